//! `kioskly commands`: list the command registry.

use serde::Serialize;
use tabled::Tabled;

use kioskly_core::command::schema::Literal;
use kioskly_core::{CommandDefinition, CommandRegistry, FieldSpec, FieldType};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CommandInfo {
    name: &'static str,
    endpoint: &'static str,
    params: Vec<String>,
    description: &'static str,
}

#[derive(Tabled)]
struct CommandRow {
    #[tabled(rename = "Command")]
    name: &'static str,
    #[tabled(rename = "Endpoint")]
    endpoint: &'static str,
    #[tabled(rename = "Parameters")]
    params: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&CommandInfo> for CommandRow {
    fn from(c: &CommandInfo) -> Self {
        Self {
            name: c.name,
            endpoint: c.endpoint,
            params: if c.params.is_empty() {
                "-".into()
            } else {
                c.params.join(", ")
            },
            description: c.description,
        }
    }
}

/// `value: 0..=100`, `loop?: bool`, `min?: 0..=100 = 10`, `command: up|down|...`
fn describe_field(field: &FieldSpec) -> String {
    let ty = match field.ty {
        FieldType::Integer { min, max } => format!("{min}..={max}"),
        FieldType::Text => "text".into(),
        FieldType::Boolean => "bool".into(),
        FieldType::OneOf(choices) => choices.join("|"),
    };
    let marker = if field.required { "" } else { "?" };
    let default = match field.default {
        Some(Literal::Integer(n)) => format!(" = {n}"),
        Some(Literal::Boolean(b)) => format!(" = {b}"),
        Some(Literal::Text(s)) => format!(" = {s}"),
        None => String::new(),
    };
    format!("{}{marker}: {ty}{default}", field.name)
}

fn info(def: &CommandDefinition) -> CommandInfo {
    CommandInfo {
        name: def.name,
        endpoint: def.endpoint_pattern,
        params: def.schema.fields.iter().map(describe_field).collect(),
        description: def.description,
    }
}

pub fn handle(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let registry = CommandRegistry::with_builtins();
    let commands: Vec<CommandInfo> = registry.definitions().map(info).collect();

    let out = output::render_list(
        config::output_format(global, cfg),
        &commands,
        |c| CommandRow::from(c),
        |c| c.name.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
