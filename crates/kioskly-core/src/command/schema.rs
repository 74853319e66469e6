// ── Input schemas ──
//
// Declarative validation for command parameters. Validation coerces the
// loosely-typed values host automations and the CLI send (numeric strings,
// "on"/"off" flags) into their canonical JSON types, rejects anything else,
// and fills defaults so payload builders only ever see complete input.

use serde_json::{Number, Value};

use super::Parameters;
use crate::error::CoreError;

/// Accepted type of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Whole number, inclusive bounds.
    Integer { min: i64, max: i64 },
    Text,
    Boolean,
    /// One of a fixed set of strings (case-insensitive on input).
    OneOf(&'static [&'static str]),
}

/// A compile-time default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Integer(i64),
    Boolean(bool),
    Text(&'static str),
}

impl Literal {
    fn to_value(self) -> Value {
        match self {
            Self::Integer(n) => Value::from(n),
            Self::Boolean(b) => Value::Bool(b),
            Self::Text(s) => Value::from(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub default: Option<Literal>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: Literal) -> Self {
        self.default = Some(default);
        self
    }

    /// Coerce `value` to this field's type.
    fn coerce(&self, value: &Value) -> Result<Value, CoreError> {
        match self.ty {
            FieldType::Integer { min, max } => {
                let n = coerce_integer(value)
                    .ok_or_else(|| CoreError::invalid_input(self.name, "expected an integer"))?;
                if n < min || n > max {
                    return Err(CoreError::invalid_input(
                        self.name,
                        format!("{n} is outside {min}..={max}"),
                    ));
                }
                Ok(Value::from(n))
            }
            FieldType::Text => coerce_text(value)
                .map(Value::String)
                .ok_or_else(|| CoreError::invalid_input(self.name, "expected a string")),
            FieldType::Boolean => coerce_bool(value)
                .map(Value::Bool)
                .ok_or_else(|| CoreError::invalid_input(self.name, "expected a boolean")),
            FieldType::OneOf(choices) => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| CoreError::invalid_input(self.name, "expected a string"))?;
                choices
                    .iter()
                    .find(|choice| **choice == raw)
                    .map(|choice| Value::from(*choice))
                    .ok_or_else(|| {
                        CoreError::invalid_input(
                            self.name,
                            format!("'{raw}' is not one of {}", choices.join(", ")),
                        )
                    })
            }
        }
    }
}

/// The accepted parameters of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSchema {
    pub fields: &'static [FieldSpec],
}

impl InputSchema {
    pub const fn empty() -> Self {
        Self { fields: &[] }
    }

    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate and normalize `params`.
    ///
    /// Returns a new parameter map holding only declared fields, each in
    /// its canonical type, with defaults filled for absent optional fields.
    pub fn validate(&self, params: &Parameters) -> Result<Parameters, CoreError> {
        if let Some(unknown) = params.keys().find(|key| self.field(key).is_none()) {
            return Err(CoreError::invalid_input(unknown, "unknown parameter"));
        }

        let mut validated = Parameters::new();
        for field in self.fields {
            match params.get(field.name) {
                Some(value) if !value.is_null() => {
                    validated.insert(field.name.to_owned(), field.coerce(value)?);
                }
                _ if field.required => {
                    return Err(CoreError::invalid_input(field.name, "required parameter missing"));
                }
                _ => {
                    if let Some(default) = field.default {
                        validated.insert(field.name.to_owned(), default.to_value());
                    }
                }
            }
        }
        Ok(validated)
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => number_to_i64(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn number_to_i64(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().and_then(truncate))
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate(f: f64) -> Option<i64> {
    // Beyond 2^53 the value is no longer an exact integer anyway.
    (-9.0e15..=9.0e15).contains(&f).then(|| f.trunc() as i64)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "enable" | "1" => Some(true),
            "false" | "no" | "off" | "disable" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
