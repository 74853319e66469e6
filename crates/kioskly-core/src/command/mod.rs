// ── Command API ──
//
// Every outbound control call is described by a `CommandDefinition`:
// where to POST, how to build the body, and what input is accepted.
// The dispatcher looks definitions up by name in the `CommandRegistry`.

pub mod registry;
pub mod schema;

use serde_json::Value;

use crate::error::CoreError;
use schema::InputSchema;

/// Validated call parameters, keyed by field name.
pub type Parameters = serde_json::Map<String, Value>;

/// Builds the JSON body of a command from its validated parameters.
pub type PayloadBuilder = fn(&Parameters) -> Parameters;

/// Where a command is POSTed.
#[derive(Debug, Clone, Copy)]
pub enum Endpoint {
    /// A fixed path such as `/api/reload`.
    Static(&'static str),
    /// A path computed from the validated parameters.
    Templated(fn(&Parameters) -> String),
}

impl Endpoint {
    pub fn render(&self, params: &Parameters) -> String {
        match self {
            Self::Static(path) => (*path).to_owned(),
            Self::Templated(template) => template(params),
        }
    }
}

/// Static description of one controllable action.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub endpoint: Endpoint,
    /// Shown in listings for templated endpoints.
    pub endpoint_pattern: &'static str,
    pub payload: Option<PayloadBuilder>,
    pub schema: InputSchema,
}

impl CommandDefinition {
    /// A bodiless command against a fixed endpoint.
    pub const fn new(name: &'static str, description: &'static str, path: &'static str) -> Self {
        Self {
            name,
            description,
            endpoint: Endpoint::Static(path),
            endpoint_pattern: path,
            payload: None,
            schema: InputSchema::empty(),
        }
    }

    pub const fn templated(
        mut self,
        pattern: &'static str,
        template: fn(&Parameters) -> String,
    ) -> Self {
        self.endpoint = Endpoint::Templated(template);
        self.endpoint_pattern = pattern;
        self
    }

    pub const fn payload(mut self, builder: PayloadBuilder) -> Self {
        self.payload = Some(builder);
        self
    }

    pub const fn schema(mut self, schema: InputSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Render the endpoint and body for already-validated parameters.
    pub fn prepare(&self, params: &Parameters) -> (String, Option<Value>) {
        let endpoint = self.endpoint.render(params);
        let body = self.payload.map(|build| Value::Object(build(params)));
        (endpoint, body)
    }
}

/// Caller-supplied identifiers for the target device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub entry_id: Option<String>,
    pub device_url: Option<String>,
}

impl Target {
    pub fn entry(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: Some(entry_id.into()),
            device_url: None,
        }
    }

    pub fn url(device_url: impl Into<String>) -> Self {
        Self {
            entry_id: None,
            device_url: Some(device_url.into()),
        }
    }
}

/// One invocation of a named command.
#[derive(Debug, Clone, Default)]
pub struct CommandCall {
    pub target: Target,
    pub parameters: Parameters,
}

impl CommandCall {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            parameters: Parameters::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Parse a `key=value` argument into a parameter entry.
///
/// The value is read as JSON when it parses (`value=42`, `loop=true`),
/// otherwise kept verbatim as a string (`url=https://example.com`).
pub fn parse_parameter(raw: &str) -> Result<(String, Value), CoreError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CoreError::invalid_input(raw, "expected key=value"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CoreError::invalid_input(raw, "empty parameter name"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

/// Copy the listed keys that are present in `params`.
pub(crate) fn pick(params: &Parameters, keys: &[&str]) -> Parameters {
    keys.iter()
        .filter_map(|key| params.get(*key).map(|v| ((*key).to_owned(), v.clone())))
        .collect()
}
