// ── Command registry ──
//
// The built-in command table, registered on first use. A registry records
// its own initialization, so any number of callers can ask for it to be
// registered and only the first does the work.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use strum::VariantNames;

use super::schema::{FieldSpec, FieldType, InputSchema, Literal};
use super::{CommandDefinition, Parameters, pick};

/// Keys accepted by `/api/remote/{command}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum RemoteKey {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    Home,
    Menu,
    PlayPause,
}

const PERCENT: FieldType = FieldType::Integer { min: 0, max: 100 };

// ── Payload builders ─────────────────────────────────────────────

fn value_body(params: &Parameters) -> Parameters {
    pick(params, &["value"])
}

fn url_body(params: &Parameters) -> Parameters {
    pick(params, &["url"])
}

fn text_body(params: &Parameters) -> Parameters {
    pick(params, &["text"])
}

fn code_body(params: &Parameters) -> Parameters {
    pick(params, &["code"])
}

fn package_body(params: &Parameters) -> Parameters {
    pick(params, &["package"])
}

fn audio_body(params: &Parameters) -> Parameters {
    pick(params, &["url", "loop", "volume"])
}

fn auto_brightness_body(params: &Parameters) -> Parameters {
    pick(params, &["min", "max"])
}

fn remote_endpoint(params: &Parameters) -> String {
    let key = params
        .get("command")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    format!("/api/remote/{key}")
}

// ── Schemas ──────────────────────────────────────────────────────

const VALUE_SCHEMA: InputSchema = InputSchema::new(&[FieldSpec::required("value", PERCENT)]);
const URL_SCHEMA: InputSchema = InputSchema::new(&[FieldSpec::required("url", FieldType::Text)]);
const TEXT_SCHEMA: InputSchema = InputSchema::new(&[FieldSpec::required("text", FieldType::Text)]);
const CODE_SCHEMA: InputSchema = InputSchema::new(&[FieldSpec::required("code", FieldType::Text)]);
const PACKAGE_SCHEMA: InputSchema =
    InputSchema::new(&[FieldSpec::required("package", FieldType::Text)]);
const AUDIO_SCHEMA: InputSchema = InputSchema::new(&[
    FieldSpec::required("url", FieldType::Text),
    FieldSpec::optional("loop", FieldType::Boolean),
    FieldSpec::optional("volume", PERCENT),
]);
const AUTO_BRIGHTNESS_SCHEMA: InputSchema = InputSchema::new(&[
    FieldSpec::optional("min", PERCENT).with_default(Literal::Integer(10)),
    FieldSpec::optional("max", PERCENT).with_default(Literal::Integer(100)),
]);
const REMOTE_SCHEMA: InputSchema = InputSchema::new(&[FieldSpec::required(
    "command",
    FieldType::OneOf(RemoteKey::VARIANTS),
)]);

// ── Built-in table ───────────────────────────────────────────────

static BUILTIN: &[CommandDefinition] = &[
    // Screen
    CommandDefinition::new("screen_on", "Turn the screen on", "/api/screen/on"),
    CommandDefinition::new("screen_off", "Turn the screen off", "/api/screen/off"),
    CommandDefinition::new("screensaver_on", "Activate the screensaver", "/api/screensaver/on"),
    CommandDefinition::new("screensaver_off", "Dismiss the screensaver", "/api/screensaver/off"),
    CommandDefinition::new("set_brightness", "Set screen brightness (0-100)", "/api/brightness")
        .payload(value_body)
        .schema(VALUE_SCHEMA),
    CommandDefinition::new(
        "enable_auto_brightness",
        "Enable light-sensor brightness between min and max",
        "/api/autoBrightness/enable",
    )
    .payload(auto_brightness_body)
    .schema(AUTO_BRIGHTNESS_SCHEMA),
    CommandDefinition::new(
        "disable_auto_brightness",
        "Disable automatic brightness",
        "/api/autoBrightness/disable",
    ),
    // Browser
    CommandDefinition::new("navigate_url", "Load a URL in the kiosk WebView", "/api/url")
        .payload(url_body)
        .schema(URL_SCHEMA),
    CommandDefinition::new("reload", "Reload the current page", "/api/reload"),
    CommandDefinition::new("clear_cache", "Clear the WebView cache", "/api/clearCache"),
    CommandDefinition::new("execute_js", "Run JavaScript in the current page", "/api/js")
        .payload(code_body)
        .schema(CODE_SCHEMA),
    // Device
    CommandDefinition::new("wake", "Wake the device", "/api/wake"),
    CommandDefinition::new("reboot", "Reboot the device", "/api/reboot"),
    CommandDefinition::new("launch_app", "Launch an installed app by package", "/api/app/launch")
        .payload(package_body)
        .schema(PACKAGE_SCHEMA),
    // Audio and notifications
    CommandDefinition::new("set_volume", "Set media volume (0-100)", "/api/volume")
        .payload(value_body)
        .schema(VALUE_SCHEMA),
    CommandDefinition::new("play_audio", "Play an audio URL", "/api/audio/play")
        .payload(audio_body)
        .schema(AUDIO_SCHEMA),
    CommandDefinition::new("stop_audio", "Stop audio playback", "/api/audio/stop"),
    CommandDefinition::new("beep", "Play a short beep", "/api/audio/beep"),
    CommandDefinition::new("tts", "Speak text aloud", "/api/tts")
        .payload(text_body)
        .schema(TEXT_SCHEMA),
    CommandDefinition::new("toast", "Show a toast message", "/api/toast")
        .payload(text_body)
        .schema(TEXT_SCHEMA),
    // Remote control
    CommandDefinition::new("remote_command", "Send a remote-control key", "/api/remote")
        .templated("/api/remote/{command}", remote_endpoint)
        .schema(REMOTE_SCHEMA),
];

// ── Registry ─────────────────────────────────────────────────────

/// Named command definitions available to the dispatcher.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    definitions: OnceLock<BTreeMap<&'static str, CommandDefinition>>,
}

impl CommandRegistry {
    /// An empty, not-yet-registered registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in commands already registered.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.ensure_registered();
        registry
    }

    /// Register the built-in commands if that has not happened yet.
    ///
    /// Returns `true` only for the call that performed the registration.
    pub fn ensure_registered(&self) -> bool {
        let mut registered_now = false;
        self.definitions.get_or_init(|| {
            registered_now = true;
            BUILTIN.iter().map(|def| (def.name, def.clone())).collect()
        });
        if registered_now {
            tracing::debug!(count = BUILTIN.len(), "registered built-in commands");
        }
        registered_now
    }

    pub fn is_registered(&self) -> bool {
        self.definitions.get().is_some()
    }

    /// Look up a command by name. `None` before registration.
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.definitions.get()?.get(name)
    }

    /// All registered definitions, ordered by name.
    pub fn definitions(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.definitions.get().into_iter().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.definitions.get().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
