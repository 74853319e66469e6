// ── Command dispatcher ──
//
// Validates a call, resolves its target, posts the command, and asks the
// target's coordinator for a refresh. Nothing touches the network until
// the command is known, the input is valid, and the target is active.

use std::sync::Arc;

use tracing::{debug, info};

use crate::command::registry::CommandRegistry;
use crate::command::{CommandCall, CommandDefinition};
use crate::error::CoreError;
use crate::hub::{DeviceEntry, DeviceHub};

/// Routes named commands to configured devices.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    hub: Arc<DeviceHub>,
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    /// Create a dispatcher, registering the built-in commands on
    /// `registry` if that has not happened yet.
    pub fn new(hub: Arc<DeviceHub>, registry: Arc<CommandRegistry>) -> Self {
        registry.ensure_registered();
        Self { hub, registry }
    }

    pub fn hub(&self) -> &Arc<DeviceHub> {
        &self.hub
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Execute `name` against the device identified by `call.target`.
    ///
    /// Errors, in the order they are checked:
    /// - `NotFound` for an unregistered command name
    /// - `InvalidInput` when the parameters fail the command's schema
    /// - `TargetUnavailable` when no active device matches the target
    /// - transport errors from the POST, unchanged
    pub async fn execute(&self, name: &str, call: CommandCall) -> Result<(), CoreError> {
        let definition = self.definition(name)?;
        let params = definition.schema.validate(&call.parameters)?;
        let entry = self.target(&call)?;

        let (endpoint, payload) = definition.prepare(&params);
        debug!(command = name, device = entry.id(), endpoint = %endpoint, "dispatching command");

        entry.client().post_command(&endpoint, payload.as_ref()).await?;
        info!(command = name, device = entry.id(), "command sent");

        entry.coordinator().request_refresh();
        Ok(())
    }

    fn definition(&self, name: &str) -> Result<&CommandDefinition, CoreError> {
        self.registry.get(name).ok_or_else(|| CoreError::NotFound {
            name: name.to_owned(),
        })
    }

    fn target(&self, call: &CommandCall) -> Result<&Arc<DeviceEntry>, CoreError> {
        let target = &call.target;
        if target.entry_id.as_deref().is_none_or(str::is_empty)
            && target.device_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(CoreError::target_unavailable("no entry_id or device_url given"));
        }

        let entry = self
            .hub
            .resolve(target.entry_id.as_deref(), target.device_url.as_deref())
            .ok_or_else(|| CoreError::target_unavailable("no configured device matches"))?;

        if !entry.is_active() {
            return Err(CoreError::target_unavailable(format!(
                "device {} is not loaded",
                entry.id()
            )));
        }
        Ok(entry)
    }
}
