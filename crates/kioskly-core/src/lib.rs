//! Polling and command layer between `kioskly-api` and host consumers.
//!
//! - **[`Coordinator`]**: per-device polling state machine. Fetches
//!   `/api/status` (plus best-effort `/api/health`) on a fixed interval and
//!   on demand, publishes the merged snapshot atomically, and keeps the last
//!   good snapshot when a poll fails.
//!
//! - **[`CommandRegistry`]** / **[`CommandDefinition`]**: the declarative
//!   table of device commands (endpoint, payload builder, input schema).
//!
//! - **[`CommandDispatcher`]**: validates a [`CommandCall`], resolves its
//!   target through the [`DeviceHub`], posts the command, then asks the
//!   target's coordinator for a coalesced refresh.
//!
//! - **[`extract`]**: pure value extractors over a snapshot, for sensors,
//!   flags, and text values shown by host integrations.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod hub;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::registry::CommandRegistry;
pub use command::schema::{FieldSpec, FieldType, InputSchema};
pub use command::{CommandCall, CommandDefinition, Endpoint, Parameters, Target};
pub use config::{DEFAULT_POLL_INTERVAL, DeviceConfig, DeviceRecord};
pub use coordinator::{Coordinator, CoordinatorState, FailureKind};
pub use dispatcher::CommandDispatcher;
pub use error::{CoreError, ErrorKind};
pub use hub::{DeviceEntry, DeviceHub};

pub use kioskly_api::{CommunicationCause, Error as ApiError, KioskClient, Snapshot, TlsMode};
