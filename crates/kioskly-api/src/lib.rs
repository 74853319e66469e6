// kioskly-api: Async Rust client for the kiosk device HTTP API

pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use client::{KioskClient, Snapshot};
pub use endpoint::normalize_base_url;
pub use error::{CommunicationCause, Error};
pub use transport::{REQUEST_TIMEOUT, TlsMode, TransportConfig};
