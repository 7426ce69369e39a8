// tc20e-api: Async Rust client for the Total Connect 2.0E panel web service

pub mod auth;
pub mod client;
pub mod commands;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use auth::{AuthHeader, SessionToken};
pub use client::{DEFAULT_SERVICE_URL, PanelClient};
pub use commands::PanelCommand;
pub use error::Error;
pub use models::{CompletionStatus, PanelResponse, SubmitAck};
pub use transport::{TlsMode, TransportConfig};
