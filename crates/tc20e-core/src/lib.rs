//! Session-gated command execution and alarm state for the Total Connect
//! 2.0E panel.
//!
//! - **[`Coordinator`]**: Facade owning the current [`AlarmState`].
//!   [`refresh()`](Coordinator::refresh) reads the panel state,
//!   [`set_alarm()`](Coordinator::set_alarm) arms or disarms it, and
//!   [`spawn_refresh()`](Coordinator::spawn_refresh) drives periodic reads.
//!
//! - **[`CommandExecutor`]**: Runs one command as login → submit → poll →
//!   logout behind a gate that allows a single open session at a time.
//!
//! - **[`mapper`]**: Pure interpretation of the service's response shapes
//!   into an [`Outcome`].
//!
//! - **[`SessionClient`]**: Timeout-bounded login/logout with best-effort
//!   teardown.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, TlsVerification};
pub use coordinator::Coordinator;
pub use error::{CommandError, CoreError, FailureKind, UpdateFailure};
pub use executor::{CommandExecutor, ExecutorSettings};
pub use mapper::{Completion, Outcome};
pub use model::{AlarmCommand, AlarmState, PanelSnapshot};
pub use session::SessionClient;

pub use tc20e_api::{AuthHeader, DEFAULT_SERVICE_URL, PanelCommand};
