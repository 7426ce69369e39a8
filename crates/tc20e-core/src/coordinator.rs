// ── Coordinator ──
//
// Facade over the command executor. Owns the current alarm state, exposes
// the refresh and arm/disarm entry points, and re-wraps command failures
// into operation-level errors.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tc20e_api::{PanelClient, PanelCommand};

use crate::config::CoordinatorConfig;
use crate::error::{CommandError, CoreError};
use crate::executor::{CommandExecutor, ExecutorSettings};
use crate::model::{AlarmCommand, AlarmState, PanelSnapshot};
use crate::session::SessionClient;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`; clones share the state
/// and the executor gate, so all of them together keep one session open
/// at most.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    executor: CommandExecutor,
    state: watch::Sender<PanelSnapshot>,
}

impl Coordinator {
    /// Create a coordinator. Does not contact the service.
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoreError> {
        let session = session_client(&config)?;
        let executor = CommandExecutor::new(session, ExecutorSettings::from(&config));
        let (state, _) = watch::channel(PanelSnapshot::default());

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                executor,
                state,
            }),
        })
    }

    /// Check credentials with a single login/logout round trip.
    pub async fn validate_credentials(config: &CoordinatorConfig) -> Result<(), CoreError> {
        session_client(config)?
            .validate()
            .await
            .map_err(|source| CoreError::ValidationFailed { source })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── State observation ────────────────────────────────────────

    pub fn alarm_status(&self) -> AlarmState {
        self.inner.state.borrow().state
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        *self.inner.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.inner.state.subscribe()
    }

    /// Whether a command session is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.executor.is_busy()
    }

    // ── Operations ───────────────────────────────────────────────

    /// Read the panel state from the service.
    pub async fn refresh(&self) -> Result<AlarmState, CoreError> {
        debug!("trying to get alarm status");

        match self.inner.executor.execute(PanelCommand::Status).await {
            Ok(completion) => {
                if let Some(state) = completion.reported_state() {
                    self.apply(state);
                }
                Ok(self.alarm_status())
            }
            Err(source) => {
                self.apply_forced(&source);
                Err(CoreError::StatusUnavailable { source })
            }
        }
    }

    /// Arm or disarm the panel.
    ///
    /// The target state is applied once the panel confirms the command.
    /// With `optimistic_state` it is applied up front instead and kept
    /// even if the command fails.
    pub async fn set_alarm(&self, command: AlarmCommand) -> Result<AlarmState, CoreError> {
        let target = command.target_state();
        if self.inner.config.optimistic_state {
            self.apply(target);
        }

        match self.inner.executor.execute(command.panel_command()).await {
            Ok(completion) if completion.accepted => {
                self.apply(target);
                Ok(target)
            }
            Ok(completion) => {
                info!(%command, status = ?completion.message_key, "panel refused command");
                // Only a code the panel actually reported counts as confirmed.
                if let Some(state) = completion.reported_state() {
                    self.apply(state);
                }
                Ok(self.alarm_status())
            }
            Err(source) => {
                self.apply_forced(&source);
                Err(CoreError::CommandFailed { command, source })
            }
        }
    }

    /// Spawn a task that refreshes every `refresh_interval` until `cancel`
    /// fires. The first refresh runs immediately.
    pub fn spawn_refresh(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let period = self.inner.config.refresh_interval.max(Duration::from_secs(1));
        tokio::spawn(refresh_task(self.clone(), period, cancel))
    }

    // ── State mutation ───────────────────────────────────────────

    fn apply(&self, state: AlarmState) {
        let previous = self.alarm_status();
        self.inner.state.send_modify(|snap| {
            snap.state = state;
            snap.updated_at = Some(Utc::now());
        });
        if previous != state {
            info!(from = %previous, to = %state, "alarm state changed");
        }
    }

    fn apply_forced(&self, error: &CommandError) {
        if let Some(state) = error.forced_state() {
            debug!(%state, "forcing alarm state after abort");
            self.apply(state);
        }
    }
}

fn session_client(config: &CoordinatorConfig) -> Result<SessionClient, CoreError> {
    let client = PanelClient::new(config.service_url.clone(), &config.transport()).map_err(|e| {
        CoreError::Config {
            message: format!("cannot build HTTP client: {e}"),
        }
    })?;
    Ok(SessionClient::new(
        Arc::new(client),
        config.auth.clone(),
        config.request_timeout,
    ))
}

/// Periodically refresh the alarm state.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
    debug!("refresh task stopped");
}
