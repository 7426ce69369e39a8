// ── Command executor ──
//
// Runs one panel command as a full session: login, submit, poll until the
// job is final, logout. A gate serializes executions so that at most one
// session is open per executor; the panel service drops concurrent
// sessions of the same account.
//
// Each execution runs in its own task that owns the gate guard, so a
// caller dropping the future cannot cut a session short before logout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, warn};

use tc20e_api::{PanelClient, PanelCommand};

use crate::config::CoordinatorConfig;
use crate::error::{CommandError, UpdateFailure};
use crate::mapper::{self, Completion, PollStep, SubmitStep};
use crate::session::SessionClient;

/// Timing knobs of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl From<&CoordinatorConfig> for ExecutorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
        }
    }
}

pub struct CommandExecutor {
    inner: Arc<ExecutorInner>,
    /// Held for the whole login..logout span of one execution.
    gate: Arc<Mutex<()>>,
}

struct ExecutorInner {
    session: SessionClient,
    settings: ExecutorSettings,
}

impl CommandExecutor {
    pub fn new(session: SessionClient, settings: ExecutorSettings) -> Self {
        Self {
            inner: Arc::new(ExecutorInner { session, settings }),
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn session(&self) -> &SessionClient {
        &self.inner.session
    }

    /// Whether an execution currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Execute `command` in its own session.
    ///
    /// Waits for any execution in flight to finish first. Logout runs on
    /// every path, including failed logins, before the gate is released.
    /// Dropping the returned future does not abort the session: it runs
    /// to logout in the background and keeps the gate until then.
    pub async fn execute(&self, command: PanelCommand) -> Result<Completion, CommandError> {
        let gate = if let Ok(guard) = Arc::clone(&self.gate).try_lock_owned() {
            guard
        } else {
            debug!(%command, "another request session in progress, waiting");
            Arc::clone(&self.gate).lock_owned().await
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(
            async move {
                let _gate = gate;
                let result = inner.run(command).await;
                inner.session.logout().await;

                match &result {
                    Ok(completion) => info!(
                        %command,
                        error_code = ?completion.error_code,
                        message = ?completion.message_key,
                        polls = completion.polls,
                        "command completed"
                    ),
                    Err(e) => warn!(%command, error = %e, "command failed"),
                }
                result
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(CommandError::CannotConnect {
                reason: format!("command session ended early: {e}"),
            }),
        }
    }
}

impl ExecutorInner {
    async fn run(&self, command: PanelCommand) -> Result<Completion, CommandError> {
        self.session.login().await?;

        let resp = self
            .bounded("command submit", self.client().submit_command(command))
            .await?;

        match mapper::interpret_submit(&resp) {
            SubmitStep::Done(outcome) => {
                debug!(status = resp.status, ?outcome, "command answered without poll phase");
                outcome.into_result()
            }
            SubmitStep::Poll { job_id } => {
                debug!(%command, %job_id, "command accepted, polling for completion");
                self.poll(command, &job_id).await
            }
        }
    }

    async fn poll(&self, command: PanelCommand, job_id: &str) -> Result<Completion, CommandError> {
        let max = self.settings.max_poll_attempts;
        for attempt in 1..=max {
            let resp = self
                .bounded("status poll", self.client().command_status(command, job_id))
                .await?;

            match mapper::interpret_poll(&resp) {
                PollStep::Done(outcome) => {
                    return outcome.into_result().map(|completion| Completion {
                        polls: attempt,
                        ..completion
                    });
                }
                PollStep::Running { status_code } => {
                    debug!(attempt, http_status = resp.status, ?status_code, "command still running");
                }
            }

            if attempt < max {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        warn!(%command, attempts = max, "giving up on command completion");
        Err(UpdateFailure::PollExhausted { attempts: max }.into())
    }

    /// Run one request under the per-step timeout.
    async fn bounded<T>(
        &self,
        step: &'static str,
        request: impl Future<Output = Result<T, tc20e_api::Error>>,
    ) -> Result<T, CommandError> {
        match timeout(self.settings.request_timeout, request).await {
            Err(_) => {
                warn!(step, "timeout when sending command to panel");
                Err(CommandError::timed_out(step, self.settings.request_timeout))
            }
            Ok(result) => result.map_err(|e| {
                debug!(step, error = %e, "exception on request");
                CommandError::from_request(e)
            }),
        }
    }

    fn client(&self) -> &PanelClient {
        self.session.client()
    }
}
