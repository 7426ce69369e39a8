// ── Status mapping ──
//
// Pure interpretation of the panel service's response shapes. No I/O:
// the executor feeds responses in and acts on the returned step.
//
// Submit (PUT) responses:
//   200 `{id, status}`                        -> poll job `id` if status == "success"
//   201 `{statusCode, messageKey, errorCode}` -> final, no poll phase
//   anything else                             -> failure with the raw body
// Poll (GET .../status) responses carry the 201 shape; statusCode 2 is
// final, 6 means the panel gave up.

use serde::de::DeserializeOwned;

use tc20e_api::{CompletionStatus, PanelResponse, SubmitAck};

use crate::error::{CommandError, UpdateFailure};
use crate::model::AlarmState;

/// Final result of a command that the panel answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Reported code; shares its number space with [`AlarmState`].
    pub error_code: Option<i64>,
    /// `false` when the submission itself was turned down.
    pub accepted: bool,
    pub message_key: Option<String>,
    /// Status polls it took to get here.
    pub polls: u32,
}

impl Completion {
    /// State reported by the panel, if it reported one.
    pub fn reported_state(&self) -> Option<AlarmState> {
        self.error_code.map(AlarmState::from_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Completion),
    /// The panel aborted the job; the state becomes `Pending`.
    Aborted,
    Failed(UpdateFailure),
}

impl Outcome {
    /// State this outcome puts the panel in, if it changes it.
    pub fn new_state(&self) -> Option<AlarmState> {
        match self {
            Self::Success(completion) => completion.reported_state(),
            Self::Aborted => Some(AlarmState::Pending),
            Self::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Completion, CommandError> {
        match self {
            Self::Success(completion) => Ok(completion),
            Self::Aborted => Err(UpdateFailure::TooLong.into()),
            Self::Failed(failure) => Err(failure.into()),
        }
    }
}

/// What to do after the submit response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStep {
    Poll { job_id: String },
    Done(Outcome),
}

/// What to do after a poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Not final yet. `status_code` is `None` when the poll itself was not
    /// answered with HTTP 200.
    Running { status_code: Option<i64> },
    Done(Outcome),
}

pub fn interpret_submit(resp: &PanelResponse) -> SubmitStep {
    match resp.status {
        200 => match decode::<SubmitAck>(resp) {
            Ok(ack) if ack.is_success() => SubmitStep::Poll { job_id: ack.id },
            Ok(ack) => SubmitStep::Done(Outcome::Success(Completion {
                error_code: ack.error_code,
                accepted: false,
                message_key: Some(ack.status),
                polls: 0,
            })),
            Err(failure) => SubmitStep::Done(Outcome::Failed(failure)),
        },
        201 => match decode::<CompletionStatus>(resp) {
            Ok(status) => SubmitStep::Done(finished(status)),
            Err(failure) => SubmitStep::Done(Outcome::Failed(failure)),
        },
        status => SubmitStep::Done(Outcome::Failed(UpdateFailure::UnexpectedStatus {
            status,
            body: resp.body_preview().to_owned(),
        })),
    }
}

pub fn interpret_poll(resp: &PanelResponse) -> PollStep {
    if resp.status != 200 {
        return PollStep::Running { status_code: None };
    }
    match decode::<CompletionStatus>(resp) {
        Ok(status) => {
            let code = status.status_code;
            interpret_completion(status).map_or(
                PollStep::Running {
                    status_code: Some(code),
                },
                PollStep::Done,
            )
        }
        Err(failure) => PollStep::Done(Outcome::Failed(failure)),
    }
}

/// `None` while the job is still running.
pub fn interpret_completion(status: CompletionStatus) -> Option<Outcome> {
    match status.status_code {
        CompletionStatus::COMPLETED | CompletionStatus::TOO_LONG => Some(finished(status)),
        _ => None,
    }
}

fn finished(status: CompletionStatus) -> Outcome {
    if status.status_code == CompletionStatus::TOO_LONG {
        return Outcome::Aborted;
    }
    Outcome::Success(Completion {
        error_code: status.error_code,
        accepted: true,
        message_key: status.message_key,
        polls: 0,
    })
}

fn decode<T: DeserializeOwned>(resp: &PanelResponse) -> Result<T, UpdateFailure> {
    if !resp.is_json() {
        return Err(UpdateFailure::ContentType {
            content_type: resp.content_type.clone().unwrap_or_default(),
            body: resp.body_preview().to_owned(),
        });
    }
    serde_json::from_str(&resp.body).map_err(|e| UpdateFailure::Decode {
        message: e.to_string(),
        body: resp.body_preview().to_owned(),
    })
}
