// ── Domain model ──
//
// The panel reports normal states and fault conditions in one numeric
// space: 100/101/102 are disarmed/away/home, 0 is "pending", and anything
// else is a service-defined error code.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use tc20e_api::PanelCommand;

/// Canonical state of the alarm panel.
///
/// Equality and hashing go through [`AlarmState::code`], so a `Code`
/// holding a reserved value equals the named state it stands for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum AlarmState {
    /// No confirmed state yet, or the last command was aborted.
    #[default]
    Pending,
    Disarmed,
    ArmedAway,
    ArmedHome,
    /// Any other code reported by the service.
    Code(i64),
}

impl AlarmState {
    pub const PENDING: i64 = 0;
    pub const DISARMED: i64 = 100;
    pub const ARMED_AWAY: i64 = 101;
    pub const ARMED_HOME: i64 = 102;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::PENDING => Self::Pending,
            Self::DISARMED => Self::Disarmed,
            Self::ARMED_AWAY => Self::ArmedAway,
            Self::ARMED_HOME => Self::ArmedHome,
            other => Self::Code(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Pending => Self::PENDING,
            Self::Disarmed => Self::DISARMED,
            Self::ArmedAway => Self::ARMED_AWAY,
            Self::ArmedHome => Self::ARMED_HOME,
            Self::Code(code) => code,
        }
    }

    /// Whether the panel is armed in either mode.
    pub fn is_armed(self) -> bool {
        matches!(self, Self::ArmedAway | Self::ArmedHome)
    }

    /// Whether this is a service error code rather than a panel state.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Code(_))
    }

    /// Short machine-friendly label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Disarmed => "disarmed",
            Self::ArmedAway => "armed_away",
            Self::ArmedHome => "armed_home",
            Self::Code(_) => "error",
        }
    }
}

impl PartialEq for AlarmState {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for AlarmState {}

impl Hash for AlarmState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<i64> for AlarmState {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<AlarmState> for i64 {
    fn from(state: AlarmState) -> Self {
        state.code()
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "error {code}"),
            other => f.write_str(other.label()),
        }
    }
}

/// User-facing arm/disarm commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AlarmCommand {
    /// Arm away.
    Full,
    /// Arm home.
    Partial,
    Disarm,
}

impl AlarmCommand {
    /// Service command that carries this request.
    pub fn panel_command(self) -> PanelCommand {
        match self {
            Self::Full => PanelCommand::Arm,
            Self::Partial => PanelCommand::PartialArm,
            Self::Disarm => PanelCommand::Disarm,
        }
    }

    /// State the panel is in once the command completes.
    pub fn target_state(self) -> AlarmState {
        match self {
            Self::Full => AlarmState::ArmedAway,
            Self::Partial => AlarmState::ArmedHome,
            Self::Disarm => AlarmState::Disarmed,
        }
    }
}

/// Alarm state plus the time it was last confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PanelSnapshot {
    pub state: AlarmState,
    pub updated_at: Option<DateTime<Utc>>,
}
