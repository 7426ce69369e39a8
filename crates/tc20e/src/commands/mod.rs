//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod alarm;
pub mod config_cmd;
pub mod watch;

use tc20e_core::{AlarmCommand, Coordinator};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a panel-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => alarm::status(coordinator, global).await,
        Command::Arm => alarm::set(coordinator, AlarmCommand::Full, global).await,
        Command::ArmHome => alarm::set(coordinator, AlarmCommand::Partial, global).await,
        Command::Disarm => alarm::set(coordinator, AlarmCommand::Disarm, global).await,
        Command::Watch(args) => watch::handle(coordinator, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
