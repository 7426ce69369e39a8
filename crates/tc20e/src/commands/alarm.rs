//! Status and arm/disarm handlers.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use tc20e_core::{AlarmCommand, Coordinator, CoreError};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn status(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    with_spinner(global, "Reading alarm state", coordinator.refresh()).await?;
    print_state(coordinator, global);
    Ok(())
}

pub async fn set(
    coordinator: &Coordinator,
    command: AlarmCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let message = format!("Sending '{command}' to the panel");
    let state = with_spinner(global, &message, coordinator.set_alarm(command)).await?;

    if state != command.target_state() && !global.quiet {
        eprintln!("! Panel did not confirm '{command}'; it reports {state}");
    }
    print_state(coordinator, global);
    Ok(())
}

fn print_state(coordinator: &Coordinator, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_state(&global.output, &coordinator.snapshot(), color);
    output::print_output(&out, global.quiet);
}

/// Await `op` behind a stderr spinner. A command can sit in its poll phase
/// for a while, so the user gets feedback.
async fn with_spinner<T>(
    global: &GlobalOpts,
    message: &str,
    op: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CoreError> {
    if global.quiet {
        return op.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = op.await;
    spinner.finish_and_clear();
    result
}
