//! `watch`: periodic refresh with one output line per state change.

use tokio_util::sync::CancellationToken;

use tc20e_core::{AlarmState, Coordinator, PanelSnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut rx = coordinator.subscribe();
    let cancel = CancellationToken::new();
    let task = coordinator.spawn_refresh(cancel.clone());

    if !global.quiet {
        eprintln!(
            "Watching alarm state every {} (Ctrl-C to stop)",
            humantime::format_duration(coordinator.config().refresh_interval)
        );
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last: Option<AlarmState> = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = *rx.borrow_and_update();
                if args.all || last != Some(snap.state) {
                    output::print_output(&render_line(&global.output, &snap, color), global.quiet);
                }
                last = Some(snap.state);
            }
        }
    }

    cancel.cancel();
    if let Err(e) = task.await {
        tracing::debug!(error = %e, "refresh task ended abnormally");
    }
    Ok(())
}

/// One line per update: timestamped label for humans, compact JSON for
/// the structured formats so the stream stays line-delimited.
fn render_line(format: &OutputFormat, snap: &PanelSnapshot, color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let at = snap
                .updated_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
            format!("{at}  {}", output::state_label(snap.state, color))
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            output::render_state(&OutputFormat::JsonCompact, snap, false)
        }
        other => output::render_state(other, snap, false),
    }
}
