//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use tc20e_core::{AlarmState, PanelSnapshot};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// State label, colored by severity when `color` is set.
pub fn state_label(state: AlarmState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        AlarmState::Disarmed => label.green().to_string(),
        AlarmState::ArmedAway | AlarmState::ArmedHome => label.red().bold().to_string(),
        AlarmState::Pending => label.yellow().to_string(),
        AlarmState::Code(_) => label.magenta().bold().to_string(),
    }
}

// ── Alarm state view ─────────────────────────────────────────────────

/// Serializable view of a snapshot for every output format.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StateView {
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Code")]
    pub code: i64,
    #[tabled(rename = "Armed")]
    pub armed: bool,
    #[tabled(rename = "Updated")]
    pub updated_at: String,
}

impl From<&PanelSnapshot> for StateView {
    fn from(snap: &PanelSnapshot) -> Self {
        Self {
            state: snap.state.to_string(),
            code: snap.state.code(),
            armed: snap.state.is_armed(),
            updated_at: snap
                .updated_at
                .map_or_else(|| "never".into(), |t| t.to_rfc3339()),
        }
    }
}

/// Render a snapshot in the chosen format.
pub fn render_state(format: &OutputFormat, snap: &PanelSnapshot, color: bool) -> String {
    let view = StateView::from(snap);
    render_single(
        format,
        &view,
        |v| {
            let mut row = v.clone();
            row.state = state_label(snap.state, color);
            render_table(&[row])
        },
        |v| v.code.to_string(),
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering goes through `detail_fn`, which returns the finished text.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
