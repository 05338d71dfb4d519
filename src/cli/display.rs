//! Display utilities for the pomotab CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status display with the three tabs

use crate::types::{IpcResponse, ResponseData, SessionKind};

/// Width of the status progress bar, in characters
const PROGRESS_BAR_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a playback or tab command: the daemon's message
    /// followed by the remaining time of the active tab.
    pub fn show_result(response: &IpcResponse) {
        for line in Self::result_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows the result of the settings command.
    pub fn show_settings(response: &IpcResponse) {
        println!("* {}", response.message);

        if let Some(sessions) = response.data.as_ref().and_then(|d| d.sessions) {
            for kind in SessionKind::ALL {
                println!("  {:<12} {}", kind.label(), format_time(sessions.get(kind)));
            }
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        for line in Self::status_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn result_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![format!("* {}", response.message)];

        if let Some(data) = &response.data {
            if let (Some(kind), Some(remaining)) = (data.active_kind, data.remaining_seconds) {
                lines.push(format!("  {}: {}", kind.label(), format_time(remaining)));
            }
        }

        lines
    }

    fn status_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![
            "ポモドーロタイマー ステータス".to_string(),
            "─────────────────────────────".to_string(),
        ];

        let Some(data) = &response.data else {
            lines.push("タイマーは起動していません".to_string());
            return lines;
        };

        if let Some(active) = data.active_kind {
            lines.push(format!("タブ: {}", tab_strip(active)));
        }

        let state = data.state.as_deref().unwrap_or("unknown");
        lines.push(format!("状態: {}", state_label(state)));

        if let Some(remaining) = data.remaining_seconds {
            lines.push(format!("残り時間: {}", format_time(remaining)));
        }
        if let Some(bar) = progress_bar(data) {
            lines.push(bar);
        }
        if let Some(muted) = data.muted {
            lines.push(format!("通知音: {}", if muted { "ミュート" } else { "オン" }));
        }

        lines
    }
}

/// Formats seconds as `m:ss`. Minutes are not wrapped into hours.
pub fn format_time(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn state_label(state: &str) -> &str {
    match state {
        "idle" => "待機中",
        "running" => "計測中",
        "paused" => "一時停止中",
        "done" => "完了",
        _ => state,
    }
}

/// Renders the three tabs with the active one bracketed.
fn tab_strip(active: SessionKind) -> String {
    SessionKind::ALL
        .iter()
        .map(|kind| {
            if *kind == active {
                format!("[{}]", kind.label())
            } else {
                kind.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Bar that empties as the countdown runs down.
fn progress_bar(data: &ResponseData) -> Option<String> {
    let percent = data.remaining_percent()?;
    let filled = ((percent / 100.0) * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    Some(format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        percent
    ))
}

// ============================================================================
// Tests
// ============================================================================
