//! Command definitions for the Pomodoro tab timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{
    duration_from_parts, SessionKind, SessionUpdate, MAX_INPUT_MINUTES, MAX_INPUT_SECONDS,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomotab - a three-tab Pomodoro timer
#[derive(Parser, Debug)]
#[command(
    name = "pomotab",
    version,
    about = "3つのタブを持つポモドーロタイマーCLI",
    long_about = "Pomodoro / Short Break / Long Break の3つのタブを切り替えて使うタイマー。\n\
                  タイマー本体はデーモンとして常駐し、CLIからソケット経由で操作します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (default: ~/.pomotab/pomotab.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the countdown of the active tab
    Begin,

    /// Pause the running countdown
    Pause,

    /// Resume a paused countdown
    Resume,

    /// Reset the active tab to a full session
    Reset,

    /// Start, pause or resume depending on the current state
    Toggle,

    /// Switch to the next tab (Pomodoro → Short Break → Long Break)
    Next,

    /// Switch to a specific tab
    Tab {
        /// Tab to activate (work, short-break, long-break)
        kind: SessionKind,
    },

    /// Change session durations
    Settings(SettingsArgs),

    /// Silence completion alerts
    Mute,

    /// Re-enable completion alert sounds
    Unmute,

    /// Show current timer status
    Status,

    /// Run the timer daemon in the foreground
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Settings Command Arguments
// ============================================================================

/// Arguments for the settings command.
///
/// Durations are given as `MIN` or `MIN:SS` (0-999 minutes, 0-99 seconds).
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Pomodoro length
    #[arg(short, long, value_name = "MIN[:SS]", value_parser = parse_duration)]
    pub work: Option<u32>,

    /// Short break length
    #[arg(short, long, value_name = "MIN[:SS]", value_parser = parse_duration)]
    pub short_break: Option<u32>,

    /// Long break length
    #[arg(short, long, value_name = "MIN[:SS]", value_parser = parse_duration)]
    pub long_break: Option<u32>,
}

impl SettingsArgs {
    /// Converts the arguments into a settings update (seconds).
    pub fn to_update(&self) -> SessionUpdate {
        SessionUpdate {
            work: self.work,
            short_break: self.short_break,
            long_break: self.long_break,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses `MIN` or `MIN:SS` into seconds.
///
/// - Minutes must be 0-999
/// - Seconds must be 0-99
fn parse_duration(s: &str) -> Result<u32, String> {
    let (minutes, seconds) = match s.split_once(':') {
        Some((m, sec)) => (m, sec),
        None => (s, "0"),
    };

    let minutes: u32 = minutes
        .trim()
        .parse()
        .map_err(|_| format!("分の値が不正です: {}", s))?;
    let seconds: u32 = seconds
        .trim()
        .parse()
        .map_err(|_| format!("秒の値が不正です: {}", s))?;

    if minutes > MAX_INPUT_MINUTES {
        return Err(format!("分は0-{}で指定してください", MAX_INPUT_MINUTES));
    }
    if seconds > MAX_INPUT_SECONDS {
        return Err(format!("秒は0-{}で指定してください", MAX_INPUT_SECONDS));
    }

    Ok(duration_from_parts(minutes, seconds))
}

// ============================================================================
// Tests
// ============================================================================
