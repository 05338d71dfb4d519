//! pomotab - a three-tab Pomodoro timer
//!
//! One countdown per tab, all driven by a single shared tick:
//! - Pomodoro (25 minutes by default)
//! - Short Break (5 minutes)
//! - Long Break (15 minutes)

use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use pomotab::cli::{Cli, Commands, Display, IpcClient};
use pomotab::daemon::{self, DaemonConfig};
use pomotab::notification::DesktopNotifier;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` raises the default level to debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let socket = cli.socket;
    let client = || -> Result<IpcClient> {
        match &socket {
            Some(path) => Ok(IpcClient::with_socket_path(path.clone())),
            None => IpcClient::new(),
        }
    };

    match command {
        Commands::Begin => Display::show_result(&client()?.begin().await?),
        Commands::Pause => Display::show_result(&client()?.pause().await?),
        Commands::Resume => Display::show_result(&client()?.resume().await?),
        Commands::Reset => Display::show_result(&client()?.reset().await?),
        Commands::Toggle => Display::show_result(&client()?.toggle().await?),
        Commands::Next => Display::show_result(&client()?.next().await?),
        Commands::Tab { kind } => Display::show_result(&client()?.tab(kind).await?),
        Commands::Settings(args) => {
            let update = args.to_update();
            if update.is_empty() {
                anyhow::bail!("--work, --short-break, --long-break のいずれかを指定してください");
            }
            Display::show_settings(&client()?.settings(update).await?);
        }
        Commands::Mute => Display::show_result(&client()?.mute(true).await?),
        Commands::Unmute => Display::show_result(&client()?.mute(false).await?),
        Commands::Status => Display::show_status(&client()?.status().await?),
        Commands::Daemon => {
            let mut config = DaemonConfig::from_home()?;
            if let Some(path) = &socket {
                config = config.with_socket_path(path.clone());
            }
            daemon::run(config, Arc::new(DesktopNotifier::new())).await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
