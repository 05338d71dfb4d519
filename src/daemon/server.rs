//! Daemon event loop.
//!
//! Wires the tick source, the coordinator, the IPC server and the alert
//! dispatcher together and drives them from a single `select!` loop:
//! - ticks are routed to the coordinator
//! - timer events are forwarded to the alert dispatcher
//! - each accepted connection is served on its own task

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};

use crate::notification::{AlertDispatcher, Notifier};
use crate::settings::{Settings, SettingsStore, APP_DIR};
use crate::types::IpcResponse;

use super::coordinator::{TabCoordinator, TimerEvent};
use super::ipc::{IpcServer, RequestHandler, SOCKET_FILE};
use super::tick::{Clock, TickSource, DEFAULT_TICK_PERIOD};

// ============================================================================
// DaemonConfig
// ============================================================================

/// Runtime configuration of the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Unix socket the daemon listens on
    pub socket_path: PathBuf,
    /// Settings file; None keeps preferences in memory only
    pub settings_path: Option<PathBuf>,
    /// Interval between ticks
    pub tick_period: Duration,
}

impl DaemonConfig {
    /// Configuration rooted at `~/.pomotab`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_home() -> Result<Self> {
        Ok(Self {
            socket_path: default_socket_path()?,
            settings_path: Some(SettingsStore::default_path()?),
            tick_period: DEFAULT_TICK_PERIOD,
        })
    }

    /// Overrides the socket path.
    pub fn with_socket_path(mut self, socket_path: impl Into<PathBuf>) -> Self {
        self.socket_path = socket_path.into();
        self
    }
}

/// Returns `~/.pomotab/pomotab.sock`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
    Ok(home.join(APP_DIR).join(SOCKET_FILE))
}

// ============================================================================
// Event loop
// ============================================================================

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the daemon cannot start or the signal handler fails.
pub async fn run(config: DaemonConfig, notifier: Arc<dyn Notifier>) -> Result<()> {
    run_until(config, notifier, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
        }
    })
    .await
}

/// Runs the daemon until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if another daemon owns the socket, the socket cannot be
/// bound, or the tick source cannot be started.
pub async fn run_until<F>(
    config: DaemonConfig,
    notifier: Arc<dyn Notifier>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    if UnixStream::connect(&config.socket_path).await.is_ok() {
        anyhow::bail!(
            "デーモンは既に起動しています: {}",
            config.socket_path.display()
        );
    }

    let store = config.settings_path.map(SettingsStore::new);
    let settings = store
        .as_ref()
        .map(SettingsStore::load_or_default)
        .unwrap_or_else(Settings::default);

    let muted = Arc::new(AtomicBool::new(settings.muted));
    let (clock, mut ticks) = TickSource::spawn(config.tick_period)?;
    let (event_tx, mut events) = mpsc::unbounded_channel();

    let coordinator = Arc::new(Mutex::new(
        TabCoordinator::new(settings.sessions, clock, event_tx).with_active(settings.active_kind),
    ));
    let handler = Arc::new(RequestHandler::new(
        Arc::clone(&coordinator),
        Arc::clone(&muted),
        store,
    ));
    let dispatcher = Arc::new(AlertDispatcher::new(notifier, muted));

    let server = IpcServer::new(&config.socket_path)?;
    tracing::info!(socket = ?server.socket_path(), "daemon listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                coordinator.lock().await.on_tick(tick);
            }
            Some(event) = events.recv() => {
                forward_event(&dispatcher, event);
            }
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    tokio::spawn(serve_connection(Arc::clone(&handler), stream));
                }
                Err(e) => tracing::warn!("{:#}", e),
            },
            () = &mut shutdown => {
                tracing::info!("daemon shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Hands finished sessions to the alert dispatcher off the event loop.
fn forward_event(dispatcher: &Arc<AlertDispatcher>, event: TimerEvent) {
    tracing::trace!(?event, "timer event");
    if dispatcher.alert_for(&event).is_none() {
        return;
    }

    let dispatcher = Arc::clone(dispatcher);
    tokio::task::spawn_blocking(move || {
        dispatcher.dispatch(&event);
    });
}

/// Serves a single request/response exchange.
async fn serve_connection<C>(handler: Arc<RequestHandler<C>>, mut stream: UnixStream)
where
    C: Clock + Send + 'static,
{
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            tracing::debug!("rejected request: {:#}", e);
            IpcResponse::error(format!("不正なリクエストです: {}", e))
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        tracing::debug!("failed to send response: {:#}", e);
    }
}

// ============================================================================
// Tests
// ============================================================================
