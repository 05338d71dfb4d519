//! IPC server for the Pomodoro tab timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TabCoordinator for command execution

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::settings::{Settings, SettingsStore};
use crate::types::{
    CountdownStatus, IpcRequest, IpcResponse, ResponseData, SessionKind, SessionUpdate,
};

use super::coordinator::TabCoordinator;
use super::countdown::CountdownTransition;
use super::tick::Clock;

// ============================================================================
// Constants
// ============================================================================

/// Socket file name inside the application directory
pub const SOCKET_FILE: &str = "pomotab.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write half, with a read timeout
    /// covering the whole request.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(256);

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            read_request(stream, &mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            anyhow::bail!("Connection closed by client");
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Reads one request. A request ends at EOF, or as soon as the bytes read so
/// far form a complete JSON document (for clients that keep the socket open).
async fn read_request(stream: &mut UnixStream, buffer: &mut Vec<u8>) -> Result<()> {
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| IpcError::ReadError(e.to_string()))?;
        if n == 0 {
            return Ok(());
        }

        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }
        if serde_json::from_slice::<serde_json::Value>(buffer).is_ok() {
            return Ok(());
        }
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the TabCoordinator.
pub struct RequestHandler<C: Clock> {
    /// Shared coordinator
    coordinator: Arc<Mutex<TabCoordinator<C>>>,
    /// Mute preference, shared with the alert dispatcher
    muted: Arc<AtomicBool>,
    /// Where preferences are persisted (None keeps them in memory only)
    store: Option<SettingsStore>,
}

impl<C: Clock> RequestHandler<C> {
    /// Creates a new request handler.
    pub fn new(
        coordinator: Arc<Mutex<TabCoordinator<C>>>,
        muted: Arc<AtomicBool>,
        store: Option<SettingsStore>,
    ) -> Self {
        Self {
            coordinator,
            muted,
            store,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        tracing::debug!(?request, "handling request");
        match request {
            IpcRequest::Begin => self.handle_begin().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Resume => self.handle_resume().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Toggle => self.handle_toggle().await,
            IpcRequest::Next => self.handle_next().await,
            IpcRequest::Tab { kind } => self.handle_tab(kind).await,
            IpcRequest::Settings { update } => self.handle_settings(update).await,
            IpcRequest::Mute { muted } => self.handle_mute(muted).await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    /// Handles the begin command.
    async fn handle_begin(&self) -> IpcResponse {
        let mut coordinator = self.coordinator.lock().await;
        let transition = coordinator.begin();
        self.playback_response(&coordinator, transition)
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        let mut coordinator = self.coordinator.lock().await;
        let transition = coordinator.pause();
        self.playback_response(&coordinator, transition)
    }

    /// Handles the resume command.
    async fn handle_resume(&self) -> IpcResponse {
        let mut coordinator = self.coordinator.lock().await;
        let transition = coordinator.resume();
        self.playback_response(&coordinator, transition)
    }

    /// Handles the reset command.
    async fn handle_reset(&self) -> IpcResponse {
        let mut coordinator = self.coordinator.lock().await;
        let transition = coordinator.reset();
        self.playback_response(&coordinator, transition)
    }

    /// Handles the toggle command.
    async fn handle_toggle(&self) -> IpcResponse {
        let mut coordinator = self.coordinator.lock().await;
        let transition = coordinator.toggle();
        self.playback_response(&coordinator, transition)
    }

    /// Handles the next command.
    async fn handle_next(&self) -> IpcResponse {
        let (response, settings) = {
            let mut coordinator = self.coordinator.lock().await;
            coordinator.next_tab();
            let message = format!("{} に切り替えました", coordinator.active_kind().label());
            (
                self.success(&coordinator, message),
                self.settings(&coordinator),
            )
        };

        self.persist(settings).await;
        response
    }

    /// Handles the tab command.
    async fn handle_tab(&self, kind: SessionKind) -> IpcResponse {
        let (response, settings) = {
            let mut coordinator = self.coordinator.lock().await;
            coordinator.change_active_tab(kind);
            (
                self.success(&coordinator, format!("{} に切り替えました", kind.label())),
                self.settings(&coordinator),
            )
        };

        self.persist(settings).await;
        response
    }

    /// Handles the settings command.
    ///
    /// Every valid update resets all countdowns, even when no duration changes.
    async fn handle_settings(&self, update: SessionUpdate) -> IpcResponse {
        if let Err(e) = update.validate() {
            return IpcResponse::error(e);
        }

        let (response, settings) = {
            let mut coordinator = self.coordinator.lock().await;
            coordinator.apply_settings(&update);
            (
                self.success(&coordinator, "設定を保存しました"),
                self.settings(&coordinator),
            )
        };

        self.persist(settings).await;
        response
    }

    /// Handles the mute command.
    async fn handle_mute(&self, muted: bool) -> IpcResponse {
        self.muted.store(muted, Ordering::SeqCst);

        let message = if muted {
            "通知音をミュートしました"
        } else {
            "通知音のミュートを解除しました"
        };
        let (response, settings) = {
            let coordinator = self.coordinator.lock().await;
            (
                self.success(&coordinator, message),
                self.settings(&coordinator),
            )
        };

        self.persist(settings).await;
        response
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let coordinator = self.coordinator.lock().await;
        self.success(&coordinator, "")
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn response_data(&self, coordinator: &TabCoordinator<C>) -> ResponseData {
        ResponseData::from_snapshot(&coordinator.snapshot())
            .with_preferences(*coordinator.registry(), self.muted.load(Ordering::SeqCst))
    }

    fn success(&self, coordinator: &TabCoordinator<C>, message: impl Into<String>) -> IpcResponse {
        IpcResponse::success(message, Some(self.response_data(coordinator)))
    }

    /// Playback commands that do not apply in the current status are no-ops,
    /// reported as successful with the unchanged state.
    fn playback_response(
        &self,
        coordinator: &TabCoordinator<C>,
        transition: Option<CountdownTransition>,
    ) -> IpcResponse {
        let message = match transition {
            Some(CountdownTransition::Started) => "タイマーを開始しました",
            Some(CountdownTransition::Paused) => "タイマーを一時停止しました",
            Some(CountdownTransition::Resumed) => "タイマーを再開しました",
            Some(CountdownTransition::Reset) => "タイマーをリセットしました",
            Some(CountdownTransition::Finished) => "セッションが完了しました",
            None => unchanged_message(coordinator.active().status()),
        };
        self.success(coordinator, message)
    }

    fn settings(&self, coordinator: &TabCoordinator<C>) -> Settings {
        Settings {
            sessions: *coordinator.registry(),
            muted: self.muted.load(Ordering::SeqCst),
            active_kind: coordinator.active_kind(),
        }
    }

    /// Writes the settings file on the blocking pool, after the coordinator
    /// lock has been released.
    async fn persist(&self, settings: Settings) {
        let Some(store) = self.store.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || store.save(&settings)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("{}", e),
            Err(e) => tracing::warn!("settings save task failed: {}", e),
        }
    }
}

fn unchanged_message(status: CountdownStatus) -> &'static str {
    match status {
        CountdownStatus::Idle => "タイマーは開始されていません",
        CountdownStatus::Running => "タイマーは既に実行中です",
        CountdownStatus::Paused => "タイマーは一時停止中です",
        CountdownStatus::Done => "セッションは完了しています",
    }
}

// ============================================================================
// Tests
// ============================================================================
