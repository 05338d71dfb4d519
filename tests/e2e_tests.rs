//! End-to-end tests for the pomotab daemon and CLI.
//!
//! The daemon is started in-process with `run_until` on a temporary socket
//! and settings file; the CLI binary is exercised with `assert_cmd`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use pomotab::cli::client::IpcClient;
use pomotab::daemon::{run_until, DaemonConfig};
use pomotab::notification::{MockNotifier, SessionAlert};
use pomotab::settings::{Settings, SettingsStore};
use pomotab::types::{SessionKind, SessionRegistry};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestDaemon {
    socket_path: PathBuf,
    settings_path: PathBuf,
    notifier: Arc<MockNotifier>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
    _dir: tempfile::TempDir,
}

impl TestDaemon {
    /// Starts a daemon with a fast tick and the given stored settings.
    async fn start(settings: Settings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("e2e.sock");
        let settings_path = dir.path().join("settings.json");
        SettingsStore::new(&settings_path).save(&settings).unwrap();

        let config = DaemonConfig {
            socket_path: socket_path.clone(),
            settings_path: Some(settings_path.clone()),
            tick_period: Duration::from_millis(20),
        };
        let notifier = Arc::new(MockNotifier::new());
        let (stop, stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(run_until(config, notifier.clone(), async {
            let _ = stopped.await;
        }));

        // Wait for the socket to appear
        for _ in 0..100 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            socket_path,
            settings_path,
            notifier,
            stop: Some(stop),
            handle,
            _dir: dir,
        }
    }

    fn client(&self) -> IpcClient {
        IpcClient::with_socket_path(self.socket_path.clone())
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let result = tokio::time::timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("daemon did not stop");
        result.unwrap().unwrap();
    }
}

fn quick_settings() -> Settings {
    Settings {
        sessions: SessionRegistry {
            work: 2,
            short_break: 1,
            long_break: 3,
        },
        muted: true,
        active_kind: SessionKind::Work,
    }
}

// ============================================================================
// Daemon Workflows
// ============================================================================

#[tokio::test]
async fn test_e2e_stored_settings_are_loaded() {
    let daemon = TestDaemon::start(quick_settings()).await;

    let data = daemon.client().status().await.unwrap().data.unwrap();
    assert_eq!(data.active_kind, Some(SessionKind::Work));
    assert_eq!(data.remaining_seconds, Some(2));
    assert_eq!(data.muted, Some(true));

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_e2e_stored_tab_is_restored() {
    let daemon = TestDaemon::start(Settings {
        active_kind: SessionKind::LongBreak,
        ..quick_settings()
    })
    .await;

    let data = daemon.client().status().await.unwrap().data.unwrap();
    assert_eq!(data.active_kind, Some(SessionKind::LongBreak));
    assert_eq!(data.remaining_seconds, Some(3));
    assert_eq!(data.state, Some("idle".to_string()));

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_e2e_session_completes_and_alerts() {
    let daemon = TestDaemon::start(quick_settings()).await;
    let client = daemon.client();

    client.begin().await.unwrap();

    let mut state = String::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        state = client.status().await.unwrap().data.unwrap().state.unwrap();
        if state == "done" {
            break;
        }
    }
    assert_eq!(state, "done");

    // The alert is delivered off the event loop
    for _ in 0..50 {
        if daemon.notifier.alert_count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        daemon.notifier.get_alerts(),
        vec![SessionAlert::new(SessionKind::Work, true)]
    );

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_e2e_next_and_unmute_round_trip() {
    let daemon = TestDaemon::start(quick_settings()).await;
    let client = daemon.client();

    let next = client.next().await.unwrap().data.unwrap();
    assert_eq!(next.active_kind, Some(SessionKind::ShortBreak));
    assert_eq!(next.remaining_seconds, Some(1));

    client.mute(false).await.unwrap();
    let stored = SettingsStore::new(&daemon.settings_path)
        .load()
        .unwrap()
        .unwrap();
    assert!(!stored.muted);
    assert_eq!(stored.active_kind, SessionKind::ShortBreak);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_e2e_second_daemon_is_refused() {
    let daemon = TestDaemon::start(quick_settings()).await;

    let config = DaemonConfig {
        socket_path: daemon.socket_path.clone(),
        settings_path: None,
        tick_period: Duration::from_millis(20),
    };
    let result = run_until(config, Arc::new(MockNotifier::new()), async {}).await;

    assert!(result.unwrap_err().to_string().contains("既に起動"));
    daemon.shutdown().await;
}

// ============================================================================
// CLI Binary
// ============================================================================

#[test]
fn test_cli_help_lists_commands() {
    Command::cargo_bin("pomotab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("toggle"))
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn test_cli_completions() {
    Command::cargo_bin("pomotab")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pomotab"));
}

#[test]
fn test_cli_status_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("missing.sock");

    Command::cargo_bin("pomotab")
        .unwrap()
        .args(["status", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("エラー"));
}

#[test]
fn test_cli_settings_requires_a_duration() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("missing.sock");

    Command::cargo_bin("pomotab")
        .unwrap()
        .args(["settings", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--work"));
}
