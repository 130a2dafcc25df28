use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

#[test]
fn help_lists_sync_command() {
    let mut cmd = Command::cargo_bin("fav-music").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_help_documents_full_flag() {
    let mut cmd = Command::cargo_bin("fav-music").expect("Binary exists");
    cmd.args(["sync", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--full").and(predicate::str::contains("--config")));
}

#[test]
#[serial]
fn sync_fails_without_credential_files() {
    let work_dir = tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("fav-music").expect("Binary exists");
    cmd.arg("sync").arg("--work-dir").arg(work_dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("SPOTIFY_PLAYLIST_ID"));
}

#[test]
#[serial]
fn sync_fails_on_invalid_config_file() {
    let work_dir = tempdir().expect("temp dir");
    let config = work_dir.path().join("config.yaml");
    std::fs::write(&config, "max_tracks: [:::").unwrap();

    let mut cmd = Command::cargo_bin("fav-music").expect("Binary exists");
    cmd.arg("sync").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
#[serial]
async fn emits_trace_initialised_event_even_when_sync_fails() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use fav_music::cli::{run, Cli, Commands};

    let work_dir = tempdir().expect("temp dir");
    let cli = Cli {
        command: Commands::Sync {
            config: None,
            full: false,
            work_dir: Some(work_dir.path().to_path_buf()),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "missing credentials must fail the run");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
