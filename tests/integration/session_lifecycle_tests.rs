//! Session lifecycle tests against live child processes.
//!
//! `cat` stands in for an interactive debugger (echoes every command),
//! `head -n 1` for one that exits mid-session, and a silent read loop
//! for one that swallows input. Unix-only: the fakes are `sh`
//! one-liners.

use std::time::{Duration, Instant};

use pdb_relay::session::{SessionRegistry, SessionSettings};
use pdb_relay::AppError;

use super::test_helpers::{fast_session, fast_settings, launch_opts};

const SESSION_ENDED: &str = "[Debug session has ended]";

#[tokio::test]
async fn start_captures_the_startup_banner() {
    let mut session = fast_session();

    let banner = session
        .start_command("echo banner; cat", &launch_opts(300))
        .await
        .unwrap();

    assert_eq!(banner, "banner");
    assert!(session.is_active());
    session.cleanup().await;
}

#[tokio::test]
async fn second_start_is_rejected_while_active() {
    let mut session = fast_session();
    session
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();

    let second = session.start_command("cat", &launch_opts(200)).await;
    assert!(matches!(second, Err(AppError::AlreadyActive(_))));

    // The original child must still be the one running.
    assert!(session.is_active());
    session.cleanup().await;
}

#[tokio::test]
async fn execute_round_trips_through_the_child() {
    let mut session = fast_session();
    session
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();

    let reply = session
        .execute("inspect everything", Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(reply, "inspect everything");
    session.cleanup().await;
}

#[tokio::test]
async fn execute_without_a_session_is_rejected() {
    let mut session = fast_session();

    let result = session.execute("n", Duration::from_millis(100)).await;
    assert!(matches!(result, Err(AppError::NoActiveSession(_))));
}

#[tokio::test]
async fn quit_token_always_returns_the_session_to_idle() {
    let mut session = fast_session();
    session
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();

    let reply = session.execute("q", Duration::from_millis(300)).await.unwrap();
    assert!(
        reply.ends_with(SESSION_ENDED),
        "terminating command must append the end marker, got: {reply}"
    );
    assert!(!session.is_active());

    let after = session.execute("n", Duration::from_millis(100)).await;
    assert!(matches!(after, Err(AppError::NoActiveSession(_))));
}

#[tokio::test]
async fn child_exit_is_detected_and_marked() {
    let mut session = fast_session();
    // `head -n 1` answers the first command, then exits on its own.
    session
        .start_command("head -n 1", &launch_opts(200))
        .await
        .unwrap();

    let reply = session
        .execute("only command", Duration::from_millis(300))
        .await
        .unwrap();

    assert!(reply.starts_with("only command"), "got: {reply}");
    assert!(reply.ends_with(SESSION_ENDED), "got: {reply}");
    assert!(!session.is_active());
}

#[tokio::test]
async fn silent_execution_reports_no_output() {
    let mut session = fast_session();
    session
        .start_command("while read line; do :; done", &launch_opts(200))
        .await
        .unwrap();

    let reply = session
        .execute("swallowed", Duration::from_millis(250))
        .await
        .unwrap();

    assert_eq!(reply, "[Command executed, no output]");
    session.cleanup().await;
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let mut session = fast_session();
    session
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();

    session.cleanup().await;
    assert!(!session.is_active());
    session.cleanup().await;
    assert!(!session.is_active());
}

#[tokio::test]
async fn session_is_restartable_after_quit() {
    let mut session = fast_session();
    session
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();
    session.execute("q", Duration::from_millis(200)).await.unwrap();

    let banner = session
        .start_command("echo second life; cat", &launch_opts(300))
        .await
        .unwrap();
    assert_eq!(banner, "second life");
    session.cleanup().await;
}

#[tokio::test]
async fn env_overrides_reach_the_child() {
    let mut session = fast_session();
    let mut opts = launch_opts(300);
    opts.env = Some(
        [("PDB_RELAY_PROBE".to_owned(), "value-42".to_owned())]
            .into_iter()
            .collect(),
    );

    let banner = session
        .start_command("echo \"$PDB_RELAY_PROBE\"; cat", &opts)
        .await
        .unwrap();

    assert_eq!(banner, "value-42");
    session.cleanup().await;
}

#[tokio::test]
async fn working_directory_is_applied() {
    let tmp = tempfile::TempDir::new().unwrap();
    let marker = tmp
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let mut session = fast_session();
    let mut opts = launch_opts(300);
    opts.cwd = Some(tmp.path().to_path_buf());

    let banner = session.start_command("pwd; cat", &opts).await.unwrap();

    assert!(
        banner.contains(&marker),
        "child must run inside {marker}, printed: {banner}"
    );
    session.cleanup().await;
}

#[tokio::test]
async fn prompt_shape_returns_early_end_to_end() {
    let mut session = fast_session();

    let started = Instant::now();
    let banner = session
        .start_command("printf '(Pdb) '; cat", &launch_opts(5000))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(banner, "(Pdb)");
    assert!(
        elapsed < Duration::from_secs(2),
        "prompt must short-circuit the five-second window, took {elapsed:?}"
    );
    session.cleanup().await;
}

#[tokio::test]
async fn stale_output_is_discarded_between_commands() {
    let mut session = fast_session();
    // Replies immediately, then emits a late straggler after the
    // quiescence wait has already returned.
    session
        .start_command(
            "while read line; do echo \"got:$line\"; { sleep 0.4; echo straggler; } & done",
            &launch_opts(200),
        )
        .await
        .unwrap();

    let first = session
        .execute("one", Duration::from_millis(200))
        .await
        .unwrap();
    assert!(first.contains("got:one"));

    // Let the straggler land in the buffer between calls.
    tokio::time::sleep(Duration::from_millis(600)).await;

    let second = session
        .execute("two", Duration::from_millis(200))
        .await
        .unwrap();
    assert!(second.contains("got:two"), "got: {second}");
    assert!(
        !second.contains("straggler"),
        "stale output must be discarded before a new command, got: {second}"
    );

    session.cleanup().await;
}

#[tokio::test]
async fn registry_cleanup_all_tears_down_running_sessions() {
    let registry = SessionRegistry::new(fast_settings());

    let session = registry.session("live").await;
    session
        .lock()
        .await
        .start_command("cat", &launch_opts(200))
        .await
        .unwrap();
    assert!(session.lock().await.is_active());

    registry.cleanup_all().await;

    assert!(!session.lock().await.is_active());
}

#[test]
fn default_settings_build_from_config() {
    // Spot-check the config-to-settings plumbing used by main.
    let settings = SessionSettings::default();
    assert_eq!(settings.interpreter_fallback, "python");
    assert_eq!(settings.prompt_grace, Duration::from_millis(50));
    assert_eq!(settings.kill_wait, Duration::from_secs(2));
}
