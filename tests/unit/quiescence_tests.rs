//! Unit tests for quiescence aggregation timing.
//!
//! Validates the silence-window contract: output keeps the wait alive,
//! silence of the configured length ends it, and a prompt match
//! returns early. Uses real time with short windows, as the channel
//! producer is a plain task rather than a child process.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use pdb_relay::session::quiescence::{collect, discard_pending};

const GRACE: Duration = Duration::from_millis(20);

#[tokio::test]
async fn silence_window_returns_accumulated_text() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send("hello".to_owned()).unwrap();

    let started = Instant::now();
    let text = collect(&mut rx, Duration::from_millis(200), GRACE).await;
    let elapsed = started.elapsed();

    assert_eq!(text, "hello");
    assert!(
        elapsed >= Duration::from_millis(180),
        "must wait out the silence window, returned after {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(2),
        "must not stall past the window, returned after {elapsed:?}"
    );
    drop(tx);
}

#[tokio::test]
async fn empty_silence_returns_empty_string() {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let started = Instant::now();
    let text = collect(&mut rx, Duration::from_millis(200), GRACE).await;

    assert_eq!(text, "");
    assert!(started.elapsed() >= Duration::from_millis(180));
    drop(tx);
}

#[tokio::test]
async fn prompt_match_returns_well_before_timeout() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send("(Pdb) 10".to_owned()).unwrap();

    let started = Instant::now();
    let text = collect(&mut rx, Duration::from_secs(5), GRACE).await;
    let elapsed = started.elapsed();

    assert_eq!(text, "(Pdb) 10");
    assert!(
        elapsed < Duration::from_secs(2),
        "prompt must short-circuit the five-second window, took {elapsed:?}"
    );
    drop(tx);
}

#[tokio::test]
async fn prompt_grace_drains_trailing_burst() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send("(Pdb)".to_owned()).unwrap();
    // Trailing chunk from the same burst, already queued when the
    // prompt is recognized.
    tx.send(" 42".to_owned()).unwrap();

    let text = collect(&mut rx, Duration::from_secs(5), GRACE).await;
    assert_eq!(text, "(Pdb) 42");
    drop(tx);
}

#[tokio::test]
async fn continuous_output_is_never_cut_off() {
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Producer keeps printing at intervals shorter than the window;
    // total production time exceeds the window several times over.
    let producer = tokio::spawn(async move {
        for n in 0..5 {
            tx.send(format!("chunk {n}\n")).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Sender drops here; collect still waits out its window.
    });

    let text = collect(&mut rx, Duration::from_millis(250), GRACE).await;

    for n in 0..5 {
        assert!(
            text.contains(&format!("chunk {n}")),
            "chunk {n} missing from: {text}"
        );
    }
    producer.await.unwrap();
}

#[tokio::test]
async fn closed_channel_still_waits_out_the_window() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send("hello".to_owned()).unwrap();
    drop(tx);

    let started = Instant::now();
    let text = collect(&mut rx, Duration::from_millis(300), GRACE).await;
    let elapsed = started.elapsed();

    assert_eq!(text, "hello");
    assert!(
        elapsed >= Duration::from_millis(250),
        "collector EOF must not shortcut the timing contract, returned after {elapsed:?}"
    );
}

#[tokio::test]
async fn trailing_whitespace_is_trimmed() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send("output\n\n".to_owned()).unwrap();

    let text = collect(&mut rx, Duration::from_millis(150), GRACE).await;
    assert_eq!(text, "output");
    drop(tx);
}

#[test]
fn discard_pending_empties_the_channel() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for chunk in ["stale", "left", "overs"] {
        tx.send(chunk.to_owned()).unwrap();
    }

    discard_pending(&mut rx);
    assert!(rx.try_recv().is_err(), "channel must be empty after discard");
    drop(tx);
}
