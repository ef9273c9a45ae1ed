//! Background turn recorder.
//!
//! The dispatcher hands completed turns to a [`RecorderHandle`] and
//! moves on; a single background task drains the channel and writes to
//! the [`TurnStore`], retrying transient failures. On shutdown the task
//! drains everything already queued before stopping.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tatami_core::TurnSink;
use tatami_types::turn::Turn;

use crate::store::TurnStore;

const WRITE_ATTEMPTS: u32 = 3;
const WRITE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Sending side of the recorder channel.
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::UnboundedSender<Turn>,
}

impl TurnSink for RecorderHandle {
    fn submit(&self, turn: Turn) {
        if self.tx.send(turn).is_err() {
            warn!("turn recorder is gone, dropping turn");
        }
    }
}

/// The background write loop.
pub struct TurnRecorder;

impl TurnRecorder {
    /// Spawn the recorder task.
    ///
    /// Returns the handle to submit turns through and the join handle to
    /// await after cancelling `shutdown`, which guarantees queued turns
    /// reach the store.
    pub fn spawn(store: TurnStore, shutdown: CancellationToken) -> (RecorderHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Turn>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        // Stop accepting, then drain what is queued.
                        rx.close();
                        let mut drained = 0usize;
                        while let Some(turn) = rx.recv().await {
                            write_with_retry(&store, turn).await;
                            drained += 1;
                        }
                        info!(drained, "turn recorder stopped");
                        return;
                    }
                    maybe_turn = rx.recv() => match maybe_turn {
                        Some(turn) => write_with_retry(&store, turn).await,
                        None => return,
                    },
                }
            }
        });

        (RecorderHandle { tx }, task)
    }
}

/// Write one turn, retrying transient storage failures.
///
/// After the final attempt the turn is logged in full as a dead letter
/// so it can be recovered from the log stream by hand.
async fn write_with_retry(store: &TurnStore, turn: Turn) {
    for attempt in 1..=WRITE_ATTEMPTS {
        match store.record(&turn).await {
            Ok(()) => return,
            Err(e) if attempt < WRITE_ATTEMPTS => {
                warn!(
                    session_key = %turn.session_key,
                    attempt,
                    error = %e,
                    "turn write failed, retrying"
                );
                tokio::time::sleep(WRITE_RETRY_DELAY).await;
            }
            Err(e) => {
                let payload = serde_json::to_string(&turn).unwrap_or_default();
                error!(
                    session_key = %turn.session_key,
                    error = %e,
                    dead_letter = %payload,
                    "turn write failed permanently"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tatami_types::event::{ChannelKind, InboundMessage};

    fn turn(peer: &str, text: &str) -> Turn {
        Turn::from_exchange(&InboundMessage::new(ChannelKind::Web, peer, text), "ok")
    }

    #[tokio::test]
    async fn submitted_turns_reach_the_store() {
        let store = TurnStore::connect("sqlite::memory:").await.unwrap();
        let shutdown = CancellationToken::new();
        let (handle, task) = TurnRecorder::spawn(store.clone(), shutdown.clone());

        handle.submit(turn("abc", "hola"));
        handle.submit(turn("abc", "¿precio?"));

        shutdown.cancel();
        task.await.unwrap();

        let turns = store.get_chat("web:abc").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user_text, "hola");
    }

    #[tokio::test]
    async fn shutdown_drains_queued_turns() {
        let store = TurnStore::connect("sqlite::memory:").await.unwrap();
        let shutdown = CancellationToken::new();
        let (handle, task) = TurnRecorder::spawn(store.clone(), shutdown.clone());

        // Cancel before the worker has had a chance to run.
        for i in 0..10 {
            handle.submit(turn("abc", &format!("m{i}")));
        }
        shutdown.cancel();
        task.await.unwrap();

        let turns = store.get_chat("web:abc").await.unwrap();
        assert_eq!(turns.len(), 10);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_dropped_quietly() {
        let store = TurnStore::connect("sqlite::memory:").await.unwrap();
        let shutdown = CancellationToken::new();
        let (handle, task) = TurnRecorder::spawn(store.clone(), shutdown.clone());

        shutdown.cancel();
        task.await.unwrap();

        // Must not panic; the turn is dropped with a warning.
        handle.submit(turn("late", "hola"));
        assert!(store.get_chat("web:late").await.is_err());
    }
}
