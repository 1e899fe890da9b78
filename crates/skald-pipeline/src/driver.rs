use crate::capture_event;
use skald_core::PipelineError;
use skald_store::SkaldPaths;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Counters from a capture-channel run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaptureStats {
    pub accepted: u64,
    pub skipped: u64,
    pub refused_paused: u64,
}

/// Handle held by capture producers. Cloneable; dropping every clone ends
/// the consumer loop.
#[derive(Clone)]
pub struct CaptureChannel {
    tx: mpsc::Sender<String>,
}

impl CaptureChannel {
    /// Offer one raw watcher payload. Applies backpressure when the
    /// channel is full rather than growing without bound.
    pub async fn offer(&self, json: String) -> bool {
        self.tx.send(json).await.is_ok()
    }
}

/// Spawn the single capture consumer behind a bounded channel. Producers
/// run concurrently; the consumer serializes arrivals into the event log.
/// A malformed payload is skipped and logged — the loop never aborts for
/// one bad line.
pub fn spawn_capture(
    paths: SkaldPaths,
    capacity: usize,
) -> (CaptureChannel, JoinHandle<CaptureStats>) {
    let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        let mut stats = CaptureStats::default();
        while let Some(json) = rx.blocking_recv() {
            match capture_event(&paths, &json) {
                Ok(Some(_)) => stats.accepted += 1,
                Ok(None) => stats.refused_paused += 1,
                Err(e) => {
                    stats.skipped += 1;
                    if e.downcast_ref::<PipelineError>().is_some() {
                        tracing::warn!(error = %e, "skipping malformed capture payload");
                    } else {
                        tracing::error!(error = %e, "capture write failed, payload dropped");
                    }
                }
            }
        }
        stats
    });
    (CaptureChannel { tx }, handle)
}
