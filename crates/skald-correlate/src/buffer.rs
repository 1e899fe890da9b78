use skald_core::RawEvent;
use std::collections::VecDeque;

/// Default bound on buffered events awaiting correlation.
const DEFAULT_CAPACITY: usize = 4096;

/// Holds raw, timestamped events from capture sources. No interpretation
/// happens here; the buffer serializes concurrent producers into the
/// arrival order the single consumer (the Correlator) sees.
#[derive(Debug)]
pub struct EventBuffer {
    queue: VecDeque<RawEvent>,
    capacity: usize,
    paused: bool,
    dropped: u64,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            paused: false,
            dropped: 0,
        }
    }

    /// Accept an event. Returns false when capture is paused (the event is
    /// refused, nothing already persisted is undone). When the buffer is
    /// full the oldest event is evicted so capture never blocks.
    pub fn push(&mut self, event: RawEvent) -> bool {
        if self.paused {
            return false;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
            tracing::warn!(dropped_total = self.dropped, "event buffer full, evicting oldest");
        }
        self.queue.push_back(event);
        true
    }

    /// Take everything buffered so far, in arrival order.
    pub fn drain(&mut self) -> Vec<RawEvent> {
        self.queue.drain(..).collect()
    }

    /// Stop accepting new events. Never undoes already-buffered ones.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events evicted due to the capacity bound since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
