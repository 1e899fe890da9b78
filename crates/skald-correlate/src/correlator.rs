use crate::ignore::IgnoreRules;
use skald_core::config::PipelineConfig;
use skald_core::ids::new_interaction_id;
use skald_core::{EventSource, Interaction, RawEvent, SCHEMA_VERSION};
use std::collections::VecDeque;
use time::{Duration, OffsetDateTime};

/// An interaction whose correlation window is still accepting file events.
#[derive(Debug)]
struct OpenWindow {
    interaction: Interaction,
    opened_at: OffsetDateTime,
}

/// Groups buffered events into Interactions: one prompt opens a window,
/// file changes inside the trailing window attach to it, and the window
/// seals once the post-prompt delay elapses.
///
/// Time advances through event timestamps (and explicit `flush`), so a
/// synthetic event sequence always correlates the same way.
#[derive(Debug)]
pub struct Correlator {
    pre_window: Duration,
    post_window: Duration,
    ignore: IgnoreRules,
    /// Open windows, oldest first. At most one per tool session.
    open: Vec<OpenWindow>,
    /// File events seen before any matching prompt, kept no longer than
    /// the pre-window horizon. Bounds memory: unmatched events age out.
    pending_files: VecDeque<(OffsetDateTime, String)>,
}

impl Correlator {
    pub fn new(config: &PipelineConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pre_window: Duration::seconds(config.pre_window_secs as i64),
            post_window: Duration::seconds(config.post_window_secs as i64),
            ignore: IgnoreRules::new(&config.ignore)?,
            open: Vec::new(),
            pending_files: VecDeque::new(),
        })
    }

    /// Feed one event. Returns any interactions sealed by time advancing
    /// to this event's timestamp (plus a same-session window superseded
    /// by a new prompt).
    pub fn offer(&mut self, event: &RawEvent) -> Vec<Interaction> {
        let mut sealed = self.seal_due(event.ts);
        match event.source {
            EventSource::Tool => {
                if let Some(superseded) = self.open_window(event) {
                    sealed.push(superseded);
                }
            }
            EventSource::File => self.attach_files(event),
            // Commits don't open or extend windows; the linker consumes
            // them downstream.
            EventSource::Vcs => {}
        }
        self.prune_pending(event.ts);
        sealed
    }

    /// Seal every window whose post-prompt delay has elapsed by `now`.
    pub fn flush(&mut self, now: OffsetDateTime) -> Vec<Interaction> {
        self.prune_pending(now);
        self.seal_due(now)
    }

    /// Seal everything still open, regardless of age (end of a batch).
    pub fn seal_all(&mut self) -> Vec<Interaction> {
        self.open.drain(..).map(|w| w.interaction).collect()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn seal_due(&mut self, now: OffsetDateTime) -> Vec<Interaction> {
        let post = self.post_window;
        let mut sealed = Vec::new();
        self.open.retain_mut(|w| {
            if now > w.opened_at + post {
                sealed.push(w.interaction.clone());
                false
            } else {
                true
            }
        });
        sealed
    }

    /// Open a window for a prompt event. A newer prompt in the same
    /// session supersedes the old window, which seals as-is and is
    /// returned.
    fn open_window(&mut self, event: &RawEvent) -> Option<Interaction> {
        let prompt = event.prompt.as_deref()?;

        let superseded = self
            .open
            .iter()
            .position(|w| w.interaction.session == event.session)
            .map(|pos| self.open.remove(pos).interaction);

        let mut interaction = Interaction {
            id: new_interaction_id(),
            ts: event.ts,
            tool: event.tool.clone(),
            session: event.session.clone(),
            author: event.author.clone(),
            prompt: prompt.to_string(),
            files: Default::default(),
            diff_hash: None,
            intent: None,
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: SCHEMA_VERSION,
        };

        // Files named on the prompt event itself.
        for path in &event.files {
            if !self.ignore.is_ignored(path) {
                interaction.files.insert(path.clone());
            }
        }

        // File changes from the trailing pre-window attach to this (most
        // recent) window and are consumed.
        let horizon = event.ts - self.pre_window;
        let mut kept = VecDeque::new();
        while let Some((ts, path)) = self.pending_files.pop_front() {
            if ts >= horizon && ts <= event.ts {
                interaction.files.insert(path);
            } else {
                kept.push_back((ts, path));
            }
        }
        self.pending_files = kept;

        self.open.push(OpenWindow {
            interaction,
            opened_at: event.ts,
        });
        superseded
    }

    fn attach_files(&mut self, event: &RawEvent) {
        for path in &event.files {
            if self.ignore.is_ignored(path) {
                continue;
            }
            // Most recently opened window still inside its post-prompt
            // delay takes the file.
            let accepting = self
                .open
                .iter_mut()
                .rev()
                .find(|w| event.ts >= w.opened_at && event.ts <= w.opened_at + self.post_window);
            match accepting {
                Some(window) => {
                    window.interaction.files.insert(path.clone());
                }
                None => {
                    self.pending_files.push_back((event.ts, path.clone()));
                }
            }
        }
    }

    fn prune_pending(&mut self, now: OffsetDateTime) {
        let horizon = now - self.pre_window;
        while let Some((ts, _)) = self.pending_files.front() {
            if *ts < horizon {
                self.pending_files.pop_front();
            } else {
                break;
            }
        }
    }
}
