pub mod batch;
pub mod driver;
pub mod state;

pub use batch::{process_batch, rebuild_snapshot, BatchOutcome};
pub use driver::{spawn_capture, CaptureChannel, CaptureStats};

use skald_adr::list_decisions;
use skald_core::config::PipelineConfig;
use skald_core::{RawEvent, Snapshot};
use skald_correlate::parse_input_event;
use skald_intent::{ConceptVocabulary, InferenceBackend, RuleTable};
use skald_store::log::{append_raw_event, load_interactions};
use skald_store::SkaldPaths;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;

/// Append one watcher payload to the raw event log. This is the whole
/// capture path: redact, append, return — no classification, linking, or
/// synthesis happens here. Returns `Ok(None)` while capture is paused.
pub fn capture_event(paths: &SkaldPaths, json: &str) -> anyhow::Result<Option<RawEvent>> {
    if paths.is_paused() {
        return Ok(None);
    }
    let event = parse_input_event(json)?;
    append_raw_event(paths, &event)?;
    Ok(Some(event))
}

/// The assembled pipeline: paths, config, rule table, vocabulary, and an
/// optional inference backend, passed explicitly through each stage.
pub struct Pipeline {
    pub paths: SkaldPaths,
    pub config: PipelineConfig,
    pub table: RuleTable,
    pub vocab: ConceptVocabulary,
    backend: Option<Arc<dyn InferenceBackend>>,
}

impl Pipeline {
    /// Initialize a `.skald/` workspace, writing the default config so the
    /// tunables are visible and editable. Idempotent.
    pub fn init(root: &Path) -> anyhow::Result<SkaldPaths> {
        let paths = SkaldPaths::discover(root);
        paths.ensure_layout()?;
        if !paths.config_json.exists() {
            let defaults = serde_json::to_string_pretty(&PipelineConfig::default())?;
            skald_store::write_atomic(&paths.config_json, defaults.as_bytes())?;
        }
        Ok(paths)
    }

    /// Open an existing workspace. Fails if `.skald/` does not exist.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let paths = SkaldPaths::discover(root);
        if !paths.is_initialized() {
            anyhow::bail!(
                "not a skald workspace ({}/.skald not found). Run `skald init` first.",
                paths.root.display()
            );
        }
        let config = PipelineConfig::load(&paths.config_json)?;
        Ok(Self {
            paths,
            config,
            table: RuleTable::builtin(),
            vocab: ConceptVocabulary::builtin(),
            backend: None,
        })
    }

    /// Plug in an inference backend for the classification stage.
    pub fn with_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Capture one event (see [`capture_event`]).
    pub fn capture(&self, json: &str) -> anyhow::Result<Option<RawEvent>> {
        capture_event(&self.paths, json)
    }

    /// Run one processing batch at `now`.
    pub fn process(&self, now: OffsetDateTime) -> anyhow::Result<BatchOutcome> {
        process_batch(
            &self.paths,
            &self.config,
            &self.table,
            &self.vocab,
            self.backend.as_ref(),
            now,
        )
    }

    /// Rebuild the snapshot from the append-only sources without
    /// processing new events (used after a checksum mismatch).
    pub fn rebuild(&self, now: OffsetDateTime) -> anyhow::Result<Snapshot> {
        let interactions = load_interactions(&self.paths);
        let decisions = list_decisions(&self.paths);
        rebuild_snapshot(&self.paths, &self.config, &interactions, &decisions, now)
    }

    /// Stop new capture. Never undoes already-persisted records.
    pub fn pause(&self) -> anyhow::Result<()> {
        std::fs::write(&self.paths.paused_file, b"")?;
        Ok(())
    }

    pub fn resume(&self) -> anyhow::Result<()> {
        if self.paths.paused_file.exists() {
            std::fs::remove_file(&self.paths.paused_file)?;
        }
        Ok(())
    }
}
