use crate::render::{parse_decision, render_decision};
use skald_core::config::PipelineConfig;
use skald_core::{DecisionRecord, DecisionStatus};
use skald_store::{locked_write_atomic, SkaldPaths};
use std::path::PathBuf;

/// Path of a decision record file: `.skald/decisions/ADR-NNN.md`.
pub fn decision_path(paths: &SkaldPaths, id: &str) -> PathBuf {
    paths.decisions_dir.join(format!("{id}.md"))
}

/// Load every decision record, sorted by id. Unparseable files are skipped
/// with a warning — one corrupt record never hides the rest.
pub fn list_decisions(paths: &SkaldPaths) -> Vec<DecisionRecord> {
    let entries = match std::fs::read_dir(&paths.decisions_dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let mut records = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        match std::fs::read_to_string(&path).map_err(anyhow::Error::from).and_then(|c| parse_decision(&c)) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unparseable decision record");
            }
        }
    }
    records.sort_by(|a, b| a.id.cmp(&b.id));
    records
}

/// Load one decision record by id.
pub fn load_decision(paths: &SkaldPaths, id: &str) -> anyhow::Result<DecisionRecord> {
    let path = decision_path(paths, id);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
    parse_decision(&content)
}

/// Persist a decision record under the scoped store lock with an atomic
/// rename. Concurrent writers back off; exhausted retries fail this write
/// only.
pub fn save_decision(
    paths: &SkaldPaths,
    record: &DecisionRecord,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    let rendered = render_decision(record)?;
    locked_write_atomic(
        &paths.lock_file,
        &decision_path(paths, &record.id),
        rendered.as_bytes(),
        config.write_retries,
        config.backoff_base_ms,
    )
}

/// Retire a record: `accepted → superseded`, pointing at the superseding
/// record, which must exist. Records are never deleted.
pub fn supersede(
    paths: &SkaldPaths,
    id: &str,
    superseded_by: &str,
    config: &PipelineConfig,
) -> anyhow::Result<DecisionRecord> {
    if !decision_path(paths, superseded_by).exists() {
        anyhow::bail!("superseding record {superseded_by} does not exist");
    }
    let mut record = load_decision(paths, id)?;
    if record.status == DecisionStatus::Superseded {
        anyhow::bail!("{id} is already superseded by {:?}", record.superseded_by);
    }
    record.status = DecisionStatus::Superseded;
    record.superseded_by = Some(superseded_by.to_string());
    save_decision(paths, &record, config)?;
    Ok(record)
}
