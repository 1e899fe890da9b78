use crate::state::Cursors;
use serde::Serialize;
use skald_adr::{list_decisions, maybe_synthesize, save_decision, Synthesis};
use skald_correlate::{Correlator, EventBuffer};
use skald_core::config::PipelineConfig;
use skald_core::{CommitInfo, EventSource, Interaction, RawEvent, Snapshot};
use skald_intent::{classify_interaction, ConceptVocabulary, InferenceBackend, RuleTable};
use skald_link::{append_links, link_batch};
use skald_retention::load_warm_interactions;
use skald_snapshot::{build, save_snapshot, BuildInputs, ProjectMeta};
use skald_store::log::{append_interaction, event_log_files, load_interactions};
use skald_store::SkaldPaths;
use std::collections::BTreeSet;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use time::OffsetDateTime;

/// Counters from one batch run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchOutcome {
    pub events_read: usize,
    pub sealed: usize,
    pub linked: usize,
    pub orphans: usize,
    pub decisions_created: usize,
    pub decisions_merged: usize,
    pub snapshot_checksum: String,
}

/// Run one processing batch: drain new raw events through
/// correlate → classify → link → synthesize, then rebuild the snapshot.
/// Capture keeps running while this executes; nothing here touches the
/// capture path.
pub fn process_batch(
    paths: &SkaldPaths,
    config: &PipelineConfig,
    table: &RuleTable,
    vocab: &ConceptVocabulary,
    backend: Option<&Arc<dyn InferenceBackend>>,
    now: OffsetDateTime,
) -> anyhow::Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let mut cursors = Cursors::load(paths);

    // ── Buffer: new events since the last batch, serialized by arrival ──
    let mut buffer = EventBuffer::default();
    let new_events = read_new_events(paths, &mut cursors)?;
    outcome.events_read = new_events.len();
    for event in new_events {
        buffer.push(event);
    }
    let mut events = buffer.drain();
    events.sort_by_key(|e| e.ts);

    let existing = load_interactions(paths);

    // ── Correlate ──
    let mut correlator = Correlator::new(config)?;
    let mut sealed: Vec<Interaction> = Vec::new();
    for event in &events {
        sealed.extend(correlator.offer(event));
    }
    sealed.extend(correlator.flush(now));
    // The batch boundary closes anything still open.
    sealed.extend(correlator.seal_all());

    // Re-reading a log from scratch (lost cursors) must not duplicate
    // history: a prompt already sealed once stays sealed once.
    let seen: BTreeSet<(OffsetDateTime, Option<String>, String)> = existing
        .iter()
        .map(|i| (i.ts, i.session.clone(), i.prompt.clone()))
        .collect();
    sealed.retain(|i| !seen.contains(&(i.ts, i.session.clone(), i.prompt.clone())));
    outcome.sealed = sealed.len();

    // ── Classify (after sealing, never on the capture path) ──
    for interaction in &mut sealed {
        let intent = classify_interaction(interaction, table, vocab, config, backend);
        interaction.intent = Some(intent);
        append_interaction(paths, interaction)?;
    }

    // ── Link: new and previously-orphaned interactions against every
    // known commit. The retroactive import is this same call over a
    // historical backlog. ──
    let mut all_interactions = merge_interactions(existing, sealed);
    let candidates = known_commits(paths)?;
    let links = link_batch(&mut all_interactions, &candidates, config);
    outcome.linked = links.iter().filter(|l| l.accepted).count();
    outcome.orphans = all_interactions.iter().filter(|i| i.commit.is_none()).count();
    append_links(paths, &links)?;
    for link in &links {
        if link.accepted {
            if let Some(interaction) = all_interactions.iter().find(|i| i.id == link.interaction_id)
            {
                append_interaction(paths, interaction)?;
            }
        }
    }

    // ── Synthesize decisions ──
    let mut decisions = list_decisions(paths);
    for interaction in all_interactions.iter_mut() {
        if interaction.adr_generated {
            continue;
        }
        match maybe_synthesize(interaction, &decisions, config) {
            Synthesis::Created(record) => {
                save_decision(paths, &record, config)?;
                decisions.push(record);
                decisions.sort_by(|a, b| a.id.cmp(&b.id));
                interaction.adr_generated = true;
                append_interaction(paths, interaction)?;
                outcome.decisions_created += 1;
            }
            Synthesis::Merged { record, added } => {
                save_decision(paths, &record, config)?;
                if let Some(existing) = decisions.iter_mut().find(|d| d.id == record.id) {
                    *existing = record;
                }
                interaction.adr_generated = true;
                append_interaction(paths, interaction)?;
                outcome.decisions_merged += 1;
                tracing::debug!(
                    interaction = %interaction.id,
                    added = added.len(),
                    "merged into existing decision"
                );
            }
            Synthesis::BelowThreshold | Synthesis::NoIntent => {}
        }
    }

    // ── Snapshot ──
    let snapshot = rebuild_snapshot(paths, config, &all_interactions, &decisions, now)?;
    outcome.snapshot_checksum = snapshot.checksum;

    cursors.save(paths)?;
    Ok(outcome)
}

/// Rebuild and persist the snapshot from hot + warm interactions and the
/// decision store. Cold inputs are absent by construction.
pub fn rebuild_snapshot(
    paths: &SkaldPaths,
    config: &PipelineConfig,
    hot_interactions: &[Interaction],
    decisions: &[skald_core::DecisionRecord],
    now: OffsetDateTime,
) -> anyhow::Result<Snapshot> {
    let mut interactions: Vec<Interaction> = hot_interactions.to_vec();
    interactions.extend(load_warm_interactions(paths));

    let meta = ProjectMeta::load(paths)?;
    let inputs = BuildInputs {
        project: meta.project_info(paths),
        stack: meta.stack.clone(),
        constraints: meta.constraints.clone(),
        decisions,
        interactions: &interactions,
        now,
    };
    let snapshot = build(&inputs, config);
    save_snapshot(paths, &snapshot, config)?;
    Ok(snapshot)
}

fn merge_interactions(existing: Vec<Interaction>, new: Vec<Interaction>) -> Vec<Interaction> {
    let mut all = existing;
    all.extend(new);
    all.sort_by_key(|i| i.ts);
    all
}

/// Every commit seen in the raw event logs, deduplicated by sha.
fn known_commits(paths: &SkaldPaths) -> anyhow::Result<Vec<CommitInfo>> {
    let mut commits: Vec<CommitInfo> = Vec::new();
    let mut seen = BTreeSet::new();
    for event in skald_store::log::load_raw_events(paths) {
        if event.source != EventSource::Vcs {
            continue;
        }
        if let Some(commit) = event.commit {
            if seen.insert(commit.sha.clone()) {
                commits.push(commit);
            }
        }
    }
    Ok(commits)
}

/// Read complete new lines from every event log, advancing cursors. A
/// malformed line is skipped; a partially-written final line is left for
/// the next batch.
fn read_new_events(paths: &SkaldPaths, cursors: &mut Cursors) -> anyhow::Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for file in event_log_files(paths) {
        let Some(name) = file.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        let len = std::fs::metadata(&file)?.len();
        let offset = cursors.offset_for(&name, len);
        if offset >= len {
            continue;
        }

        let mut handle = std::fs::File::open(&file)?;
        handle.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity((len - offset) as usize);
        handle.read_to_end(&mut buf)?;

        // Only consume up to the last complete line.
        let consumable = match buf.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => 0,
        };
        if consumable == 0 {
            continue;
        }

        for line in buf[..consumable].split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<RawEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(file = name, error = %e, "skipping malformed event line");
                }
            }
        }
        cursors.advance(&name, offset + consumable as u64);
    }
    Ok(events)
}
