use crate::checksum::finalize;
use crate::cluster::{cluster_concepts, decay};
use skald_core::config::PipelineConfig;
use skald_core::tokens::estimate_tokens;
use skald_core::{
    BudgetAllocation, DecisionIndexEntry, DecisionRecord, DecisionStatus, Interaction,
    ProjectInfo, RecentEntry, Snapshot, SNAPSHOT_VERSION,
};
use time::OffsetDateTime;

/// Everything the builder aggregates. Interactions may span hot and warm
/// tiers; cold-tier records are simply absent from the slice.
pub struct BuildInputs<'a> {
    pub project: ProjectInfo,
    pub stack: Vec<String>,
    pub constraints: Vec<String>,
    pub decisions: &'a [DecisionRecord],
    pub interactions: &'a [Interaction],
    pub now: OffsetDateTime,
}

/// Build a snapshot from the append-only sources, respecting the total
/// token budget.
///
/// `project`, `stack`, and `constraints` are always included, truncated to
/// their fixed reserved sizes. `decisions` (the index plus the semantic
/// concepts) and `recent` fill greedily by descending relevance until their
/// sub-budgets run out; whatever stays unused folds into the reserve pool
/// for on-demand loading of full record bodies.
pub fn build(inputs: &BuildInputs<'_>, config: &PipelineConfig) -> Snapshot {
    let total = config.token_budget;

    let stack = fit_lines(&inputs.stack, config.stack_tokens);
    let constraints = fit_lines(&inputs.constraints, config.constraints_tokens);

    // Cost of the document with every greedy section empty: what the
    // envelope and fixed sections consume before any filling happens.
    let mut snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        generated_at: inputs.now,
        checksum: "0".repeat(64),
        project: inputs.project.clone(),
        stack,
        decisions_index: Vec::new(),
        constraints,
        semantic_index: Vec::new(),
        recent_window: Vec::new(),
        budget_allocation: BudgetAllocation {
            total,
            project: 0,
            stack: 0,
            constraints: 0,
            decisions: 0,
            recent: 0,
            reserve: 0,
        },
    };
    let envelope = doc_tokens(&snapshot);
    let remaining = total.saturating_sub(envelope);

    let decisions_budget = (remaining as f64 * config.decisions_fraction) as usize;
    let recent_budget = (remaining as f64 * config.recent_fraction) as usize;

    // Decisions index: most relevant first, then the semantic concepts
    // fill whatever the index left of the decisions sub-budget.
    let mut used_decisions = 0;
    for entry in decision_entries(inputs.decisions, config, inputs.now) {
        let cost = entry_tokens(&entry);
        if used_decisions + cost > decisions_budget {
            break;
        }
        used_decisions += cost;
        snapshot.decisions_index.push(entry);
    }
    for concept in cluster_concepts(inputs.decisions, inputs.interactions, config, inputs.now) {
        let cost = entry_tokens(&concept);
        if used_decisions + cost > decisions_budget {
            break;
        }
        used_decisions += cost;
        snapshot.semantic_index.push(concept);
    }

    let mut used_recent = 0;
    for entry in recent_entries(inputs.interactions, config) {
        let cost = entry_tokens(&entry);
        if used_recent + cost > recent_budget {
            break;
        }
        used_recent += cost;
        snapshot.recent_window.push(entry);
    }

    // Belt and braces: the estimate-per-entry fill can land slightly over
    // the document budget once everything is assembled; shed the least
    // relevant entries until the whole serialized document fits.
    while doc_tokens(&snapshot) > total {
        if snapshot.recent_window.pop().is_some() {
            continue;
        }
        if snapshot.semantic_index.pop().is_some() {
            continue;
        }
        if snapshot.decisions_index.pop().is_some() {
            continue;
        }
        if snapshot.constraints.pop().is_some() {
            continue;
        }
        if snapshot.stack.pop().is_some() {
            continue;
        }
        break;
    }

    snapshot.budget_allocation = BudgetAllocation {
        total,
        project: entry_tokens(&snapshot.project),
        stack: entry_tokens(&snapshot.stack),
        constraints: entry_tokens(&snapshot.constraints),
        decisions: snapshot
            .decisions_index
            .iter()
            .map(entry_tokens)
            .chain(snapshot.semantic_index.iter().map(entry_tokens))
            .sum(),
        recent: snapshot.recent_window.iter().map(entry_tokens).sum(),
        reserve: 0,
    };
    let spent = envelope
        + snapshot.budget_allocation.decisions
        + snapshot.budget_allocation.recent;
    snapshot.budget_allocation.reserve = total.saturating_sub(spent);

    finalize(&mut snapshot);
    snapshot
}

/// Tokens of the serialized document.
fn doc_tokens(snapshot: &Snapshot) -> usize {
    match serde_json::to_string(snapshot) {
        Ok(s) => estimate_tokens(&s),
        Err(_) => usize::MAX,
    }
}

fn entry_tokens<T: serde::Serialize>(entry: &T) -> usize {
    serde_json::to_string(entry)
        .map(|s| estimate_tokens(&s))
        .unwrap_or(0)
}

/// Keep whole lines while they fit the reserved token size.
fn fit_lines(lines: &[String], reserved_tokens: usize) -> Vec<String> {
    let mut used = 0;
    let mut out = Vec::new();
    for line in lines {
        let cost = estimate_tokens(line) + 1;
        if used + cost > reserved_tokens {
            break;
        }
        used += cost;
        out.push(line.clone());
    }
    out
}

/// Decision index entries ordered by descending relevance. Superseded
/// records stay listed (they are part of history) but rank half as high.
fn decision_entries(
    decisions: &[DecisionRecord],
    config: &PipelineConfig,
    now: OffsetDateTime,
) -> Vec<DecisionIndexEntry> {
    let mut scored: Vec<(f64, DecisionIndexEntry)> = decisions
        .iter()
        .map(|record| {
            let mut relevance = decay(record.date, now, config.half_life_days);
            if record.status == DecisionStatus::Superseded {
                relevance *= 0.5;
            }
            let impact = match record.status {
                DecisionStatus::Superseded => match &record.superseded_by {
                    Some(by) => format!("superseded by {by}"),
                    None => "superseded".to_string(),
                },
                _ => record
                    .consequences
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "active".to_string()),
            };
            let entry = DecisionIndexEntry {
                id: record.id.clone(),
                title: record.title.clone(),
                triggers: record.triggers.iter().cloned().collect(),
                summary: truncate(&record.decision, 140),
                impact,
            };
            (relevance, entry)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });
    scored.into_iter().map(|(_, e)| e).collect()
}

/// Recent-window candidates: newest interactions first, capped at the
/// configured window size.
fn recent_entries(interactions: &[Interaction], config: &PipelineConfig) -> Vec<RecentEntry> {
    let mut sorted: Vec<&Interaction> = interactions.iter().collect();
    sorted.sort_by(|a, b| b.ts.cmp(&a.ts));
    sorted
        .into_iter()
        .take(config.recent_window_size)
        .map(|interaction| RecentEntry {
            interaction_id: interaction.id.clone(),
            ts: interaction.ts,
            category: interaction.intent.as_ref().map(|i| i.category),
            summary: truncate(&interaction.prompt, 120),
            files: interaction.files.iter().take(5).cloned().collect(),
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.len() <= max {
        return flat;
    }
    let mut end = max;
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &flat[..end])
}
