pub mod score;

use skald_core::config::PipelineConfig;
use skald_core::ids::now_utc;
use skald_core::{CommitInfo, CommitLink, Interaction};
use skald_store::SkaldPaths;
use std::collections::BTreeMap;
use std::io::Write;

/// Score one interaction against one candidate commit.
pub fn score_link(
    interaction: &Interaction,
    commit: &CommitInfo,
    config: &PipelineConfig,
) -> CommitLink {
    let signals = score::signals(interaction, commit, config);
    let combined = score::combine(&signals, config);
    CommitLink {
        interaction_id: interaction.id.clone(),
        commit_sha: commit.sha.clone(),
        score: combined,
        accepted: combined >= config.accept_threshold,
        signals,
        linked_at: now_utc(),
    }
}

/// Best-scoring candidate for an interaction, if any candidates exist.
/// Ties break on commit timestamp then sha, so repeated runs over the same
/// inputs pick the same link.
pub fn best_link(
    interaction: &Interaction,
    candidates: &[CommitInfo],
    config: &PipelineConfig,
) -> Option<CommitLink> {
    candidates
        .iter()
        .map(|c| (score_link(interaction, c, config), c))
        .max_by(|(a, ca), (b, cb)| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| cb.ts.cmp(&ca.ts))
                .then_with(|| cb.sha.cmp(&ca.sha))
        })
        .map(|(link, _)| link)
}

/// Link a batch of interactions against candidate commits. Serves both the
/// reactive path and the retroactive/cold-start import — there is no
/// behavioral difference, it is the same scoring over a larger candidate
/// set. Interactions with an accepted link get the commit attached;
/// everything else stays an orphan whose best candidate is still recorded.
///
/// Returns every computed best link (accepted and orphan candidates alike).
pub fn link_batch(
    interactions: &mut [Interaction],
    candidates: &[CommitInfo],
    config: &PipelineConfig,
) -> Vec<CommitLink> {
    let mut links = Vec::new();
    for interaction in interactions.iter_mut() {
        // Already-linked interactions are settled; at most one accepted
        // link per interaction.
        if interaction.commit.is_some() {
            continue;
        }
        let Some(link) = best_link(interaction, candidates, config) else {
            continue;
        };
        if link.accepted {
            if let Some(commit) = candidates.iter().find(|c| c.sha == link.commit_sha) {
                interaction.commit = Some(commit.sha.clone());
                interaction.commit_msg = Some(commit.message.clone());
            }
        } else {
            tracing::debug!(
                interaction = %interaction.id,
                score = link.score,
                "no commit above accept threshold, keeping orphan"
            );
        }
        links.push(link);
    }
    links
}

/// Append link outcomes to `links/links.jsonl`. Orphan candidates are
/// recorded too — they are retained for later re-scoring, never dropped.
pub fn append_links(paths: &SkaldPaths, links: &[CommitLink]) -> anyhow::Result<()> {
    if links.is_empty() {
        return Ok(());
    }
    if let Some(parent) = paths.links_jsonl.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.links_jsonl)?;
    for link in links {
        writeln!(file, "{}", serde_json::to_string(link)?)?;
    }
    Ok(())
}

/// Load links, resolved to the latest line per interaction id.
pub fn load_links(paths: &SkaldPaths) -> Vec<CommitLink> {
    let content = match std::fs::read_to_string(&paths.links_jsonl) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let mut by_interaction: BTreeMap<String, CommitLink> = BTreeMap::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CommitLink>(line) {
            Ok(link) => {
                by_interaction.insert(link.interaction_id.clone(), link);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed link line");
            }
        }
    }
    by_interaction.into_values().collect()
}
