use skald_core::config::PipelineConfig;
use skald_core::tokens::{jaccard, token_set};
use skald_core::{CommitInfo, Interaction, LinkSignals};
use std::collections::BTreeSet;

/// Linear decay from 1 at zero seconds apart to 0 at the horizon.
pub fn time_proximity(delta_secs: f64, horizon_secs: f64) -> f64 {
    if horizon_secs <= 0.0 {
        return 0.0;
    }
    (1.0 - delta_secs.abs() / horizon_secs).max(0.0)
}

/// Compute the three link signals for an interaction/commit pair.
pub fn signals(interaction: &Interaction, commit: &CommitInfo, config: &PipelineConfig) -> LinkSignals {
    let delta = (commit.ts - interaction.ts).whole_seconds() as f64;
    let commit_files: BTreeSet<String> = commit.files.iter().cloned().collect();

    // Message similarity compares the intent's solution text (the prompt
    // when no intent is attached yet) against the commit message.
    let solution = interaction
        .intent
        .as_ref()
        .map(|i| i.solution.as_str())
        .unwrap_or(&interaction.prompt);

    LinkSignals {
        time_proximity: time_proximity(delta, config.time_horizon_secs as f64),
        file_overlap: jaccard(&interaction.files, &commit_files),
        message_similarity: jaccard(&token_set(solution), &token_set(&commit.message)),
    }
}

/// Weighted combination of the signals. Each signal is in [0,1] and the
/// weights sum to 1 by default, so the score stays in [0,1]; pathological
/// weight overrides are clamped rather than propagated.
pub fn combine(signals: &LinkSignals, config: &PipelineConfig) -> f64 {
    let w = &config.link_weights;
    let score = w.time * signals.time_proximity
        + w.files * signals.file_overlap
        + w.message * signals.message_similarity;
    score.clamp(0.0, 1.0)
}
