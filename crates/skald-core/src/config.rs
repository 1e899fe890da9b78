use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights for the commit-link score. Not empirically validated; kept
/// configurable rather than baked in as constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkWeights {
    pub time: f64,
    pub files: f64,
    pub message: f64,
}

impl Default for LinkWeights {
    fn default() -> Self {
        Self {
            time: 0.3,
            files: 0.5,
            message: 0.2,
        }
    }
}

/// All pipeline tunables with their defaults. Loaded from
/// `.skald/config.json`; any field missing there falls back to the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File events up to this many seconds before a prompt attach to it.
    pub pre_window_secs: u64,
    /// Seconds after the prompt before the interaction seals.
    pub post_window_secs: u64,
    /// Confidence assigned when an ordered rule matches.
    pub rule_confidence: f64,
    /// Confidence floor when no rule matches.
    pub fallback_confidence: f64,
    /// Bounded timeout for the pluggable inference backend.
    pub inference_timeout_ms: u64,
    /// Subtracted from rule confidence when the backend times out or errors.
    pub inference_discount: f64,
    pub link_weights: LinkWeights,
    /// Seconds at which time_proximity decays to zero.
    pub time_horizon_secs: u64,
    /// Link score at or above which a commit link is accepted.
    pub accept_threshold: f64,
    /// Intent confidence at or above which decision synthesis fires.
    pub synthesis_threshold: f64,
    /// Concept/trigger Jaccard at or above which a new decision merges into
    /// an existing one.
    pub dedup_threshold: f64,
    /// Half-life in days for concept relevance decay.
    pub half_life_days: f64,
    /// Total snapshot token budget.
    pub token_budget: usize,
    /// Reserved token sizes for the always-included sections.
    pub project_tokens: usize,
    pub stack_tokens: usize,
    pub constraints_tokens: usize,
    /// Fractions of the remaining budget for decisions and recent entries;
    /// whatever they leave unused folds into the reserve pool.
    pub decisions_fraction: f64,
    pub recent_fraction: f64,
    /// Interactions considered for the recent window.
    pub recent_window_size: usize,
    /// Days before per-session records move to the warm tier.
    pub hot_days: i64,
    /// Days before warm batches move to the cold tier.
    pub warm_days: i64,
    /// Retry budget for snapshot/decision writes.
    pub write_retries: u32,
    /// Base backoff between write retries, in milliseconds.
    pub backoff_base_ms: u64,
    /// Glob patterns for file paths the correlator ignores.
    pub ignore: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pre_window_secs: 30,
            post_window_secs: 2,
            rule_confidence: 0.7,
            fallback_confidence: 0.5,
            inference_timeout_ms: 5000,
            inference_discount: 0.1,
            link_weights: LinkWeights::default(),
            time_horizon_secs: 3600,
            accept_threshold: 0.7,
            synthesis_threshold: 0.8,
            dedup_threshold: 0.6,
            half_life_days: 14.0,
            token_budget: 8000,
            project_tokens: 200,
            stack_tokens: 200,
            constraints_tokens: 400,
            decisions_fraction: 0.5,
            recent_fraction: 0.3,
            recent_window_size: 20,
            hot_days: 90,
            warm_days: 365,
            write_retries: 5,
            backoff_base_ms: 50,
            ignore: vec![
                "**/node_modules/**".into(),
                "**/target/**".into(),
                "**/.git/**".into(),
                "**/*.lock".into(),
                "**/dist/**".into(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file, falling back to defaults when the file is
    /// missing. A present but unreadable file is an error; a present file
    /// overrides only the fields it names. `SKALD_TOKEN_BUDGET` overrides
    /// the token budget last.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?
        } else {
            Self::default()
        };
        if let Some(budget) = std::env::var("SKALD_TOKEN_BUDGET")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.token_budget = budget;
        }
        Ok(config)
    }
}
