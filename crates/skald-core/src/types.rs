use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Current schema version for new records.
pub const SCHEMA_VERSION: u32 = 1;

/// Snapshot document format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Where a raw event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// A prompt issued to an AI coding tool.
    Tool,
    /// A file-change notification.
    File,
    /// A version-control commit.
    Vcs,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Tool => write!(f, "tool"),
            EventSource::File => write!(f, "file"),
            EventSource::Vcs => write!(f, "vcs"),
        }
    }
}

/// Commit metadata carried by a vcs event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
}

/// A raw, timestamped event as captured. Immutable once buffered; the
/// prompt and commit message are already redacted when this exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub source: EventSource,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitInfo>,
    #[serde(default)]
    pub schema_version: u32,
}

/// Intent categories assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Feature,
    Bugfix,
    Refactor,
    Performance,
    Security,
    Docs,
    Test,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Feature => "feature",
            IntentCategory::Bugfix => "bugfix",
            IntentCategory::Refactor => "refactor",
            IntentCategory::Performance => "performance",
            IntentCategory::Security => "security",
            IntentCategory::Docs => "docs",
            IntentCategory::Test => "test",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(IntentCategory::Feature),
            "bugfix" => Ok(IntentCategory::Bugfix),
            "refactor" => Ok(IntentCategory::Refactor),
            "performance" => Ok(IntentCategory::Performance),
            "security" => Ok(IntentCategory::Security),
            "docs" => Ok(IntentCategory::Docs),
            "test" => Ok(IntentCategory::Test),
            other => Err(format!("unknown intent category: {other}")),
        }
    }
}

/// Classifier output. Owned by exactly one Interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredIntent {
    pub category: IntentCategory,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    pub solution: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<String>,
}

/// One correlated bundle: prompt + touched files + optional commit.
///
/// Appended to the intent log when sealed; mutated only to attach `intent`
/// and the commit link once computed, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub files: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<InferredIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_msg: Option<String>,
    #[serde(default)]
    pub adr_generated: bool,
    #[serde(default)]
    pub schema_version: u32,
}

/// Decision record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Draft,
    Accepted,
    Superseded,
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionStatus::Draft => write!(f, "draft"),
            DecisionStatus::Accepted => write!(f, "accepted"),
            DecisionStatus::Superseded => write!(f, "superseded"),
        }
    }
}

/// A durable "why" record synthesized from a high-confidence Interaction.
/// Immutable after creation except status transitions and trigger unions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub status: DecisionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
    pub context: String,
    pub decision: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consequences: Vec<String>,
    pub triggers: BTreeSet<String>,
    pub source_interaction: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<String>,
}

/// Parse the numeric part of an ADR id: `"ADR-012"` → `Some(12)`.
pub fn adr_number(id: &str) -> Option<u32> {
    id.strip_prefix("ADR-")?.parse().ok()
}

/// Format an ADR id from its number: `7` → `"ADR-007"`.
pub fn format_adr_id(n: u32) -> String {
    format!("ADR-{n:03}")
}

/// Per-signal breakdown of a commit link score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkSignals {
    pub time_proximity: f64,
    pub file_overlap: f64,
    pub message_similarity: f64,
}

/// Scored association between an Interaction and a commit. Links below the
/// accept threshold are kept as orphan candidates, never dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitLink {
    pub interaction_id: String,
    pub commit_sha: String,
    pub score: f64,
    pub accepted: bool,
    pub signals: LinkSignals,
    #[serde(with = "time::serde::rfc3339")]
    pub linked_at: OffsetDateTime,
}

/// A clustered concept in the semantic index. Derived and rebuildable;
/// never the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConcept {
    pub name: String,
    pub summary: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub files: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decision_ids: Vec<String>,
    pub trigger_keywords: BTreeSet<String>,
    pub relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Compact decision entry in the snapshot index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionIndexEntry {
    pub id: String,
    pub title: String,
    pub triggers: Vec<String>,
    pub summary: String,
    pub impact: String,
}

/// Recent-activity entry in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEntry {
    pub interaction_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<IntentCategory>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// How the token budget was split across snapshot sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub total: usize,
    pub project: usize,
    pub stack: usize,
    pub constraints: usize,
    pub decisions: usize,
    pub recent: usize,
    pub reserve: usize,
}

/// The token-budgeted, checksum-verified summary of project semantic state
/// (`context.lock`). Regenerated wholesale on each build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub checksum: String,
    pub project: ProjectInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions_index: Vec<DecisionIndexEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semantic_index: Vec<SemanticConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_window: Vec<RecentEntry>,
    pub budget_allocation: BudgetAllocation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn event_source_round_trip() {
        for src in [EventSource::Tool, EventSource::File, EventSource::Vcs] {
            let json = serde_json::to_string(&src).unwrap();
            let back: EventSource = serde_json::from_str(&json).unwrap();
            assert_eq!(src, back);
        }
        assert_eq!(serde_json::to_string(&EventSource::Vcs).unwrap(), "\"vcs\"");
    }

    #[test]
    fn category_display_and_parse() {
        for cat in [
            IntentCategory::Feature,
            IntentCategory::Bugfix,
            IntentCategory::Refactor,
            IntentCategory::Performance,
            IntentCategory::Security,
            IntentCategory::Docs,
            IntentCategory::Test,
        ] {
            let s = cat.to_string();
            assert_eq!(s.parse::<IntentCategory>().unwrap(), cat);
        }
        assert!("deploy".parse::<IntentCategory>().is_err());
    }

    #[test]
    fn adr_id_round_trip() {
        assert_eq!(format_adr_id(7), "ADR-007");
        assert_eq!(format_adr_id(123), "ADR-123");
        assert_eq!(adr_number("ADR-007"), Some(7));
        assert_eq!(adr_number("ADR-123"), Some(123));
        assert_eq!(adr_number("DR-007"), None);
        assert_eq!(adr_number("ADR-xyz"), None);
    }

    #[test]
    fn interaction_serializes_rfc3339() {
        let it = Interaction {
            id: "int_test".into(),
            ts: datetime!(2026-03-01 12:00:00 UTC),
            tool: "claude-code".into(),
            session: None,
            author: None,
            prompt: "add caching".into(),
            files: BTreeSet::new(),
            diff_hash: None,
            intent: None,
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: SCHEMA_VERSION,
        };
        let json = serde_json::to_string(&it).unwrap();
        assert!(json.contains("2026-03-01T12:00:00Z"));
        let back: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, it.id);
        assert_eq!(back.ts, it.ts);
        assert!(!back.adr_generated);
    }

    #[test]
    fn old_interaction_line_deserializes_with_defaults() {
        // A v0 line without schema_version, adr_generated, or optional fields.
        let json = r#"{
            "id": "int_old",
            "ts": "2025-11-02T08:30:00Z",
            "tool": "claude-code",
            "prompt": "fix login redirect"
        }"#;
        let it: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(it.schema_version, 0);
        assert!(it.files.is_empty());
        assert!(it.intent.is_none());
        assert!(!it.adr_generated);
    }

    #[test]
    fn commit_link_round_trips() {
        let link = CommitLink {
            interaction_id: "int_a".into(),
            commit_sha: "abc123".into(),
            score: 0.5,
            accepted: false,
            signals: LinkSignals {
                time_proximity: 1.0,
                file_overlap: 0.0,
                message_similarity: 0.5,
            },
            linked_at: datetime!(2026-03-01 12:00:00 UTC),
        };
        let json = serde_json::to_string(&link).unwrap();
        let back: CommitLink = serde_json::from_str(&json).unwrap();
        assert_eq!(back.commit_sha, "abc123");
        assert!(!back.accepted);
    }

    #[test]
    fn decision_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DecisionStatus::Superseded).unwrap(),
            "\"superseded\""
        );
        assert_eq!(DecisionStatus::Accepted.to_string(), "accepted");
    }
}
