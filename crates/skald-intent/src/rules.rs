use serde::{Deserialize, Serialize};
use skald_core::tokens::token_set;
use skald_core::IntentCategory;

/// One ordered classification rule: the rule fires when a single-word
/// keyword appears as a prompt token, or a multi-word keyword appears as a
/// substring of the lowercased prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub id: String,
    pub keywords: Vec<String>,
    pub category: IntentCategory,
}

/// The versioned rule table for the deterministic fallback path. First
/// matching rule wins; order is part of the table's contract and bumping
/// it requires a version bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: u32,
    pub rules: Vec<IntentRule>,
}

impl RuleTable {
    /// The built-in table. Specific categories come before the generic
    /// `feature` catch-all so "fix the slow add path" classifies as a fix,
    /// not a feature.
    pub fn builtin() -> Self {
        fn rule(id: &str, category: IntentCategory, keywords: &[&str]) -> IntentRule {
            IntentRule {
                id: id.to_string(),
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
                category,
            }
        }
        Self {
            version: 1,
            rules: vec![
                rule(
                    "security",
                    IntentCategory::Security,
                    &[
                        "security", "vulnerability", "cve", "xss", "csrf", "injection",
                        "sanitize", "exploit", "auth bypass",
                    ],
                ),
                rule(
                    "bugfix",
                    IntentCategory::Bugfix,
                    &["fix", "bug", "crash", "broken", "regression", "panic", "fault"],
                ),
                rule(
                    "performance",
                    IntentCategory::Performance,
                    &[
                        "performance", "perf", "slow", "latency", "optimize", "optimization",
                        "throughput", "cache", "caching",
                    ],
                ),
                rule(
                    "test",
                    IntentCategory::Test,
                    &["test", "tests", "testing", "coverage", "flaky"],
                ),
                rule(
                    "docs",
                    IntentCategory::Docs,
                    &["docs", "documentation", "readme", "changelog", "docstring"],
                ),
                rule(
                    "refactor",
                    IntentCategory::Refactor,
                    &[
                        "refactor", "cleanup", "restructure", "rename", "extract", "simplify",
                        "rewrite",
                    ],
                ),
                rule(
                    "feature",
                    IntentCategory::Feature,
                    &["add", "implement", "support", "create", "introduce", "feature"],
                ),
            ],
        }
    }

    /// First rule matching the prompt, if any.
    pub fn match_prompt(&self, prompt: &str) -> Option<&IntentRule> {
        let lower = prompt.to_lowercase();
        let tokens = token_set(prompt);
        self.rules.iter().find(|rule| {
            rule.keywords.iter().any(|kw| {
                if kw.contains(' ') {
                    lower.contains(kw)
                } else {
                    tokens.contains(kw)
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let table = RuleTable::builtin();
        // "fix" (bugfix) outranks "slow" (performance) by table order.
        let rule = table.match_prompt("fix the slow query").unwrap();
        assert_eq!(rule.category, IntentCategory::Bugfix);
    }

    #[test]
    fn perf_prompt_matches_performance() {
        let table = RuleTable::builtin();
        let rule = table
            .match_prompt("Add Redis cache for sessions, perf issues at 10k users")
            .unwrap();
        assert_eq!(rule.category, IntentCategory::Performance);
    }

    #[test]
    fn multiword_keywords_match_as_substring() {
        let table = RuleTable::builtin();
        let rule = table.match_prompt("found an auth bypass in the admin panel").unwrap();
        assert_eq!(rule.category, IntentCategory::Security);
    }

    #[test]
    fn single_word_keywords_need_token_boundaries() {
        let table = RuleTable::builtin();
        // "prefix" contains "fix" as a substring but not as a token.
        assert!(table.match_prompt("rework the url prefix handling").is_none());
    }

    #[test]
    fn unmatched_prompt_returns_none() {
        let table = RuleTable::builtin();
        assert!(table.match_prompt("hello there").is_none());
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = RuleTable::builtin();
        let json = serde_json::to_string(&table).unwrap();
        let back: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, table.version);
        assert_eq!(back.rules.len(), table.rules.len());
        assert_eq!(back.rules[0].id, "security");
    }
}
