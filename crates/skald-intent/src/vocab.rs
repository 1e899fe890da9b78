use serde::{Deserialize, Serialize};
use skald_core::tokens::{path_tokens, token_set};
use std::collections::BTreeSet;

/// One vocabulary entry: the concept fires when its name or any alias
/// appears among the prompt/path tokens, and firing also emits every
/// implied concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptEntry {
    pub concept: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub implies: Vec<String>,
}

/// Fixed, versioned concept vocabulary. Deterministic by construction: the
/// same prompt and file set always extract the same concept set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptVocabulary {
    pub version: u32,
    pub entries: Vec<ConceptEntry>,
}

impl ConceptVocabulary {
    pub fn builtin() -> Self {
        fn entry(concept: &str, aliases: &[&str], implies: &[&str]) -> ConceptEntry {
            ConceptEntry {
                concept: concept.to_string(),
                aliases: aliases.iter().map(|s| s.to_string()).collect(),
                implies: implies.iter().map(|s| s.to_string()).collect(),
            }
        }
        Self {
            version: 1,
            entries: vec![
                entry("session", &["sessions"], &["login", "auth"]),
                entry("auth", &["authentication", "authorization", "oauth"], &["login"]),
                entry("login", &["signin", "logout"], &["auth"]),
                entry("redis", &[], &["cache"]),
                entry("cache", &["caching", "memcached"], &[]),
                entry("database", &["db", "postgres", "postgresql", "sqlite", "mysql"], &[]),
                entry("api", &["endpoint", "rest", "graphql"], &[]),
                entry("performance", &["perf", "latency", "slow", "throughput"], &[]),
                entry("security", &["vulnerability", "cve", "xss", "csrf"], &[]),
                entry("config", &["configuration", "settings"], &[]),
                entry("migration", &["migrations", "migrate"], &["database"]),
                entry("queue", &["worker", "job", "jobs"], &[]),
                entry("logging", &["logs", "log", "tracing"], &[]),
                entry("search", &["indexing", "query"], &[]),
                entry("ui", &["frontend", "css", "layout"], &[]),
                entry("deploy", &["deployment", "ci", "docker", "kubernetes"], &[]),
                entry("payment", &["billing", "stripe", "invoice"], &[]),
                entry("email", &["smtp", "notification", "notifications"], &[]),
                entry("websocket", &["ws", "realtime"], &[]),
                entry("storage", &["s3", "upload", "uploads", "blob"], &[]),
            ],
        }
    }

    /// Intersect the vocabulary with the prompt and file-path tokens.
    pub fn extract(&self, prompt: &str, files: &BTreeSet<String>) -> Vec<String> {
        let mut tokens = token_set(prompt);
        for file in files {
            tokens.extend(path_tokens(file));
        }

        let mut concepts = BTreeSet::new();
        for entry in &self.entries {
            let hit = tokens.contains(&entry.concept)
                || entry.aliases.iter().any(|a| tokens.contains(a));
            if hit {
                concepts.insert(entry.concept.clone());
                concepts.extend(entry.implies.iter().cloned());
            }
        }
        concepts.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_from_prompt_and_paths() {
        let vocab = ConceptVocabulary::builtin();
        let concepts = vocab.extract(
            "Add Redis cache for sessions, perf issues at 10k users",
            &files(&["src/auth/session.ts", "src/config/redis.ts"]),
        );
        for expected in ["session", "auth", "redis", "login", "performance", "cache"] {
            assert!(concepts.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn implied_concepts_are_emitted() {
        let vocab = ConceptVocabulary::builtin();
        let concepts = vocab.extract("run the migrations", &BTreeSet::new());
        assert!(concepts.contains(&"migration".to_string()));
        assert!(concepts.contains(&"database".to_string()));
    }

    #[test]
    fn no_vocabulary_overlap_means_no_concepts() {
        let vocab = ConceptVocabulary::builtin();
        assert!(vocab
            .extract("miscellaneous chores", &BTreeSet::new())
            .is_empty());
    }

    #[test]
    fn extraction_is_deterministic_and_sorted() {
        let vocab = ConceptVocabulary::builtin();
        let f = files(&["src/auth/session.ts"]);
        let a = vocab.extract("session auth cache", &f);
        let b = vocab.extract("session auth cache", &f);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(a, sorted);
    }
}
