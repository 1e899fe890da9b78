use skald_core::config::PipelineConfig;
use skald_core::{DecisionRecord, Interaction, SemanticConcept};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// One clusterable unit: a decision's trigger set or a recent
/// interaction's concept set.
#[derive(Debug)]
struct Member {
    keywords: BTreeSet<String>,
    files: BTreeSet<String>,
    decision_id: Option<String>,
    confidence: f64,
    ts: OffsetDateTime,
    label: String,
}

/// Recency weight: exponential decay with the configured half-life.
pub fn decay(ts: OffsetDateTime, now: OffsetDateTime, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 0.0;
    }
    let age_days = ((now - ts).whole_seconds() as f64 / 86_400.0).max(0.0);
    0.5_f64.powf(age_days / half_life_days)
}

/// Cluster decision triggers and recent interaction concepts into semantic
/// concepts: members sharing at least one keyword merge into one cluster.
/// Relevance is the recency-weighted occurrence count of the cluster's
/// members. Output ordering is by descending relevance (name breaks ties),
/// so the builder can fill its budget greedily.
pub fn cluster_concepts(
    decisions: &[DecisionRecord],
    interactions: &[Interaction],
    config: &PipelineConfig,
    now: OffsetDateTime,
) -> Vec<SemanticConcept> {
    let mut members: Vec<Member> = Vec::new();

    for record in decisions {
        if record.triggers.is_empty() {
            continue;
        }
        members.push(Member {
            keywords: record.triggers.clone(),
            files: record.files.iter().cloned().collect(),
            decision_id: Some(record.id.clone()),
            confidence: 0.9,
            ts: record.date,
            label: record.title.clone(),
        });
    }

    for interaction in interactions {
        let Some(intent) = interaction.intent.as_ref() else {
            continue;
        };
        if intent.concepts.is_empty() {
            continue;
        }
        members.push(Member {
            keywords: intent.concepts.iter().cloned().collect(),
            files: interaction.files.clone(),
            decision_id: None,
            confidence: intent.confidence,
            ts: interaction.ts,
            label: intent.solution.clone(),
        });
    }

    // Union-find over members keyed by shared keywords.
    let mut parent: Vec<usize> = (0..members.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = i;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }
    let mut by_keyword: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, member) in members.iter().enumerate() {
        for kw in &member.keywords {
            match by_keyword.get(kw.as_str()) {
                Some(&j) => {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[ri.max(rj)] = ri.min(rj);
                    }
                }
                None => {
                    by_keyword.insert(kw.as_str(), i);
                }
            }
        }
    }

    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..members.len() {
        let root = find(&mut parent, i);
        clusters.entry(root).or_default().push(i);
    }

    let mut concepts: Vec<SemanticConcept> = clusters
        .values()
        .map(|idxs| build_concept(&members, idxs, config, now))
        .collect();

    concepts.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    concepts
}

fn build_concept(
    members: &[Member],
    idxs: &[usize],
    config: &PipelineConfig,
    now: OffsetDateTime,
) -> SemanticConcept {
    let mut keyword_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut trigger_keywords = BTreeSet::new();
    let mut files = BTreeSet::new();
    let mut decision_ids = Vec::new();
    let mut relevance = 0.0;
    let mut confidence_sum = 0.0;
    let mut best_label: Option<(&str, f64)> = None;

    for &i in idxs {
        let member = &members[i];
        let weight = decay(member.ts, now, config.half_life_days);
        relevance += weight;
        confidence_sum += member.confidence;
        for kw in &member.keywords {
            *keyword_counts.entry(kw.as_str()).or_insert(0) += 1;
            trigger_keywords.insert(kw.clone());
        }
        files.extend(member.files.iter().cloned());
        if let Some(id) = &member.decision_id {
            decision_ids.push(id.clone());
        }
        if best_label.map_or(true, |(_, w)| weight > w) {
            best_label = Some((&member.label, weight));
        }
    }

    // Name: the keyword shared most often; lexicographic tie-break keeps
    // rebuilds stable.
    let name = keyword_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(kw, _)| kw.to_string())
        .unwrap_or_default();

    decision_ids.sort();
    decision_ids.dedup();

    SemanticConcept {
        name,
        summary: best_label.map(|(l, _)| l.to_string()).unwrap_or_default(),
        confidence: if idxs.is_empty() {
            0.0
        } else {
            confidence_sum / idxs.len() as f64
        },
        files,
        decision_ids,
        trigger_keywords,
        relevance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::ids::new_interaction_id;
    use skald_core::{DecisionStatus, InferredIntent, IntentCategory};
    use time::macros::datetime;
    use time::Duration;

    fn now() -> OffsetDateTime {
        datetime!(2026-03-01 12:00:00 UTC)
    }

    fn decision(id: &str, title: &str, triggers: &[&str], age_days: i64) -> DecisionRecord {
        DecisionRecord {
            id: id.into(),
            title: title.into(),
            date: now() - Duration::days(age_days),
            status: DecisionStatus::Accepted,
            superseded_by: None,
            context: String::new(),
            decision: String::new(),
            alternatives: vec![],
            consequences: vec![],
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            source_interaction: "int_x".into(),
            files: vec![],
            commits: vec![],
        }
    }

    fn interaction(concepts: &[&str], age_days: i64) -> Interaction {
        Interaction {
            id: new_interaction_id(),
            ts: now() - Duration::days(age_days),
            tool: "claude-code".into(),
            session: None,
            author: None,
            prompt: "p".into(),
            files: BTreeSet::new(),
            diff_hash: None,
            intent: Some(InferredIntent {
                category: IntentCategory::Feature,
                confidence: 0.8,
                problem: None,
                solution: "did a thing".into(),
                alternatives: vec![],
                concepts: concepts.iter().map(|s| s.to_string()).collect(),
            }),
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: skald_core::SCHEMA_VERSION,
        }
    }

    #[test]
    fn decay_halves_at_half_life() {
        let w = decay(now() - Duration::days(14), now(), 14.0);
        assert!((w - 0.5).abs() < 1e-6);
        assert!((decay(now(), now(), 14.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shared_keywords_merge_into_one_cluster() {
        let decisions = vec![decision("ADR-001", "redis sessions", &["session", "redis"], 1)];
        let interactions = vec![interaction(&["session", "auth"], 0)];
        let concepts = cluster_concepts(
            &decisions,
            &interactions,
            &PipelineConfig::default(),
            now(),
        );
        assert_eq!(concepts.len(), 1);
        let c = &concepts[0];
        assert!(c.trigger_keywords.contains("redis"));
        assert!(c.trigger_keywords.contains("auth"));
        assert_eq!(c.decision_ids, vec!["ADR-001"]);
        // "session" appears in both members.
        assert_eq!(c.name, "session");
    }

    #[test]
    fn disjoint_keywords_stay_separate() {
        let decisions = vec![
            decision("ADR-001", "caching", &["cache", "redis"], 1),
            decision("ADR-002", "payments", &["payment", "stripe"], 1),
        ];
        let concepts =
            cluster_concepts(&decisions, &[], &PipelineConfig::default(), now());
        assert_eq!(concepts.len(), 2);
    }

    #[test]
    fn recency_orders_clusters() {
        let decisions = vec![
            decision("ADR-001", "old topic", &["legacy"], 120),
            decision("ADR-002", "new topic", &["websocket"], 1),
        ];
        let concepts =
            cluster_concepts(&decisions, &[], &PipelineConfig::default(), now());
        assert_eq!(concepts[0].decision_ids, vec!["ADR-002"]);
        assert!(concepts[0].relevance > concepts[1].relevance);
    }

    #[test]
    fn repeated_concepts_accumulate_relevance() {
        let interactions = vec![
            interaction(&["cache"], 0),
            interaction(&["cache"], 1),
            interaction(&["cache"], 2),
        ];
        let lone = vec![interaction(&["email"], 0)];
        let config = PipelineConfig::default();
        let busy = cluster_concepts(&[], &interactions, &config, now());
        let quiet = cluster_concepts(&[], &lone, &config, now());
        assert!(busy[0].relevance > quiet[0].relevance);
    }

    #[test]
    fn interactions_without_intent_are_ignored() {
        let mut bare = interaction(&["cache"], 0);
        bare.intent = None;
        let concepts = cluster_concepts(&[], &[bare], &PipelineConfig::default(), now());
        assert!(concepts.is_empty());
    }

    #[test]
    fn clustering_is_deterministic() {
        let decisions = vec![
            decision("ADR-001", "a", &["session", "redis"], 3),
            decision("ADR-002", "b", &["payment"], 2),
        ];
        let interactions = vec![interaction(&["session"], 1), interaction(&["stripe", "payment"], 0)];
        let config = PipelineConfig::default();
        let a = cluster_concepts(&decisions, &interactions, &config, now());
        let b = cluster_concepts(&decisions, &interactions, &config, now());
        let names_a: Vec<_> = a.iter().map(|c| c.name.clone()).collect();
        let names_b: Vec<_> = b.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names_a, names_b);
    }
}
