use skald_core::config::PipelineConfig;
use skald_core::tokens::jaccard;
use skald_core::{format_adr_id, adr_number, DecisionRecord, DecisionStatus, Interaction};
use std::collections::BTreeSet;

/// Outcome of offering an interaction to the synthesizer.
#[derive(Debug)]
pub enum Synthesis {
    /// A brand-new record to persist.
    Created(DecisionRecord),
    /// An existing record absorbed this interaction; its trigger set was
    /// extended with the listed novel concepts. Persist the updated record.
    Merged {
        record: DecisionRecord,
        added: Vec<String>,
    },
    /// Intent confidence below the synthesis threshold.
    BelowThreshold,
    /// The interaction has no classified intent yet.
    NoIntent,
}

/// Decide whether an interaction is significant enough to become a durable
/// decision record, deduplicating against the existing ones.
///
/// Fires only at or above the confidence threshold. When the interaction's
/// concept set is close enough (Jaccard ≥ dedup threshold) to an existing
/// record's triggers, no new record is created — the closest record's
/// triggers are unioned with any novel concepts instead.
pub fn maybe_synthesize(
    interaction: &Interaction,
    existing: &[DecisionRecord],
    config: &PipelineConfig,
) -> Synthesis {
    let Some(intent) = interaction.intent.as_ref() else {
        return Synthesis::NoIntent;
    };
    if intent.confidence < config.synthesis_threshold {
        return Synthesis::BelowThreshold;
    }

    let concepts: BTreeSet<String> = intent.concepts.iter().cloned().collect();

    // Closest existing record by trigger similarity.
    let closest = existing
        .iter()
        .map(|record| (jaccard(&concepts, &record.triggers), record))
        .max_by(|(a, ra), (b, rb)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| rb.id.cmp(&ra.id))
        });

    if let Some((similarity, record)) = closest {
        if similarity >= config.dedup_threshold {
            let mut merged = record.clone();
            let added: Vec<String> = concepts
                .iter()
                .filter(|c| !merged.triggers.contains(*c))
                .cloned()
                .collect();
            merged.triggers.extend(added.iter().cloned());
            return Synthesis::Merged {
                record: merged,
                added,
            };
        }
    }

    let next = existing
        .iter()
        .filter_map(|r| adr_number(&r.id))
        .max()
        .unwrap_or(0)
        + 1;

    let mut triggers = concepts;
    triggers.insert(intent.category.to_string());

    Synthesis::Created(DecisionRecord {
        id: format_adr_id(next),
        title: title_from_prompt(&interaction.prompt),
        date: interaction.ts,
        status: DecisionStatus::Accepted,
        superseded_by: None,
        context: intent
            .problem
            .clone()
            .unwrap_or_else(|| interaction.prompt.clone()),
        decision: intent.solution.clone(),
        alternatives: intent.alternatives.clone(),
        consequences: Vec::new(),
        triggers,
        source_interaction: interaction.id.clone(),
        files: interaction.files.iter().cloned().collect(),
        commits: interaction.commit.iter().cloned().collect(),
    })
}

/// First line of the prompt, truncated at a word boundary.
fn title_from_prompt(prompt: &str) -> String {
    const MAX: usize = 72;
    let line = prompt.lines().next().unwrap_or("").trim();
    if line.len() <= MAX {
        return line.to_string();
    }
    let mut cut = MAX;
    while cut > 0 && !line.is_char_boundary(cut) {
        cut -= 1;
    }
    let truncated = &line[..cut];
    match truncated.rfind(' ') {
        Some(pos) if pos > MAX / 2 => format!("{}…", &truncated[..pos]),
        _ => format!("{truncated}…"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::ids::new_interaction_id;
    use skald_core::{InferredIntent, IntentCategory};
    use time::macros::datetime;

    fn interaction(prompt: &str, files: &[&str], intent: Option<InferredIntent>) -> Interaction {
        Interaction {
            id: new_interaction_id(),
            ts: datetime!(2026-03-01 12:00:00 UTC),
            tool: "claude-code".into(),
            session: None,
            author: None,
            prompt: prompt.into(),
            files: files.iter().map(|s| s.to_string()).collect(),
            diff_hash: None,
            intent,
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: skald_core::SCHEMA_VERSION,
        }
    }

    fn intent(category: IntentCategory, confidence: f64, concepts: &[&str]) -> InferredIntent {
        InferredIntent {
            category,
            confidence,
            problem: None,
            solution: "the chosen approach".into(),
            alternatives: vec!["the road not taken".into()],
            concepts: concepts.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn record(id: &str, triggers: &[&str]) -> DecisionRecord {
        DecisionRecord {
            id: id.into(),
            title: "existing".into(),
            date: datetime!(2026-01-01 00:00:00 UTC),
            status: DecisionStatus::Accepted,
            superseded_by: None,
            context: "ctx".into(),
            decision: "dec".into(),
            alternatives: vec![],
            consequences: vec![],
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            source_interaction: "int_x".into(),
            files: vec![],
            commits: vec![],
        }
    }

    #[test]
    fn high_confidence_creates_record_with_category_trigger() {
        let it = interaction(
            "Add Redis cache for sessions, perf issues at 10k users",
            &["src/auth/session.ts", "src/config/redis.ts"],
            Some(intent(
                IntentCategory::Performance,
                0.92,
                &["session", "auth", "redis", "login", "cache"],
            )),
        );
        let Synthesis::Created(record) = maybe_synthesize(&it, &[], &PipelineConfig::default())
        else {
            panic!("expected a created record");
        };
        assert_eq!(record.id, "ADR-001");
        assert_eq!(record.status, DecisionStatus::Accepted);
        for trigger in ["session", "auth", "redis", "login", "performance"] {
            assert!(record.triggers.contains(trigger), "missing {trigger}");
        }
        assert_eq!(record.decision, "the chosen approach");
        assert_eq!(record.alternatives, vec!["the road not taken"]);
    }

    #[test]
    fn below_threshold_does_not_fire() {
        let it = interaction(
            "small tweak",
            &[],
            Some(intent(IntentCategory::Feature, 0.79, &["cache"])),
        );
        assert!(matches!(
            maybe_synthesize(&it, &[], &PipelineConfig::default()),
            Synthesis::BelowThreshold
        ));
    }

    #[test]
    fn missing_intent_does_not_fire() {
        let it = interaction("anything", &[], None);
        assert!(matches!(
            maybe_synthesize(&it, &[], &PipelineConfig::default()),
            Synthesis::NoIntent
        ));
    }

    #[test]
    fn similar_concepts_merge_instead_of_duplicating() {
        let existing = vec![record("ADR-001", &["session", "auth", "redis"])];
        // Jaccard({session,auth,redis,login}, {session,auth,redis}) = 3/4.
        let it = interaction(
            "more session caching work",
            &[],
            Some(intent(
                IntentCategory::Performance,
                0.9,
                &["session", "auth", "redis", "login"],
            )),
        );
        let Synthesis::Merged { record, added } =
            maybe_synthesize(&it, &existing, &PipelineConfig::default())
        else {
            panic!("expected a merge");
        };
        assert_eq!(record.id, "ADR-001");
        assert_eq!(added, vec!["login".to_string()]);
        assert!(record.triggers.contains("login"));
        assert!(record.triggers.contains("session"));
    }

    #[test]
    fn dissimilar_concepts_create_next_id() {
        let existing = vec![
            record("ADR-001", &["session", "auth"]),
            record("ADR-007", &["payment", "stripe"]),
        ];
        let it = interaction(
            "switch search to tantivy",
            &[],
            Some(intent(IntentCategory::Feature, 0.85, &["search", "indexing"])),
        );
        let Synthesis::Created(created) =
            maybe_synthesize(&it, &existing, &PipelineConfig::default())
        else {
            panic!("expected a created record");
        };
        assert_eq!(created.id, "ADR-008");
    }

    #[test]
    fn merge_at_exact_dedup_threshold() {
        // Jaccard({a,b,c}, {a,b,c,d,e}) = 3/5 = 0.6 — exactly the default.
        let existing = vec![record("ADR-001", &["a", "b", "c", "d", "e"])];
        let it = interaction(
            "same territory",
            &[],
            Some(intent(IntentCategory::Refactor, 0.9, &["a", "b", "c"])),
        );
        assert!(matches!(
            maybe_synthesize(&it, &existing, &PipelineConfig::default()),
            Synthesis::Merged { .. }
        ));
    }

    #[test]
    fn title_truncates_long_prompts_at_word_boundary() {
        let long = "implement a very long and winding description of the caching layer that keeps going";
        let title = title_from_prompt(long);
        assert!(title.len() <= 80);
        assert!(title.ends_with('…'));
        let short = title_from_prompt("short prompt");
        assert_eq!(short, "short prompt");
    }
}
