use crate::classify::classify_rules;
use crate::rules::RuleTable;
use crate::vocab::ConceptVocabulary;
use skald_core::config::PipelineConfig;
use skald_core::{InferredIntent, Interaction};
use std::collections::BTreeSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// The pluggable inference contract. Implementations must be stateless and
/// side-effect free from the pipeline's perspective; the pipeline only
/// depends on this input/output shape.
pub trait InferenceBackend: Send + Sync {
    fn infer(
        &self,
        prompt: &str,
        files: &BTreeSet<String>,
        diff: Option<&str>,
    ) -> anyhow::Result<InferredIntent>;
}

/// Classify a sealed interaction, preferring the backend when one is
/// configured. The backend runs under a bounded timeout on its own thread;
/// on timeout or error the rule-based result is recorded with its
/// confidence reduced by the configured discount. Runs only after sealing,
/// never on the capture path.
pub fn classify_interaction(
    interaction: &Interaction,
    table: &RuleTable,
    vocab: &ConceptVocabulary,
    config: &PipelineConfig,
    backend: Option<&Arc<dyn InferenceBackend>>,
) -> InferredIntent {
    let rule_result = classify_rules(interaction, table, vocab, config);

    let Some(backend) = backend else {
        return rule_result;
    };

    match infer_with_timeout(
        backend,
        interaction,
        Duration::from_millis(config.inference_timeout_ms),
    ) {
        Ok(mut intent) => {
            intent.confidence = intent.confidence.clamp(0.0, 1.0);
            intent
        }
        Err(e) => {
            tracing::warn!(
                interaction = %interaction.id,
                error = %e,
                "inference backend failed, using rule-based result"
            );
            discounted(rule_result, config.inference_discount)
        }
    }
}

fn infer_with_timeout(
    backend: &Arc<dyn InferenceBackend>,
    interaction: &Interaction,
    timeout: Duration,
) -> anyhow::Result<InferredIntent> {
    let (tx, rx) = mpsc::channel();
    let backend = Arc::clone(backend);
    let prompt = interaction.prompt.clone();
    let files = interaction.files.clone();

    std::thread::spawn(move || {
        let result = backend.infer(&prompt, &files, None);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => anyhow::bail!("inference timed out after {timeout:?}"),
    }
}

fn discounted(mut intent: InferredIntent, discount: f64) -> InferredIntent {
    intent.confidence = (intent.confidence - discount).max(0.0);
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::ids::new_interaction_id;
    use skald_core::IntentCategory;
    use time::macros::datetime;

    fn interaction(prompt: &str) -> Interaction {
        Interaction {
            id: new_interaction_id(),
            ts: datetime!(2026-03-01 12:00:00 UTC),
            tool: "claude-code".into(),
            session: None,
            author: None,
            prompt: prompt.into(),
            files: BTreeSet::new(),
            diff_hash: None,
            intent: None,
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: skald_core::SCHEMA_VERSION,
        }
    }

    struct FixedBackend(InferredIntent);

    impl InferenceBackend for FixedBackend {
        fn infer(
            &self,
            _prompt: &str,
            _files: &BTreeSet<String>,
            _diff: Option<&str>,
        ) -> anyhow::Result<InferredIntent> {
            Ok(self.0.clone())
        }
    }

    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn infer(
            &self,
            _prompt: &str,
            _files: &BTreeSet<String>,
            _diff: Option<&str>,
        ) -> anyhow::Result<InferredIntent> {
            anyhow::bail!("model unavailable")
        }
    }

    struct SlowBackend;

    impl InferenceBackend for SlowBackend {
        fn infer(
            &self,
            _prompt: &str,
            _files: &BTreeSet<String>,
            _diff: Option<&str>,
        ) -> anyhow::Result<InferredIntent> {
            std::thread::sleep(Duration::from_millis(200));
            anyhow::bail!("too late anyway")
        }
    }

    fn fixtures() -> (RuleTable, ConceptVocabulary, PipelineConfig) {
        (
            RuleTable::builtin(),
            ConceptVocabulary::builtin(),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn no_backend_returns_rule_result() {
        let (table, vocab, config) = fixtures();
        let intent =
            classify_interaction(&interaction("fix crash"), &table, &vocab, &config, None);
        assert_eq!(intent.category, IntentCategory::Bugfix);
        assert!((intent.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn backend_result_wins_when_it_answers() {
        let (table, vocab, config) = fixtures();
        let backend: Arc<dyn InferenceBackend> = Arc::new(FixedBackend(InferredIntent {
            category: IntentCategory::Security,
            confidence: 0.92,
            problem: Some("tokens leak in logs".into()),
            solution: "scrub tokens before logging".into(),
            alternatives: vec!["disable logging".into()],
            concepts: vec!["logging".into(), "security".into()],
        }));
        let intent = classify_interaction(
            &interaction("fix crash"),
            &table,
            &vocab,
            &config,
            Some(&backend),
        );
        assert_eq!(intent.category, IntentCategory::Security);
        assert!((intent.confidence - 0.92).abs() < 1e-9);
    }

    #[test]
    fn backend_confidence_is_clamped() {
        let (table, vocab, config) = fixtures();
        let backend: Arc<dyn InferenceBackend> = Arc::new(FixedBackend(InferredIntent {
            category: IntentCategory::Feature,
            confidence: 1.7,
            problem: None,
            solution: "x".into(),
            alternatives: vec![],
            concepts: vec![],
        }));
        let intent = classify_interaction(
            &interaction("add thing"),
            &table,
            &vocab,
            &config,
            Some(&backend),
        );
        assert!((intent.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn backend_error_falls_back_with_discount() {
        let (table, vocab, config) = fixtures();
        let backend: Arc<dyn InferenceBackend> = Arc::new(FailingBackend);
        let intent = classify_interaction(
            &interaction("fix crash"),
            &table,
            &vocab,
            &config,
            Some(&backend),
        );
        assert_eq!(intent.category, IntentCategory::Bugfix);
        // 0.7 rule confidence minus the 0.1 discount.
        assert!((intent.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn backend_timeout_falls_back_with_discount() {
        let (table, vocab, mut config) = fixtures();
        config.inference_timeout_ms = 20;
        let backend: Arc<dyn InferenceBackend> = Arc::new(SlowBackend);
        let intent = classify_interaction(
            &interaction("fix crash"),
            &table,
            &vocab,
            &config,
            Some(&backend),
        );
        assert_eq!(intent.category, IntentCategory::Bugfix);
        assert!((intent.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn discount_floors_at_zero() {
        let result = discounted(
            InferredIntent {
                category: IntentCategory::Feature,
                confidence: 0.05,
                problem: None,
                solution: "x".into(),
                alternatives: vec![],
                concepts: vec![],
            },
            0.1,
        );
        assert_eq!(result.confidence, 0.0);
    }
}
