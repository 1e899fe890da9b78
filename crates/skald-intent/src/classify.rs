use crate::rules::RuleTable;
use crate::vocab::ConceptVocabulary;
use skald_core::config::PipelineConfig;
use skald_core::{InferredIntent, Interaction, IntentCategory};

/// Rule-based classification: a pure function of the interaction's prompt
/// and file set. Deterministic and idempotent — identical input always
/// yields the identical category, confidence, and concepts.
pub fn classify_rules(
    interaction: &Interaction,
    table: &RuleTable,
    vocab: &ConceptVocabulary,
    config: &PipelineConfig,
) -> InferredIntent {
    let (category, confidence) = match table.match_prompt(&interaction.prompt) {
        Some(rule) => (rule.category, config.rule_confidence),
        None => (IntentCategory::Feature, config.fallback_confidence),
    };

    InferredIntent {
        category,
        confidence,
        problem: None,
        solution: interaction.prompt.trim().to_string(),
        alternatives: Vec::new(),
        concepts: vocab.extract(&interaction.prompt, &interaction.files),
    }
}
