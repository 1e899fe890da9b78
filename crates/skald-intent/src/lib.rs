pub mod backend;
pub mod classify;
pub mod rules;
pub mod vocab;

pub use backend::{classify_interaction, InferenceBackend};
pub use classify::classify_rules;
pub use rules::{IntentRule, RuleTable};
pub use vocab::{ConceptEntry, ConceptVocabulary};
