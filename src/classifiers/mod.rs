pub mod classifier;
pub mod examples;
#[cfg(feature = "intent-model")]
pub mod model;
pub mod rules;

pub use classifier::StructuralIntentClassifier;
pub use examples::{EDGE_BASE_CLASS, EDGE_CALLS, IntentLabel, QueryIntent, STRUCTURAL_INTENT_EXAMPLES};
#[cfg(feature = "intent-model")]
pub use model::TrainedIntentModel;
pub use rules::classify_with_rules;
