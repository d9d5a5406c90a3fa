use tracing::{debug, info, warn};

use super::examples::QueryIntent;
#[cfg(feature = "intent-model")]
use super::model::TrainedIntentModel;
use super::rules::classify_with_rules;


enum IntentStrategy {
    #[cfg(feature = "intent-model")]
    Trained(TrainedIntentModel),
    KeywordRules,
}


/// Decides whether a query is about call/inheritance structure.
///
/// Built once at startup and shared (usually behind an `Arc`). When the
/// statistical model is available it answers; otherwise the keyword rule
/// table does. Callers only ever see [`classify`](Self::classify).
pub struct StructuralIntentClassifier {
    strategy: IntentStrategy,
}

impl StructuralIntentClassifier {
    pub fn new() -> Self {
        match Self::fit_model() {
            Some(strategy) => {
                info!("Structural intent classifier: trained model");
                Self { strategy }
            }
            None => {
                warn!("Intent model unavailable, structural routing uses keyword rules");
                Self::rules_only()
            }
        }
    }

    pub fn rules_only() -> Self {
        Self {
            strategy: IntentStrategy::KeywordRules,
        }
    }

    #[cfg(feature = "intent-model")]
    fn fit_model() -> Option<IntentStrategy> {
        TrainedIntentModel::fit().map(IntentStrategy::Trained)
    }

    #[cfg(not(feature = "intent-model"))]
    fn fit_model() -> Option<IntentStrategy> {
        None
    }

    /// Model answer only; `None` when no model is loaded.
    pub fn predict(&self, query: &str) -> Option<QueryIntent> {
        match &self.strategy {
            #[cfg(feature = "intent-model")]
            IntentStrategy::Trained(model) => Some(model.predict(query)),
            IntentStrategy::KeywordRules => None,
        }
    }


    pub fn classify(&self, query: &str) -> QueryIntent {
        let intent = self
            .predict(query)
            .unwrap_or_else(|| classify_with_rules(query));
        debug!(
            "Classified {:?}: structural={} edge={:?} successors={}",
            crate::safe_truncate(query, 60),
            intent.is_structural,
            intent.edge_type,
            intent.use_successors
        );
        intent
    }

    pub fn is_trained(&self) -> bool {
        !matches!(self.strategy, IntentStrategy::KeywordRules)
    }

    pub fn strategy_name(&self) -> &'static str {
        match self.strategy {
            #[cfg(feature = "intent-model")]
            IntentStrategy::Trained(_) => "trained_model",
            IntentStrategy::KeywordRules => "keyword_rules",
        }
    }
}

impl Default for StructuralIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
