//! Classification dispatcher — the single entry point for callers.
//!
//! Flow per call:
//! 1. Blank text → `Unknown` / 0.0, nothing else runs
//! 2. Model loaded → ask the predictor
//! 3. No model, or the predictor failed → keyword rules
//!
//! **Never returns an error.** Predictor failures (including panics) are
//! logged and absorbed by falling back to the rules.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::model::{ModelHandle, Predictor, PredictorOutcome};
use super::rules::RuleEngine;
use super::types::{ClassificationResult, is_blank};
use crate::error::ModelError;

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Input was blank; no classifier ran.
    Empty,
    /// The statistical model answered.
    Model,
    /// No model is loaded; the rules answered.
    Rules,
    /// The model failed; the rules answered instead.
    Fallback,
}

impl Route {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Model => "model",
            Self::Rules => "rules",
            Self::Fallback => "fallback",
        }
    }
}

/// Two-tier document classifier.
///
/// Holds an optional model and the rule engine, both read-only, so one
/// instance can be shared across threads behind an `Arc`.
pub struct Classifier {
    model: ModelHandle,
    rules: RuleEngine,
}

impl Classifier {
    /// Create a classifier from an optional model and a rule engine.
    pub fn new(model: ModelHandle, rules: RuleEngine) -> Self {
        Self { model, rules }
    }

    /// Rules-only classifier over the built-in keywords.
    pub fn rules_only() -> Self {
        Self::new(None, RuleEngine::default_rules())
    }

    /// Classifier preferring `model`, with the built-in rules as fallback.
    pub fn with_model(model: Arc<dyn Predictor>) -> Self {
        Self::new(Some(model), RuleEngine::default_rules())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Classify extracted document text.
    pub fn classify_document(&self, text: &str) -> ClassificationResult {
        self.classify_with_route(text).0
    }

    /// Classify and report which path produced the answer.
    pub fn classify_with_route(&self, text: &str) -> (ClassificationResult, Route) {
        if is_blank(text) {
            return (ClassificationResult::unknown(), Route::Empty);
        }

        let (result, route) = match &self.model {
            Some(model) => match invoke_predictor(model.as_ref(), text) {
                PredictorOutcome::Prediction(result) => (result, Route::Model),
                PredictorOutcome::Failure(e) => {
                    warn!(
                        predictor = model.name(),
                        error = %e,
                        "Model classification failed, falling back to rules"
                    );
                    (self.rules.score_and_classify(text), Route::Fallback)
                }
            },
            None => (self.rules.score_and_classify(text), Route::Rules),
        };

        info!(
            route = route.label(),
            document_type = %result.document_type,
            confidence = result.confidence,
            "Document classified"
        );
        (result, route)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::rules_only()
    }
}

/// Run the predictor, turning a panic into a `Failure`.
fn invoke_predictor(model: &dyn Predictor, text: &str) -> PredictorOutcome {
    match catch_unwind(AssertUnwindSafe(|| model.predict(text))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            error!(predictor = model.name(), reason = %reason, "Predictor panicked");
            PredictorOutcome::Failure(ModelError::Panicked { reason })
        }
    }
}
