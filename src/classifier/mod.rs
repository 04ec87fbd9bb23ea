//! Document classification core.
//!
//! Text flows through:
//! 1. `Classifier::classify_document()` — blank-input guard and routing
//! 2. `Predictor::predict()` — trained model, when one was loaded at startup
//! 3. `RuleEngine::score_and_classify()` — keyword scoring fallback
//!
//! Every path returns a `ClassificationResult`; none can fail.

pub mod dispatcher;
pub mod keywords;
pub mod model;
pub mod rules;
pub mod types;
pub mod vectorizer;

pub use dispatcher::{Classifier, Route};
pub use keywords::KeywordSet;
pub use model::{DocumentModel, ModelHandle, Predictor, PredictorOutcome, load_model};
pub use rules::RuleEngine;
pub use types::{ClassificationResult, DocumentType};
