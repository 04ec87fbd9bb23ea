//! Statistical model predictor.
//!
//! Wraps a trained TF-IDF + multinomial naive Bayes pipeline loaded from a
//! JSON artifact. The artifact is read once at startup; a missing or broken
//! artifact simply means the service runs on keyword rules alone.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::types::{ClassificationResult, DocumentType, is_blank, round_confidence};
use super::vectorizer::{TfIdfVectorizer, VectorizerArtifact};
use crate::error::ModelError;

// ── Predictor seam ──────────────────────────────────────────────────

/// Outcome of asking a predictor about one text.
///
/// `Failure` means the predictor could not produce a usable answer and the
/// caller should fall back; it is distinct from a low-confidence prediction.
#[derive(Debug)]
pub enum PredictorOutcome {
    Prediction(ClassificationResult),
    Failure(ModelError),
}

/// A trained text classifier.
///
/// Implementations are shared read-only across concurrent requests.
pub trait Predictor: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Predict the document type of `text`.
    fn predict(&self, text: &str) -> PredictorOutcome;
}

/// Shared handle to a loaded predictor; `None` when no model is available.
pub type ModelHandle = Option<Arc<dyn Predictor>>;

// ── Artifact ────────────────────────────────────────────────────────

/// Serialized multinomial naive Bayes parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesArtifact {
    /// Class labels, in column order.
    pub classes: Vec<String>,
    /// Log prior per class.
    pub class_log_prior: Vec<f64>,
    /// Log probability of each feature given each class (classes × features).
    pub feature_log_prob: Vec<Vec<f64>>,
}

/// On-disk model artifact: vectorizer followed by classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub vectorizer: VectorizerArtifact,
    pub classifier: NaiveBayesArtifact,
}

// ── Model ───────────────────────────────────────────────────────────

/// TF-IDF + multinomial naive Bayes document classifier.
#[derive(Debug)]
pub struct DocumentModel {
    vectorizer: TfIdfVectorizer,
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl DocumentModel {
    /// Build a model from an artifact, validating shapes.
    ///
    /// Labels are not checked here; an unexpected label surfaces as a
    /// prediction failure only when the model actually predicts it.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let vectorizer = TfIdfVectorizer::from_artifact(artifact.vectorizer)?;
        let nb = artifact.classifier;

        if nb.classes.is_empty() {
            return Err(ModelError::InvalidArtifact {
                reason: "model has no classes".to_string(),
            });
        }
        if nb.class_log_prior.len() != nb.classes.len()
            || nb.feature_log_prob.len() != nb.classes.len()
        {
            return Err(ModelError::InvalidArtifact {
                reason: format!(
                    "{} classes but {} priors and {} likelihood rows",
                    nb.classes.len(),
                    nb.class_log_prior.len(),
                    nb.feature_log_prob.len()
                ),
            });
        }
        let width = vectorizer.vocabulary_size();
        if let Some(row) = nb.feature_log_prob.iter().position(|r| r.len() != width) {
            return Err(ModelError::InvalidArtifact {
                reason: format!(
                    "likelihood row {row} has {} columns, vocabulary has {width}",
                    nb.feature_log_prob[row].len()
                ),
            });
        }

        Ok(Self {
            vectorizer,
            classes: nb.classes,
            class_log_prior: nb.class_log_prior,
            feature_log_prob: nb.feature_log_prob,
        })
    }

    /// Parse a model from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Read and parse a model artifact file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Joint log-likelihood per class for a feature vector.
    fn joint_log_likelihood(&self, features: &[f64]) -> Vec<f64> {
        self.feature_log_prob
            .iter()
            .zip(&self.class_log_prior)
            .map(|(row, prior)| {
                row.iter()
                    .zip(features)
                    .filter(|(_, x)| **x != 0.0)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + prior
            })
            .collect()
    }

    /// Class probabilities for `text`, in `classes()` order.
    pub fn predict_proba(&self, text: &str) -> Result<Vec<f64>, ModelError> {
        let features = self.vectorizer.transform(text);
        let jll = self.joint_log_likelihood(&features);
        let probabilities = softmax(&jll);
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Numerical {
                reason: format!("non-finite class probabilities from log-likelihoods {jll:?}"),
            });
        }
        Ok(probabilities)
    }

    /// Predicted label and its probability.
    fn predict_label(&self, text: &str) -> Result<(DocumentType, f64), ModelError> {
        let probabilities = self.predict_proba(text)?;

        // First maximum wins.
        let mut best = 0;
        for (idx, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = idx;
            }
        }

        let document_type = self.classes[best].parse::<DocumentType>()?;
        Ok((document_type, probabilities[best]))
    }
}

impl Predictor for DocumentModel {
    fn name(&self) -> &str {
        "tfidf-naive-bayes"
    }

    fn predict(&self, text: &str) -> PredictorOutcome {
        if is_blank(text) {
            return PredictorOutcome::Prediction(ClassificationResult::unknown());
        }

        match self.predict_label(text) {
            Ok((document_type, probability)) => PredictorOutcome::Prediction(
                ClassificationResult::new(document_type, round_confidence(probability)),
            ),
            Err(e) => PredictorOutcome::Failure(e),
        }
    }
}

/// Normalize log-likelihoods into probabilities via log-sum-exp.
fn softmax(log_values: &[f64]) -> Vec<f64> {
    let max = log_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = log_values.iter().map(|v| (v - max).exp()).sum();
    let log_norm = max + sum.ln();
    log_values.iter().map(|v| (v - log_norm).exp()).collect()
}

/// Load the model artifact at `path`, best-effort.
///
/// A missing file is the normal "no trained model" case and is logged as a
/// warning; any other failure is logged as an error. Both yield `None`.
pub fn load_model(path: &Path) -> ModelHandle {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Model not found, using rule-based fallback"
        );
        return None;
    }

    match DocumentModel::load(path) {
        Ok(model) => {
            info!(
                path = %path.display(),
                classes = ?model.classes(),
                "Loaded classification model"
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error loading model");
            None
        }
    }
}
