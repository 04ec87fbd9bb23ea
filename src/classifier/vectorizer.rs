//! TF-IDF vectorizer for text feature extraction.
//!
//! Inference-only: vocabulary and IDF weights come from a trained artifact.
//! Tokens are runs of two or more word characters, optionally lowercased,
//! with stop words removed before word n-grams are built.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Token pattern: two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Row normalization applied after IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

/// Serialized vectorizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    /// Term → column index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    /// Inclusive word n-gram range.
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub norm: Norm,
    #[serde(default)]
    pub sublinear_tf: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// TF-IDF vectorizer.
pub struct TfIdfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    lowercase: bool,
    stop_words: HashSet<String>,
    norm: Norm,
    sublinear_tf: bool,
    token_pattern: Regex,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("ngram_range", &self.ngram_range)
            .field("stop_words", &self.stop_words.len())
            .field("norm", &self.norm)
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Build a vectorizer from its artifact, validating the shape.
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, ModelError> {
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::InvalidArtifact {
                reason: format!("invalid ngram_range ({min_n}, {max_n})"),
            });
        }
        if artifact.vocabulary.len() != artifact.idf.len() {
            return Err(ModelError::InvalidArtifact {
                reason: format!(
                    "vocabulary has {} terms but idf has {} weights",
                    artifact.vocabulary.len(),
                    artifact.idf.len()
                ),
            });
        }
        if let Some((term, idx)) = artifact
            .vocabulary
            .iter()
            .find(|(_, idx)| **idx >= artifact.idf.len())
        {
            return Err(ModelError::InvalidArtifact {
                reason: format!("term {term:?} maps to out-of-range column {idx}"),
            });
        }
        if artifact.idf.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::InvalidArtifact {
                reason: "idf contains non-finite weights".to_string(),
            });
        }

        let token_pattern = Regex::new(TOKEN_PATTERN).map_err(|e| ModelError::InvalidArtifact {
            reason: format!("token pattern: {e}"),
        })?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            lowercase: artifact.lowercase,
            stop_words: artifact.stop_words.into_iter().collect(),
            norm: artifact.norm,
            sublinear_tf: artifact.sublinear_tf,
            token_pattern,
        })
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Split a document into word tokens, dropping stop words.
    fn tokenize(&self, document: &str) -> Vec<String> {
        let text = if self.lowercase {
            document.to_lowercase()
        } else {
            document.to_string()
        };
        self.token_pattern
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .filter(|t| !self.stop_words.contains(t))
            .collect()
    }

    /// Word n-grams within the configured range, joined by single spaces.
    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    /// Transform a document into a TF-IDF feature vector.
    ///
    /// Terms outside the vocabulary are ignored; a document with no known
    /// terms yields the zero vector.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let tokens = self.tokenize(document);
        let mut features = vec![0.0f64; self.vocabulary.len()];

        for gram in self.ngrams(&tokens) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                features[idx] += 1.0;
            }
        }

        for (idx, value) in features.iter_mut().enumerate() {
            if *value == 0.0 {
                continue;
            }
            if self.sublinear_tf {
                *value = value.ln() + 1.0;
            }
            *value *= self.idf[idx];
        }

        if self.norm == Norm::L2 {
            let magnitude = features.iter().map(|x| x * x).sum::<f64>().sqrt();
            if magnitude > 0.0 {
                for value in &mut features {
                    *value /= magnitude;
                }
            }
        }

        features
    }
}
