//! Shared types for document classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ── Document type ───────────────────────────────────────────────────

/// Classification output category.
///
/// `Unknown` is reserved for empty or unusable input; `Other` is for text
/// that was readable but matched no known category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Contract,
    Receipt,
    IdDocument,
    Other,
    Unknown,
}

impl DocumentType {
    /// Categories the keyword rules score, in tie-break priority order.
    pub const SCORED: [DocumentType; 4] = [
        DocumentType::Invoice,
        DocumentType::Contract,
        DocumentType::Receipt,
        DocumentType::IdDocument,
    ];

    /// Wire label (e.g. `"ID_DOCUMENT"`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::Contract => "CONTRACT",
            Self::Receipt => "RECEIPT",
            Self::IdDocument => "ID_DOCUMENT",
            Self::Other => "OTHER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVOICE" => Ok(Self::Invoice),
            "CONTRACT" => Ok(Self::Contract),
            "RECEIPT" => Ok(Self::Receipt),
            "ID_DOCUMENT" => Ok(Self::IdDocument),
            "OTHER" => Ok(Self::Other),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(ModelError::UnknownLabel {
                label: other.to_string(),
            }),
        }
    }
}

// ── Classification result ───────────────────────────────────────────

/// A document type with the classifier's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub document_type: DocumentType,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(document_type: DocumentType, confidence: f64) -> Self {
        Self {
            document_type,
            confidence,
        }
    }

    /// Result for empty or whitespace-only input.
    pub fn unknown() -> Self {
        Self::new(DocumentType::Unknown, 0.0)
    }
}

/// Round a confidence to two decimal places.
///
/// Rounds the exact decimal value of `value`, with exact ties going to
/// even. A scaled product that only looks like a tie after float rounding
/// (0.015 is stored just below 0.015) is resolved by the product's error.
pub fn round_confidence(value: f64) -> f64 {
    let scaled = value * 100.0;
    if (scaled - scaled.trunc()).abs() != 0.5 {
        return scaled.round() / 100.0;
    }
    let error = value.mul_add(100.0, -scaled);
    let rounded = if error > 0.0 {
        scaled.ceil()
    } else if error < 0.0 {
        scaled.floor()
    } else {
        scaled.round_ties_even()
    };
    rounded / 100.0
}

/// True when the text carries nothing to classify.
///
/// OCR output can contain the ASCII information separators (U+001C to
/// U+001F) as layout markers; they count as blank along with Unicode
/// whitespace.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(is_blank_char)
}

fn is_blank_char(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
