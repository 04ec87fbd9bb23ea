//! Text extraction from uploaded document images.
//!
//! The classifier only ever sees text; this module is the seam between
//! image bytes and that text.

pub mod tesseract;

pub use tesseract::TesseractExtractor;

use async_trait::async_trait;

use crate::error::OcrError;

/// Turns raw image bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extractor name (e.g. "tesseract").
    fn name(&self) -> &str;

    /// Extract all readable text from an image.
    ///
    /// An image with no readable text yields `Ok` with an empty or
    /// whitespace-only string, not an error.
    async fn extract(&self, image: &[u8]) -> Result<String, OcrError>;
}
