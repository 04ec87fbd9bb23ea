//! Tesseract OCR extractor.
//!
//! Runs the `tesseract` CLI as a child process on a temporary copy of the
//! upload and reads the recognized text from stdout.

use std::io::Write;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::TextExtractor;
use crate::config::{DEFAULT_OCR_LANGUAGES, ServiceConfig};
use crate::error::OcrError;

/// Tesseract CLI extractor.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    binary: String,
    languages: String,
}

impl TesseractExtractor {
    /// Extractor using `tesseract` from `PATH` with Finnish + English.
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: DEFAULT_OCR_LANGUAGES.to_string(),
        }
    }

    /// Extractor using the binary and languages from service config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            binary: config.tesseract_bin.clone(),
            languages: config.ocr_languages.clone(),
        }
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn extract(&self, image: &[u8]) -> Result<String, OcrError> {
        if image.is_empty() {
            return Err(OcrError::Failed("uploaded file is empty".to_string()));
        }

        let start = Instant::now();

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(image)?;
        file.flush()?;

        let output = Command::new(&self.binary)
            .arg(file.path())
            .arg("stdout")
            .args(["-l", self.languages.as_str()])
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary
                )));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            languages = %self.languages,
            "Tesseract extraction complete"
        );
        Ok(text)
    }
}
