//! Document classifier — OCR text to document type.

pub mod classifier;
pub mod config;
pub mod error;
pub mod ocr;
pub mod server;
