use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use doc_classifier::classifier::{Classifier, RuleEngine, load_model};
use doc_classifier::config::ServiceConfig;
use doc_classifier::ocr::{TesseractExtractor, TextExtractor};
use doc_classifier::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid service configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config);

    eprintln!("📄 Document classifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://{}", config.bind_addr());
    eprintln!("   Model path: {}", config.model_path.display());
    eprintln!("   OCR languages: {}", config.ocr_languages);

    run(&config).await?;
    Ok(())
}

async fn run(config: &ServiceConfig) -> doc_classifier::error::Result<()> {
    // ── Classifier ──────────────────────────────────────────────────────
    // Loaded once; a missing model is normal and leaves us on rules.
    let model = load_model(&config.model_path);
    eprintln!(
        "   Classifier: {}",
        if model.is_some() {
            "trained model (rules fallback)"
        } else {
            "keyword rules"
        }
    );
    let classifier = Arc::new(Classifier::new(model, RuleEngine::default_rules()));

    // ── OCR ─────────────────────────────────────────────────────────────
    let extractor: Arc<dyn TextExtractor> = Arc::new(TesseractExtractor::from_config(config));

    // ── HTTP ────────────────────────────────────────────────────────────
    let app = server::build_app(AppState::new(classifier, extractor), config);
    server::serve(app, config).await?;

    Ok(())
}

/// Install the tracing subscriber: stderr always, plus a daily rolling file
/// when `DOCCLASS_LOG_DIR` is set.
fn init_tracing(config: &ServiceConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "doc-classifier.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}
