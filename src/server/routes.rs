//! REST endpoints for document processing.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classifier::types::is_blank;
use crate::classifier::{Classifier, DocumentType};
use crate::ocr::TextExtractor;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn new(classifier: Arc<Classifier>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            classifier,
            extractor,
        }
    }
}

/// Response body for a processed document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub extracted_text: String,
    pub document_type: DocumentType,
    pub confidence: f64,
}

/// Build the router with health and processing routes.
pub fn document_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/process", post(process_document))
        .fallback(not_found)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "ml-service"
    }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found")
}

// ── Processing ──────────────────────────────────────────────────────────

/// POST /api/process
///
/// Multipart upload with a `file` part: OCR the image, classify the text,
/// return `{extractedText, documentType, confidence}`.
async fn process_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            error!(%request_id, error = %e, "No file in request");
            return error_response(StatusCode::BAD_REQUEST, "No file provided");
        }
    };

    // Find the `file` upload. Parts without a filename are plain form
    // fields, not files, and are skipped like any other field.
    let upload = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                match field.bytes().await {
                    Ok(bytes) => break Some((filename, bytes)),
                    Err(e) => {
                        warn!(%request_id, error = %e, "Failed to read uploaded file");
                        return error_response(
                            e.status(),
                            format!("Invalid upload: {}", e.body_text()),
                        );
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break None,
            Err(e) => {
                warn!(%request_id, error = %e, "Malformed multipart body");
                return error_response(
                    e.status(),
                    format!("Invalid upload: {}", e.body_text()),
                );
            }
        }
    };

    let Some((filename, bytes)) = upload else {
        error!(%request_id, "No file in request");
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    if filename.is_empty() {
        error!(%request_id, "Empty filename");
        return error_response(StatusCode::BAD_REQUEST, "Empty filename");
    }

    info!(%request_id, filename = %filename, bytes = bytes.len(), "Processing file");

    let extracted_text = match state.extractor.extract(&bytes).await {
        Ok(text) if is_blank(&text) => {
            warn!(%request_id, "No text extracted from image");
            String::new()
        }
        Ok(text) => text,
        Err(e) => {
            error!(
                %request_id,
                extractor = state.extractor.name(),
                error = %e,
                "Error processing document"
            );
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing failed: {e}"),
            );
        }
    };

    info!(%request_id, chars = extracted_text.chars().count(), "Extracted text");

    let result = state.classifier.classify_document(&extracted_text);

    info!(
        %request_id,
        document_type = %result.document_type,
        confidence = result.confidence,
        "Classification result"
    );

    (
        StatusCode::OK,
        Json(ProcessResponse {
            extracted_text,
            document_type: result.document_type,
            confidence: result.confidence,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::ocr::testing::EchoExtractor;

    fn app() -> Router {
        document_routes(AppState::new(
            Arc::new(Classifier::rules_only()),
            Arc::new(EchoExtractor),
        ))
    }

    const BOUNDARY: &str = "docclass-test-boundary";

    fn multipart_request(name: &str, filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/process")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "ml-service");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn process_classifies_extracted_text() {
        let response = app()
            .oneshot(multipart_request("file", "scan.png", "SOPIMUS Allekirjoitus"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["extractedText"], "SOPIMUS Allekirjoitus");
        assert_eq!(json["documentType"], "CONTRACT");
        assert_eq!(json["confidence"], 0.8);
    }

    #[tokio::test]
    async fn process_blank_text_is_unknown() {
        let response = app()
            .oneshot(multipart_request("file", "blank.png", "   "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["extractedText"], "");
        assert_eq!(json["documentType"], "UNKNOWN");
        assert_eq!(json["confidence"], 0.0);
    }

    #[tokio::test]
    async fn process_without_file_part() {
        let response = app()
            .oneshot(multipart_request("attachment", "scan.png", "lasku"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn process_with_empty_filename() {
        let response = app()
            .oneshot(multipart_request("file", "", "lasku"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Empty filename");
    }

    #[tokio::test]
    async fn process_non_multipart_request() {
        let request = Request::post("/api/process")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn process_file_field_without_filename() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"\r\n\r\n\
             lasku\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::post("/api/process")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn process_skips_plain_file_field_before_upload() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"\r\n\r\n\
             not an upload\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"kuitti.png\"\r\n\r\n\
             KUITTI Kassa\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::post("/api/process")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["extractedText"], "KUITTI Kassa");
        assert_eq!(json["documentType"], "RECEIPT");
    }
}
