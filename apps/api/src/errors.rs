#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::record::DecodeError;
use crate::render::RenderError;
use crate::review::ingest::IngestError;
use crate::review::loader::LoadError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized { next: String },

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Conversion error: {0}")]
    Conversion(#[from] RenderError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(#[from] DecodeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let message = err.to_string();
        match err {
            IngestError::Upload(_) | IngestError::UploadImage(_) => AppError::Upload(message),
            IngestError::Convert(e) => AppError::Conversion(e),
            IngestError::Persist(_) | IngestError::Finalize(_) => AppError::Storage(message),
            IngestError::Analyze(_) => AppError::Analysis(message),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(id) => AppError::NotFound(format!("No review found for '{id}'")),
            LoadError::Store(e) => AppError::Storage(e.to_string()),
            LoadError::Corrupt(e) => AppError::CorruptRecord(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized { .. } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Upload(msg) => {
                tracing::error!("Upload error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPLOAD_ERROR",
                    "Could not store the resume".to_string(),
                )
            }
            AppError::Conversion(e) => match e {
                RenderError::InvalidInput(_) | RenderError::EncryptedDocument => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "CONVERSION_ERROR",
                    e.to_string(),
                ),
                _ => {
                    tracing::error!("Conversion error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONVERSION_ERROR",
                        "Could not render the resume preview".to_string(),
                    )
                }
            },
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::CorruptRecord(e) => {
                tracing::error!("Corrupt record: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DECODE_ERROR",
                    "Stored review record is corrupted".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if let AppError::Unauthorized { next } = &self {
            body["redirect"] = json!(format!("/auth?next={next}"));
        }

        (status, Json(body)).into_response()
    }
}
