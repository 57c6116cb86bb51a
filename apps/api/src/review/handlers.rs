//! Axum route handlers for the review API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::models::record::ResumeRecord;
use crate::review::ingest::{self, IngestContext, REDIRECT_DELAY_MS};
use crate::review::loader::{load_review, ReviewStatus};
use crate::review::validation::{validate, Submission};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    pub id: String,
    pub redirect: String,
    pub redirect_after_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ReviewDetailResponse {
    pub record: ResumeRecord,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    pub status: ReviewStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/reviews
///
/// Multipart submission: `resume` (PDF file), `company_name`, `job_title`,
/// `job_description`. Validation runs before any external call; a rejected
/// submission causes no upload.
pub async fn handle_submit_review(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitReviewResponse>), AppError> {
    let submission = read_submission(multipart).await?;
    validate(&submission).map_err(|e| AppError::Validation(e.to_string()))?;

    let ctx = IngestContext {
        blobs: state.blobs.as_ref(),
        records: state.records.as_ref(),
        renderer: state.renderer.as_ref(),
        analyzer: state.analyzer.as_ref(),
    };
    let receipt = ingest::run(&ctx, submission).await.map_err(|e| {
        warn!("ingest stopped at '{}': {e}", e.stage());
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitReviewResponse {
            id: receipt.id,
            redirect: receipt.redirect,
            redirect_after_ms: REDIRECT_DELAY_MS,
        }),
    ))
}

/// GET /api/v1/reviews/:id
pub async fn handle_get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewDetailResponse>, AppError> {
    let view = load_review(state.records.as_ref(), state.blobs.as_ref(), &id).await?;
    Ok(Json(ReviewDetailResponse {
        record: view.record,
        resume_url: view.resume_url,
        image_url: view.image_url,
        status: view.status,
    }))
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut file_name = String::new();
    let mut content_type = String::new();
    let mut bytes = Vec::new();
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "resume" => {
                file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                content_type = field.content_type().unwrap_or_default().to_string();
                bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read file field: {e}")))?
                    .to_vec();
            }
            "company_name" => company_name = read_text(field).await?,
            "job_title" => job_title = read_text(field).await?,
            "job_description" => job_description = read_text(field).await?,
            _ => {}
        }
    }

    Ok(Submission {
        file_name,
        content_type,
        bytes,
        company_name,
        job_title,
        job_description,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("could not read text field: {e}")))
}
