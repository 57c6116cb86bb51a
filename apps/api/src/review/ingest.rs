//! The ingestion pipeline: validated submission in, persisted review out.
//!
//! Stages run strictly in sequence and short-circuit on the first failure.
//! There is no rollback: a failed run may leave an orphaned blob or a
//! checkpoint record with empty feedback, both of which are valid states on
//! the presentation side.

use std::fmt;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::feedback::{parse_feedback, Feedback};
use crate::models::record::{encode, record_key, ResumeRecord};
use crate::render::{PreviewRenderer, RenderError, RenderSource};
use crate::review::analyzer::{AnalyzeError, JobContext, ResumeAnalyzer};
use crate::review::validation::Submission;
use crate::store::{BlobError, BlobStore, RecordStore, StoreError};

/// Cosmetic delay the client applies before navigating to the review.
pub const REDIRECT_DELAY_MS: u64 = 1000;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Uploading,
    Converting,
    UploadingImage,
    Persisting,
    Analyzing,
    Finalizing,
}

impl IngestStage {
    /// Human-readable status text, paired with the machine state.
    pub fn describe(&self) -> &'static str {
        match self {
            IngestStage::Uploading => "Uploading the resume",
            IngestStage::Converting => "Rendering the preview image",
            IngestStage::UploadingImage => "Uploading the preview image",
            IngestStage::Persisting => "Saving the review record",
            IngestStage::Analyzing => "Analyzing the resume",
            IngestStage::Finalizing => "Saving the feedback",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One variant per stage; the pipeline stops at whichever fires first.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("resume upload failed: {0}")]
    Upload(BlobError),
    #[error("preview conversion failed: {0}")]
    Convert(RenderError),
    #[error("preview upload failed: {0}")]
    UploadImage(BlobError),
    #[error("checkpoint write failed: {0}")]
    Persist(StoreError),
    #[error("analysis failed: {0}")]
    Analyze(AnalyzeError),
    #[error("feedback write failed: {0}")]
    Finalize(StoreError),
}

impl IngestError {
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::Upload(_) => IngestStage::Uploading,
            IngestError::Convert(_) => IngestStage::Converting,
            IngestError::UploadImage(_) => IngestStage::UploadingImage,
            IngestError::Persist(_) => IngestStage::Persisting,
            IngestError::Analyze(_) => IngestStage::Analyzing,
            IngestError::Finalize(_) => IngestStage::Finalizing,
        }
    }
}

/// External capabilities the pipeline runs against.
pub struct IngestContext<'a> {
    pub blobs: &'a dyn BlobStore,
    pub records: &'a dyn RecordStore,
    pub renderer: &'a dyn PreviewRenderer,
    pub analyzer: &'a dyn ResumeAnalyzer,
}

#[derive(Debug)]
pub struct IngestReceipt {
    pub id: String,
    pub redirect: String,
}

/// Runs the full pipeline for one validated submission. The record id is
/// generated once here and never recomputed; blob references are fixed at
/// the checkpoint and never rewritten.
pub async fn run(
    ctx: &IngestContext<'_>,
    submission: Submission,
) -> Result<IngestReceipt, IngestError> {
    let id = Uuid::new_v4().to_string();

    info!("ingest {id}: {}", IngestStage::Uploading);
    let resume_path = format!("resumes/{id}/{}", submission.file_name);
    ctx.blobs
        .put(&resume_path, submission.bytes.clone(), "application/pdf")
        .await
        .map_err(IngestError::Upload)?;

    info!("ingest {id}: {}", IngestStage::Converting);
    let preview = ctx
        .renderer
        .render_first_page(RenderSource {
            file_name: submission.file_name.clone(),
            content_type: submission.content_type.clone(),
            bytes: submission.bytes,
        })
        .await
        .map_err(IngestError::Convert)?;

    info!(
        "ingest {id}: {} ({}x{} px)",
        IngestStage::UploadingImage,
        preview.width,
        preview.height
    );
    let image_path = format!("resumes/{id}/{}", preview.file_name);
    ctx.blobs
        .put(&image_path, preview.bytes, "image/jpeg")
        .await
        .map_err(IngestError::UploadImage)?;

    // Checkpoint: the record becomes readable before the slow analysis call,
    // with empty feedback meaning "processing".
    info!("ingest {id}: {}", IngestStage::Persisting);
    let mut record = ResumeRecord {
        id: id.clone(),
        resume_path,
        image_path,
        company_name: submission.company_name,
        job_title: submission.job_title,
        job_description: submission.job_description,
        feedback: Feedback::pending(),
    };
    let key = record_key(&record.id);
    ctx.records
        .set(&key, &encode(&record))
        .await
        .map_err(IngestError::Persist)?;

    info!("ingest {id}: {}", IngestStage::Analyzing);
    let job = JobContext {
        job_title: record.job_title.clone(),
        job_description: record.job_description.clone(),
    };
    let raw = ctx
        .analyzer
        .review(&record.image_path, &job)
        .await
        .map_err(IngestError::Analyze)?;

    // An unparseable response is stored as raw text rather than failing the
    // run this late.
    info!("ingest {id}: {}", IngestStage::Finalizing);
    record.feedback = parse_feedback(&raw);
    ctx.records
        .set(&key, &encode(&record))
        .await
        .map_err(IngestError::Finalize)?;

    info!("ingest {id}: complete");
    Ok(IngestReceipt {
        redirect: format!("/resume/{id}"),
        id,
    })
}
