use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::llm_client::{LlmClient, LlmError, RequestBlock};
use crate::review::prompts::{FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_SYSTEM};
use crate::store::{BlobError, BlobStore};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("could not read the document: {0}")]
    Blob(#[from] BlobError),
    #[error("inference call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("inference returned no content")]
    EmptyContent,
}

/// Job context the feedback prompt is built from.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_title: String,
    pub job_description: String,
}

/// External AI capability: a stored document reference plus job context in,
/// feedback text out.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn review(&self, image_ref: &str, job: &JobContext) -> Result<String, AnalyzeError>;
}

/// Analyzer backed by the Claude vision API. Reads the rendered preview from
/// the blob tier and submits it alongside the feedback prompt.
pub struct ClaudeAnalyzer {
    llm: LlmClient,
    blobs: Arc<dyn BlobStore>,
}

impl ClaudeAnalyzer {
    pub fn new(llm: LlmClient, blobs: Arc<dyn BlobStore>) -> Self {
        Self { llm, blobs }
    }
}

#[async_trait]
impl ResumeAnalyzer for ClaudeAnalyzer {
    async fn review(&self, image_ref: &str, job: &JobContext) -> Result<String, AnalyzeError> {
        let image = self.blobs.get(image_ref).await?;
        let encoded = STANDARD.encode(&image);

        let prompt = FEEDBACK_PROMPT_TEMPLATE
            .replace("{job_title}", &job.job_title)
            .replace("{job_description}", &job.job_description);

        let content = [
            RequestBlock::base64_image("image/jpeg", &encoded),
            RequestBlock::text(&prompt),
        ];
        let response = self.llm.call(&content, FEEDBACK_SYSTEM).await?;

        response
            .content
            .text()
            .map(str::to_string)
            .ok_or(AnalyzeError::EmptyContent)
    }
}
