use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::feedback::Feedback;

/// Fixed namespace joined with the record id to form the stored key.
pub const RECORD_KEY_PREFIX: &str = "resume:";

/// The persisted unit of state: job context, blob references, and feedback.
///
/// Serialized with camelCase keys; this shape is the stored value layout and
/// must not drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: Feedback,
}

/// A stored value that does not decode is a hard read error; there is no
/// partial-decode recovery.
#[derive(Debug, Error)]
#[error("malformed resume record: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

pub fn record_key(id: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

pub fn encode(record: &ResumeRecord) -> String {
    serde_json::to_string(record).expect("resume record serialization is infallible")
}

pub fn decode(value: &str) -> Result<ResumeRecord, DecodeError> {
    Ok(serde_json::from_str(value)?)
}
