//! The presentation pipeline: record id in, hydrated review out.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::record::{decode, record_key, DecodeError, ResumeRecord};
use crate::store::{BlobStore, RecordStore, StoreError};

/// Lifetime of the transient URLs handed to the client.
pub const RESOURCE_URL_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no review found for '{0}'")]
    NotFound(String),
    #[error("record read failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Corrupt(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Ready,
    Processing,
}

/// A hydrated review: the record plus whichever resources resolved.
#[derive(Debug)]
pub struct ReviewView {
    pub record: ResumeRecord,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    pub status: ReviewStatus,
}

pub async fn load_review(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    id: &str,
) -> Result<ReviewView, LoadError> {
    let stored = records
        .get(&record_key(id))
        .await?
        .ok_or_else(|| LoadError::NotFound(id.to_string()))?;
    let record = decode(&stored)?;

    // Each resource resolves independently; a failure degrades the display
    // without failing the load.
    let resume_url = resolve(blobs, &record.resume_path).await;
    let image_url = resolve(blobs, &record.image_path).await;

    let status = if record.feedback.is_pending() {
        ReviewStatus::Processing
    } else {
        ReviewStatus::Ready
    };

    Ok(ReviewView {
        record,
        resume_url,
        image_url,
        status,
    })
}

async fn resolve(blobs: &dyn BlobStore, path: &str) -> Option<String> {
    match blobs.presign_get(path, RESOURCE_URL_TTL).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("could not resolve blob '{path}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::models::feedback::{Feedback, Tip};
    use crate::store::BlobError;

    struct MemoryRecords {
        map: HashMap<String, String>,
    }

    #[async_trait]
    impl RecordStore for MemoryRecords {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.map.get(key).cloned())
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            unimplemented!("not used by presentation")
        }
    }

    struct FakeBlobs {
        fail: bool,
    }

    #[async_trait]
    impl BlobStore for FakeBlobs {
        async fn put(&self, _key: &str, _bytes: Vec<u8>, _ct: &str) -> Result<(), BlobError> {
            unimplemented!("not used by presentation")
        }

        async fn get(&self, _key: &str) -> Result<Vec<u8>, BlobError> {
            unimplemented!("not used by presentation")
        }

        async fn presign_get(&self, key: &str, _ttl: Duration) -> Result<String, BlobError> {
            if self.fail {
                return Err(BlobError::Presign {
                    key: key.to_string(),
                    detail: "unavailable".to_string(),
                });
            }
            Ok(format!("https://blobs.example/{key}?sig=abc"))
        }
    }

    const EXAMPLE: &str = r#"{
        "id": "abc123",
        "resumePath": "r1",
        "imagePath": "i1",
        "companyName": "Acme",
        "jobTitle": "Engineer",
        "jobDescription": "...",
        "feedback": {"ATS": {"score": 82, "tips": ["Add metrics"]}}
    }"#;

    fn records_with(value: &str) -> MemoryRecords {
        MemoryRecords {
            map: HashMap::from([(record_key("abc123"), value.to_string())]),
        }
    }

    #[tokio::test]
    async fn test_missing_record_reports_not_found() {
        let records = MemoryRecords {
            map: HashMap::new(),
        };
        let err = load_review(&records, &FakeBlobs { fail: false }, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_example_record_hydrates_fully() {
        let records = records_with(EXAMPLE);
        let view = load_review(&records, &FakeBlobs { fail: false }, "abc123")
            .await
            .unwrap();

        assert_eq!(view.status, ReviewStatus::Ready);
        assert_eq!(view.resume_url.as_deref(), Some("https://blobs.example/r1?sig=abc"));
        assert_eq!(view.image_url.as_deref(), Some("https://blobs.example/i1?sig=abc"));

        let Feedback::Structured(feedback) = &view.record.feedback else {
            panic!("expected structured feedback");
        };
        let ats = feedback.ats.as_ref().unwrap();
        assert_eq!(ats.score, 82.0);
        assert_eq!(ats.tips, vec![Tip::Note("Add metrics".to_string())]);
    }

    #[tokio::test]
    async fn test_pending_feedback_reports_processing() {
        let stored = r#"{"id":"abc123","resumePath":"r1","imagePath":"i1","companyName":"Acme","jobTitle":"Engineer","jobDescription":"...","feedback":""}"#;
        let records = records_with(stored);
        let view = load_review(&records, &FakeBlobs { fail: false }, "abc123")
            .await
            .unwrap();
        assert_eq!(view.status, ReviewStatus::Processing);
    }

    #[tokio::test]
    async fn test_resolution_failure_degrades_not_fails() {
        let records = records_with(EXAMPLE);
        let view = load_review(&records, &FakeBlobs { fail: true }, "abc123")
            .await
            .unwrap();
        assert_eq!(view.resume_url, None);
        assert_eq!(view.image_url, None);
        assert_eq!(view.status, ReviewStatus::Ready);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_hard_error() {
        let records = records_with("definitely not json");
        let err = load_review(&records, &FakeBlobs { fail: false }, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(_)));
    }
}
