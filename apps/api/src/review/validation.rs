use thiserror::Error;

/// Upper bound on an uploaded resume.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A review submission as received from the multipart form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a resume file is required")]
    MissingFile,
    #[error("resume must be a PDF")]
    NotAPdf,
    #[error("resume exceeds the {} MiB limit", MAX_RESUME_BYTES / (1024 * 1024))]
    FileTooLarge,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Pre-flight checks. A submission that fails here never starts the
/// pipeline and causes no external call.
pub fn validate(submission: &Submission) -> Result<(), ValidationError> {
    if submission.bytes.is_empty() {
        return Err(ValidationError::MissingFile);
    }
    if submission.content_type != PDF_CONTENT_TYPE {
        return Err(ValidationError::NotAPdf);
    }
    if submission.bytes.len() > MAX_RESUME_BYTES {
        return Err(ValidationError::FileTooLarge);
    }
    for (field, value) in [
        ("company name", &submission.company_name),
        ("job title", &submission.job_title),
        ("job description", &submission.job_description),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField(field));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> Submission {
        Submission {
            file_name: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![0u8; 1024],
            company_name: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            job_description: "Build the platform".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert_eq!(validate(&valid_submission()), Ok(()));
    }

    #[test]
    fn test_missing_file_rejected() {
        let mut s = valid_submission();
        s.bytes.clear();
        assert_eq!(validate(&s), Err(ValidationError::MissingFile));
    }

    #[test]
    fn test_non_pdf_rejected() {
        let mut s = valid_submission();
        s.content_type = "image/png".to_string();
        assert_eq!(validate(&s), Err(ValidationError::NotAPdf));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let mut s = valid_submission();
        s.bytes = vec![0u8; MAX_RESUME_BYTES + 1];
        assert_eq!(validate(&s), Err(ValidationError::FileTooLarge));
    }

    #[test]
    fn test_file_at_limit_passes() {
        let mut s = valid_submission();
        s.bytes = vec![0u8; MAX_RESUME_BYTES];
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn test_whitespace_only_fields_rejected() {
        for field in ["company_name", "job_title", "job_description"] {
            let mut s = valid_submission();
            match field {
                "company_name" => s.company_name = "   ".to_string(),
                "job_title" => s.job_title = "\t".to_string(),
                _ => s.job_description = String::new(),
            }
            assert!(
                matches!(validate(&s), Err(ValidationError::EmptyField(_))),
                "{field} should be rejected"
            );
        }
    }
}
