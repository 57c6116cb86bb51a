use serde::{Deserialize, Serialize};

use crate::llm_client::strip_json_fences;

/// Feedback as stored on a record: the empty string until analysis runs,
/// the structured shape when the AI response parses, or the raw response
/// text as a degraded fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Feedback {
    Structured(StructuredFeedback),
    Raw(String),
}

impl Feedback {
    /// Placeholder written by the checkpoint, before analysis completes.
    pub fn pending() -> Self {
        Feedback::Raw(String::new())
    }

    /// True while the record is persisted but carries no analysis yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Feedback::Raw(s) if s.trim().is_empty())
    }
}

/// The analysis result. Every subsection is optional; the AI service's
/// response contract owns the exact shape and partial responses are valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(rename = "ATS", default, skip_serializing_if = "Option::is_none")]
    pub ats: Option<FeedbackSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_and_style: Option<FeedbackSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<FeedbackSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<FeedbackSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<FeedbackSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSection {
    pub score: f64,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

/// Tips occur both as typed objects and as bare strings; stored records may
/// carry either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tip {
    Entry {
        #[serde(rename = "type")]
        kind: String,
        tip: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    Note(String),
}

/// Decodes analyzer output, degrading to the raw text when the response is
/// not the structured shape. Never fails.
pub fn parse_feedback(text: &str) -> Feedback {
    match serde_json::from_str::<StructuredFeedback>(strip_json_fences(text)) {
        Ok(parsed) => Feedback::Structured(parsed),
        Err(_) => Feedback::Raw(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feedback_structured() {
        let text = r#"{"overallScore": 70, "ATS": {"score": 82, "tips": [{"type": "improve", "tip": "Add metrics"}]}}"#;
        let Feedback::Structured(feedback) = parse_feedback(text) else {
            panic!("expected structured feedback");
        };
        assert_eq!(feedback.overall_score, Some(70.0));
        assert_eq!(feedback.ats.unwrap().score, 82.0);
    }

    #[test]
    fn test_parse_feedback_strips_code_fences() {
        let text = "```json\n{\"ATS\": {\"score\": 55, \"tips\": []}}\n```";
        let Feedback::Structured(feedback) = parse_feedback(text) else {
            panic!("expected structured feedback");
        };
        assert_eq!(feedback.ats.unwrap().score, 55.0);
    }

    #[test]
    fn test_parse_feedback_degrades_to_raw_text() {
        let text = "I'm sorry, I couldn't read that resume.";
        assert_eq!(parse_feedback(text), Feedback::Raw(text.to_string()));
    }

    #[test]
    fn test_partial_sections_are_tolerated() {
        let text = r#"{"skills": {"score": 40, "tips": ["Broaden the toolchain section"]}}"#;
        let Feedback::Structured(feedback) = parse_feedback(text) else {
            panic!("expected structured feedback");
        };
        assert!(feedback.ats.is_none());
        assert!(feedback.tone_and_style.is_none());
        assert_eq!(feedback.skills.unwrap().score, 40.0);
    }

    #[test]
    fn test_tip_decodes_from_both_shapes() {
        let tips: Vec<Tip> = serde_json::from_str(
            r#"["Add metrics", {"type": "good", "tip": "Clear layout", "explanation": "Sections are scannable"}]"#,
        )
        .unwrap();
        assert_eq!(tips[0], Tip::Note("Add metrics".to_string()));
        assert_eq!(
            tips[1],
            Tip::Entry {
                kind: "good".to_string(),
                tip: "Clear layout".to_string(),
                explanation: Some("Sections are scannable".to_string()),
            }
        );
    }

    #[test]
    fn test_pending_detection() {
        assert!(Feedback::pending().is_pending());
        assert!(Feedback::Raw("  ".to_string()).is_pending());
        assert!(!Feedback::Raw("verdict".to_string()).is_pending());
        assert!(!Feedback::Structured(StructuredFeedback::default()).is_pending());
    }
}
