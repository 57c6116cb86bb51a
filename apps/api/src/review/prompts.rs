// All LLM prompt constants for the review module.

/// System prompt for resume feedback — enforces JSON-only output.
pub const FEEDBACK_SYSTEM: &str =
    "You are an expert in ATS (Applicant Tracking Systems) and resume review. \
    Analyze the attached resume image against the target role. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Be thorough and honest; low scores are acceptable when deserved.";

/// Feedback prompt template. Replace `{job_title}` and `{job_description}`
/// before sending.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Review the attached resume for the role below and rate it.

Return a JSON object with this EXACT schema (no extra fields):
{
  "overallScore": 0,
  "ATS": {
    "score": 0,
    "tips": [{"type": "good", "tip": "short headline"}]
  },
  "toneAndStyle": {
    "score": 0,
    "tips": [{"type": "improve", "tip": "short headline", "explanation": "detailed advice"}]
  },
  "content": {"score": 0, "tips": []},
  "structure": {"score": 0, "tips": []},
  "skills": {"score": 0, "tips": []}
}

Rules:
- Every score is an integer from 0 to 100.
- Each "type" is "good" or "improve".
- Give 3 to 4 tips per section, mixing praise and fixes where honest.
- ATS tips are short headlines only; every other section also carries an
  "explanation" with concrete advice.
- Judge against the job description when it is specific; otherwise judge the
  resume on its own merits.

JOB TITLE:
{job_title}

JOB DESCRIPTION:
{job_description}"#;
