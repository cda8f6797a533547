use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only; the newest by `generated_at` is the current analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub user_id: String,
    pub resume_text: String,
    pub target_role: String,
    pub ats_score: Value,
    pub analysis_content: Value,
    pub recommendations: Value,
    pub generated_at: String,
}
