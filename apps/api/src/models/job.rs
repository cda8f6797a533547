use serde::{Deserialize, Serialize};

pub const NEW_STATUS: &str = "new";
pub const DEFAULT_RELEVANCE: f64 = 0.8;
pub const DEFAULT_MATCH_REASON: &str = "Skills match";

/// A job surfaced for a user. Only `status` changes after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub user_id: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub relevance_score: f64,
    pub match_reason: String,
    pub status: String,
    pub matched_at: String,
}
