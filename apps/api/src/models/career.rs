use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PLAN_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Archived,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Archived => "archived",
        }
    }
}

/// At most one plan per user is `Active`; superseded plans are archived, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPlan {
    pub user_id: String,
    pub agent_name: String,
    pub plan_content: Value,
    pub phases: Value,
    pub status: PlanStatus,
    pub generated_at: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub user_id: String,
    pub roadmap_data: Value,
    pub status: PlanStatus,
    pub created_at: String,
    pub updated_at: String,
}
