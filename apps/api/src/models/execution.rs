use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Error,
}

/// Audit row for one agent invocation. Written `Pending`, then updated
/// exactly once to `Success` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentExecution {
    pub user_id: String,
    pub agent_name: String,
    pub trigger_type: String,
    pub input_data: Value,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub executed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl AgentExecution {
    pub fn pending(
        user_id: &str,
        agent_name: &str,
        trigger_type: &str,
        input_data: Value,
        executed_at: String,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            agent_name: agent_name.to_string(),
            trigger_type: trigger_type.to_string(),
            input_data,
            status: ExecutionStatus::Pending,
            output_data: None,
            error_message: None,
            executed_at,
            execution_time_ms: None,
        }
    }
}
