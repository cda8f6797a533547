//! Axum route handlers that start agent runs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::agents::kind::AgentKind;
use crate::agents::trigger::{AgentTriggerService, DEFAULT_TRIGGER_TYPE};
use crate::auth::{resolve_user_id, AuthUser};
use crate::errors::AppError;
use crate::models::profile::UserProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
    pub trigger_type: Option<String>,
}

impl TriggerRequest {
    fn trigger_type(&self) -> String {
        self.trigger_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRIGGER_TYPE.to_string())
    }
}

/// POST /api/agent-results/trigger
///
/// Fire-and-forget: the selected agents run on the runtime after the
/// response is sent. Progress is visible through the agent-status endpoint.
pub async fn handle_trigger_agents(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<TriggerRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user_id = resolve_user_id(
        state.store.as_ref(),
        &auth,
        request.user_id.as_deref(),
        request.email.as_deref(),
    )
    .await?;
    let trigger_type = request.trigger_type();
    let agents: Vec<String> = AgentTriggerService::select_agents(&request.profile)
        .iter()
        .map(AgentKind::to_string)
        .collect();

    let service = state.agents.clone();
    let profile = request.profile;
    let spawned_user = user_id.clone();
    let spawned_trigger = trigger_type.clone();
    tokio::spawn(async move {
        let outcomes = service
            .trigger_multiple(&spawned_user, &profile, &spawned_trigger)
            .await;
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Agent trigger for user {spawned_user} finished: {succeeded}/{} succeeded",
            outcomes.len()
        );
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "userId": user_id,
            "agents": agents,
            "triggerType": trigger_type,
        })),
    ))
}

/// POST /api/agent-results/run/:agentName
///
/// Runs one agent and waits for it. An agent failure is reported in the
/// body with `success: false`; it is not an HTTP error.
pub async fn handle_run_agent(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(agent_name): Path<String>,
    Json(request): Json<TriggerRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = resolve_user_id(
        state.store.as_ref(),
        &auth,
        request.user_id.as_deref(),
        request.email.as_deref(),
    )
    .await?;
    let kind = AgentKind::from_name(&agent_name);

    let outcome = state
        .agents
        .run_agent(kind, &user_id, &request.profile, &request.trigger_type())
        .await;

    Ok(Json(json!({
        "success": outcome.success,
        "agentName": outcome.agent_name,
        "executionId": outcome.execution_id,
        "data": outcome.agent_output,
        "error": outcome.error,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_defaults_to_profile_update() {
        let request: TriggerRequest = serde_json::from_value(json!({"profile": {}})).unwrap();
        assert_eq!(request.trigger_type(), DEFAULT_TRIGGER_TYPE);

        let request: TriggerRequest =
            serde_json::from_value(json!({"triggerType": "manual"})).unwrap();
        assert_eq!(request.trigger_type(), "manual");
        assert_eq!(request.profile, UserProfile::default());
    }
}
