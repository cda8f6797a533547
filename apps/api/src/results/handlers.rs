//! Axum route handlers for agent-produced artifacts.
//!
//! Queries filter on equality only and every ordering / truncation happens
//! here, after the fetch.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::auth::{resolve_user_id, AuthUser};
use crate::errors::{AppError, FieldError};
use crate::models::career::PlanStatus;
use crate::models::job::NEW_STATUS;
use crate::state::AppState;
use crate::store::{collections, sort_newest_first, Document, Filter};

pub const MAX_JOB_MATCHES_RETURNED: usize = 20;
pub const MAX_EXECUTIONS_RETURNED: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsQuery {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobMatchStatusUpdate {
    pub status: Option<Value>,
}

fn newest(mut docs: Vec<Document>, field: &str, limit: usize) -> Vec<Value> {
    sort_newest_first(&mut docs, &[field]);
    docs.into_iter().take(limit).map(Document::into_json).collect()
}

async fn caller_id(state: &AppState, auth: &AuthUser, q: &ResultsQuery) -> Result<String, AppError> {
    resolve_user_id(
        state.store.as_ref(),
        auth,
        q.user_id.as_deref(),
        q.email.as_deref(),
    )
    .await
}

/// GET /api/agent-results/career-plan
pub async fn handle_get_career_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ResultsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&state, &auth, &q).await?;
    let plans = state
        .store
        .query(
            collections::CAREER_PLANS,
            &[
                Filter::eq("userId", user_id.as_str()),
                Filter::eq("status", PlanStatus::Active.as_str()),
            ],
            None,
        )
        .await?;

    let plan = newest(plans, "generatedAt", 1).into_iter().next();
    Ok(Json(json!({ "success": true, "careerPlan": plan })))
}

/// GET /api/agent-results/resume-analysis
pub async fn handle_get_resume_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ResultsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&state, &auth, &q).await?;
    let analyses = state
        .store
        .query(
            collections::RESUME_ANALYSES,
            &[Filter::eq("userId", user_id.as_str())],
            None,
        )
        .await?;

    let analysis = newest(analyses, "generatedAt", 1).into_iter().next();
    Ok(Json(json!({ "success": true, "resumeAnalysis": analysis })))
}

/// GET /api/agent-results/job-matches?status=new
pub async fn handle_get_job_matches(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ResultsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&state, &auth, &q).await?;
    let status = q.status.as_deref().unwrap_or(NEW_STATUS);
    let matches = state
        .store
        .query(
            collections::JOB_MATCHES,
            &[
                Filter::eq("userId", user_id.as_str()),
                Filter::eq("status", status),
            ],
            None,
        )
        .await?;

    let matches = newest(matches, "matchedAt", MAX_JOB_MATCHES_RETURNED);
    Ok(Json(json!({ "success": true, "jobMatches": matches })))
}

/// GET /api/agent-results/agent-status
pub async fn handle_get_agent_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ResultsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&state, &auth, &q).await?;
    let executions = state
        .store
        .query(
            collections::AGENT_EXECUTIONS,
            &[Filter::eq("userId", user_id.as_str())],
            None,
        )
        .await?;

    let executions = newest(executions, "executedAt", MAX_EXECUTIONS_RETURNED);
    Ok(Json(json!({ "success": true, "executions": executions })))
}

/// PATCH /api/agent-results/job-matches/:matchId
///
/// Ownership is checked against the authenticated caller, not against ids
/// supplied in the request.
pub async fn handle_update_job_match_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(match_id): Path<String>,
    Json(body): Json<JobMatchStatusUpdate>,
) -> Result<Json<Value>, AppError> {
    let status = match body.status {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(_) => {
            return Err(AppError::Validation(vec![FieldError::new(
                "status",
                "Expected non-empty string",
            )]))
        }
        None => return Err(AppError::Validation(vec![FieldError::new("status", "Required")])),
    };

    let user_id = resolve_user_id(state.store.as_ref(), &auth, None, None).await?;
    let existing = state
        .store
        .get(collections::JOB_MATCHES, &match_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job match not found".to_string()))?;
    if existing.get_str("userId") != Some(user_id.as_str()) {
        return Err(AppError::Forbidden);
    }

    let mut patch = Map::new();
    patch.insert("status".to_string(), Value::String(status.clone()));
    state
        .store
        .update(collections::JOB_MATCHES, &match_id, patch)
        .await?;
    info!("Job match {match_id} for user {user_id} set to {status}");

    Ok(Json(json!({ "success": true })))
}
