pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::agents::handlers as agent_handlers;
use crate::chat::handlers as chat_handlers;
use crate::results::handlers as result_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat sessions
        .route(
            "/api/chats",
            get(chat_handlers::handle_list_sessions).post(chat_handlers::handle_create_session),
        )
        .route(
            "/api/chats/:id",
            get(chat_handlers::handle_get_session)
                .put(chat_handlers::handle_update_session)
                .delete(chat_handlers::handle_delete_session),
        )
        // Agent results
        .route(
            "/api/agent-results/career-plan",
            get(result_handlers::handle_get_career_plan),
        )
        .route(
            "/api/agent-results/resume-analysis",
            get(result_handlers::handle_get_resume_analysis),
        )
        .route(
            "/api/agent-results/job-matches",
            get(result_handlers::handle_get_job_matches),
        )
        .route(
            "/api/agent-results/job-matches/:match_id",
            patch(result_handlers::handle_update_job_match_status),
        )
        .route(
            "/api/agent-results/agent-status",
            get(result_handlers::handle_get_agent_status),
        )
        // Agent triggers
        .route(
            "/api/agent-results/trigger",
            post(agent_handlers::handle_trigger_agents),
        )
        .route(
            "/api/agent-results/run/:agent_name",
            post(agent_handlers::handle_run_agent),
        )
        .with_state(state)
}
