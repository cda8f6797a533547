use std::sync::Arc;

use crate::agents::trigger::AgentTriggerService;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable document store. Postgres in production, memory when no
    /// `DATABASE_URL` is configured.
    pub store: Arc<dyn DocumentStore>,
    pub agents: AgentTriggerService,
}
