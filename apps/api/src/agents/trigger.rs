//! Agent trigger service.
//!
//! Flow per agent: audit row (pending) → prompt → agent call → dispatch result
//! → audit row (success | error). Failures are recorded and reported in the
//! returned outcome; they never propagate to the caller.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::agents::client::{AgentError, AgentInvoker};
use crate::agents::dispatcher::store_agent_result;
use crate::agents::kind::AgentKind;
use crate::agents::prompts::build_prompt;
use crate::clock;
use crate::models::execution::{AgentExecution, ExecutionStatus};
use crate::models::profile::UserProfile;
use crate::store::{collections, to_fields, DocumentStore, StoreError};

pub const DEFAULT_TRIGGER_TYPE: &str = "profile_update";

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one agent run as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunOutcome {
    pub agent_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentRunOutcome {
    fn succeeded(kind: &AgentKind, execution_id: String, output: Value) -> Self {
        Self {
            agent_name: kind.to_string(),
            success: true,
            execution_id: Some(execution_id),
            agent_output: Some(output),
            error: None,
        }
    }

    fn failed(kind: &AgentKind, execution_id: Option<String>, message: String) -> Self {
        Self {
            agent_name: kind.to_string(),
            success: false,
            execution_id,
            agent_output: None,
            error: Some(message),
        }
    }
}

#[derive(Clone)]
pub struct AgentTriggerService {
    store: Arc<dyn DocumentStore>,
    invoker: Arc<dyn AgentInvoker>,
}

impl AgentTriggerService {
    pub fn new(store: Arc<dyn DocumentStore>, invoker: Arc<dyn AgentInvoker>) -> Self {
        Self { store, invoker }
    }

    /// Career plan and roadmap always run; job search only when the profile
    /// carries a location.
    pub fn select_agents(profile: &UserProfile) -> Vec<AgentKind> {
        let mut agents = vec![AgentKind::CareerPlan, AgentKind::SkillGapRoadmap];
        if profile.has_location() {
            agents.push(AgentKind::JobSearchApplication);
        }
        agents
    }

    pub async fn run_agent(
        &self,
        kind: AgentKind,
        user_id: &str,
        profile: &UserProfile,
        trigger_type: &str,
    ) -> AgentRunOutcome {
        let started = Instant::now();

        let execution = AgentExecution::pending(
            user_id,
            kind.as_str(),
            trigger_type,
            profile.to_value(),
            clock::now_ist_iso(),
        );
        let execution_id = match self.record_pending(&execution).await {
            Ok(id) => id,
            Err(e) => {
                error!("Could not record execution for agent {kind} (user {user_id}): {e}");
                return AgentRunOutcome::failed(&kind, None, e.to_string());
            }
        };

        let result = match self.execute(&kind, user_id, profile).await {
            Ok(output) => {
                let elapsed = elapsed_ms(started);
                let patch = execution_patch(
                    ExecutionStatus::Success,
                    "outputData",
                    output.clone(),
                    elapsed,
                );
                self.store
                    .update(collections::AGENT_EXECUTIONS, &execution_id, patch)
                    .await
                    .map(|_| output)
                    .map_err(RunError::from)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => {
                info!(
                    "Agent {kind} succeeded for user {user_id} in {}ms",
                    elapsed_ms(started)
                );
                AgentRunOutcome::succeeded(&kind, execution_id, output)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Agent {kind} failed for user {user_id}: {message}");
                let patch = execution_patch(
                    ExecutionStatus::Error,
                    "errorMessage",
                    Value::String(message.clone()),
                    elapsed_ms(started),
                );
                if let Err(store_err) = self
                    .store
                    .update(collections::AGENT_EXECUTIONS, &execution_id, patch)
                    .await
                {
                    error!("Could not mark execution {execution_id} as failed: {store_err}");
                }
                AgentRunOutcome::failed(&kind, Some(execution_id), message)
            }
        }
    }

    /// Runs every selected agent concurrently and waits for all of them.
    /// Outcomes are returned in selection order.
    pub async fn trigger_multiple(
        &self,
        user_id: &str,
        profile: &UserProfile,
        trigger_type: &str,
    ) -> Vec<AgentRunOutcome> {
        let agents = Self::select_agents(profile);
        info!(
            "Triggering {} agents for user {user_id} ({trigger_type})",
            agents.len()
        );

        let runs = agents
            .into_iter()
            .map(|kind| self.run_agent(kind, user_id, profile, trigger_type));
        join_all(runs).await
    }

    async fn record_pending(&self, execution: &AgentExecution) -> Result<String, StoreError> {
        self.store
            .add(collections::AGENT_EXECUTIONS, to_fields(execution)?)
            .await
    }

    async fn execute(
        &self,
        kind: &AgentKind,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<Value, RunError> {
        let prompt = build_prompt(kind, profile);
        let output = self.invoker.invoke(kind, &prompt).await?;
        store_agent_result(self.store.as_ref(), kind, user_id, &output, profile).await?;
        Ok(output)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn execution_patch(
    status: ExecutionStatus,
    detail_field: &str,
    detail: Value,
    elapsed: u64,
) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(status));
    patch.insert(detail_field.to_string(), detail);
    patch.insert("executionTimeMs".to_string(), json!(elapsed));
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::store::{Filter, MemoryDocumentStore};

    /// Records every call; fails for agents listed in `failing`.
    #[derive(Default)]
    struct StubInvoker {
        calls: Mutex<Vec<String>>,
        failing: Vec<AgentKind>,
    }

    #[async_trait]
    impl AgentInvoker for StubInvoker {
        async fn invoke(&self, kind: &AgentKind, _prompt: &str) -> Result<Value, AgentError> {
            self.calls.lock().unwrap().push(kind.to_string());
            if self.failing.contains(kind) {
                return Err(AgentError::Timeout(Duration::from_secs(60)));
            }
            Ok(match kind {
                AgentKind::JobSearchApplication => json!({"jobs": [{"title": "Dev"}]}),
                _ => json!({"ok": true}),
            })
        }
    }

    fn service(invoker: StubInvoker) -> (Arc<MemoryDocumentStore>, Arc<StubInvoker>, AgentTriggerService) {
        let store = Arc::new(MemoryDocumentStore::new());
        let invoker = Arc::new(invoker);
        let svc = AgentTriggerService::new(store.clone(), invoker.clone());
        (store, invoker, svc)
    }

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    async fn executions(store: &MemoryDocumentStore) -> Vec<AgentExecution> {
        store
            .query(collections::AGENT_EXECUTIONS, &[Filter::eq("userId", "u1")], None)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.decode().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_successful_run_marks_execution_success() {
        let (store, _, svc) = service(StubInvoker::default());
        let outcome = svc
            .run_agent(AgentKind::CareerPlan, "u1", &UserProfile::default(), "manual")
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.agent_output, Some(json!({"ok": true})));

        let rows = executions(&store).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ExecutionStatus::Success);
        assert_eq!(rows[0].trigger_type, "manual");
        assert_eq!(rows[0].output_data, Some(json!({"ok": true})));
        assert!(rows[0].execution_time_ms.is_some());
        assert_eq!(store.count(collections::CAREER_PLANS).await, 1);
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_not_raised() {
        let (store, _, svc) = service(StubInvoker {
            failing: vec![AgentKind::CareerPlan],
            ..Default::default()
        });
        let outcome = svc
            .run_agent(AgentKind::CareerPlan, "u1", &UserProfile::default(), DEFAULT_TRIGGER_TYPE)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("timed out"));

        let rows = executions(&store).await;
        assert_eq!(rows[0].status, ExecutionStatus::Error);
        assert!(rows[0].error_message.as_deref().is_some_and(|m| !m.is_empty()));
        assert!(rows[0].output_data.is_none());
        assert_eq!(store.count(collections::CAREER_PLANS).await, 0);
    }

    #[tokio::test]
    async fn test_no_location_skips_job_search() {
        let (_, invoker, svc) = service(StubInvoker::default());
        let outcomes = svc
            .trigger_multiple("u1", &profile(json!({"role": "dev"})), DEFAULT_TRIGGER_TYPE)
            .await;

        assert_eq!(outcomes.len(), 2);
        let calls = invoker.calls.lock().unwrap();
        assert!(!calls.contains(&"jobSearchApplicationAgent".to_string()));
    }

    #[tokio::test]
    async fn test_location_adds_job_search() {
        let (store, invoker, svc) = service(StubInvoker::default());
        let outcomes = svc
            .trigger_multiple("u1", &profile(json!({"location": "Bengaluru"})), DEFAULT_TRIGGER_TYPE)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[2].agent_name, "jobSearchApplicationAgent");
        assert!(invoker
            .calls
            .lock()
            .unwrap()
            .contains(&"jobSearchApplicationAgent".to_string()));
        assert_eq!(store.count(collections::JOB_MATCHES).await, 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let (store, _, svc) = service(StubInvoker {
            failing: vec![AgentKind::CareerPlan],
            ..Default::default()
        });
        let outcomes = svc
            .trigger_multiple("u1", &UserProfile::default(), DEFAULT_TRIGGER_TYPE)
            .await;

        assert!(!outcomes[0].success);
        assert!(outcomes[1].success);
        assert_eq!(store.count(collections::ROADMAPS).await, 1);
        assert_eq!(store.count(collections::AGENT_EXECUTIONS).await, 2);
    }
}
