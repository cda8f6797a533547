//! Projects an agent's raw output into the collection owned by that agent.
//!
//! | Agent | Write pattern |
//! |---|---|
//! | career plan | archive active plans + insert new active plan (one batch) |
//! | skill-gap roadmap | update the user's roadmap, or insert one |
//! | resume optimization | append a resume analysis |
//! | job search | batch-insert up to `MAX_JOB_MATCHES` job matches |
//! | anything else | nothing; the audit row keeps the output |

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::agents::kind::AgentKind;
use crate::clock;
use crate::models::career::{CareerPlan, PlanStatus, Roadmap, PLAN_LIFETIME_DAYS};
use crate::models::job::{JobMatch, DEFAULT_MATCH_REASON, DEFAULT_RELEVANCE, NEW_STATUS};
use crate::models::profile::{is_truthy, UserProfile};
use crate::models::resume::ResumeAnalysis;
use crate::store::{collections, to_fields, DocumentStore, Filter, StoreError, WriteBatch};

pub const MAX_JOB_MATCHES: usize = 10;

pub async fn store_agent_result(
    store: &dyn DocumentStore,
    kind: &AgentKind,
    user_id: &str,
    output: &Value,
    profile: &UserProfile,
) -> Result<(), StoreError> {
    let timestamp = clock::now_ist_iso();

    match kind {
        AgentKind::CareerPlan => {
            replace_active_plan(store, kind, user_id, output, timestamp).await?;
        }
        AgentKind::SkillGapRoadmap => {
            upsert_roadmap(store, user_id, output, timestamp).await?;
        }
        AgentKind::ResumeOptimization => {
            let analysis = ResumeAnalysis {
                user_id: user_id.to_string(),
                resume_text: profile.text("resumeText").unwrap_or_default(),
                target_role: profile.text("targetRole").unwrap_or_default(),
                ats_score: truthy_field(output, "atsScore").unwrap_or_else(|| json!(0)),
                analysis_content: output.clone(),
                recommendations: truthy_field(output, "topFixes").unwrap_or_else(|| json!([])),
                generated_at: timestamp,
            };
            let id = store
                .add(collections::RESUME_ANALYSES, to_fields(&analysis)?)
                .await?;
            info!("Stored resume analysis {id} for user {user_id}");
        }
        AgentKind::JobSearchApplication => {
            let Some(jobs) = output.get("jobs").and_then(Value::as_array) else {
                debug!("Job search output for user {user_id} has no jobs list");
                return Ok(());
            };
            let mut batch = WriteBatch::new();
            for job in jobs.iter().take(MAX_JOB_MATCHES) {
                let job_match = job_match_from(job, user_id, &timestamp);
                batch.set(collections::JOB_MATCHES, to_fields(&job_match)?);
            }
            let stored = batch.len();
            store.commit(batch).await?;
            info!("Stored {stored} job matches for user {user_id}");
        }
        AgentKind::JobPrep | AgentKind::Other(_) => {
            debug!("No projection for agent {kind}; output kept in execution record");
        }
    }

    Ok(())
}

/// Archives every active plan for the user and inserts the new one in a
/// single batch, so readers never observe the archive without the insert.
async fn replace_active_plan(
    store: &dyn DocumentStore,
    kind: &AgentKind,
    user_id: &str,
    output: &Value,
    timestamp: String,
) -> Result<(), StoreError> {
    let active = store
        .query(
            collections::CAREER_PLANS,
            &[
                Filter::eq("userId", user_id),
                Filter::eq("status", PlanStatus::Active.as_str()),
            ],
            None,
        )
        .await?;

    let mut batch = WriteBatch::new();
    for doc in &active {
        batch.update(
            collections::CAREER_PLANS,
            &doc.id,
            status_patch(PlanStatus::Archived),
        );
    }

    let plan = CareerPlan {
        user_id: user_id.to_string(),
        agent_name: kind.as_str().to_string(),
        plan_content: output.clone(),
        phases: truthy_field(output, "phases").unwrap_or_else(|| json!([])),
        status: PlanStatus::Active,
        generated_at: timestamp,
        expires_at: clock::days_from_now_iso(PLAN_LIFETIME_DAYS),
    };
    batch.set(collections::CAREER_PLANS, to_fields(&plan)?);
    store.commit(batch).await?;

    info!(
        "Stored new career plan for user {user_id} (archived {})",
        active.len()
    );
    Ok(())
}

async fn upsert_roadmap(
    store: &dyn DocumentStore,
    user_id: &str,
    output: &Value,
    timestamp: String,
) -> Result<(), StoreError> {
    let existing = store
        .query(
            collections::ROADMAPS,
            &[Filter::eq("userId", user_id)],
            Some(1),
        )
        .await?;

    match existing.first() {
        Some(doc) => {
            let mut patch = status_patch(PlanStatus::Active);
            patch.insert("roadmapData".to_string(), output.clone());
            patch.insert("updatedAt".to_string(), Value::String(timestamp));
            store.update(collections::ROADMAPS, &doc.id, patch).await?;
            info!("Updated roadmap {} for user {user_id}", doc.id);
        }
        None => {
            let roadmap = Roadmap {
                user_id: user_id.to_string(),
                roadmap_data: output.clone(),
                status: PlanStatus::Active,
                created_at: timestamp.clone(),
                updated_at: timestamp,
            };
            let id = store
                .add(collections::ROADMAPS, to_fields(&roadmap)?)
                .await?;
            info!("Created roadmap {id} for user {user_id}");
        }
    }
    Ok(())
}

fn status_patch(status: PlanStatus) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert(
        "status".to_string(),
        Value::String(status.as_str().to_string()),
    );
    patch
}

fn truthy_field(output: &Value, field: &str) -> Option<Value> {
    output.get(field).filter(|v| is_truthy(v)).cloned()
}

fn string_field(job: &Value, field: &str) -> Option<String> {
    match job.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn job_match_from(job: &Value, user_id: &str, timestamp: &str) -> JobMatch {
    JobMatch {
        user_id: user_id.to_string(),
        job_id: string_field(job, "id").unwrap_or_else(fallback_job_id),
        job_title: string_field(job, "title").unwrap_or_default(),
        company: string_field(job, "company").unwrap_or_default(),
        location: string_field(job, "location").unwrap_or_default(),
        relevance_score: fit_score(job).unwrap_or(DEFAULT_RELEVANCE),
        match_reason: string_field(job, "reason")
            .unwrap_or_else(|| DEFAULT_MATCH_REASON.to_string()),
        status: NEW_STATUS.to_string(),
        matched_at: timestamp.to_string(),
    }
}

/// Agents send `fitScore` as a number or a numeric string. Zero counts as absent.
fn fit_score(job: &Value) -> Option<f64> {
    let score = match job.get("fitScore")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (score != 0.0 && score.is_finite()).then_some(score)
}

/// `job_<unix millis>_<9 base-36 chars>`.
fn fallback_job_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("job_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    async fn plans_for(store: &MemoryDocumentStore, user_id: &str) -> Vec<CareerPlan> {
        store
            .query(
                collections::CAREER_PLANS,
                &[Filter::eq("userId", user_id)],
                None,
            )
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.decode().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_career_plan_archives_previous_active_plan() {
        let store = MemoryDocumentStore::new();
        let p = UserProfile::default();

        store_agent_result(&store, &AgentKind::CareerPlan, "u1", &json!({"v": 1}), &p)
            .await
            .unwrap();
        store_agent_result(
            &store,
            &AgentKind::CareerPlan,
            "u1",
            &json!({"v": 2, "phases": [{"name": "Learn"}]}),
            &p,
        )
        .await
        .unwrap();

        let plans = plans_for(&store, "u1").await;
        assert_eq!(plans.len(), 2);
        let active: Vec<_> = plans
            .iter()
            .filter(|p| p.status == PlanStatus::Active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].plan_content["v"], 2);
        assert_eq!(active[0].phases, json!([{"name": "Learn"}]));
        assert_eq!(active[0].agent_name, "careerPlanJsonAgent");

        let archived = plans
            .iter()
            .find(|p| p.status == PlanStatus::Archived)
            .unwrap();
        assert_eq!(archived.plan_content["v"], 1);
        assert_eq!(archived.phases, json!([]));
    }

    #[tokio::test]
    async fn test_career_plan_leaves_other_users_alone() {
        let store = MemoryDocumentStore::new();
        let p = UserProfile::default();
        store_agent_result(&store, &AgentKind::CareerPlan, "u1", &json!({}), &p)
            .await
            .unwrap();
        store_agent_result(&store, &AgentKind::CareerPlan, "u2", &json!({}), &p)
            .await
            .unwrap();

        let u1 = plans_for(&store, "u1").await;
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].status, PlanStatus::Active);
    }

    #[tokio::test]
    async fn test_roadmap_is_upserted() {
        let store = MemoryDocumentStore::new();
        let p = UserProfile::default();
        store_agent_result(&store, &AgentKind::SkillGapRoadmap, "u1", &json!({"step": 1}), &p)
            .await
            .unwrap();
        store_agent_result(&store, &AgentKind::SkillGapRoadmap, "u1", &json!({"step": 2}), &p)
            .await
            .unwrap();

        let docs = store
            .query(collections::ROADMAPS, &[Filter::eq("userId", "u1")], None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        let roadmap: Roadmap = docs[0].clone().decode().unwrap();
        assert_eq!(roadmap.roadmap_data["step"], 2);
        assert_eq!(roadmap.status, PlanStatus::Active);
    }

    #[tokio::test]
    async fn test_resume_analysis_appends_with_defaults() {
        let store = MemoryDocumentStore::new();
        let p = profile(json!({"resumeText": "My CV", "targetRole": "SRE"}));
        store_agent_result(&store, &AgentKind::ResumeOptimization, "u1", &json!({"atsScore": 72}), &p)
            .await
            .unwrap();
        store_agent_result(&store, &AgentKind::ResumeOptimization, "u1", &json!({}), &p)
            .await
            .unwrap();

        let docs = store
            .query(collections::RESUME_ANALYSES, &[], None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        let analyses: Vec<ResumeAnalysis> = docs.into_iter().map(|d| d.decode().unwrap()).collect();
        assert!(analyses.iter().any(|a| a.ats_score == json!(72)));
        assert!(analyses.iter().any(|a| a.ats_score == json!(0)));
        assert!(analyses.iter().all(|a| a.resume_text == "My CV" && a.target_role == "SRE"));
        assert!(analyses.iter().all(|a| a.recommendations == json!([])));
    }

    #[tokio::test]
    async fn test_job_search_caps_at_ten_matches() {
        let store = MemoryDocumentStore::new();
        let jobs: Vec<Value> = (0..15)
            .map(|i| json!({"id": format!("j{i}"), "title": "Engineer", "company": "Acme"}))
            .collect();
        store_agent_result(
            &store,
            &AgentKind::JobSearchApplication,
            "u1",
            &json!({ "jobs": jobs }),
            &UserProfile::default(),
        )
        .await
        .unwrap();

        assert_eq!(store.count(collections::JOB_MATCHES).await, 10);
    }

    #[tokio::test]
    async fn test_job_search_without_jobs_is_noop() {
        let store = MemoryDocumentStore::new();
        store_agent_result(
            &store,
            &AgentKind::JobSearchApplication,
            "u1",
            &json!({"message": "none found"}),
            &UserProfile::default(),
        )
        .await
        .unwrap();
        assert_eq!(store.count(collections::JOB_MATCHES).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_agent_stores_nothing() {
        let store = MemoryDocumentStore::new();
        store_agent_result(
            &store,
            &AgentKind::Other("customAgent".into()),
            "u1",
            &json!({"anything": true}),
            &UserProfile::default(),
        )
        .await
        .unwrap();
        for c in [
            collections::CAREER_PLANS,
            collections::ROADMAPS,
            collections::RESUME_ANALYSES,
            collections::JOB_MATCHES,
        ] {
            assert_eq!(store.count(c).await, 0);
        }
    }

    #[test]
    fn test_job_match_defaults() {
        let m = job_match_from(&json!({}), "u1", "ts");
        assert!(m.job_id.starts_with("job_"));
        assert_eq!(m.job_id.rsplit('_').next().unwrap().len(), 9);
        assert_eq!(m.relevance_score, DEFAULT_RELEVANCE);
        assert_eq!(m.match_reason, DEFAULT_MATCH_REASON);
        assert_eq!(m.status, NEW_STATUS);
        assert_eq!(m.job_title, "");
    }

    #[test]
    fn test_job_match_keeps_agent_values() {
        let m = job_match_from(
            &json!({"id": 42, "title": "SWE", "fitScore": 0.93, "reason": "Rust"}),
            "u1",
            "ts",
        );
        assert_eq!(m.job_id, "42");
        assert_eq!(m.job_title, "SWE");
        assert_eq!(m.relevance_score, 0.93);
        assert_eq!(m.match_reason, "Rust");
    }

    #[test]
    fn test_job_match_parses_string_fit_score() {
        let m = job_match_from(&json!({"fitScore": " 0.9 "}), "u1", "ts");
        assert_eq!(m.relevance_score, 0.9);

        for unusable in [json!("high"), json!("0"), json!(0), json!(true)] {
            let m = job_match_from(&json!({ "fitScore": unusable }), "u1", "ts");
            assert_eq!(m.relevance_score, DEFAULT_RELEVANCE);
        }
    }
}
