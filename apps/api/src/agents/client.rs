//! Agent client: the single point of entry for calls to the external agent service.
//!
//! Every agent is reached with `POST {base}{endpoint}` and a `{ "prompt": ... }`
//! body; the service answers `{ "result": <agent-specific JSON> }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::agents::kind::AgentKind;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Agent service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Agent response had no result field")]
    MalformedResponse,
}

/// Seam between the trigger service and the agent transport.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, kind: &AgentKind, prompt: &str) -> Result<Value, AgentError>;
}

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    result: Option<Value>,
}

#[derive(Clone)]
pub struct HttpAgentClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAgentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn url_for(&self, kind: &AgentKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint_path())
    }
}

#[async_trait]
impl AgentInvoker for HttpAgentClient {
    async fn invoke(&self, kind: &AgentKind, prompt: &str) -> Result<Value, AgentError> {
        let url = self.url_for(kind);
        debug!("Calling agent {kind} at {url}");

        let response = self
            .client
            .post(&url)
            .json(&AgentRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.timeout)
                } else {
                    AgentError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Agent {kind} returned {status}: {body}");
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: AgentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(self.timeout)
            } else {
                AgentError::Http(e)
            }
        })?;
        debug!("Agent {kind} responded");

        body.result
            .filter(|v| !v.is_null())
            .ok_or(AgentError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_strips_trailing_slash() {
        let client = HttpAgentClient::new("http://agents.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url_for(&AgentKind::JobPrep),
            "http://agents.local/api/agent/jobPrepAgent"
        );
        assert_eq!(
            client.url_for(&AgentKind::ResumeOptimization),
            "http://agents.local/api/resume/optimize"
        );
    }

    #[test]
    fn test_response_without_result_parses_as_none() {
        let body: AgentResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(body.result.is_none());
    }
}
