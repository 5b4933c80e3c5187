use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{HealthReport, Task, TaskDraft, TaskPatch};

// ---------------------------------------------------------------------------
// Transport abstraction (for testability)
// ---------------------------------------------------------------------------

/// The single transport seam. Returns the response body on success;
/// non-2xx statuses and transport failures surface as errors.
pub trait HttpClient {
    fn send(&self, method: &str, path: &str, body: Option<&serde_json::Value>) -> Result<String>;
}

pub struct UreqHttp {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqHttp {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl HttpClient for UreqHttp {
    fn send(&self, method: &str, path: &str, body: Option<&serde_json::Value>) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.agent.request(method, &url);
        let result = match body {
            Some(b) => request.send_json(b),
            None => request.call(),
        };
        match result {
            Ok(response) => response
                .into_string()
                .map_err(|e| Error::Network(format!("failed to read response body: {e}"))),
            Err(ureq::Error::Status(status, response)) => Err(Error::Remote {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(t)) => Err(Error::Network(t.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskGateway
// ---------------------------------------------------------------------------

/// Health wire shape: the backend reports its own status plus the state of
/// the language-model service it delegates parsing to.
#[derive(Debug, Deserialize)]
struct HealthWire {
    status: String,
    #[serde(default)]
    llm_service: Option<String>,
}

/// Typed wrapper around the remote task API. Translates intents into HTTP
/// calls and responses into the data model; no business logic.
pub struct TaskGateway {
    client: Box<dyn HttpClient>,
}

impl TaskGateway {
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self { client }
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let body = self.call("GET", path, None)?;
        decode(&body, path)
    }

    fn call(&self, method: &str, path: &str, body: Option<&serde_json::Value>) -> Result<String> {
        debug!(method, path, "gateway request");
        let result = self.client.send(method, path, body);
        if let Err(e) = &result {
            warn!(method, path, error = %e, "gateway request failed");
        }
        result
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.get("/tasks/")
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.get(&format!("/tasks/{id}"))
    }

    pub fn create_task(&self, draft: &TaskDraft) -> Result<Task> {
        let payload = serde_json::to_value(draft)
            .map_err(|e| Error::Decode(format!("failed to encode draft: {e}")))?;
        let body = self.call("POST", "/tasks/", Some(&payload))?;
        decode(&body, "/tasks/")
    }

    pub fn create_task_from_text(&self, text: &str) -> Result<Task> {
        let payload = serde_json::json!({ "text": text });
        let body = self.call("POST", "/tasks/parse", Some(&payload))?;
        decode(&body, "/tasks/parse")
    }

    pub fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        let payload = serde_json::to_value(patch)
            .map_err(|e| Error::Decode(format!("failed to encode patch: {e}")))?;
        let path = format!("/tasks/{id}");
        let body = self.call("PUT", &path, Some(&payload))?;
        decode(&body, &path)
    }

    pub fn delete_task(&self, id: i64) -> Result<()> {
        self.call("DELETE", &format!("/tasks/{id}"), None)?;
        Ok(())
    }

    /// Probe service health. Never fails: any transport, remote, or decode
    /// problem degrades to `{status: "error", natural_language_available:
    /// false}` so callers need no failure branch.
    pub fn check_health(&self) -> HealthReport {
        match self.call("GET", "/health", None) {
            Ok(body) => match decode::<HealthWire>(&body, "/health") {
                Ok(wire) => HealthReport {
                    status: wire.status,
                    natural_language_available: wire
                        .llm_service
                        .as_deref()
                        .is_some_and(|s| s.starts_with("available")),
                },
                Err(e) => {
                    warn!(error = %e, "health response malformed");
                    HealthReport::degraded()
                }
            },
            Err(_) => HealthReport::degraded(),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &str, path: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::Decode(format!("unexpected response from {path}: {e}")))
}
