use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::gateway::TaskGateway;
use crate::model::{HealthReport, Priority, Task, TaskDraft, TaskPatch, parse_due_input};
use crate::ordering::display_order;

/// Raw form input for create and edit intents. Strings come straight from
/// the user; the engine trims, validates, and converts them before anything
/// goes over the wire. A `None` field means "not provided" (for edits:
/// leave unchanged).
#[derive(Debug, Clone, Default)]
pub struct DraftInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

/// The synchronization engine: sole owner and mutator of session state.
///
/// Every intent handler routes through the gateway and reconciles local
/// state from the server's response, never from the request payload, so
/// server-side normalization stays authoritative. Handlers never propagate
/// errors; each failure sets the session error message for its intent
/// class and leaves the collection untouched.
pub struct Engine {
    gateway: TaskGateway,
    tasks: Vec<Task>,
    loading: bool,
    nl_loading: bool,
    error: Option<String>,
    editing: Option<i64>,
    form_open: bool,
    health: HealthReport,
}

impl Engine {
    pub fn new(gateway: TaskGateway) -> Self {
        Self {
            gateway,
            tasks: Vec::new(),
            loading: false,
            nl_loading: false,
            error: None,
            editing: None,
            form_open: false,
            health: HealthReport::degraded(),
        }
    }

    /// Session start: initial load plus an independent health probe. The
    /// probe never blocks the load and never touches the error banner.
    pub fn start(&mut self) {
        self.load();
        self.refresh_health();
    }

    // --- snapshot -----------------------------------------------------

    /// Tasks in display order: incomplete first, newest first within each
    /// group.
    pub fn tasks(&self) -> Vec<Task> {
        display_order(&self.tasks)
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn nl_loading(&self) -> bool {
        self.nl_loading
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn form_open(&self) -> bool {
        self.form_open
    }

    pub fn nl_available(&self) -> bool {
        self.health.natural_language_available
    }

    pub fn health(&self) -> &HealthReport {
        &self.health
    }

    #[cfg(test)]
    fn collection(&self) -> &[Task] {
        &self.tasks
    }

    // --- intents ------------------------------------------------------

    /// Replace the collection from the server. On failure the collection
    /// is left empty and a load-failure message is set.
    pub fn load(&mut self) {
        self.loading = true;
        self.error = None;
        match self.gateway.list_tasks() {
            Ok(tasks) => {
                debug!(count = tasks.len(), "tasks loaded");
                self.tasks = tasks;
            }
            Err(e) => {
                self.tasks.clear();
                self.error = Some(format!("Failed to load tasks: {e}"));
            }
        }
        self.loading = false;
    }

    pub fn refresh_health(&mut self) {
        self.health = self.gateway.check_health();
        debug!(
            status = %self.health.status,
            nl_available = self.health.natural_language_available,
            "health refreshed"
        );
    }

    /// Manual create. An empty or whitespace-only title, or an unparseable
    /// due date, surfaces a validation message without any remote call.
    pub fn create(&mut self, input: DraftInput) {
        let draft = match draft_from(&input) {
            Ok(draft) => draft,
            Err(e) => {
                self.error = Some(e.to_string());
                return;
            }
        };
        match self.gateway.create_task(&draft) {
            Ok(task) => {
                info!(id = task.id, "task created");
                self.tasks.insert(0, task);
                self.form_open = false;
                self.error = None;
            }
            Err(e) => {
                // Leave the form open so nothing typed is lost.
                self.error = Some(format!("Failed to create task: {e}"));
            }
        }
    }

    /// Natural-language create: the remote parser does all the extraction.
    pub fn create_from_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.error = Some("describe the task before submitting".to_string());
            return;
        }
        self.nl_loading = true;
        self.error = None;
        match self.gateway.create_task_from_text(text) {
            Ok(task) => {
                info!(id = task.id, "task created from text");
                self.tasks.insert(0, task);
            }
            Err(e) => {
                self.error = Some(format!("AI parsing failed: {e}"));
            }
        }
        self.nl_loading = false;
    }

    /// Flip completion. No optimistic flip: the stored state only changes
    /// once the server confirms. Unknown ids are a no-op.
    pub fn toggle(&mut self, id: i64) {
        let Some(current) = self.tasks.iter().find(|t| t.id == id) else {
            return;
        };
        let patch = TaskPatch {
            completed: Some(!current.completed),
            ..Default::default()
        };
        match self.gateway.update_task(id, &patch) {
            Ok(updated) => {
                self.replace(updated);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(format!("Failed to update task {id}: {e}"));
            }
        }
    }

    pub fn begin_edit(&mut self, id: i64) {
        if self.tasks.iter().any(|t| t.id == id) {
            self.editing = Some(id);
            self.form_open = true;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.form_open = false;
    }

    pub fn open_form(&mut self) {
        self.form_open = true;
    }

    /// Save the active edit as a partial patch. On failure the edit target
    /// stays set so the user can retry without re-entering anything.
    pub fn save_edit(&mut self, input: DraftInput) {
        let Some(id) = self.editing else {
            self.error = Some("no task is being edited".to_string());
            return;
        };
        let patch = match patch_from(&input) {
            Ok(patch) => patch,
            Err(e) => {
                self.error = Some(e.to_string());
                return;
            }
        };
        if patch.is_empty() {
            self.error = Some("nothing to update".to_string());
            return;
        }
        match self.gateway.update_task(id, &patch) {
            Ok(updated) => {
                info!(id, "task updated");
                self.replace(updated);
                self.editing = None;
                self.form_open = false;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(format!("Failed to update task {id}: {e}"));
            }
        }
    }

    /// Delete. Confirmation is the presentation layer's job; by the time
    /// this runs the user has already said yes.
    pub fn delete(&mut self, id: i64) {
        match self.gateway.delete_task(id) {
            Ok(()) => {
                info!(id, "task deleted");
                self.tasks.retain(|t| t.id != id);
                if self.editing == Some(id) {
                    self.cancel_edit();
                }
                self.error = None;
            }
            Err(e) => {
                self.error = Some(format!("Failed to delete task {id}: {e}"));
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn replace(&mut self, updated: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        }
    }
}

fn draft_from(input: &DraftInput) -> Result<TaskDraft> {
    let title = input.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(Error::Validation("task title cannot be empty".to_string()));
    }
    Ok(TaskDraft {
        title,
        description: trimmed(&input.description),
        due_date: match &input.due {
            Some(raw) => parse_due_input(raw)?,
            None => None,
        },
        priority: input.priority,
    })
}

fn patch_from(input: &DraftInput) -> Result<TaskPatch> {
    let title = match &input.title {
        Some(raw) => {
            let t = raw.trim();
            if t.is_empty() {
                return Err(Error::Validation("task title cannot be empty".to_string()));
            }
            Some(t.to_string())
        }
        None => None,
    };
    Ok(TaskPatch {
        title,
        description: trimmed(&input.description),
        completed: input.completed,
        due_date: match &input.due {
            Some(raw) => parse_due_input(raw)?,
            None => None,
        },
        priority: input.priority,
    })
}

fn trimmed(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
