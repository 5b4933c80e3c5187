use chrono::{DateTime, Local, Utc};

use crate::model::{HealthReport, Task};

/// Snapshot formatting for the terminal. Pure string building; the engine
/// decides what exists, this module only decides how it looks.

fn local_stamp(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn task_line(task: &Task) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{marker} {:>4}  {}", task.id, task.title);
    if let Some(priority) = task.priority {
        line.push_str(&format!("  [{priority}]"));
    }
    if let Some(due) = &task.due_date {
        line.push_str(&format!("  (due {})", local_stamp(due)));
    }
    line
}

pub fn task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks yet.".to_string();
    }
    tasks
        .iter()
        .map(task_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_detail(task: &Task) -> String {
    let mut out = format!("Task {}: {}\n", task.id, task.title);
    out.push_str(&format!(
        "  status:   {}\n",
        if task.completed { "done" } else { "open" }
    ));
    out.push_str(&format!(
        "  priority: {}\n",
        task.priority.map_or("-".to_string(), |p| p.to_string())
    ));
    out.push_str(&format!(
        "  due:      {}\n",
        task.due_date.as_ref().map_or("-".to_string(), local_stamp)
    ));
    out.push_str(&format!("  created:  {}\n", local_stamp(&task.created_at)));
    out.push_str(&format!("  updated:  {}\n", local_stamp(&task.updated_at)));
    if let Some(description) = &task.description {
        out.push_str(&format!("\n  {description}\n"));
    }
    out
}

pub fn health_line(report: &HealthReport) -> String {
    let nl = if report.natural_language_available {
        "AI parsing available"
    } else {
        "AI parsing unavailable"
    };
    format!("service status: {} ({nl})", report.status)
}

pub fn error_banner(message: &str) -> String {
    format!("error: {message}")
}
