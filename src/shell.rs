use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::{DraftInput, Engine};
use crate::error::Result;
use crate::model::Priority;
use crate::render;

const HELP: &str = "\
commands:
  list                show all tasks
  show <id>           show one task in full
  add                 create a task (prompts for fields)
  ai <text>           create a task from natural language
  done <id>           toggle completion
  edit <id>           edit a task (blank field keeps current value)
  rm <id>             delete a task (asks for confirmation)
  health              probe the service
  dismiss             clear the error banner
  help                this text
  quit                leave the shell";

/// Interactive session over injected reader/writer so the whole loop is
/// testable without a terminal. The health flag is re-probed once the
/// poll interval has elapsed, checked between commands.
pub fn run(
    engine: &mut Engine,
    poll_interval: Duration,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    engine.start();
    writeln!(output, "{}", render::task_table(&engine.tasks()))?;
    show_banner(engine, output)?;

    let mut last_probe = Instant::now();
    loop {
        write!(output, "taskdeck> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        if last_probe.elapsed() >= poll_interval {
            engine.refresh_health();
            last_probe = Instant::now();
        }

        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        debug!(command, "shell command");

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => writeln!(output, "{HELP}")?,
            "list" | "ls" => writeln!(output, "{}", render::task_table(&engine.tasks()))?,
            "show" => show(engine, rest, output)?,
            "add" => add(engine, input, output)?,
            "ai" => {
                engine.create_from_text(rest);
                if engine.error().is_none() {
                    writeln!(output, "{}", render::task_table(&engine.tasks()))?;
                }
            }
            "done" => {
                if let Some(id) = parse_id(rest, output)? {
                    engine.toggle(id);
                }
            }
            "edit" => edit(engine, rest, input, output)?,
            "rm" => remove(engine, rest, input, output)?,
            "health" => {
                engine.refresh_health();
                writeln!(output, "{}", render::health_line(engine.health()))?;
            }
            "dismiss" => engine.dismiss_error(),
            other => writeln!(output, "unknown command: {other} (try help)")?,
        }

        show_banner(engine, output)?;
    }
    Ok(())
}

fn show_banner(engine: &Engine, output: &mut dyn Write) -> Result<()> {
    if let Some(message) = engine.error() {
        writeln!(output, "{}", render::error_banner(message))?;
    }
    Ok(())
}

fn parse_id(arg: &str, output: &mut dyn Write) -> Result<Option<i64>> {
    match arg.parse::<i64>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            writeln!(output, "invalid task id: {arg}")?;
            Ok(None)
        }
    }
}

fn prompt_line(
    label: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<String> {
    write!(output, "{label}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_priority(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<std::result::Result<Option<Priority>, String>> {
    let raw = prompt_line("Priority (low/medium/high, blank for none): ", input, output)?;
    if raw.is_empty() {
        return Ok(Ok(None));
    }
    match Priority::parse(&raw) {
        Some(p) => Ok(Ok(Some(p))),
        None => Ok(Err(raw)),
    }
}

fn show(engine: &Engine, arg: &str, output: &mut dyn Write) -> Result<()> {
    let Some(id) = parse_id(arg, output)? else {
        return Ok(());
    };
    match engine.task(id) {
        Some(task) => writeln!(output, "{}", render::task_detail(task))?,
        None => writeln!(output, "no task with id {id}")?,
    }
    Ok(())
}

fn add(engine: &mut Engine, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<()> {
    engine.open_form();
    let title = prompt_line("Title: ", input, output)?;
    let description = prompt_line("Description (blank for none): ", input, output)?;
    let due = prompt_line("Due (YYYY-MM-DD [HH:MM], blank for none): ", input, output)?;
    let priority = match prompt_priority(input, output)? {
        Ok(p) => p,
        Err(raw) => {
            writeln!(output, "invalid priority: {raw}")?;
            engine.cancel_edit();
            return Ok(());
        }
    };

    engine.create(DraftInput {
        title: Some(title),
        description: Some(description),
        due: Some(due),
        priority,
        completed: None,
    });
    if engine.error().is_none() {
        writeln!(output, "{}", render::task_table(&engine.tasks()))?;
    }
    Ok(())
}

fn edit(
    engine: &mut Engine,
    arg: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    let Some(id) = parse_id(arg, output)? else {
        return Ok(());
    };
    engine.begin_edit(id);
    if engine.editing() != Some(id) {
        writeln!(output, "no task with id {id}")?;
        return Ok(());
    }

    let title = prompt_line("Title (blank keeps current): ", input, output)?;
    let description = prompt_line("Description (blank keeps current): ", input, output)?;
    let due = prompt_line("Due (blank keeps current): ", input, output)?;
    let priority = match prompt_priority(input, output)? {
        Ok(p) => p,
        Err(raw) => {
            writeln!(output, "invalid priority: {raw}")?;
            engine.cancel_edit();
            return Ok(());
        }
    };

    let draft = DraftInput {
        title: (!title.is_empty()).then_some(title),
        description: (!description.is_empty()).then_some(description),
        due: (!due.is_empty()).then_some(due),
        priority,
        completed: None,
    };
    engine.save_edit(draft);
    if engine.error().is_none()
        && let Some(task) = engine.task(id)
    {
        writeln!(output, "{}", render::task_line(task))?;
    }
    Ok(())
}

fn remove(
    engine: &mut Engine,
    arg: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    let Some(id) = parse_id(arg, output)? else {
        return Ok(());
    };
    if engine.task(id).is_none() {
        writeln!(output, "no task with id {id}")?;
        return Ok(());
    }
    let answer = prompt_line(&format!("Delete task {id}? [y/N]: "), input, output)?;
    if answer.eq_ignore_ascii_case("y") {
        engine.delete(id);
    } else {
        writeln!(output, "cancelled")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::gateway::testing::{MockHttp, scripted, task_json};
    use std::io::Cursor;
    use std::rc::Rc;

    const NEVER: Duration = Duration::from_secs(3600);

    fn engine(responses: Vec<crate::error::Result<String>>) -> (Engine, Rc<MockHttp>) {
        let (gateway, mock) = scripted(responses);
        (Engine::new(gateway), mock)
    }

    fn two_tasks() -> String {
        format!(
            "[{}, {}]",
            task_json(1, "first", false, "2026-01-01T10:00:00"),
            task_json(2, "second", true, "2026-01-02T10:00:00"),
        )
    }

    fn health_ok() -> crate::error::Result<String> {
        Ok(r#"{"status": "ok", "llm_service": "available"}"#.to_string())
    }

    fn run_script(
        engine: &mut Engine,
        script: &str,
        poll_interval: Duration,
    ) -> String {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        run(engine, poll_interval, &mut input, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_startup_lists_tasks_then_quit() {
        let (mut engine, _) = engine(vec![Ok(two_tasks()), health_ok()]);
        let out = run_script(&mut engine, "quit\n", NEVER);
        assert!(out.contains("first"));
        assert!(out.contains("second"));
    }

    #[test]
    fn test_eof_ends_session() {
        let (mut engine, _) = engine(vec![Ok(two_tasks()), health_ok()]);
        let out = run_script(&mut engine, "", NEVER);
        assert!(out.contains("taskdeck> "));
    }

    #[test]
    fn test_unknown_command_reported() {
        let (mut engine, _) = engine(vec![Ok("[]".to_string()), health_ok()]);
        let out = run_script(&mut engine, "frobnicate\nquit\n", NEVER);
        assert!(out.contains("unknown command: frobnicate"));
    }

    #[test]
    fn test_add_flow_creates_task() {
        let (mut engine, mock) = engine(vec![
            Ok("[]".to_string()),
            health_ok(),
            Ok(task_json(3, "Buy milk", false, "2026-01-03T10:00:00")),
        ]);
        // add → title, description, due, priority
        let out = run_script(&mut engine, "add\nBuy milk\n\n\nhigh\nquit\n", NEVER);
        assert!(out.contains("Buy milk"));
        assert_eq!(engine.tasks().len(), 1);

        let calls = mock.calls.borrow();
        assert_eq!(calls[2].1, "/tasks/");
        assert_eq!(
            calls[2].2,
            Some(serde_json::json!({"title": "Buy milk", "priority": "high"}))
        );
    }

    #[test]
    fn test_add_invalid_priority_aborts_without_call() {
        let (mut engine, mock) = engine(vec![Ok("[]".to_string()), health_ok()]);
        let out = run_script(&mut engine, "add\nBuy milk\n\n\nurgent\nquit\n", NEVER);
        assert!(out.contains("invalid priority: urgent"));
        assert_eq!(mock.calls.borrow().len(), 2); // load + health only
    }

    #[test]
    fn test_add_empty_title_shows_banner() {
        let (mut engine, mock) = engine(vec![Ok("[]".to_string()), health_ok()]);
        let out = run_script(&mut engine, "add\n\n\n\n\nquit\n", NEVER);
        assert!(out.contains("error: task title cannot be empty"));
        assert_eq!(mock.calls.borrow().len(), 2);
    }

    #[test]
    fn test_ai_command_creates_from_text() {
        let (mut engine, mock) = engine(vec![
            Ok("[]".to_string()),
            health_ok(),
            Ok(task_json(9, "Submit taxes", false, "2026-01-05T10:00:00")),
        ]);
        let out = run_script(&mut engine, "ai remind me to submit taxes\nquit\n", NEVER);
        assert!(out.contains("Submit taxes"));
        assert_eq!(mock.calls.borrow()[2].1, "/tasks/parse");
    }

    #[test]
    fn test_done_toggles() {
        let (mut engine, mock) = engine(vec![
            Ok(two_tasks()),
            health_ok(),
            Ok(task_json(1, "first", true, "2026-01-01T10:00:00")),
        ]);
        run_script(&mut engine, "done 1\nquit\n", NEVER);
        assert!(engine.task(1).unwrap().completed);
        assert_eq!(
            mock.calls.borrow()[2].2,
            Some(serde_json::json!({"completed": true}))
        );
    }

    #[test]
    fn test_done_invalid_id_reported() {
        let (mut engine, mock) = engine(vec![Ok(two_tasks()), health_ok()]);
        let out = run_script(&mut engine, "done abc\nquit\n", NEVER);
        assert!(out.contains("invalid task id: abc"));
        assert_eq!(mock.calls.borrow().len(), 2);
    }

    #[test]
    fn test_edit_blank_fields_keep_current() {
        let (mut engine, mock) = engine(vec![
            Ok(two_tasks()),
            health_ok(),
            Ok(task_json(1, "renamed", false, "2026-01-01T10:00:00")),
        ]);
        // Only the title is provided; everything else left blank.
        run_script(&mut engine, "edit 1\nrenamed\n\n\n\nquit\n", NEVER);
        assert_eq!(engine.task(1).unwrap().title, "renamed");
        assert_eq!(
            mock.calls.borrow()[2].2,
            Some(serde_json::json!({"title": "renamed"}))
        );
    }

    #[test]
    fn test_rm_requires_confirmation() {
        let (mut engine, mock) = engine(vec![Ok(two_tasks()), health_ok()]);
        let out = run_script(&mut engine, "rm 1\nn\nquit\n", NEVER);
        assert!(out.contains("cancelled"));
        assert_eq!(mock.calls.borrow().len(), 2); // no delete sent
        assert!(engine.task(1).is_some());
    }

    #[test]
    fn test_rm_confirmed_deletes() {
        let (mut engine, mock) = engine(vec![Ok(two_tasks()), health_ok(), Ok(String::new())]);
        run_script(&mut engine, "rm 1\ny\nquit\n", NEVER);
        assert!(engine.task(1).is_none());
        assert_eq!(mock.calls.borrow()[2].0, "DELETE");
    }

    #[test]
    fn test_show_unknown_id() {
        let (mut engine, _) = engine(vec![Ok(two_tasks()), health_ok()]);
        let out = run_script(&mut engine, "show 42\nquit\n", NEVER);
        assert!(out.contains("no task with id 42"));
    }

    #[test]
    fn test_health_command_reprobes() {
        let (mut engine, mock) = engine(vec![
            Ok("[]".to_string()),
            health_ok(),
            Ok(r#"{"status": "ok", "llm_service": "unavailable (using fallback)"}"#.to_string()),
        ]);
        let out = run_script(&mut engine, "health\nquit\n", NEVER);
        assert!(out.contains("AI parsing unavailable"));
        let health_calls = mock
            .calls
            .borrow()
            .iter()
            .filter(|(_, path, _)| path == "/health")
            .count();
        assert_eq!(health_calls, 2);
    }

    #[test]
    fn test_elapsed_interval_triggers_probe() {
        // Zero interval: every command re-probes. Scripted responses run
        // out, which the health check absorbs as degraded.
        let (mut engine, mock) = engine(vec![Ok("[]".to_string()), health_ok()]);
        run_script(&mut engine, "list\nquit\n", Duration::ZERO);
        let health_calls = mock
            .calls
            .borrow()
            .iter()
            .filter(|(_, path, _)| path == "/health")
            .count();
        assert!(health_calls >= 2);
        assert!(!engine.nl_available());
    }

    #[test]
    fn test_dismiss_clears_banner() {
        let (mut engine, _) = engine(vec![
            Err(crate::error::Error::Network("down".to_string())),
            health_ok(),
        ]);
        let out = run_script(&mut engine, "dismiss\nlist\nquit\n", NEVER);
        assert!(out.contains("error: Failed to load tasks"));
        assert!(engine.error().is_none());
    }
}
