use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Parser;
use tracing::debug;

use taskdeck::cli::{Cli, Command};
use taskdeck::config::Config;
use taskdeck::engine::{DraftInput, Engine};
use taskdeck::error::{Error, Result};
use taskdeck::gateway::{TaskGateway, UreqHttp};
use taskdeck::model::Priority;
use taskdeck::render;
use taskdeck::shell;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    debug!(?config, "config loaded");

    let client = UreqHttp::new(&config.api_url, Duration::from_secs(config.timeout_seconds));
    let mut engine = Engine::new(TaskGateway::new(Box::new(client)));

    if let Err(e) = run(&mut engine, &cli.command, &config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    // Intent handlers report failure through the session error, not Err.
    if let Some(message) = engine.error() {
        eprintln!("{}", render::error_banner(message));
        std::process::exit(1);
    }
}

fn run(engine: &mut Engine, command: &Command, config: &Config) -> Result<()> {
    if let Command::Shell = command {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        return shell::run(
            engine,
            Duration::from_secs(config.health_poll_seconds),
            &mut input,
            &mut output,
        );
    }

    // One-shot commands are each a short session: load, probe, one intent.
    engine.start();

    match command {
        Command::List => {
            if engine.error().is_none() {
                println!("{}", render::task_table(&engine.tasks()));
            }
        }
        Command::Show { id } => match engine.task(*id) {
            Some(task) => println!("{}", render::task_detail(task)),
            None => {
                if engine.error().is_none() {
                    return Err(Error::Validation(format!("no task with id {id}")));
                }
            }
        },
        Command::Add {
            title,
            description,
            due,
            priority,
        } => {
            engine.open_form();
            engine.create(DraftInput {
                title: Some(title.clone()),
                description: description.clone(),
                due: due.clone(),
                priority: parse_priority(priority)?,
                completed: None,
            });
            if engine.error().is_none() {
                println!("{}", render::task_table(&engine.tasks()));
            }
        }
        Command::Ai { text } => {
            engine.create_from_text(&text.join(" "));
            if engine.error().is_none() {
                println!("{}", render::task_table(&engine.tasks()));
            }
        }
        Command::Done { id } => {
            if engine.task(*id).is_none() && engine.error().is_none() {
                return Err(Error::Validation(format!("no task with id {id}")));
            }
            engine.toggle(*id);
            if let Some(task) = engine.task(*id)
                && engine.error().is_none()
            {
                println!("{}", render::task_line(task));
            }
        }
        Command::Edit {
            id,
            title,
            description,
            due,
            priority,
            completed,
        } => {
            engine.begin_edit(*id);
            if engine.editing().is_none() {
                if engine.error().is_none() {
                    return Err(Error::Validation(format!("no task with id {id}")));
                }
                return Ok(());
            }
            engine.save_edit(DraftInput {
                title: title.clone(),
                description: description.clone(),
                due: due.clone(),
                priority: parse_priority(priority)?,
                completed: *completed,
            });
            if let Some(task) = engine.task(*id)
                && engine.error().is_none()
            {
                println!("{}", render::task_line(task));
            }
        }
        Command::Rm { id, yes } => {
            if !yes && !confirm_delete(*id)? {
                println!("cancelled");
                return Ok(());
            }
            engine.delete(*id);
        }
        Command::Health => {
            println!("{}", render::health_line(engine.health()));
        }
        Command::Shell => unreachable!("handled above"),
    }
    Ok(())
}

fn parse_priority(raw: &Option<String>) -> Result<Option<Priority>> {
    match raw {
        None => Ok(None),
        Some(s) => Priority::parse(s).map(Some).ok_or_else(|| {
            Error::Validation(format!("unknown priority: {s} (expected: low, medium, high)"))
        }),
    }
}

fn confirm_delete(id: i64) -> Result<bool> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Delete task {id}? [y/N]: ")?;
    stderr.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
