use clap::{Parser, Subcommand};

/// taskdeck — command-line client for the task service
#[derive(Parser, Debug, Clone)]
#[command(name = "taskdeck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the task API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all tasks in display order
    List,

    /// Show one task in full
    Show { id: i64 },

    /// Create a task from structured fields
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(long)]
        description: Option<String>,

        /// Due date in local time: YYYY-MM-DD, optionally with HH:MM
        #[arg(long)]
        due: Option<String>,

        /// Priority: low, medium, or high
        #[arg(long)]
        priority: Option<String>,
    },

    /// Create a task from a natural-language description
    Ai {
        /// Free text, e.g. "remind me to submit taxes next monday"
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Toggle a task's completion state
    Done { id: i64 },

    /// Edit task fields; omitted flags keep the current values
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Due date in local time: YYYY-MM-DD, optionally with HH:MM
        #[arg(long)]
        due: Option<String>,

        /// Priority: low, medium, or high
        #[arg(long)]
        priority: Option<String>,

        /// Completion state (true or false)
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Delete a task
    Rm {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Probe service health
    Health,

    /// Start an interactive session
    Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["taskdeck", "list"]);
        assert!(matches!(cli.command, Command::List));
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["taskdeck", "list", "--api-url", "http://example/api/v1"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://example/api/v1"));
    }

    #[test]
    fn test_parse_add_with_fields() {
        let cli = Cli::parse_from([
            "taskdeck", "add", "Buy milk", "--due", "2026-06-01 17:00", "--priority", "high",
        ]);
        match cli.command {
            Command::Add {
                title,
                due,
                priority,
                description,
            } => {
                assert_eq!(title, "Buy milk");
                assert_eq!(due.as_deref(), Some("2026-06-01 17:00"));
                assert_eq!(priority.as_deref(), Some("high"));
                assert!(description.is_none());
            }
            _ => panic!("expected Add"),
        }
    }

    #[test]
    fn test_parse_ai_collects_trailing_words() {
        let cli = Cli::parse_from(["taskdeck", "ai", "submit", "taxes", "monday"]);
        match cli.command {
            Command::Ai { text } => assert_eq!(text, vec!["submit", "taxes", "monday"]),
            _ => panic!("expected Ai"),
        }
    }

    #[test]
    fn test_parse_ai_requires_text() {
        assert!(Cli::try_parse_from(["taskdeck", "ai"]).is_err());
    }

    #[test]
    fn test_parse_rm_with_yes() {
        let cli = Cli::parse_from(["taskdeck", "rm", "7", "--yes"]);
        match cli.command {
            Command::Rm { id, yes } => {
                assert_eq!(id, 7);
                assert!(yes);
            }
            _ => panic!("expected Rm"),
        }
    }

    #[test]
    fn test_parse_edit_partial_flags() {
        let cli = Cli::parse_from(["taskdeck", "edit", "3", "--completed", "true"]);
        match cli.command {
            Command::Edit {
                id,
                completed,
                title,
                ..
            } => {
                assert_eq!(id, 3);
                assert_eq!(completed, Some(true));
                assert!(title.is_none());
            }
            _ => panic!("expected Edit"),
        }
    }

    #[test]
    fn test_parse_non_numeric_id_rejected() {
        assert!(Cli::try_parse_from(["taskdeck", "done", "abc"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["taskdeck"]).is_err());
    }
}
