use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Terminal client for the to-do list API", long_about = None)]
pub struct Cli {
    /// API base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true, env = "TODO_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to the config file
    #[arg(long, global = true, env = "TODO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Text,
    Html,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a username or email
    Login {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Signup {
        #[arg(value_name = "USERNAME")]
        username: String,
        #[arg(value_name = "EMAIL")]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show whether you are logged in
    Status,
    /// List all tasks
    List {
        #[arg(long, value_enum, default_value = "text")]
        format: ListFormat,
    },
    /// Add a task
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// Due time (HH:MM)
        #[arg(short, long)]
        time: Option<String>,
    },
    /// Change a task, selected by id or name
    Edit {
        #[arg(value_name = "TASK")]
        task: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, conflicts_with = "clear_date")]
        date: Option<String>,
        #[arg(short, long, conflicts_with = "clear_time")]
        time: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_date: bool,
        /// Remove the due time
        #[arg(long)]
        clear_time: bool,
    },
    /// Delete a task, selected by id or name
    Delete {
        #[arg(value_name = "TASK")]
        task: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Launch TUI interface
    Tui,
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
