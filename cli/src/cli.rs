//! Command-line arguments and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Todo and chat client for the todo backend")]
pub struct Cli {
    /// Base URL of the API; paths are appended verbatim
    #[arg(long, env = "TODO_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// File holding the session token
    #[arg(long, env = "TODO_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Give up on a request after this many seconds
    #[arg(long, env = "TODO_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Explicit `--token-file`, else `<config dir>/todo-client/token`.
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_file.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("todo-client").join("token"))
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and start a session
    Signup { email: String, password: String },
    /// Start a session for an existing account
    Login { email: String, password: String },
    /// End the session
    Logout,
    /// List todos
    List,
    /// Add a todo
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Toggle a todo between done and open
    Done { id: i64 },
    /// Change a todo's title or description
    Edit {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete one todo
    Delete { id: i64 },
    /// Delete several todos at once
    DeleteSelected {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Delete every todo
    DeleteAll,
    /// Chat with the assistant
    #[command(subcommand)]
    Chat(ChatCommand),
}

#[derive(Debug, Subcommand)]
pub enum ChatCommand {
    /// Show the conversation so far
    History,
    /// Send a message
    Send { message: String },
    /// Delete the conversation
    Clear,
}
