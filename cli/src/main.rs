mod cli;
mod prompt;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use todo_core::{
    friendly_hint, ChatView, Confirm, DashboardView, FileCredentialStore, Outcome, RequestClient,
    Role, SignupView, TodoApi, UreqTransport,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{ChatCommand, Cli, Command};
use crate::prompt::StdinConfirm;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let token_path = cli
        .token_path()
        .context("no config directory found; pass --token-file")?;
    tracing::debug!(api_url = %cli.api_url, token_file = %token_path.display(), "starting");

    let transport = match cli.timeout() {
        Some(timeout) => UreqTransport::with_timeout(timeout),
        None => UreqTransport::new(),
    };
    let store = Arc::new(FileCredentialStore::new(token_path));
    let api = TodoApi::new(RequestClient::new(&cli.api_url, transport, store));
    let confirm = StdinConfirm::new(cli.yes);

    run(cli.command, &api, &confirm)
}

fn run(command: Command, api: &TodoApi, confirm: &dyn Confirm) -> Result<()> {
    match command {
        Command::Signup { email, password } => {
            let mut view = SignupView::new(&email, &password);
            let outcome = view.submit(api);
            check(outcome, &view.error)?;
            println!("Signed up as {email}.");
        }
        Command::Login { email, password } => {
            let mut view = SignupView::new(&email, &password);
            let outcome = view.login(api);
            check(outcome, &view.error)?;
            println!("Logged in as {email}.");
        }
        Command::Logout => {
            let mut view = DashboardView::new();
            let outcome = view.logout(api, confirm);
            // the local session is gone even if the server call failed
            check(outcome, &view.error)?;
            if outcome == Outcome::Completed {
                println!("Logged out.");
            }
        }
        Command::List => {
            let mut view = DashboardView::new();
            check(view.load(api), &view.error)?;
            print_todos(&view);
        }
        Command::Add { title, description } => {
            let mut view = DashboardView::new();
            let outcome = view.add(api, &title, &description);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::Done { id } => {
            let mut view = loaded(api)?;
            let outcome = view.toggle_complete(api, id);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            let mut view = loaded(api)?;
            check(view.start_edit(id), &view.error)?;
            if let Some(draft) = view.editing.as_mut() {
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
            }
            let outcome = view.save_edit(api);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::Delete { id } => {
            let mut view = DashboardView::new();
            let outcome = view.delete(api, id, confirm);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::DeleteSelected { ids } => {
            let mut view = loaded(api)?;
            for id in ids {
                view.selected.insert(id);
            }
            let outcome = view.delete_selected(api, confirm);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::DeleteAll => {
            let mut view = loaded(api)?;
            let outcome = view.delete_all(api, confirm);
            check(outcome, &view.error)?;
            print_todos(&view);
        }
        Command::Chat(chat) => run_chat(chat, api, confirm)?,
    }
    Ok(())
}

fn run_chat(command: ChatCommand, api: &TodoApi, confirm: &dyn Confirm) -> Result<()> {
    let mut view = ChatView::new();
    match command {
        ChatCommand::History => {
            check(view.load_history(api), &view.error)?;
            if view.messages.is_empty() {
                println!("No messages yet.");
            }
            for entry in &view.messages {
                println!("{}: {}", speaker(entry.role), entry.content);
            }
        }
        ChatCommand::Send { message } => {
            let outcome = view.send(api, &message);
            check(outcome, &view.error)?;
            if let Some(reply) = view.messages.iter().rev().find(|e| e.role == Role::Assistant) {
                println!("{}", reply.content);
            }
        }
        ChatCommand::Clear => {
            let outcome = view.clear(api, confirm);
            check(outcome, &view.error)?;
            if outcome == Outcome::Completed {
                println!("Chat cleared.");
            }
        }
    }
    Ok(())
}

fn loaded(api: &TodoApi) -> Result<DashboardView> {
    let mut view = DashboardView::new();
    check(view.load(api), &view.error)?;
    Ok(view)
}

/// Turn a view outcome into a process result, attaching a hint when the
/// error text matches one.
fn check(outcome: Outcome, error: &Option<String>) -> Result<()> {
    match outcome {
        Outcome::Completed => Ok(()),
        Outcome::Skipped => {
            println!("Nothing to do.");
            Ok(())
        }
        Outcome::Declined => {
            println!("Cancelled.");
            Ok(())
        }
        Outcome::Failed => {
            let message = error.as_deref().unwrap_or("Request failed");
            match friendly_hint(message) {
                Some(hint) => Err(anyhow!("{message}\nhint: {hint}")),
                None => bail!("{message}"),
            }
        }
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

fn print_todos(view: &DashboardView) {
    if view.todos.is_empty() {
        println!("No todos.");
        return;
    }
    for todo in &view.todos {
        let mark = if todo.completed { "x" } else { " " };
        match todo.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => println!("[{mark}] {:>4}  {} ({description})", todo.id, todo.title),
            None => println!("[{mark}] {:>4}  {}", todo.id, todo.title),
        }
    }
}
