//! Interactive chat over the router.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! The whole conversation is resent on every turn, so any provider can
//! pick it up after a failover.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use switchboard_core::{ChatMessage, Provider, RequestEnvelope};
use switchboard_router::Router;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

const RESET_COMMAND: &str = "/reset";

/// Conversation state for one REPL session.
#[derive(Debug)]
struct Conversation {
    system: Option<String>,
    turns: Vec<ChatMessage>,
}

impl Conversation {
    fn new(system: Option<String>) -> Self {
        Self {
            system,
            turns: Vec::new(),
        }
    }

    /// Messages to send for a new user input.
    fn with_user(&self, input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() + 2);
        if let Some(ref system) = self.system {
            messages.push(ChatMessage::system(system.as_str()));
        }
        messages.extend(self.turns.iter().cloned());
        messages.push(ChatMessage::user(input));
        messages
    }

    /// Keep a completed exchange. Failed turns are never recorded.
    fn commit(&mut self, input: &str, reply: &str) {
        self.turns.push(ChatMessage::user(input));
        self.turns.push(ChatMessage::assistant(reply));
    }

    fn reset(&mut self) {
        self.turns.clear();
    }
}

/// Run the interactive REPL loop.
pub async fn run(router: &Router, preferred: Option<Provider>, system: Option<String>) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;
    let mut conversation = Conversation::new(system);
    let options = router.options();

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed.eq_ignore_ascii_case(RESET_COMMAND) {
            conversation.reset();
            println!("(conversation cleared)\n");
            continue;
        }

        let envelope = RequestEnvelope::new(conversation.with_user(trimmed))
            .with_preferred_provider(preferred)
            .with_max_retries(options.max_retries)
            .with_temperature(options.temperature);

        debug!(turns = conversation.turns.len(), "routing chat turn");
        helpers::print_thinking();

        match router.route(&envelope).await {
            Ok(reply) => {
                helpers::clear_thinking();
                helpers::print_response(&reply);
                conversation.commit(trimmed, &reply);
            }
            Err(e) => {
                helpers::clear_thinking();
                eprintln!("\nError: {e}\n");
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// `~/.switchboard/history/cli_history`
fn history_path() -> std::path::PathBuf {
    switchboard_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::Role;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("/quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("hello"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".switchboard"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }

    #[test]
    fn conversation_resends_history() {
        let mut conversation = Conversation::new(Some("Be brief.".into()));
        conversation.commit("hi", "hello");

        let messages = conversation.with_user("how are you?");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "how are you?");
    }

    #[test]
    fn conversation_reset_keeps_system() {
        let mut conversation = Conversation::new(Some("Be brief.".into()));
        conversation.commit("hi", "hello");
        conversation.reset();

        let messages = conversation.with_user("again");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
    }
}
