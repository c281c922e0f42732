//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat session management and
//! per-chat settings (role instruction and reference document).

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    /// Start a new session.
    New,
    /// List sessions.
    Sessions,
    /// Make another session active (1-based number).
    Switch(usize),
    /// Rename the active session.
    Rename(String),
    /// Set the role instruction; `None` clears it.
    Role(Option<String>),
    /// Attach a reference document; `None` detaches it.
    Doc(Option<String>),
    /// Show the active session's turns.
    History,
    /// Unknown command or bad arguments, with a message for the user.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (trimmed.to_lowercase(), None),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/sessions" | "/ls" => ChatCommand::Sessions,
        "/history" => ChatCommand::History,
        "/switch" | "/sw" => match arg.map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => ChatCommand::Switch(n),
            _ => ChatCommand::Unknown("/switch requires a session number".to_string()),
        },
        "/rename" => match arg {
            Some(title) => ChatCommand::Rename(title.to_string()),
            None => ChatCommand::Unknown("/rename requires a title".to_string()),
        },
        "/role" => ChatCommand::Role(arg.map(str::to_string)),
        "/doc" => ChatCommand::Doc(arg.map(str::to_string)),
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Start a new session"),
        ("/sessions", "List sessions"),
        ("/switch N", "Continue session N"),
        ("/rename TITLE", "Rename the current session"),
        ("/role [TEXT]", "Set the role instruction (no text clears it)"),
        ("/doc [PATH]", "Attach a text document, PDFs via pdftotext (no path detaches it)"),
        ("/history", "Show this session's turns"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {:<16} {}", style(cmd).cyan(), help);
    }
    println!();
    println!(
        "  {}",
        style("Anything else is sent to both models. Ctrl+D to exit.").dim()
    );
    println!();
}
