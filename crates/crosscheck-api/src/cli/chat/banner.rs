//! Welcome banner shown when a chat starts.

use console::style;

/// Print the banner with both models and the active session.
pub fn print_welcome_banner(
    model_a: &str,
    model_b: &str,
    session_number: usize,
    session_title: &str,
    turns: usize,
) {
    println!();
    println!("  {} {}", style("⚖").bold(), style("Crosscheck").cyan().bold());
    println!(
        "  {}",
        style("Two answers, two critiques, one verdict.").dim()
    );
    println!();
    println!(
        "  {}  {}",
        style("Model A:").bold(),
        style(model_a).dim()
    );
    println!(
        "  {}  {} {}",
        style("Model B:").bold(),
        style(model_b).dim(),
        style("(chair)").dim()
    );
    println!(
        "  {}  {} {}",
        style("Session:").bold(),
        style(format!("{session_number} \"{session_title}\"")).dim(),
        style(format!("{turns} turn(s)")).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
