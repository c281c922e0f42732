//! Printing a turn as five labelled sections or as JSON.

use crosscheck_types::llm::Backend;
use crosscheck_types::session::{Turn, is_error_text};

use super::chat::renderer::ChatRenderer;

/// Section headings paired with the turn field they show, in display order.
pub fn sections(turn: &Turn) -> Vec<(String, &str)> {
    let model_b = turn.synthesis_model_id.as_deref().unwrap_or("?");
    vec![
        (
            format!("Answer · {} ({})", Backend::A.label(), turn.backend_model_id),
            turn.answer_a.as_str(),
        ),
        (
            format!("Answer · {} ({model_b})", Backend::B.label()),
            turn.answer_b.as_str(),
        ),
        (
            format!("Critique · {} on {}", Backend::A.label(), Backend::B.label()),
            turn.critique_a_of_b.as_str(),
        ),
        (
            format!("Critique · {} on {}", Backend::B.label(), Backend::A.label()),
            turn.critique_b_of_a.as_str(),
        ),
        (
            format!("Synthesis · {}", Backend::B.label()),
            turn.synthesis.as_str(),
        ),
    ]
}

pub fn print_turn(renderer: &ChatRenderer, turn: &Turn) {
    for (heading, body) in sections(turn) {
        renderer.print_section(&heading, body, is_error_text(body));
    }
    let failed = turn.failed_fields();
    if !failed.is_empty() {
        println!();
        println!(
            "  {} {} of 5 steps failed: {}",
            console::style("!").yellow().bold(),
            failed.len(),
            failed.join(", ")
        );
    }
    println!();
}

/// The turn with its list of failed fields, for `--json` output.
pub fn turn_json(turn: &Turn) -> serde_json::Value {
    serde_json::json!({
        "turn": turn,
        "failed_fields": turn.failed_fields(),
    })
}

/// One-line preview of a question for listings.
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text
    }
}
