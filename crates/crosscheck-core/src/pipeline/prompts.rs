//! Prompt builders for the three pipeline stages.

use crosscheck_types::document::ReferenceDocument;
use crosscheck_types::llm::Backend;

pub const DOCUMENT_START: &str = "=== REFERENCE DOCUMENT:";
pub const DOCUMENT_END: &str = "=== END REFERENCE DOCUMENT ===";

/// Stage 1: the question, with the reference document (if any) ahead of it.
pub fn generation_prompt(question: &str, reference: Option<&ReferenceDocument>) -> String {
    let question = question.trim();
    match reference.filter(|doc| !doc.is_empty()) {
        Some(doc) => {
            let note = if doc.truncated {
                "\n(The document was truncated.)"
            } else {
                ""
            };
            format!(
                "{DOCUMENT_START} {name} ===\n{text}\n{DOCUMENT_END}{note}\n\n\
                 Using the reference document above where relevant, answer the question:\n\
                 {question}",
                name = doc.name,
                text = doc.text.trim_end(),
            )
        }
        None => question.to_string(),
    }
}

/// Stage 2: ask one backend to critique its peer's answer.
pub fn critique_prompt(question: &str, peer: Backend, peer_answer: &str) -> String {
    format!(
        "Another assistant ({peer}) answered the question below. Review its answer critically.\n\
         \n\
         [Question]\n\
         {question}\n\
         \n\
         [{peer}'s answer]\n\
         {peer_answer}\n\
         \n\
         Write a natural, substantive critique in prose. Point out logical gaps, factual \
         errors and anything important that is missing, and say what you would change. \
         Do not produce a formulaic pros/cons list.",
        peer = peer.label(),
        question = question.trim(),
        peer_answer = peer_answer.trim(),
    )
}

/// Stage 3: the chair prompt that resolves both answers and both critiques.
pub fn synthesis_prompt(
    question: &str,
    answer_a: &str,
    answer_b: &str,
    critique_a_of_b: &str,
    critique_b_of_a: &str,
) -> String {
    format!(
        "You are the chair of a discussion between two assistants. Review everything \
         below and write the final conclusion that is most useful to the user.\n\
         \n\
         [Question]\n\
         {question}\n\
         \n\
         [{a}'s answer]\n\
         {answer_a}\n\
         \n\
         [{b}'s answer]\n\
         {answer_b}\n\
         \n\
         [{a}'s critique of {b}]\n\
         {critique_a_of_b}\n\
         \n\
         [{b}'s critique of {a}]\n\
         {critique_b_of_a}\n\
         \n\
         ---\n\
         Guidelines:\n\
         1. Briefly note where the two answers agree and where they differ.\n\
         2. Explicitly resolve every valid issue raised in the critiques.\n\
         3. End with clear final advice on what the user should understand or do.\n\
         Be professional and concise.",
        a = Backend::A.label(),
        b = Backend::B.label(),
        question = question.trim(),
        answer_a = answer_a.trim(),
        answer_b = answer_b.trim(),
        critique_a_of_b = critique_a_of_b.trim(),
        critique_b_of_a = critique_b_of_a.trim(),
    )
}
