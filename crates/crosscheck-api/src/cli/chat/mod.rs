//! Interactive CLI chat for Crosscheck.
//!
//! Each line the user enters runs one full pipeline turn, rendered as five
//! sections, with slash commands for session management. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
