//! Prompt domain
//!
//! Message templates for each stage of a debate.

mod template;

pub use template::DebatePrompt;
