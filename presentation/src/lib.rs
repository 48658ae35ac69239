//! Presentation layer for mars
//!
//! This crate contains CLI definitions, debate flag parsing, the progress
//! renderer and report formatters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, DebateArgs, HistoryArgs, ModeArg, ShowArgs, ShowSection};
pub use cli::participants::{ArgumentError, model_overrides, participant_ids, resolve_value};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ConsoleRenderer;
