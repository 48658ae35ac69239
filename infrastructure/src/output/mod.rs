//! Debate transcripts on disk
//!
//! Every debate gets its own directory under the output root:
//!
//! ```text
//! mars-output/2026-03-01T14-05-09_should-we-rewrite-it-in-rust/
//!   final-answer.md
//!   audit/
//!     00-prompt-and-context.md
//!     01-round-1-responses.md
//!     02-round-2-critiques.md
//!     convergence.md
//!     resolution.md
//!     attribution.md
//!     round-diffs.md
//!     costs.md
//! ```
//!
//! [`MarkdownWriter`] produces this layout; the [`reader`] functions query it
//! for the `show` and `history` commands.

pub mod markdown_writer;
pub mod reader;

pub use markdown_writer::MarkdownWriter;
pub use reader::{DebateSummary, OutputError};

/// Sub-directory holding everything except the final answer
pub const AUDIT_DIR: &str = "audit";
pub const FINAL_ANSWER_FILE: &str = "final-answer.md";
pub const PROMPT_FILE: &str = "00-prompt-and-context.md";
pub const CONVERGENCE_FILE: &str = "convergence.md";
pub const RESOLUTION_FILE: &str = "resolution.md";
pub const ATTRIBUTION_FILE: &str = "attribution.md";
pub const ROUND_DIFFS_FILE: &str = "round-diffs.md";
pub const COSTS_FILE: &str = "costs.md";
