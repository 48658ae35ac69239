//! Debate mode, verbosity and phase definitions.
//!
//! - [`DebateMode`] selects the orchestration strategy
//! - [`Verbosity`] selects concurrent (quiet) or sequential streaming (verbose) dispatch
//! - [`DebatePhase`] labels the unit of work currently in flight

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the participants interact.
///
/// - **RoundRobin** (default): every participant answers, then critiques
///   the others and revises for up to `max_rounds`, followed by synthesis.
/// - **Judge**: every participant answers once, then a single judge
///   evaluates all answers and produces the final one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebateMode {
    #[default]
    RoundRobin,
    Judge,
}

impl DebateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebateMode::RoundRobin => "round-robin",
            DebateMode::Judge => "judge",
        }
    }
}

impl fmt::Display for DebateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DebateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round-robin" | "roundrobin" | "rr" => Ok(DebateMode::RoundRobin),
            "judge" => Ok(DebateMode::Judge),
            _ => Err(format!("Invalid DebateMode: {}", s)),
        }
    }
}

/// Output verbosity, which also decides the dispatch model.
///
/// Quiet dispatches every provider of a round concurrently. Verbose
/// streams each provider to the output sink one after another, since
/// concurrent streams would interleave on the same terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
}

impl Verbosity {
    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Unit of work reported to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebatePhase {
    /// A numbered debate round (1-based)
    Round(u32),
    /// The judge evaluating all round-1 answers
    Judging,
    /// Merging the latest answers into the final one
    Synthesis,
}

impl DebatePhase {
    pub fn display_name(&self) -> String {
        match self {
            DebatePhase::Round(1) => "Round 1".to_string(),
            DebatePhase::Round(n) => format!("Round {} critiques", n),
            DebatePhase::Judging => "Judging".to_string(),
            DebatePhase::Synthesis => "Synthesizing".to_string(),
        }
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
