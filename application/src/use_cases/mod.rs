//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod retry;
pub mod run_debate;
pub mod strategy;
