//! Heading protocol for synthesis and judge output.
//!
//! A synthesizing model is asked to answer in two sections. Everything
//! before the first [`FINAL_ANSWER_HEADING`] is resolution reasoning,
//! everything after it is the final answer. Without the heading the whole
//! text is the answer.

/// Marker separating resolution reasoning from the final answer
pub const FINAL_ANSWER_HEADING: &str = "## Final Answer";

/// Final answer and resolution reasoning extracted from a model's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    pub answer: String,
    pub resolution: String,
}

impl FinalAnswer {
    /// Split `content` once on the first occurrence of the heading
    pub fn parse(content: &str) -> Self {
        match content.split_once(FINAL_ANSWER_HEADING) {
            Some((before, after)) => Self {
                answer: after.trim().to_string(),
                resolution: before.trim().to_string(),
            },
            None => Self {
                answer: content.to_string(),
                resolution: String::new(),
            },
        }
    }
}
