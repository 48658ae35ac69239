//! Prompt templates for each stage of a debate

use crate::debate::entities::LlmResponse;
use crate::session::entities::Message;

const SYSTEM_CONTEXT: &str = "You are participating in a structured debate. The user's prompt \
includes context that is essential to the task. Treat the context \
as primary source material - reference it directly, address its \
specifics, and ensure your answer covers every requirement stated \
in both the context and prompt.\n\nCONTEXT:\n";

const CRITIQUE_INSTRUCTIONS: &str = "\nIMPORTANT: Re-read the original prompt and context above carefully. \
For each specific question or requirement in the original prompt, \
evaluate whether the other models addressed it adequately.\n\n\
1. Identify specific points where other answers are wrong, incomplete, \
or miss requirements from the original prompt.\n\
2. Identify what they got right that your answer missed.\n\
3. Call out where any answer (including yours) replaced concrete data \
from the original prompt with vague generalities.\n\
4. Provide your COMPLETE improved answer that addresses ALL \
requirements from the original prompt, incorporating valid points \
from others while correcting errors.\n\n\
When the prompt asks for examples, give CONCRETE examples using \
real data from the context - not generic placeholders. When it asks \
for code, prompts, or schemas, provide complete, usable output. \
Do not summarize or shorten - give a full, detailed answer.";

const EVALUATION_RULES: &str = "CRITICAL RULES:\n\
- Address EVERY numbered question or requirement in the original prompt.\n\
- When the prompt asks for examples, provide CONCRETE examples with \
real data, names, numbers, and specifics - not generic placeholders.\n\
- When the prompt or context mentions specific data (names, numbers, \
scores, versions), use that exact data in your answer.\n\
- When the prompt asks for code, prompts, schemas, or configs, \
provide complete, copy-pasteable output - not descriptions of what \
it would look like.\n\
- Prefer the most specific and detailed version of any point across \
the models. Never abstract a concrete example into a vague summary.\n\
- If models disagree, pick the version with the strongest reasoning \
and most specificity.\n\n\
Structure your response in two sections:\n\n\
## Resolution Analysis\n\
For each model, list which specific points you accepted and which \
you rejected, with reasoning tied to the original requirements.\n\n\
## Final Answer\n\
Provide the complete synthesized answer. Match the level of detail \
and specificity the original prompt demands.";

const SYNTHESIS_PREAMBLE: &str = "\nSynthesize the best possible answer from all models' responses. \
Re-read the original prompt and context above carefully.\n\n";

const JUDGE_PREAMBLE: &str = "\nYou are the judge. Re-read the original prompt and context above \
carefully. Evaluate each response against EVERY specific requirement \
in the original prompt.\n\n";

/// Builds the messages sent to participants at each debate stage
///
/// Every stage repeats the full prompt envelope (context blocks plus the
/// original prompt) so that late rounds never lose sight of the task.
#[derive(Debug, Clone, Copy)]
pub struct DebatePrompt<'a> {
    prompt: &'a str,
    context: &'a [String],
}

impl<'a> DebatePrompt<'a> {
    pub fn new(prompt: &'a str, context: &'a [String]) -> Self {
        Self { prompt, context }
    }

    /// Original prompt wrapped with its context blocks
    pub fn envelope(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.context.is_empty() {
            parts.push("=== CONTEXT ===".to_string());
            for (i, ctx) in self.context.iter().enumerate() {
                if self.context.len() > 1 {
                    parts.push(format!("\n--- Context {} ---", i + 1));
                }
                parts.push(ctx.clone());
            }
            parts.push("\n=== END CONTEXT ===\n".to_string());
        }
        parts.push(format!("ORIGINAL PROMPT: {}", self.prompt));
        parts.join("\n")
    }

    /// System instruction framing context as primary source material.
    /// `None` when there is no context.
    pub fn system_message(&self) -> Option<Message> {
        if self.context.is_empty() {
            return None;
        }
        let joined = self.context.join("\n\n---\n\n");
        Some(Message::system(format!("{SYSTEM_CONTEXT}{joined}")))
    }

    /// Round 1: every participant answers independently
    pub fn initial(&self) -> Vec<Message> {
        self.with_system(self.envelope())
    }

    /// Rounds 2+: a participant critiques the others and improves its answer
    pub fn critique(&self, own: &LlmResponse, others: &[&LlmResponse]) -> Vec<Message> {
        let mut parts = vec![
            self.envelope(),
            format!("\n---\n\nYour previous answer:\n{}\n", own.content),
            "\nOther models' answers:\n".to_string(),
        ];
        for other in others {
            parts.push(format!(
                "--- {} ---\n{}\n",
                other.participant_id, other.content
            ));
        }
        parts.push(CRITIQUE_INSTRUCTIONS.to_string());
        self.with_system(parts.join("\n"))
    }

    /// Merge every participant's latest answer into one
    pub fn synthesis(&self, latest: &[LlmResponse]) -> Vec<Message> {
        let mut parts = vec![
            self.envelope(),
            "\n---\n\nFinal answers from each model after debate:\n".to_string(),
        ];
        parts.extend(latest.iter().map(labelled));
        parts.push(format!("{SYNTHESIS_PREAMBLE}{EVALUATION_RULES}"));
        self.with_system(parts.join("\n"))
    }

    /// A single judge evaluates all round-1 answers
    pub fn judge(&self, responses: &[LlmResponse]) -> Vec<Message> {
        let mut parts = vec![
            self.envelope(),
            "\n---\n\nResponses from each model:\n".to_string(),
        ];
        parts.extend(responses.iter().map(labelled));
        parts.push(format!("{JUDGE_PREAMBLE}{EVALUATION_RULES}"));
        self.with_system(parts.join("\n"))
    }

    fn with_system(&self, user: String) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_message() {
            messages.push(system);
        }
        messages.push(Message::user(user));
        messages
    }
}

fn labelled(response: &LlmResponse) -> String {
    format!(
        "--- {} ({}) ---\n{}\n",
        response.participant_id, response.model, response.content
    )
}
