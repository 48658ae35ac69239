//! Judge strategy: every participant answers once, then one judge
//! evaluates all answers and writes the final one.

use super::{DebateStrategy, StrategyContext};
use crate::use_cases::run_debate::RunDebateError;
use async_trait::async_trait;
use mars_domain::{
    DebateMode, DebatePhase, DebateResult, DebateRound, DomainError, FinalAnswer,
};
use tracing::info;

pub struct JudgeStrategy;

#[async_trait]
impl DebateStrategy for JudgeStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<DebateResult, RunDebateError> {
        let config = ctx.config;
        let judge_id = config.judge().ok_or(DomainError::MissingJudge)?;
        let judge = ctx
            .participant(judge_id)
            .ok_or_else(|| RunDebateError::UnknownParticipant(judge_id.to_string()))?;

        let prompt = ctx.prompt();
        let mut result =
            DebateResult::new(config.prompt(), config.context().to_vec(), DebateMode::Judge);
        ctx.transcript
            .write_prompt(config.prompt(), config.context())?;

        // Step 1: every participant answers independently
        ctx.progress.on_round_start(1);
        let messages = prompt.initial();
        let requests = ctx
            .participants
            .iter()
            .map(|p| (p, messages.clone()))
            .collect();
        let responses = ctx.gather_responses(requests, DebatePhase::Round(1)).await;
        if responses.is_empty() {
            return Err(RunDebateError::AllParticipantsFailed { round: 1 });
        }
        let judge_messages = prompt.judge(&responses);
        let round = DebateRound::new(1, responses);
        ctx.transcript.write_round(&round)?;
        result.push_round(round);

        // Step 2: the judge evaluates
        ctx.progress.on_round_start(2);
        info!(judge = %judge_id, "Judging");
        let judgment = ctx
            .single_response(judge, judge_messages, DebatePhase::Judging)
            .await
            .map_err(|source| RunDebateError::JudgeFailed {
                participant: judge_id.to_string(),
                source,
            })?;

        let parsed = FinalAnswer::parse(&judgment.content);
        let reason = format!("Judge ({}) evaluated all responses.", judge_id);

        let round = DebateRound::new(2, vec![judgment]);
        ctx.transcript.write_round(&round)?;
        result.push_round(round);

        ctx.progress.on_convergence(&reason);
        ctx.transcript.write_convergence(&reason)?;
        ctx.transcript.write_resolution(&parsed.resolution)?;
        ctx.transcript.write_final(&parsed.answer)?;

        result.convergence_reason = reason;
        result.final_answer = parsed.answer;
        result.resolution_reasoning = parsed.resolution;
        Ok(result)
    }
}
