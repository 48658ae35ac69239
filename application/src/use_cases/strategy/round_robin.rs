//! Round-robin strategy: answer, critique and revise until the answers
//! converge or the round budget is spent, then synthesize.

use super::{DebateStrategy, StrategyContext};
use crate::use_cases::run_debate::RunDebateError;
use async_trait::async_trait;
use mars_domain::analysis::sequence_ratio;
use mars_domain::{
    Critique, DebateConfig, DebateMode, DebatePhase, DebateResult, DebateRound, FinalAnswer,
    LlmResponse, provider_base_name, redact_secrets,
};
use tracing::{debug, info};

/// Provider families preferred for synthesis, most preferred first
const SYNTHESIS_PREFERENCE: &[&str] = &["anthropic", "openai"];

pub struct RoundRobinStrategy;

#[async_trait]
impl DebateStrategy for RoundRobinStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<DebateResult, RunDebateError> {
        let config = ctx.config;
        let prompt = ctx.prompt();
        let mut result = DebateResult::new(
            config.prompt(),
            config.context().to_vec(),
            DebateMode::RoundRobin,
        );
        ctx.transcript
            .write_prompt(config.prompt(), config.context())?;

        // Latest answer of every still-active participant, in configuration order
        let mut latest: Vec<LlmResponse> = Vec::new();
        let mut converged_reason = None;

        for round_number in 1..=config.max_rounds() {
            ctx.progress.on_round_start(round_number);
            info!("Round {}", round_number);

            if round_number == 1 {
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
                let round = DebateRound::new(1, responses);
                ctx.transcript.write_round(&round)?;
                latest = round.responses.clone();
                result.push_round(round);
                continue;
            }

            let round = critique_round(ctx, round_number, &latest).await;
            ctx.transcript.write_round(&round)?;

            let converged = has_converged(
                &latest,
                &round.responses,
                config.convergence_threshold(),
            );
            for response in &round.responses {
                match latest
                    .iter_mut()
                    .find(|r| r.participant_id == response.participant_id)
                {
                    Some(slot) => *slot = response.clone(),
                    None => latest.push(response.clone()),
                }
            }
            result.push_round(round);

            if converged {
                converged_reason = Some(format!(
                    "Answers converged after round {} (similarity threshold {} reached).",
                    round_number,
                    config.convergence_threshold()
                ));
                break;
            }
        }

        let reason = converged_reason
            .unwrap_or_else(|| format!("Maximum rounds ({}) reached.", config.max_rounds()));
        info!("{}", reason);
        ctx.progress.on_convergence(&reason);
        ctx.transcript.write_convergence(&reason)?;

        let synthesis = synthesize(ctx, &latest).await?;
        let parsed = FinalAnswer::parse(&synthesis.content);
        ctx.transcript.write_resolution(&parsed.resolution)?;
        ctx.transcript.write_final(&parsed.answer)?;

        result.convergence_reason = reason;
        result.final_answer = parsed.answer;
        result.resolution_reasoning = parsed.resolution;
        result.synthesis = Some(synthesis);
        Ok(result)
    }
}

/// Every participant with a latest answer critiques the others and
/// revises its own. One critique is recorded per (author, target) pair.
async fn critique_round(
    ctx: &StrategyContext<'_>,
    round_number: u32,
    latest: &[LlmResponse],
) -> DebateRound {
    let prompt = ctx.prompt();
    let mut requests = Vec::new();
    for participant in ctx.participants {
        let Some(own) = latest.iter().find(|r| r.participant_id == participant.id) else {
            continue;
        };
        let others: Vec<&LlmResponse> = latest
            .iter()
            .filter(|r| r.participant_id != participant.id)
            .collect();
        if others.is_empty() {
            continue;
        }
        requests.push((participant, prompt.critique(own, &others)));
    }

    let responses = ctx
        .gather_responses(requests, DebatePhase::Round(round_number))
        .await;

    let critiques = responses
        .iter()
        .flat_map(move |response| {
            latest
                .iter()
                .filter(move |other| other.participant_id != response.participant_id)
                .map(move |other| {
                    Critique::new(
                        &response.participant_id,
                        &other.participant_id,
                        &response.content,
                    )
                })
        })
        .collect();

    DebateRound::new(round_number, responses).with_critiques(critiques)
}

/// True when every participant answering in both rounds kept its answer
/// at least `threshold` similar. No common participants never converges.
fn has_converged(previous: &[LlmResponse], current: &[LlmResponse], threshold: f64) -> bool {
    let mut common = 0;
    for now in current {
        let Some(before) = previous
            .iter()
            .find(|r| r.participant_id == now.participant_id)
        else {
            continue;
        };
        common += 1;
        let ratio = sequence_ratio(&before.content, &now.content);
        debug!(participant = %now.participant_id, ratio, "Round-over-round similarity");
        if ratio < threshold {
            return false;
        }
    }
    common > 0
}

/// Participant ids in the order synthesis should be attempted.
///
/// An explicit synthesis participant goes first. Otherwise the first
/// participant of each preferred provider family leads, followed by the
/// rest in configuration order.
pub fn synthesis_order(config: &DebateConfig, participant_ids: &[String]) -> Vec<String> {
    if let Some(explicit) = config.synthesis_provider()
        && participant_ids.iter().any(|id| id == explicit)
    {
        let mut ordered = vec![explicit.to_string()];
        ordered.extend(participant_ids.iter().filter(|id| *id != explicit).cloned());
        return ordered;
    }

    let mut ordered: Vec<String> = Vec::with_capacity(participant_ids.len());
    for family in SYNTHESIS_PREFERENCE {
        if let Some(id) = participant_ids
            .iter()
            .find(|id| provider_base_name(id) == *family && !ordered.contains(id))
        {
            ordered.push(id.clone());
        }
    }
    for id in participant_ids {
        if !ordered.contains(id) {
            ordered.push(id.clone());
        }
    }
    ordered
}

/// Try participants in synthesis order until one produces the final answer
async fn synthesize(
    ctx: &StrategyContext<'_>,
    latest: &[LlmResponse],
) -> Result<LlmResponse, RunDebateError> {
    let messages = ctx.prompt().synthesis(latest);
    let mut last_error = None;

    for id in synthesis_order(ctx.config, &ctx.participant_ids()) {
        let participant = ctx
            .participant(&id)
            .ok_or_else(|| RunDebateError::UnknownParticipant(id.clone()))?;
        match ctx
            .single_response(participant, messages.clone(), DebatePhase::Synthesis)
            .await
        {
            Ok(response) => {
                info!(participant = %id, "Synthesis complete");
                return Ok(response);
            }
            Err(e) => {
                ctx.report_failure(&id, &format!("Synthesis failed: {e}"));
                last_error = Some(e);
            }
        }
    }

    Err(RunDebateError::SynthesisFailed {
        last_error: last_error
            .map(|e| redact_secrets(&e.to_string()))
            .unwrap_or_else(|| "no participants".to_string()),
    })
}
