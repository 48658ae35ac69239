//! Token spend per participant.

use super::round_to;
use crate::debate::entities::{DebateResult, LlmResponse};
use serde::{Deserialize, Serialize};

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Price in dollars per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

impl ModelPrice {
    pub const FREE: ModelPrice = ModelPrice {
        input: 0.0,
        output: 0.0,
    };

    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Approximate list prices. Local models (Ollama) are free.
const BUILTIN_PRICES: &[(&str, ModelPrice)] = &[
    // OpenAI
    ("gpt-4o", ModelPrice::new(2.50, 10.00)),
    ("gpt-4o-mini", ModelPrice::new(0.15, 0.60)),
    ("gpt-4.1", ModelPrice::new(2.00, 8.00)),
    ("gpt-4.1-mini", ModelPrice::new(0.40, 1.60)),
    ("gpt-4.1-nano", ModelPrice::new(0.10, 0.40)),
    ("o3", ModelPrice::new(2.00, 8.00)),
    ("o3-mini", ModelPrice::new(1.10, 4.40)),
    ("o4-mini", ModelPrice::new(1.10, 4.40)),
    // Anthropic
    ("claude-opus-4", ModelPrice::new(15.00, 75.00)),
    ("claude-sonnet-4", ModelPrice::new(3.00, 15.00)),
    ("claude-haiku-3", ModelPrice::new(0.25, 1.25)),
    // Google
    ("gemini-2.0-flash", ModelPrice::new(0.10, 0.40)),
    ("gemini-2.5-pro", ModelPrice::new(1.25, 10.00)),
    ("gemini-2.5-flash", ModelPrice::new(0.15, 0.60)),
];

/// Mapping from model name (or name prefix) to price
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    entries: Vec<(String, ModelPrice)>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            entries: BUILTIN_PRICES
                .iter()
                .map(|(name, price)| (name.to_string(), *price))
                .collect(),
        }
    }
}

impl PricingTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace the price of a model prefix
    pub fn with_price(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        let model = model.into();
        self.entries.retain(|(name, _)| *name != model);
        self.entries.push((model, price));
        self
    }

    /// Exact match first, then the longest matching prefix
    /// (`claude-sonnet-4-20250514` → `claude-sonnet-4`). Unknown models are free.
    pub fn lookup(&self, model: &str) -> ModelPrice {
        if let Some((_, price)) = self.entries.iter().find(|(name, _)| name == model) {
            return *price;
        }
        self.entries
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map_or(ModelPrice::FREE, |(_, price)| *price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCost {
    /// Participant id
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    /// Percentage of the debate's total cost
    pub share_of_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub providers: Vec<ProviderCost>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
}

/// Sum token usage per participant across all rounds, plus the synthesis
/// call, and price it.
pub fn compute_costs(result: &DebateResult, pricing: &PricingTable) -> CostReport {
    // (participant, model, input, output) in first-seen order
    let mut totals: Vec<(String, String, u64, u64)> = Vec::new();
    let responses = result
        .all_responses()
        .map(|(_, response)| response)
        .chain(result.synthesis.as_ref());

    for LlmResponse {
        participant_id,
        model,
        usage,
        ..
    } in responses
    {
        match totals.iter_mut().find(|(id, ..)| id == participant_id) {
            Some((_, _, input, output)) => {
                *input += usage.input_tokens;
                *output += usage.output_tokens;
            }
            None => totals.push((
                participant_id.clone(),
                model.clone(),
                usage.input_tokens,
                usage.output_tokens,
            )),
        }
    }

    let mut providers = Vec::with_capacity(totals.len());
    let mut grand_cost = 0.0;
    for (provider, model, input_tokens, output_tokens) in totals {
        let price = pricing.lookup(&model);
        let input_cost = input_tokens as f64 / TOKENS_PER_UNIT * price.input;
        let output_cost = output_tokens as f64 / TOKENS_PER_UNIT * price.output;
        let total_cost = input_cost + output_cost;
        grand_cost += total_cost;

        providers.push(ProviderCost {
            provider,
            model,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            input_cost: round_to(input_cost, 6),
            output_cost: round_to(output_cost, 6),
            total_cost: round_to(total_cost, 6),
            share_of_total: 0.0,
        });
    }

    if grand_cost > 0.0 {
        for cost in &mut providers {
            cost.share_of_total = round_to(cost.total_cost / grand_cost * 100.0, 1);
        }
    }

    CostReport {
        total_input_tokens: providers.iter().map(|p| p.input_tokens).sum(),
        total_output_tokens: providers.iter().map(|p| p.output_tokens).sum(),
        total_cost: round_to(grand_cost, 6),
        providers,
    }
}
