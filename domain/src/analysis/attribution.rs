//! Post-debate attribution analysis.
//!
//! Traces which participant's sentences survived into the final answer,
//! how much of each participant's opening answer persisted, and how often
//! participants adopted each other's phrasing between rounds.

use super::round_to;
use super::similarity::{best_match, best_score, sequence_ratio, split_sentences};
use crate::debate::entities::DebateResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default similarity threshold for every classification decision
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Attribution metrics for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttribution {
    /// Participant id
    pub provider: String,
    pub model: String,
    /// Share of final-answer sentences credited to this participant
    pub contribution_pct: f64,
    pub contributed_sentences: usize,
    pub total_final_sentences: usize,
    /// Share of round-1 sentences that persisted into the final answer
    pub survival_rate: f64,
    pub survived_sentences: usize,
    pub initial_sentences: usize,
    /// Mean adoption rate of this participant's sentences by the others
    pub influence_score: f64,
    /// Adoption rate per other participant
    pub influence_details: BTreeMap<String, f64>,
}

/// Sentence-level change of one participant between consecutive rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDiff {
    pub provider: String,
    pub from_round: u32,
    pub to_round: u32,
    /// Whole-text similarity of the two rounds
    pub similarity: f64,
    pub sentences_added: usize,
    pub sentences_removed: usize,
    pub sentences_unchanged: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionReport {
    pub providers: Vec<ProviderAttribution>,
    pub similarity_threshold: f64,
    pub sentence_count_final: usize,
    /// Final sentences not credited to any participant (synthesizer-introduced)
    pub novel_sentences: usize,
    pub novel_pct: f64,
    pub round_diffs: Vec<RoundDiff>,
}

impl AttributionReport {
    pub fn provider(&self, id: &str) -> Option<&ProviderAttribution> {
        self.providers.iter().find(|p| p.provider == id)
    }
}

/// Sentences of one participant, bucketed by round
#[derive(Debug)]
struct ProviderText {
    id: String,
    model: String,
    rounds: BTreeMap<u32, Vec<String>>,
}

impl ProviderText {
    fn round(&self, number: u32) -> &[String] {
        self.rounds.get(&number).map_or(&[], Vec::as_slice)
    }

    fn all_sentences(&self) -> Vec<&str> {
        self.rounds
            .values()
            .flat_map(|sentences| sentences.iter().map(String::as_str))
            .collect()
    }
}

/// Computes an [`AttributionReport`] from a finished debate.
///
/// Analysis is a pure function of the transcript: participants and rounds
/// are always visited in transcript order.
#[derive(Debug, Clone, Copy)]
pub struct AttributionAnalyzer {
    threshold: f64,
}

impl Default for AttributionAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl AttributionAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn analyze(&self, result: &DebateResult) -> AttributionReport {
        let texts = index_providers(result);
        let final_sentences = split_sentences(&result.final_answer);
        let total = final_sentences.len();
        let credited = self.credit_final_sentences(&final_sentences, &texts);

        let providers: Vec<ProviderAttribution> = texts
            .iter()
            .zip(&credited)
            .map(|(text, &contributed)| {
                let (survived, initial) = self.survival(&final_sentences, text);
                let details = self.influence(text, &texts);
                let influence_score = mean(details.values().copied());

                ProviderAttribution {
                    provider: text.id.clone(),
                    model: text.model.clone(),
                    contribution_pct: round_to(percent(contributed, total), 1),
                    contributed_sentences: contributed,
                    total_final_sentences: total,
                    survival_rate: round_to(percent(survived, initial), 1),
                    survived_sentences: survived,
                    initial_sentences: initial,
                    influence_score: round_to(influence_score, 1),
                    influence_details: details
                        .into_iter()
                        .map(|(k, v)| (k, round_to(v, 1)))
                        .collect(),
                }
            })
            .collect();

        let attributed: usize = credited.iter().sum();
        let novel = total.saturating_sub(attributed);

        AttributionReport {
            providers,
            similarity_threshold: self.threshold,
            sentence_count_final: total,
            novel_sentences: novel,
            novel_pct: round_to(percent(novel, total), 1),
            round_diffs: self.round_diffs(&texts),
        }
    }

    /// Credit each final sentence to the participant holding its single
    /// best-scoring source sentence, if that score reaches the threshold.
    /// Returns the credited count per participant.
    fn credit_final_sentences(
        &self,
        final_sentences: &[String],
        texts: &[ProviderText],
    ) -> Vec<usize> {
        let pools: Vec<Vec<&str>> = texts.iter().map(ProviderText::all_sentences).collect();
        let mut credited = vec![0; texts.len()];

        for sentence in final_sentences {
            let mut best: Option<(usize, f64)> = None;
            for (idx, pool) in pools.iter().enumerate() {
                let score = best_score(sentence, pool);
                if score > best.map_or(0.0, |(_, s)| s) {
                    best = Some((idx, score));
                }
            }
            if let Some((idx, score)) = best
                && score >= self.threshold
            {
                credited[idx] += 1;
            }
        }
        credited
    }

    /// Returns (survived, round-1 sentence count)
    fn survival(&self, final_sentences: &[String], text: &ProviderText) -> (usize, usize) {
        let initial = text.round(1);
        let survived = initial
            .iter()
            .filter(|s| best_score(s, final_sentences) >= self.threshold)
            .count();
        (survived, initial.len())
    }

    /// Mean adoption rate of `text`'s sentences by every other participant.
    ///
    /// A sentence counts as adopted by Q in round r+1 only if Q did not
    /// already have a matching sentence in round r.
    fn influence(&self, text: &ProviderText, all: &[ProviderText]) -> BTreeMap<String, f64> {
        let mut details = BTreeMap::new();

        for other in all.iter().filter(|o| o.id != text.id) {
            let mut rates = Vec::new();
            for (&round, sources) in &text.rounds {
                if sources.is_empty() {
                    continue;
                }
                let current = other.round(round);
                let next = other.round(round + 1);
                if next.is_empty() {
                    continue;
                }
                let adopted = sources
                    .iter()
                    .filter(|s| {
                        best_score(s, next) >= self.threshold
                            && best_score(s, current) < self.threshold
                    })
                    .count();
                rates.push(percent(adopted, sources.len()));
            }
            details.insert(other.id.clone(), mean(rates));
        }
        details
    }

    fn round_diffs(&self, texts: &[ProviderText]) -> Vec<RoundDiff> {
        let mut diffs = Vec::new();
        for text in texts {
            let rounds: Vec<(&u32, &Vec<String>)> = text.rounds.iter().collect();
            for pair in rounds.windows(2) {
                let (&from_round, earlier) = pair[0];
                let (&to_round, later) = pair[1];
                let unchanged = self.match_unchanged(earlier, later);

                diffs.push(RoundDiff {
                    provider: text.id.clone(),
                    from_round,
                    to_round,
                    similarity: round_to(
                        sequence_ratio(&earlier.join("\n"), &later.join("\n")),
                        3,
                    ),
                    sentences_added: later.len() - unchanged,
                    sentences_removed: earlier.len() - unchanged,
                    sentences_unchanged: unchanged,
                });
            }
        }
        diffs
    }

    /// Count earlier sentences that reappear in the later round. Each later
    /// sentence can satisfy at most one earlier sentence.
    fn match_unchanged(&self, earlier: &[String], later: &[String]) -> usize {
        let mut consumed = vec![false; later.len()];
        let mut unchanged = 0;

        for sentence in earlier {
            let (free_idx, free): (Vec<usize>, Vec<&str>) = later
                .iter()
                .enumerate()
                .filter(|(i, _)| !consumed[*i])
                .map(|(i, s)| (i, s.as_str()))
                .unzip();
            if let Some((pos, score)) = best_match(sentence, &free)
                && score >= self.threshold
            {
                consumed[free_idx[pos]] = true;
                unchanged += 1;
            }
        }
        unchanged
    }
}

fn index_providers(result: &DebateResult) -> Vec<ProviderText> {
    let mut texts: Vec<ProviderText> = Vec::new();
    for (round, response) in result.all_responses() {
        let pos = match texts.iter().position(|t| t.id == response.participant_id) {
            Some(pos) => pos,
            None => {
                texts.push(ProviderText {
                    id: response.participant_id.clone(),
                    model: response.model.clone(),
                    rounds: BTreeMap::new(),
                });
                texts.len() - 1
            }
        };
        texts[pos]
            .rounds
            .insert(round, split_sentences(&response.content));
    }
    texts
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::entities::{DebateRound, LlmResponse, TokenUsage};
    use crate::debate::mode::DebateMode;

    // Pairwise similarity of these sentences is well below 0.6
    const S0: &str = "Rust guarantees memory safety without a garbage collector.";
    const S1: &str = "Ownership rules are checked entirely at compile time.";
    const S2: &str = "Python relies on reference counting plus a cycle detector.";
    const S3: &str = "Benchmarks show comparable throughput for network services.";
    const S4: &str = "1234567890 0987654321 1234567890 0987654321";
    const S5: &str = "Zzzz qqqq xxxx vvvv wwww jjjj kkkk yyyy.";

    fn response(id: &str, sentences: &[&str]) -> LlmResponse {
        LlmResponse::new(id, "model-x", sentences.join("\n"), TokenUsage::default())
    }

    fn debate(rounds: Vec<Vec<LlmResponse>>, final_answer: &[&str]) -> DebateResult {
        let mut result = DebateResult::new("q", vec![], DebateMode::RoundRobin);
        for (i, responses) in rounds.into_iter().enumerate() {
            result.push_round(DebateRound::new(i as u32 + 1, responses));
        }
        result.final_answer = final_answer.join("\n");
        result
    }

    #[test]
    fn test_contribution_survival_and_novel() {
        let result = debate(
            vec![vec![
                response("openai", &[S0, S1]),
                response("anthropic", &[S2, S3]),
            ]],
            &[S0, S2, S4],
        );
        let report = AttributionAnalyzer::default().analyze(&result);

        assert_eq!(report.sentence_count_final, 3);
        assert_eq!(report.novel_sentences, 1);
        assert_eq!(report.novel_pct, 33.3);

        let openai = report.provider("openai").unwrap();
        assert_eq!(openai.contributed_sentences, 1);
        assert_eq!(openai.contribution_pct, 33.3);
        assert_eq!(openai.total_final_sentences, 3);
        assert_eq!(openai.survived_sentences, 1);
        assert_eq!(openai.initial_sentences, 2);
        assert_eq!(openai.survival_rate, 50.0);

        let anthropic = report.provider("anthropic").unwrap();
        assert_eq!(anthropic.contributed_sentences, 1);
        assert_eq!(anthropic.survival_rate, 50.0);
    }

    #[test]
    fn test_contributions_and_novel_sum_to_total() {
        let result = debate(
            vec![
                vec![response("openai", &[S0, S1]), response("anthropic", &[S0])],
                vec![response("openai", &[S0]), response("anthropic", &[S0, S3])],
            ],
            &[S0, S1, S3, S4, S5],
        );
        let report = AttributionAnalyzer::default().analyze(&result);
        let credited: usize = report
            .providers
            .iter()
            .map(|p| p.contributed_sentences)
            .sum();
        assert_eq!(credited + report.novel_sentences, report.sentence_count_final);
        assert!(
            report
                .providers
                .iter()
                .all(|p| p.contributed_sentences <= report.sentence_count_final)
        );
        // S0 ties between both participants; the first one in transcript order wins
        assert_eq!(report.provider("openai").unwrap().contributed_sentences, 2);
        assert_eq!(report.provider("anthropic").unwrap().contributed_sentences, 1);
    }

    #[test]
    fn test_empty_final_answer() {
        let result = debate(vec![vec![response("openai", &[S0])]], &[]);
        let report = AttributionAnalyzer::default().analyze(&result);
        assert_eq!(report.sentence_count_final, 0);
        assert_eq!(report.novel_sentences, 0);
        assert_eq!(report.novel_pct, 0.0);
        assert_eq!(report.providers[0].contribution_pct, 0.0);
        assert_eq!(report.providers[0].contributed_sentences, 0);
    }

    #[test]
    fn test_empty_round_one_has_zero_survival() {
        let result = debate(vec![vec![response("openai", &["ok"])]], &[S0]);
        let report = AttributionAnalyzer::default().analyze(&result);
        let openai = &report.providers[0];
        assert_eq!(openai.initial_sentences, 0);
        assert_eq!(openai.survived_sentences, 0);
        assert_eq!(openai.survival_rate, 0.0);
    }

    #[test]
    fn test_single_provider_has_no_influence() {
        let result = debate(vec![vec![response("openai", &[S0])]], &[S0]);
        let report = AttributionAnalyzer::default().analyze(&result);
        assert_eq!(report.providers[0].influence_score, 0.0);
        assert!(report.providers[0].influence_details.is_empty());
    }

    #[test]
    fn test_influence_counts_adoption_between_rounds() {
        let result = debate(
            vec![
                vec![response("openai", &[S0]), response("anthropic", &[S5])],
                vec![response("openai", &[S0]), response("anthropic", &[S5, S0])],
            ],
            &[S0],
        );
        let report = AttributionAnalyzer::default().analyze(&result);

        let openai = report.provider("openai").unwrap();
        assert_eq!(openai.influence_details.get("anthropic"), Some(&100.0));
        assert_eq!(openai.influence_score, 100.0);

        let anthropic = report.provider("anthropic").unwrap();
        assert_eq!(anthropic.influence_details.get("openai"), Some(&0.0));
        assert_eq!(anthropic.influence_score, 0.0);
    }

    #[test]
    fn test_already_similar_sentence_is_not_adoption() {
        let result = debate(
            vec![
                vec![response("openai", &[S0]), response("anthropic", &[S0])],
                vec![response("openai", &[S0]), response("anthropic", &[S0])],
            ],
            &[S0],
        );
        let report = AttributionAnalyzer::default().analyze(&result);
        assert_eq!(report.provider("openai").unwrap().influence_score, 0.0);
    }

    #[test]
    fn test_round_diffs() {
        let result = debate(
            vec![
                vec![response("openai", &[S0]), response("anthropic", &[S5])],
                vec![response("openai", &[S0]), response("anthropic", &[S5, S0])],
            ],
            &[S0],
        );
        let report = AttributionAnalyzer::default().analyze(&result);
        assert_eq!(report.round_diffs.len(), 2);

        let openai = &report.round_diffs[0];
        assert_eq!(openai.provider, "openai");
        assert_eq!((openai.from_round, openai.to_round), (1, 2));
        assert_eq!(openai.similarity, 1.0);
        assert_eq!(openai.sentences_unchanged, 1);
        assert_eq!(openai.sentences_added, 0);
        assert_eq!(openai.sentences_removed, 0);

        let anthropic = &report.round_diffs[1];
        assert_eq!(anthropic.sentences_unchanged, 1);
        assert_eq!(anthropic.sentences_added, 1);
        assert_eq!(anthropic.sentences_removed, 0);
        assert!(anthropic.similarity < 1.0);
    }

    #[test]
    fn test_round_diff_does_not_reuse_later_sentences() {
        let result = debate(
            vec![
                vec![response("openai", &[S0, S0])],
                vec![response("openai", &[S0])],
            ],
            &[S0],
        );
        let report = AttributionAnalyzer::default().analyze(&result);
        let diff = &report.round_diffs[0];
        assert_eq!(diff.sentences_unchanged, 1);
        assert_eq!(diff.sentences_removed, 1);
        assert_eq!(diff.sentences_added, 0);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let result = debate(
            vec![
                vec![response("openai", &[S0, S1]), response("anthropic", &[S2])],
                vec![response("openai", &[S0, S2]), response("anthropic", &[S2, S1])],
            ],
            &[S0, S2, S3],
        );
        let analyzer = AttributionAnalyzer::default();
        assert_eq!(analyzer.analyze(&result), analyzer.analyze(&result));
    }
}
