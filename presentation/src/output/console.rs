//! Console output formatter for debate results

use colored::Colorize;
use mars_application::DebateOutcome;
use mars_domain::{AttributionReport, CostReport, RoundDiff, format_thousands};
use mars_infrastructure::{DebateSummary, ProviderStatus};
use std::path::Path;

/// Max characters of the prompt shown in the history table
const HISTORY_PROMPT_WIDTH: usize = 40;

/// Formats debate results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full report printed after a debate: attribution, diffs, costs,
    /// final answer and the output location
    pub fn format_outcome(outcome: &DebateOutcome, output_path: Option<&Path>) -> String {
        let mut output = String::new();

        output.push_str(&Self::format_attribution(&outcome.attribution));
        if !outcome.attribution.round_diffs.is_empty() {
            output.push_str(&Self::format_round_diffs(&outcome.attribution.round_diffs));
        }
        output.push_str(&Self::format_costs(&outcome.costs));
        output.push_str(&Self::format_final_answer(&outcome.result.final_answer));

        if let Some(path) = output_path {
            output.push_str(&format!(
                "\n{}\n",
                format!("Output written to: {}", path.display()).dimmed()
            ));
        }
        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &DebateOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_attribution(report: &AttributionReport) -> String {
        let mut output = Self::section_header("Attribution Analysis");

        let rows: Vec<Vec<String>> = report
            .providers
            .iter()
            .map(|pa| {
                vec![
                    pa.provider.clone(),
                    pa.model.clone(),
                    format!(
                        "{:.1}% ({}/{})",
                        pa.contribution_pct, pa.contributed_sentences, pa.total_final_sentences
                    ),
                    format!(
                        "{:.1}% ({}/{})",
                        pa.survival_rate, pa.survived_sentences, pa.initial_sentences
                    ),
                    format!("{:.1}%", pa.influence_score),
                ]
            })
            .chain((report.novel_sentences > 0).then(|| {
                vec![
                    "Synthesizer (novel)".to_string(),
                    "-".to_string(),
                    format!(
                        "{:.1}% ({}/{})",
                        report.novel_pct, report.novel_sentences, report.sentence_count_final
                    ),
                    "-".to_string(),
                    "-".to_string(),
                ]
            }))
            .collect();
        output.push_str(&Self::table(
            &["Provider", "Model", "Contribution", "Survival", "Influence"],
            &rows,
        ));

        for pa in &report.providers {
            if pa.influence_details.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{}\n", format!("{} influence", pa.provider).bold()));
            for (target, rate) in &pa.influence_details {
                output.push_str(&format!("  adopted by {target}: {rate:.1}%\n"));
            }
        }

        output.push_str(&format!(
            "{}\n",
            format!(
                "Similarity threshold: {}  |  Final answer sentences: {}",
                report.similarity_threshold, report.sentence_count_final
            )
            .dimmed()
        ));
        output
    }

    pub fn format_round_diffs(diffs: &[RoundDiff]) -> String {
        let mut output = Self::section_header("Round-over-Round Changes");
        let rows: Vec<Vec<String>> = diffs
            .iter()
            .map(|d| {
                vec![
                    d.provider.clone(),
                    format!("{}->{}", d.from_round, d.to_round),
                    format!("{:.1}%", d.similarity * 100.0),
                    format!("+{}", d.sentences_added),
                    format!("-{}", d.sentences_removed),
                    d.sentences_unchanged.to_string(),
                ]
            })
            .collect();
        output.push_str(&Self::table(
            &["Provider", "Rounds", "Similarity", "Added", "Removed", "Unchanged"],
            &rows,
        ));
        output
    }

    pub fn format_costs(report: &CostReport) -> String {
        let mut output = Self::section_header("Cost Summary");
        let rows: Vec<Vec<String>> = report
            .providers
            .iter()
            .map(|pc| {
                vec![
                    pc.provider.clone(),
                    pc.model.clone(),
                    format_thousands(pc.input_tokens),
                    format_thousands(pc.output_tokens),
                    format!("${:.4}", pc.total_cost),
                    format!("{:.1}%", pc.share_of_total),
                ]
            })
            .collect();
        output.push_str(&Self::table(
            &["Provider", "Model", "Input", "Output", "Cost", "Share"],
            &rows,
        ));
        output.push_str(&format!(
            "{}\n",
            format!(
                "Total: {} tokens  |  ${:.4}",
                format_thousands(report.total_input_tokens + report.total_output_tokens),
                report.total_cost
            )
            .dimmed()
        ));
        output
    }

    pub fn format_final_answer(answer: &str) -> String {
        let mut output = Self::section_header("Final Answer");
        output.push_str(answer.trim_end());
        output.push('\n');
        output
    }

    /// `mars providers` listing
    pub fn format_providers(statuses: &[ProviderStatus]) -> String {
        statuses
            .iter()
            .map(|status| {
                let detail = format!("({})", status.detail);
                let detail = if status.configured {
                    detail.green()
                } else {
                    detail.yellow()
                };
                format!(
                    "  {:15}  model: {:30}  {}\n",
                    status.name, status.default_model, detail
                )
            })
            .collect()
    }

    /// `mars history` table
    pub fn format_history(debates: &[DebateSummary]) -> String {
        let mut output = format!("{}\n", "MARS Debate History".bold());
        let rows: Vec<Vec<String>> = debates
            .iter()
            .enumerate()
            .map(|(i, d)| {
                vec![
                    (i + 1).to_string(),
                    d.timestamp.clone(),
                    truncate(&d.prompt, HISTORY_PROMPT_WIDTH),
                    d.providers.join(", "),
                    d.rounds.to_string(),
                    d.total_cost.clone(),
                ]
            })
            .collect();
        output.push_str(&Self::table(
            &["#", "Timestamp", "Prompt", "Providers", "Rounds", "Cost"],
            &rows,
        ));
        output
    }

    /// Compact view of a stored debate for `mars show`
    pub fn format_summary(
        summary: &DebateSummary,
        attribution: Option<&str>,
        answer: Option<&str>,
    ) -> String {
        let mut output = Self::header("MARS Debate Summary");
        output.push('\n');
        output.push_str(&format!("{}\n\n", summary.prompt.bold()));
        output.push_str(&format!("{} {}\n", "Timestamp:".cyan().bold(), summary.timestamp));
        let providers = if summary.providers.is_empty() {
            "unknown".to_string()
        } else {
            summary.providers.join(", ")
        };
        output.push_str(&format!("{} {}\n", "Providers:".cyan().bold(), providers));
        output.push_str(&format!("{} {}\n", "Rounds:   ".cyan().bold(), summary.rounds));
        output.push_str(&format!("{} {}\n", "Cost:     ".cyan().bold(), summary.total_cost));

        if let Some(attribution) = attribution {
            output.push_str(&Self::section_header("Attribution"));
            output.push_str(attribution.trim_end());
            output.push('\n');
        }
        match answer {
            Some(answer) => output.push_str(&Self::format_final_answer(answer)),
            None => output.push_str(&format!(
                "\n{}\n",
                "No final answer yet (debate may be incomplete).".yellow()
            )),
        }
        output
    }

    /// A stored Markdown section under a titled rule
    pub fn format_section(title: &str, content: &str) -> String {
        let mut output = Self::section_header(title);
        output.push_str(content.trim_end());
        output.push('\n');
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Left-aligned text columns padded to the widest cell
    fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut output = format!(
            "{}\n",
            render(headers.iter().map(|h| h.to_string()).collect()).bold()
        );
        for row in rows {
            output.push_str(&render(row.clone()));
            output.push('\n');
        }
        output
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mars_domain::{DebateMode, DebateResult, ProviderAttribution, ProviderCost};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn plain<F: FnOnce() -> String>(f: F) -> String {
        colored::control::set_override(false);
        f()
    }

    fn attribution() -> AttributionReport {
        AttributionReport {
            providers: vec![ProviderAttribution {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                contribution_pct: 75.0,
                contributed_sentences: 3,
                total_final_sentences: 4,
                survival_rate: 50.0,
                survived_sentences: 2,
                initial_sentences: 4,
                influence_score: 25.0,
                influence_details: BTreeMap::from([("anthropic".to_string(), 25.0)]),
            }],
            similarity_threshold: 0.6,
            sentence_count_final: 4,
            novel_sentences: 1,
            novel_pct: 25.0,
            round_diffs: Vec::new(),
        }
    }

    #[test]
    fn test_attribution_includes_novel_row() {
        let output = plain(|| ConsoleFormatter::format_attribution(&attribution()));
        assert!(output.contains("Attribution Analysis"));
        assert!(output.contains("75.0% (3/4)"));
        assert!(output.contains("50.0% (2/4)"));
        assert!(output.contains("Synthesizer (novel)"));
        assert!(output.contains("25.0% (1/4)"));
        assert!(output.contains("adopted by anthropic: 25.0%"));
        assert!(output.contains("Similarity threshold: 0.6  |  Final answer sentences: 4"));
    }

    #[test]
    fn test_costs_use_thousands_separators() {
        let report = CostReport {
            providers: vec![ProviderCost {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4".to_string(),
                input_tokens: 12_345,
                output_tokens: 678,
                total_tokens: 13_023,
                input_cost: 0.037,
                output_cost: 0.0102,
                total_cost: 0.0472,
                share_of_total: 100.0,
            }],
            total_input_tokens: 12_345,
            total_output_tokens: 678,
            total_cost: 0.0472,
        };
        let output = plain(|| ConsoleFormatter::format_costs(&report));
        assert!(output.contains("12,345"));
        assert!(output.contains("$0.0472"));
        assert!(output.contains("Total: 13,023 tokens  |  $0.0472"));
    }

    #[test]
    fn test_outcome_report() {
        let mut result = DebateResult::new("What is Rust?", Vec::new(), DebateMode::RoundRobin);
        result.final_answer = "A systems language.".to_string();
        let outcome = DebateOutcome {
            result,
            attribution: attribution(),
            costs: CostReport::default(),
        };

        let output = plain(|| {
            ConsoleFormatter::format_outcome(&outcome, Some(Path::new("./mars-output/run")))
        });
        assert!(output.contains("Final Answer"));
        assert!(output.contains("A systems language."));
        assert!(output.contains("Output written to: ./mars-output/run"));
        assert!(!output.contains("Round-over-Round"));

        let json = ConsoleFormatter::format_json(&outcome);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["final_answer"], "A systems language.");
        assert_eq!(value["attribution"]["novel_sentences"], 1);
    }

    #[test]
    fn test_history_truncates_long_prompts() {
        let summary = DebateSummary {
            path: PathBuf::from("out/2026-03-01T14-05-09_x"),
            timestamp: "2026-03-01 14-05-09".to_string(),
            prompt: "a very long prompt that keeps going well past the column width".to_string(),
            providers: vec!["openai".to_string(), "google".to_string()],
            rounds: 3,
            total_cost: "$0.0100".to_string(),
        };
        let output = plain(|| ConsoleFormatter::format_history(&[summary]));
        assert!(output.contains("a very long prompt that keeps going w..."));
        assert!(output.contains("openai, google"));
        assert!(output.contains("$0.0100"));
    }

    #[test]
    fn test_providers_listing() {
        let statuses = vec![ProviderStatus {
            name: "ollama",
            default_model: "llama3.2".to_string(),
            configured: true,
            detail: "http://localhost:11434".to_string(),
        }];
        let output = plain(|| ConsoleFormatter::format_providers(&statuses));
        assert!(output.starts_with("  ollama"));
        assert!(output.contains("model: llama3.2"));
        assert!(output.contains("(http://localhost:11434)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
