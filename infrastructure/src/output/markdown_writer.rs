//! Markdown transcript writer

use super::{
    ATTRIBUTION_FILE, AUDIT_DIR, CONVERGENCE_FILE, COSTS_FILE, FINAL_ANSWER_FILE, PROMPT_FILE,
    RESOLUTION_FILE, ROUND_DIFFS_FILE,
};
use chrono::{DateTime, Local};
use mars_application::{TranscriptError, TranscriptWriter};
use mars_domain::{AttributionReport, CostReport, DebateRound, RoundDiff, format_thousands};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Prompt characters that go into the directory name
const SLUG_PROMPT_CHARS: usize = 60;

/// Directory timestamp; sorts lexically in time order
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

#[allow(clippy::expect_used)]
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Writes one debate's transcript as Markdown files
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    base: PathBuf,
    audit: PathBuf,
}

impl MarkdownWriter {
    /// Create `<output_dir>/<timestamp>_<slug>/audit/` for a new debate
    pub fn create(output_dir: &Path, prompt: &str) -> Result<Self, TranscriptError> {
        Self::create_at(output_dir, prompt, Local::now())
    }

    pub fn create_at(
        output_dir: &Path,
        prompt: &str,
        started: DateTime<Local>,
    ) -> Result<Self, TranscriptError> {
        let name = format!("{}_{}", started.format(TIMESTAMP_FORMAT), slugify(prompt));
        let base = output_dir.join(name);
        let audit = base.join(AUDIT_DIR);
        fs::create_dir_all(&audit)
            .map_err(|e| TranscriptError::io(audit.display().to_string(), e))?;
        debug!(path = %base.display(), "Created debate output directory");
        Ok(Self { base, audit })
    }

    /// The debate's directory
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    fn write(&self, path: PathBuf, content: &str) -> Result<(), TranscriptError> {
        fs::write(&path, content).map_err(|e| TranscriptError::io(path.display().to_string(), e))
    }
}

impl TranscriptWriter for MarkdownWriter {
    fn write_prompt(&self, prompt: &str, context: &[String]) -> Result<(), TranscriptError> {
        self.write(self.audit.join(PROMPT_FILE), &render_prompt(prompt, context))
    }

    fn write_round(&self, round: &DebateRound) -> Result<(), TranscriptError> {
        self.write(self.audit.join(round_file_name(round)), &render_round(round))
    }

    fn write_convergence(&self, reason: &str) -> Result<(), TranscriptError> {
        self.write(
            self.audit.join(CONVERGENCE_FILE),
            &format!("# Convergence\n\n{reason}\n"),
        )
    }

    fn write_resolution(&self, resolution: &str) -> Result<(), TranscriptError> {
        self.write(
            self.audit.join(RESOLUTION_FILE),
            &format!("# Resolution\n\n{resolution}\n"),
        )
    }

    fn write_final(&self, answer: &str) -> Result<(), TranscriptError> {
        self.write(self.base.join(FINAL_ANSWER_FILE), answer)
    }

    fn write_attribution(&self, report: &AttributionReport) -> Result<(), TranscriptError> {
        self.write(
            self.audit.join(ATTRIBUTION_FILE),
            &render_attribution(report),
        )?;
        if !report.round_diffs.is_empty() {
            self.write(
                self.audit.join(ROUND_DIFFS_FILE),
                &render_round_diffs(&report.round_diffs),
            )?;
        }
        Ok(())
    }

    fn write_costs(&self, report: &CostReport) -> Result<(), TranscriptError> {
        self.write(self.audit.join(COSTS_FILE), &render_costs(report))
    }
}

/// Lower-case ASCII slug of the first characters of the prompt
pub fn slugify(prompt: &str) -> String {
    let head: String = prompt.chars().take(SLUG_PROMPT_CHARS).collect();
    NON_ALPHANUMERIC
        .replace_all(&head.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn round_file_name(round: &DebateRound) -> String {
    let label = if round.critiques.is_empty() {
        "responses"
    } else {
        "critiques"
    };
    format!(
        "{:02}-round-{}-{}.md",
        round.round_number, round.round_number, label
    )
}

fn render_prompt(prompt: &str, context: &[String]) -> String {
    let mut parts = vec![format!("# Prompt\n\n{prompt}\n")];
    if !context.is_empty() {
        parts.push("\n# Context\n".to_string());
        for (i, ctx) in context.iter().enumerate() {
            parts.push(format!("\n## Context {}\n\n{ctx}\n", i + 1));
        }
    }
    parts.join("\n")
}

fn render_round(round: &DebateRound) -> String {
    let n = round.round_number;
    let mut parts = Vec::new();
    if round.critiques.is_empty() {
        if n == 1 {
            parts.push(format!("# Round {n} - Initial Responses\n"));
        } else {
            parts.push(format!("# Round {n} - Responses\n"));
        }
    } else {
        parts.push(format!("# Round {n} - Critiques & Improved Answers\n"));
        for critique in &round.critiques {
            parts.push(format!(
                "\n## {} critiques {}\n\n{}\n",
                critique.author, critique.target, critique.content
            ));
        }
        parts.push("\n---\n\n# Improved Answers\n".to_string());
    }

    for response in &round.responses {
        parts.push(format!(
            "\n## {} ({})\n\n{}\n",
            response.participant_id, response.model, response.content
        ));
    }
    parts.join("\n")
}

pub fn render_attribution(report: &AttributionReport) -> String {
    let mut lines = vec!["# Attribution Analysis\n".to_string()];
    lines.push(format!(
        "Similarity threshold: {}  \nFinal answer sentences: {}\n",
        report.similarity_threshold, report.sentence_count_final
    ));
    lines.push("\n## Summary\n".to_string());
    lines.push("| Provider | Model | Contribution | Survival | Influence |".to_string());
    lines.push("|----------|-------|-------------|----------|-----------|".to_string());
    for pa in &report.providers {
        lines.push(format!(
            "| {} | {} | {:.1}% ({}/{}) | {:.1}% ({}/{}) | {:.1}% |",
            pa.provider,
            pa.model,
            pa.contribution_pct,
            pa.contributed_sentences,
            pa.total_final_sentences,
            pa.survival_rate,
            pa.survived_sentences,
            pa.initial_sentences,
            pa.influence_score
        ));
    }
    if report.novel_sentences > 0 {
        lines.push(format!(
            "| *Synthesizer (novel)* | - | {:.1}% ({}/{}) | - | - |",
            report.novel_pct, report.novel_sentences, report.sentence_count_final
        ));
    }

    lines.push("\n## Metric Definitions\n".to_string());
    lines.push(
        "- **Contribution**: percentage of final answer sentences whose \
         best match (above threshold) traces to this provider."
            .to_string(),
    );
    lines.push(
        "- **Survival rate**: percentage of this provider's round-1 \
         sentences that appear (above threshold) in the final answer."
            .to_string(),
    );
    lines.push(
        "- **Influence**: average rate at which other providers adopted \
         this provider's sentences in subsequent rounds."
            .to_string(),
    );

    for pa in &report.providers {
        if pa.influence_details.is_empty() {
            continue;
        }
        lines.push(format!("\n### {} Influence Breakdown\n", pa.provider));
        for (target, rate) in &pa.influence_details {
            lines.push(format!("- Adopted by **{target}**: {rate:.1}%"));
        }
    }
    lines.join("\n")
}

pub fn render_round_diffs(diffs: &[RoundDiff]) -> String {
    let mut lines = vec!["# Round-over-Round Changes\n".to_string()];
    lines.push("| Provider | Rounds | Similarity | Added | Removed | Unchanged |".to_string());
    lines.push("|----------|--------|-----------|-------|---------|-----------|".to_string());
    for d in diffs {
        lines.push(format!(
            "| {} | {}->{} | {:.1}% | +{} | -{} | {} |",
            d.provider,
            d.from_round,
            d.to_round,
            d.similarity * 100.0,
            d.sentences_added,
            d.sentences_removed,
            d.sentences_unchanged
        ));
    }
    lines.join("\n")
}

pub fn render_costs(report: &CostReport) -> String {
    let mut lines = vec!["# Cost Summary\n".to_string()];
    lines.push("| Provider | Model | Input Tokens | Output Tokens | Cost | Share |".to_string());
    lines.push("|----------|-------|-------------|--------------|------|-------|".to_string());
    for pc in &report.providers {
        lines.push(format!(
            "| {} | {} | {} | {} | ${:.4} | {:.1}% |",
            pc.provider,
            pc.model,
            format_thousands(pc.input_tokens),
            format_thousands(pc.output_tokens),
            pc.total_cost,
            pc.share_of_total
        ));
    }
    lines.push(format!(
        "\n**Total**: {} tokens | ${:.4}",
        format_thousands(report.total_input_tokens + report.total_output_tokens),
        report.total_cost
    ));
    lines.join("\n")
}
