//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use mars_domain::DebateMode;
use std::path::PathBuf;

/// CLI arguments for mars
#[derive(Parser, Debug)]
#[command(name = "mars")]
#[command(author, version, about = "Multi-Agent Resolution Synthesis - LLMs debate, critique and converge")]
#[command(long_about = r#"
Multiple LLMs debate a prompt, critique each other's answers, and converge
on a synthesized best answer.

Two modes are available:
  round-robin  Providers answer, then critique and revise for up to N rounds
               until their answers stabilize. A final synthesis merges them.
  judge        Providers answer once; a judge provider evaluates the answers
               and produces the final one.

Configuration files are loaded from (in priority order):
1. --config <path>          Explicit config file
2. ./mars.toml              Project-level config
3. ~/.config/mars/config.toml   Global config
Environment variables prefixed with MARS_ override all files.

Example:
  mars debate "Is Python better than Rust?" -p openai -p anthropic
  mars debate @question.txt -c @data.csv -p openai -p google -v
  mars debate "Explain X" -m judge -p openai -p anthropic -j anthropic
  mars providers
  mars show
  mars history -n 5
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log verbosity (-l = info, -ll = debug, -lll = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub log: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a multi-LLM debate on PROMPT
    Debate(DebateArgs),

    /// List available providers and their configuration status
    Providers,

    /// View results of a completed debate (most recent by default)
    Show(ShowArgs),

    /// List past debates, most recent first
    History(HistoryArgs),
}

/// Debate mode as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Iterative critique rounds followed by synthesis
    RoundRobin,
    /// One answer per provider, evaluated by a judge
    Judge,
}

impl From<ModeArg> for DebateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::RoundRobin => DebateMode::RoundRobin,
            ModeArg::Judge => DebateMode::Judge,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DebateArgs {
    /// The question or task to debate (@file reads it from a file)
    pub prompt: String,

    /// Context text or @file path (repeatable)
    #[arg(short, long, value_name = "TEXT")]
    pub context: Vec<String>,

    /// Provider or provider:model, e.g. openai:gpt-4.1 (repeatable)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Vec<String>,

    /// Debate mode
    #[arg(short, long, value_enum, default_value = "round-robin")]
    pub mode: ModeArg,

    /// Max debate rounds [default: 3]
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Participant acting as judge (judge mode)
    #[arg(short, long, value_name = "PROVIDER")]
    pub judge_provider: Option<String>,

    /// Participant for the final synthesis (default: automatic)
    #[arg(short, long, value_name = "PROVIDER")]
    pub synthesis_provider: Option<String>,

    /// provider:model override applied to every participant of that provider (repeatable)
    #[arg(long, value_name = "PROVIDER:MODEL")]
    pub model: Vec<String>,

    /// Convergence similarity threshold, 0.0-1.0 [default: 0.85]
    #[arg(long, value_name = "RATIO")]
    pub threshold: Option<f64>,

    /// Max output tokens per LLM call [default: 8192]
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Temperature, 0.0-2.0 (default: provider default)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Stream responses in real time
    #[arg(short, long)]
    pub verbose: bool,

    /// Output directory [default: ./mars-output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the complete outcome as JSON instead of the console report
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowSection {
    /// Only the final synthesized answer
    Answer,
    /// Token usage and cost breakdown
    Costs,
    /// Per-provider contribution and influence metrics
    Attribution,
    /// Round-by-round responses and diffs
    Rounds,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub section: Option<ShowSection>,

    /// Path to a specific debate directory
    #[arg(long, value_name = "DIR", global = true)]
    pub debate: Option<PathBuf>,

    /// Output directory [default: ./mars-output]
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Show only the last N debates
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output directory [default: ./mars-output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_debate_flags() {
        let cli = Cli::try_parse_from([
            "mars",
            "debate",
            "Is Rust fast?",
            "-p",
            "openai",
            "-p",
            "anthropic:claude-opus-4",
            "-c",
            "@notes.md",
            "-m",
            "judge",
            "-j",
            "anthropic:claude-opus-4",
            "--model",
            "openai:gpt-4.1",
            "-r",
            "5",
            "--threshold",
            "0.9",
            "-v",
            "-ll",
        ])
        .unwrap();

        assert_eq!(cli.log, 2);
        let Command::Debate(args) = cli.command else {
            panic!("expected debate command");
        };
        assert_eq!(args.prompt, "Is Rust fast?");
        assert_eq!(args.provider, vec!["openai", "anthropic:claude-opus-4"]);
        assert_eq!(args.context, vec!["@notes.md"]);
        assert_eq!(args.mode, ModeArg::Judge);
        assert_eq!(args.judge_provider.as_deref(), Some("anthropic:claude-opus-4"));
        assert_eq!(args.model, vec!["openai:gpt-4.1"]);
        assert_eq!(args.rounds, Some(5));
        assert_eq!(args.threshold, Some(0.9));
        assert!(args.verbose);
        assert!(!args.json);
        assert!(args.max_tokens.is_none());
    }

    #[test]
    fn test_debate_defaults() {
        let cli = Cli::try_parse_from(["mars", "debate", "prompt"]).unwrap();
        let Command::Debate(args) = cli.command else {
            panic!("expected debate command");
        };
        assert_eq!(args.mode, ModeArg::RoundRobin);
        assert!(args.provider.is_empty());
        assert!(args.rounds.is_none());
        assert!(args.output_dir.is_none());
        assert_eq!(DebateMode::from(args.mode), DebateMode::RoundRobin);
    }

    #[test]
    fn test_show_sections() {
        let cli = Cli::try_parse_from(["mars", "show"]).unwrap();
        assert!(matches!(cli.command, Command::Show(ShowArgs { section: None, .. })));

        let cli =
            Cli::try_parse_from(["mars", "show", "costs", "--debate", "./out/run"]).unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(args.section, Some(ShowSection::Costs));
        assert_eq!(args.debate, Some(PathBuf::from("./out/run")));
    }

    #[test]
    fn test_history_limit() {
        let cli = Cli::try_parse_from(["mars", "history", "-n", "5", "--no-config"]).unwrap();
        assert!(cli.no_config);
        let Command::History(args) = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(args.limit, Some(5));
    }

    #[test]
    fn test_mode_rejects_unknown_value() {
        assert!(Cli::try_parse_from(["mars", "debate", "p", "-m", "chaos"]).is_err());
    }
}
