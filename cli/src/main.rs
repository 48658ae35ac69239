//! CLI entrypoint for mars
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use mars_application::{DebateProgressNotifier, NoProgress, RunDebateUseCase};
use mars_domain::{DebateConfig, DebateMode, Verbosity};
use mars_infrastructure::output::reader::{
    find_debates, read_file, read_section, resolve_debate, round_files,
};
use mars_infrastructure::output::{
    ATTRIBUTION_FILE, AUDIT_DIR, COSTS_FILE, FINAL_ANSWER_FILE, ROUND_DIFFS_FILE,
};
use mars_infrastructure::{
    AVAILABLE_PROVIDERS, ConfigLoader, DebateSummary, FileConfig, MarkdownWriter,
    ProviderRegistry,
};
use mars_presentation::{
    Cli, Command, ConsoleFormatter, ConsoleRenderer, DebateArgs, HistoryArgs, ShowArgs,
    ShowSection, model_overrides, participant_ids, resolve_value,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -l; logs go to stderr so streamed answers stay clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.log)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    match cli.command {
        Command::Debate(args) => run_debate(args, config).await,
        Command::Providers => {
            let registry = ProviderRegistry::new(config.providers);
            print!(
                "{}",
                ConsoleFormatter::format_providers(&registry.provider_statuses())
            );
            Ok(())
        }
        Command::Show(args) => show(args, &config),
        Command::History(args) => history(args, &config),
    }
}

fn log_level(count: u8) -> &'static str {
    match count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

async fn run_debate(args: DebateArgs, config: FileConfig) -> Result<()> {
    let prompt = resolve_value(&args.prompt)?;
    let context = args
        .context
        .iter()
        .map(|value| resolve_value(value))
        .collect::<Result<Vec<_>, _>>()?;

    let ids = participant_ids(
        &args.provider,
        &config.debate.participants(),
        AVAILABLE_PROVIDERS,
    )?;
    let overrides = model_overrides(&args.model, &ids)?;
    let verbosity = if args.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    let debate_config = DebateConfig::builder(prompt, ids.iter().cloned())
        .context(context)
        .model_overrides(overrides)
        .mode(DebateMode::from(args.mode))
        .max_rounds(args.rounds.unwrap_or(config.debate.max_rounds))
        .judge(args.judge_provider)
        .synthesis_provider(args.synthesis_provider)
        .convergence_threshold(
            args.threshold
                .unwrap_or(config.debate.convergence_threshold),
        )
        .max_tokens(args.max_tokens.unwrap_or(config.debate.max_tokens))
        .temperature(args.temperature)
        .verbosity(verbosity)
        .build()?;

    // === Dependency Injection ===
    let registry = ProviderRegistry::new(config.providers);
    let participants = registry.build_participants(&ids)?;
    let use_case =
        RunDebateUseCase::new(participants).with_retry_policy(config.retry.to_policy());

    let output_dir = args.output_dir.unwrap_or(config.debate.output_dir);
    let writer = MarkdownWriter::create(&output_dir, debate_config.prompt())?;
    info!(path = %writer.base_path().display(), "Writing debate transcript");

    let renderer = ConsoleRenderer::new(verbosity);
    let progress: &dyn DebateProgressNotifier = if args.json {
        &NoProgress
    } else {
        renderer.show_start(debate_config.prompt(), debate_config.mode().as_str(), &ids);
        &renderer
    };

    let outcome = use_case
        .execute_with(&debate_config, progress, &writer)
        .await?;

    if args.json {
        println!("{}", ConsoleFormatter::format_json(&outcome));
    } else {
        print!(
            "{}",
            ConsoleFormatter::format_outcome(&outcome, Some(writer.base_path()))
        );
    }
    Ok(())
}

fn show(args: ShowArgs, config: &FileConfig) -> Result<()> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.debate.output_dir.clone());
    let debate_dir = resolve_debate(args.debate.as_deref(), &output_dir)?;
    let audit_file = |name: &str| format!("{AUDIT_DIR}/{name}");

    match args.section {
        None => {
            let summary = DebateSummary::load(&debate_dir);
            let attribution = read_file(&debate_dir, &audit_file(ATTRIBUTION_FILE));
            let answer = read_file(&debate_dir, FINAL_ANSWER_FILE);
            print!(
                "{}",
                ConsoleFormatter::format_summary(&summary, attribution.as_deref(), answer.as_deref())
            );
        }
        Some(ShowSection::Answer) => {
            println!("{}", read_section(&debate_dir, FINAL_ANSWER_FILE)?.trim_end());
        }
        Some(ShowSection::Costs) => {
            println!("{}", read_section(&debate_dir, &audit_file(COSTS_FILE))?);
        }
        Some(ShowSection::Attribution) => {
            println!("{}", read_section(&debate_dir, &audit_file(ATTRIBUTION_FILE))?);
        }
        Some(ShowSection::Rounds) => {
            let files = round_files(&debate_dir);
            if files.is_empty() {
                bail!("No round files found in {}", debate_dir.display());
            }
            for file in files {
                let stem = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let label = stem.split_once('-').map_or(stem.as_str(), |(_, rest)| rest);
                let content = std::fs::read_to_string(&file)?;
                print!("{}", ConsoleFormatter::format_section(label, &content));
            }
            if let Some(diffs) = read_file(&debate_dir, &audit_file(ROUND_DIFFS_FILE)) {
                print!("{}", ConsoleFormatter::format_section("Round Diffs", &diffs));
            }
        }
    }
    Ok(())
}

fn history(args: HistoryArgs, config: &FileConfig) -> Result<()> {
    let output_dir: PathBuf = args
        .output_dir
        .unwrap_or_else(|| config.debate.output_dir.clone());
    let mut debates = find_debates(&output_dir)?;
    if debates.is_empty() {
        bail!("No debates found in {}", output_dir.display());
    }
    if let Some(limit) = args.limit {
        debates.truncate(limit);
    }

    let summaries: Vec<DebateSummary> = debates.iter().map(|d| DebateSummary::load(d)).collect();
    print!("{}", ConsoleFormatter::format_history(&summaries));
    Ok(())
}
