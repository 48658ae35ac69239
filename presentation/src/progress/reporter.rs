//! Progress rendering for debate execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mars_application::DebateProgressNotifier;
use mars_domain::{DebatePhase, Verbosity, redact_secrets};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Renders debate progress on the terminal.
///
/// Quiet runs show a spinner while a phase is in flight and print each
/// response as it settles. Verbose runs print streamed chunks as they
/// arrive instead.
pub struct ConsoleRenderer {
    verbosity: Verbosity,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleRenderer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.blue}: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Print a line without tearing an active spinner
    fn println(&self, line: String) {
        match self.spinner.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(bar) => bar.suspend(|| println!("{line}")),
                None => println!("{line}"),
            },
            Err(_) => println!("{line}"),
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish_and_clear();
        }
    }

    /// Summary table printed before the first round
    pub fn show_start(&self, prompt: &str, mode: &str, participants: &[String]) {
        let prompt = if prompt.chars().count() > 120 {
            format!("{}...", prompt.chars().take(120).collect::<String>())
        } else {
            prompt.to_string()
        };
        println!("{}", "Debate Configuration".bold());
        println!("  {} {}", "Prompt:   ".cyan().bold(), prompt);
        println!("  {} {}", "Mode:     ".cyan().bold(), mode);
        println!("  {} {}", "Providers:".cyan().bold(), participants.join(", "));
        println!();
    }
}

impl DebateProgressNotifier for ConsoleRenderer {
    fn on_round_start(&self, round: u32) {
        let title = format!(" Round {round} ");
        self.println(format!("\n{}", format!("{title:=^60}").blue().bold()));
    }

    fn on_phase_start(&self, phase: &DebatePhase, participants: &[String]) {
        if self.verbosity.is_verbose() {
            return;
        }
        self.stop_spinner();

        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix(phase.display_name());
        bar.set_message(participants.join(", "));
        bar.enable_steady_tick(SPINNER_TICK);
        if let Ok(mut guard) = self.spinner.lock() {
            *guard = Some(bar);
        }
    }

    fn on_phase_complete(&self, _phase: &DebatePhase) {
        self.stop_spinner();
    }

    fn on_response(&self, participant: &str, content: &str) {
        if self.verbosity.is_verbose() {
            return;
        }
        self.println(format!(
            "\n{}\n{}\n",
            format!("── {participant} ──").green().bold(),
            content.trim_end()
        ));
    }

    fn on_participant_error(&self, participant: &str, error: &str) {
        self.println(format!(
            "{} {}",
            format!("Error from {participant}:").red().bold(),
            redact_secrets(error)
        ));
    }

    fn on_convergence(&self, reason: &str) {
        self.println(format!("\n{} {}", "Convergence:".yellow().bold(), reason));
    }

    fn on_stream_start(&self, participant: &str, phase: &DebatePhase) {
        println!(
            "\n{} {}",
            format!("{participant}:").green().bold(),
            format!("({phase})").dimmed()
        );
    }

    fn on_stream_chunk(&self, _participant: &str, chunk: &str) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{chunk}");
        let _ = stdout.flush();
    }

    fn on_stream_end(&self, _participant: &str) {
        println!();
    }
}
