//! Read and query debate output directories

use super::{AUDIT_DIR, COSTS_FILE};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)]
static DEBATE_DIR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}_").expect("valid regex")
});

#[allow(clippy::expect_used)]
static ROUND_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-round-\d+-").expect("valid regex"));

const ROUND_ONE_FILE: &str = "01-round-1-responses.md";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Debate directory not found: {}", .0.display())]
    DebateNotFound(PathBuf),

    #[error("No debates found in {}", .0.display())]
    NoDebates(PathBuf),

    #[error("{file} not found in {}", .dir.display())]
    MissingSection { dir: PathBuf, file: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One line of `mars history`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateSummary {
    pub path: PathBuf,
    /// `YYYY-MM-DD HH-MM-SS`
    pub timestamp: String,
    /// Prompt slug with dashes turned back into spaces
    pub prompt: String,
    pub providers: Vec<String>,
    pub rounds: usize,
    /// `$x.xxxx`, or `n/a` when no cost summary was written
    pub total_cost: String,
}

impl DebateSummary {
    pub fn load(debate_dir: &Path) -> Self {
        let name = debate_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let total_cost = read_file(debate_dir, &format!("{AUDIT_DIR}/{COSTS_FILE}"))
            .map(|content| parse_costs_total(&content))
            .unwrap_or_else(|| "n/a".to_string());

        Self {
            path: debate_dir.to_path_buf(),
            timestamp: extract_timestamp(&name),
            prompt: extract_prompt_from_dirname(&name),
            providers: parse_providers(debate_dir),
            rounds: count_rounds(debate_dir),
            total_cost,
        }
    }
}

/// Debate directories under `output_dir`, most recent first.
///
/// A missing output directory simply has no debates.
pub fn find_debates(output_dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(output_dir).map_err(|source| OutputError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut debates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .is_some_and(|name| DEBATE_DIR_NAME.is_match(&name.to_string_lossy()))
        })
        .collect();
    debates.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(debates)
}

/// The explicitly named debate directory, or the most recent one
pub fn resolve_debate(debate: Option<&Path>, output_dir: &Path) -> Result<PathBuf, OutputError> {
    if let Some(path) = debate {
        if !path.is_dir() {
            return Err(OutputError::DebateNotFound(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }
    find_debates(output_dir)?
        .into_iter()
        .next()
        .ok_or_else(|| OutputError::NoDebates(output_dir.to_path_buf()))
}

/// A file relative to the debate directory, or `None` if it does not exist
pub fn read_file(debate_dir: &Path, relative: &str) -> Option<String> {
    let path = debate_dir.join(relative);
    if !path.is_file() {
        return None;
    }
    fs::read_to_string(path).ok()
}

/// Like [`read_file`], but a missing file is an error
pub fn read_section(debate_dir: &Path, relative: &str) -> Result<String, OutputError> {
    let path = debate_dir.join(relative);
    if !path.is_file() {
        return Err(OutputError::MissingSection {
            dir: debate_dir.to_path_buf(),
            file: relative.to_string(),
        });
    }
    fs::read_to_string(&path).map_err(|source| OutputError::Io { path, source })
}

/// `2026-03-01T14-05-09_slug` -> `2026-03-01 14-05-09`
pub fn extract_timestamp(dirname: &str) -> String {
    let stamp = dirname.split_once('_').map_or(dirname, |(ts, _)| ts);
    stamp.replace('T', " ")
}

/// `2026-03-01T14-05-09_what-is-rust` -> `what is rust`
pub fn extract_prompt_from_dirname(dirname: &str) -> String {
    match dirname.split_once('_') {
        Some((_, slug)) => slug.replace('-', " "),
        None => dirname.to_string(),
    }
}

/// Participant ids from the round-1 response headers, in order
pub fn parse_providers(debate_dir: &Path) -> Vec<String> {
    let Some(content) = read_file(debate_dir, &format!("{AUDIT_DIR}/{ROUND_ONE_FILE}")) else {
        return Vec::new();
    };
    let mut providers: Vec<String> = Vec::new();
    for line in content.lines() {
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((name, _)) = header.split_once('(') else {
            continue;
        };
        let name = name.trim();
        if !name.is_empty() && !providers.iter().any(|p| p == name) {
            providers.push(name.to_string());
        }
    }
    providers
}

/// Round files in the audit directory, in round order
pub fn round_files(debate_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(debate_dir.join(AUDIT_DIR)) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| ROUND_FILE_NAME.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

/// Number of round files in the audit directory
pub fn count_rounds(debate_dir: &Path) -> usize {
    round_files(debate_dir).len()
}

/// The dollar amount from the `**Total**` line of `costs.md`
pub fn parse_costs_total(content: &str) -> String {
    content
        .lines()
        .filter(|line| line.starts_with("**Total**"))
        .find_map(|line| line.split_once('$'))
        .map(|(_, amount)| format!("${}", amount.trim()))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_debate(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join(AUDIT_DIR)).unwrap();
        dir
    }

    #[test]
    fn test_find_debates_newest_first() {
        let root = tempfile::tempdir().unwrap();
        make_debate(root.path(), "2026-01-02T10-00-00_older");
        make_debate(root.path(), "2026-03-01T09-30-00_newest");
        make_debate(root.path(), "2026-02-15T23-59-59_middle");
        make_debate(root.path(), "not-a-debate");
        fs::write(root.path().join("2026-04-01T00-00-00_a-file"), "x").unwrap();

        let debates = find_debates(root.path()).unwrap();
        let names: Vec<String> = debates
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2026-03-01T09-30-00_newest",
                "2026-02-15T23-59-59_middle",
                "2026-01-02T10-00-00_older",
            ]
        );
    }

    #[test]
    fn test_missing_output_dir_has_no_debates() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(find_debates(&missing).unwrap().is_empty());
        assert!(matches!(
            resolve_debate(None, &missing),
            Err(OutputError::NoDebates(_))
        ));
    }

    #[test]
    fn test_resolve_explicit_and_latest() {
        let root = tempfile::tempdir().unwrap();
        let old = make_debate(root.path(), "2026-01-01T00-00-00_old");
        let new = make_debate(root.path(), "2026-01-02T00-00-00_new");

        assert_eq!(resolve_debate(None, root.path()).unwrap(), new);
        assert_eq!(resolve_debate(Some(old.as_path()), root.path()).unwrap(), old);

        let missing = root.path().join("missing");
        assert!(matches!(
            resolve_debate(Some(missing.as_path()), root.path()),
            Err(OutputError::DebateNotFound(_))
        ));
    }

    #[test]
    fn test_dirname_parsing() {
        let name = "2026-03-01T14-05-09_should-we-use-rust";
        assert_eq!(extract_timestamp(name), "2026-03-01 14-05-09");
        assert_eq!(extract_prompt_from_dirname(name), "should we use rust");
        assert_eq!(extract_prompt_from_dirname("plain"), "plain");
    }

    #[test]
    fn test_parse_providers_and_rounds() {
        let root = tempfile::tempdir().unwrap();
        let debate = make_debate(root.path(), "2026-03-01T14-05-09_q");
        let audit = debate.join(AUDIT_DIR);
        fs::write(
            audit.join(ROUND_ONE_FILE),
            "# Round 1 - Initial Responses\n\n\n## openai (gpt-4o)\n\nA\n\n\n## openai:gpt-4.1 (gpt-4.1)\n\nB\n\n## Not a header\n",
        )
        .unwrap();
        fs::write(audit.join("02-round-2-critiques.md"), "").unwrap();
        fs::write(audit.join("convergence.md"), "").unwrap();

        assert_eq!(parse_providers(&debate), vec!["openai", "openai:gpt-4.1"]);
        assert_eq!(count_rounds(&debate), 2);
        assert_eq!(
            round_files(&debate),
            vec![
                audit.join(ROUND_ONE_FILE),
                audit.join("02-round-2-critiques.md")
            ]
        );
    }

    #[test]
    fn test_parse_costs_total() {
        let content = "# Cost Summary\n\n| ... |\n\n**Total**: 1,500 tokens | $0.0123";
        assert_eq!(parse_costs_total(content), "$0.0123");
        assert_eq!(parse_costs_total("# Cost Summary"), "n/a");
    }

    #[test]
    fn test_read_section_missing() {
        let root = tempfile::tempdir().unwrap();
        let debate = make_debate(root.path(), "2026-03-01T14-05-09_q");
        fs::write(debate.join("final-answer.md"), "Four.").unwrap();

        assert_eq!(read_section(&debate, "final-answer.md").unwrap(), "Four.");
        let err = read_section(&debate, "audit/costs.md").unwrap_err();
        assert!(err.to_string().starts_with("audit/costs.md not found"));
        assert!(read_file(&debate, "audit/costs.md").is_none());
    }

    #[test]
    fn test_summary() {
        let root = tempfile::tempdir().unwrap();
        let debate = make_debate(root.path(), "2026-03-01T14-05-09_is-rust-fast");
        let audit = debate.join(AUDIT_DIR);
        fs::write(audit.join(ROUND_ONE_FILE), "## openai (gpt-4o)\n").unwrap();
        fs::write(audit.join(COSTS_FILE), "**Total**: 10 tokens | $0.5000").unwrap();

        let summary = DebateSummary::load(&debate);
        assert_eq!(summary.timestamp, "2026-03-01 14-05-09");
        assert_eq!(summary.prompt, "is rust fast");
        assert_eq!(summary.providers, vec!["openai"]);
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.total_cost, "$0.5000");
    }
}
