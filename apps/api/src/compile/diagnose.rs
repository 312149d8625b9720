//! Engine log diagnosis.
//!
//! Turns a TeX engine log into one short `message` and a few lines of `details`.
//! This is a best-effort extractor, not a log parser: it looks for the single line a
//! non-expert is most likely to act on.
//!
//! # Rule order (first match wins)
//! 1. First line starting with `!` plus a little filtered context
//! 2. First line containing `Error:`
//! 3. Known failure categories (missing `\begin{document}`, undefined control
//!    sequence, missing file)
//! 4. Catch-all: the last non-blank lines of the log

use lazy_static::lazy_static;
use regex::Regex;

use crate::compile::engine::EngineOutcome;

pub const GENERIC_FAILURE: &str = "LaTeX compilation failed";

/// Lines inspected after a `!` line for context.
const CONTEXT_WINDOW: usize = 4;
/// Context lines this long or longer are usually wrapped file lists; skip them.
const MAX_CONTEXT_LINE_LEN: usize = 100;
const TAIL_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub message: String,
    pub details: String,
}

impl Diagnosis {
    fn new(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: details.into(),
        }
    }
}

type Matcher = fn(&str) -> Option<Diagnosis>;

const MATCHERS: &[Matcher] = &[
    engine_error_line,
    error_label_line,
    missing_begin_document,
    undefined_control_sequence,
    missing_file,
];

lazy_static! {
    static ref MISSING_BEGIN_DOCUMENT: Regex =
        Regex::new(r"(?i)Missing \\begin\{document\}").expect("valid pattern");
    static ref UNDEFINED_CONTROL_SEQUENCE: Regex =
        Regex::new(r"(?i)Undefined control sequence[^\n]*").expect("valid pattern");
    static ref FILE_NOT_FOUND: Regex =
        Regex::new(r"(?i)File `[^']+' not found").expect("valid pattern");
}

/// Diagnoses a failed run from the engine's log text.
pub fn diagnose_log(log: &str) -> Diagnosis {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(log))
        .unwrap_or_else(|| log_tail(log))
}

/// Diagnosis for a run that left neither a PDF nor a log behind.
pub fn diagnose_without_log(engine: &str, outcome: EngineOutcome) -> Diagnosis {
    let ending = match outcome {
        EngineOutcome::Exited { code: Some(code) } => format!("exited with status {code}"),
        EngineOutcome::Exited { code: None } => "was terminated by a signal".to_string(),
        EngineOutcome::TimedOut => "was stopped after exceeding the time limit".to_string(),
    };
    Diagnosis::new(
        GENERIC_FAILURE,
        format!("{engine} {ending} and produced neither a PDF nor a log file."),
    )
}

fn engine_error_line(log: &str) -> Option<Diagnosis> {
    let lines: Vec<&str> = log.lines().collect();
    let index = lines.iter().position(|line| line.starts_with('!'))?;
    let first = lines[index];

    let mut captured = vec![first.trim_end()];
    for next in lines.iter().skip(index + 1).take(CONTEXT_WINDOW) {
        let next = next.trim();
        if next.starts_with('!') {
            // The next error is usually a consequence of this one.
            break;
        }
        if next.is_empty()
            || next.starts_with("l.")
            || next.starts_with('?')
            || next.len() >= MAX_CONTEXT_LINE_LEN
        {
            continue;
        }
        captured.push(next);
    }

    let message = first.strip_prefix('!').unwrap_or(first).trim();
    let message = if message.is_empty() {
        GENERIC_FAILURE
    } else {
        message
    };

    Some(Diagnosis::new(message, captured.join("\n")))
}

fn error_label_line(log: &str) -> Option<Diagnosis> {
    let line = log.lines().find(|line| line.contains("Error:"))?.trim();
    Some(Diagnosis::new(line, line))
}

fn missing_begin_document(log: &str) -> Option<Diagnosis> {
    MISSING_BEGIN_DOCUMENT.is_match(log).then(|| {
        Diagnosis::new(
            r"Missing \begin{document}",
            "Your LaTeX document must include \\begin{document} and \\end{document} tags. \
             Make sure your document has a complete structure.",
        )
    })
}

fn undefined_control_sequence(log: &str) -> Option<Diagnosis> {
    UNDEFINED_CONTROL_SEQUENCE.find(log).map(|m| {
        Diagnosis::new(
            m.as_str().trim(),
            "An undefined LaTeX command was used. Check for typos in command names.",
        )
    })
}

fn missing_file(log: &str) -> Option<Diagnosis> {
    FILE_NOT_FOUND.find(log).map(|m| {
        Diagnosis::new(
            m.as_str(),
            "A required LaTeX package or file is missing. You may need to install \
             additional packages, or the template is missing one of its assets.",
        )
    })
}

fn log_tail(log: &str) -> Diagnosis {
    let lines: Vec<&str> = log.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return Diagnosis::new(GENERIC_FAILURE, "LaTeX compilation failed. The engine log is empty.");
    }

    let tail = &lines[lines.len().saturating_sub(TAIL_LINES)..];
    Diagnosis::new(
        GENERIC_FAILURE,
        format!(
            "LaTeX compilation failed. Last log entries:\n{}",
            tail.join("\n")
        ),
    )
}
