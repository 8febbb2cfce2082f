//! Parser for the application status table.
//!
//! The orchestration CLI prints a human-oriented table:
//!
//! ```text
//! APPLICATION NAME   POD NAME              STATUS
//! ──────────────────────────────────────────────────────────
//! demo               demo--vllm-server     Running (healthy)
//!                    demo--milvus          Running (healthy) Restarts: 1
//! ```
//!
//! Columns are separated by runs of two or more spaces; the application
//! column is only filled on the first row of each application. Parsing is a
//! small state machine so that a header appearing after data is rejected.

use std::collections::HashSet;
use std::sync::OnceLock;

use appcheck_exec::{CommandExecutor, ExecError};
use regex::Regex;
use tracing::debug;

use crate::commands::OrchestratorCommand;
use crate::context::RunContext;
use crate::domain::{ParseError, StatusRow, VerifyError};

const HEADER_WORDS: [&str; 5] = ["APPLICATION", "NAME", "POD", "NAME", "STATUS"];

fn restart_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)restarts?:\s*(\d+)").expect("static regex"))
}

/// Where the parser is within the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Start,
    Header,
    Rows,
}

/// Columns captured from a data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCaptures<'a> {
    pub application: Option<&'a str>,
    pub pod: &'a str,
    pub status: &'a str,
}

/// Classification of a single (right-trimmed) line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Header,
    Separator,
    Row(RowCaptures<'a>),
    Unparseable,
}

fn is_separator_char(c: char) -> bool {
    c.is_whitespace() || c == '-' || ('\u{2500}'..='\u{257F}').contains(&c)
}

/// Split off the first whitespace-delimited token.
///
/// Returns the token, the number of whitespace characters after it, and the
/// remainder. `s` must not start with whitespace.
fn next_token(s: &str) -> (&str, usize, &str) {
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    let (token, after) = s.split_at(end);
    let rest = after.trim_start();
    let gap = after[..after.len() - rest.len()].chars().count();
    (token, gap, rest)
}

fn split_row(content: &str) -> Option<RowCaptures<'_>> {
    let (first, gap1, rest1) = next_token(content);
    if first.is_empty() || rest1.is_empty() {
        return None;
    }

    let (second, gap2, rest2) = next_token(rest1);
    if !rest2.is_empty() && gap2 >= 2 {
        return Some(RowCaptures {
            application: Some(first),
            pod: second,
            status: rest2.trim(),
        });
    }

    if gap1 >= 2 {
        return Some(RowCaptures {
            application: None,
            pod: first,
            status: rest1.trim(),
        });
    }

    None
}

/// Classify one raw line.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim_end();
    if line.is_empty() {
        return LineKind::Blank;
    }
    if line.chars().all(is_separator_char) {
        return LineKind::Separator;
    }
    if line.split_whitespace().eq(HEADER_WORDS) {
        return LineKind::Header;
    }
    match split_row(line.trim_start()) {
        Some(captures) => LineKind::Row(captures),
        None => LineKind::Unparseable,
    }
}

/// Extract a `restarts: N` marker from free-text status. Absent or
/// out-of-range counts yield 0.
pub fn extract_restart_count(status: &str) -> u32 {
    restart_regex()
        .captures(status)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Stateful line-by-line parser for one table.
#[derive(Debug)]
pub struct StatusTableParser {
    state: ParserState,
    rows: Vec<StatusRow>,
    seen: HashSet<String>,
}

impl Default for StatusTableParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTableParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Start,
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Parse every line, failing on the first malformed one.
    pub fn parse<'a, I>(lines: I) -> Result<Vec<StatusRow>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parser = Self::new();
        for (idx, line) in lines.into_iter().enumerate() {
            parser.feed(idx + 1, line)?;
        }
        Ok(parser.finish())
    }

    /// Parse a complete block of command output.
    pub fn parse_text(text: &str) -> Result<Vec<StatusRow>, ParseError> {
        Self::parse(text.lines())
    }

    /// Consume one line. `line_no` is 1-based and only used for errors.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        match (self.state, classify(line)) {
            (_, LineKind::Blank) | (_, LineKind::Separator) => Ok(()),
            (ParserState::Start, LineKind::Header) | (ParserState::Header, LineKind::Header) => {
                self.state = ParserState::Header;
                Ok(())
            }
            (ParserState::Rows, LineKind::Header) => Err(ParseError::UnexpectedHeader {
                line_no,
                line: line.trim_end().to_string(),
            }),
            (_, LineKind::Row(captures)) => {
                if !self.seen.insert(captures.pod.to_string()) {
                    return Err(ParseError::DuplicatePod {
                        line_no,
                        pod: captures.pod.to_string(),
                    });
                }
                self.rows.push(StatusRow {
                    application_name: captures.application.map(str::to_string),
                    pod_name: captures.pod.to_string(),
                    status: captures.status.to_string(),
                    restart_count: extract_restart_count(captures.status),
                });
                self.state = ParserState::Rows;
                Ok(())
            }
            (_, LineKind::Unparseable) => Err(ParseError::UnparseableRow {
                line_no,
                line: line.trim_end().to_string(),
            }),
        }
    }

    pub fn finish(self) -> Vec<StatusRow> {
        self.rows
    }
}

/// Run `application ps` for the context's application and parse the table.
///
/// Returns `Ok(None)` when the command prints nothing but whitespace, which
/// means nothing is deployed yet.
pub async fn query_status_rows(
    executor: &dyn CommandExecutor,
    ctx: &RunContext,
) -> Result<Option<Vec<StatusRow>>, VerifyError> {
    let spec = OrchestratorCommand::ApplicationPs {
        application: ctx.application.clone(),
    }
    .to_spec(&ctx.tools, ctx.timeouts.command_secs);

    let status_query = |source: ExecError| VerifyError::StatusQuery {
        application: ctx.application.clone(),
        source,
    };
    let stdout = executor
        .execute(&spec)
        .await
        .and_then(|output| output.into_stdout(&spec))
        .map_err(status_query)?;

    if stdout.trim().is_empty() {
        debug!(application = %ctx.application, "Status table is empty");
        return Ok(None);
    }

    let rows = StatusTableParser::parse_text(&stdout)?;
    debug!(application = %ctx.application, rows = rows.len(), "Parsed status table");
    Ok(Some(rows))
}
