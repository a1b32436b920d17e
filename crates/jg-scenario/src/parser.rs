//! Scenario text ⇄ [`ScenarioRecord`].
//!
//! Scenarios are separated by `---` lines. Each starts with `key = value`
//! headers followed by the JOI code body:
//!
//! ```text
//! name = "MorningLights"
//! cron = "0 9 * * *"
//! period = -1
//! (#Light #livingroom).switch_on()
//! ---
//! ...
//! ```

use jg_protocol::scenario::{ScenarioRecord, default_name};
use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, ScenarioResult};
use crate::lexer::strip_comment;

const SEPARATOR: &str = "---";

/// Scenario header layout, selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrammarVariant {
    /// Optional `name`, then `cron` and `period`; `//` comments.
    #[default]
    Named,
    /// `cron` and `period` only; `//` and `# ` comments.
    Anonymous,
}

impl GrammarVariant {
    /// Whether `#` followed by whitespace starts a comment.
    pub fn hash_comments(self) -> bool {
        matches!(self, GrammarVariant::Anonymous)
    }

    fn has_name(self) -> bool {
        matches!(self, GrammarVariant::Named)
    }
}

/// A non-empty source line with its 1-based line number.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
}

/// Parse a block of scenario text into records.
pub fn parse_scenarios(text: &str, variant: GrammarVariant) -> ScenarioResult<Vec<ScenarioRecord>> {
    let mut chunks: Vec<Vec<Line<'_>>> = vec![Vec::new()];
    for (i, raw) in text.lines().enumerate() {
        if raw.trim() == SEPARATOR {
            chunks.push(Vec::new());
            continue;
        }
        let stripped = strip_comment(raw, variant);
        if stripped.trim().is_empty() {
            continue;
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(Line {
                number: i + 1,
                text: stripped,
            });
        }
    }

    let records = chunks
        .into_iter()
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(index, lines)| parse_chunk(index, &lines, variant))
        .collect::<ScenarioResult<Vec<_>>>()?;

    if records.is_empty() {
        return Err(ScenarioError::Empty);
    }
    Ok(records)
}

fn parse_chunk(index: usize, lines: &[Line<'_>], variant: GrammarVariant) -> ScenarioResult<ScenarioRecord> {
    let mut cursor = 0;

    let named = variant.has_name()
        && lines
            .first()
            .and_then(|l| split_header(l.text))
            .is_some_and(|(key, _)| key == "name");
    let name = if named {
        cursor += 1;
        header_value(lines, 0, "name")?
    } else {
        default_name(index)
    };

    let cron = header_value(lines, cursor, "cron")?;
    cursor += 1;

    let period_raw = header_value(lines, cursor, "period")?;
    let period_line = lines[cursor].number;
    let period = period_raw
        .parse::<i64>()
        .map_err(|_| ScenarioError::InvalidPeriod {
            line: period_line,
            value: period_raw.clone(),
        })?;
    cursor += 1;

    let body = lines[cursor..]
        .iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n");
    let code = format!("{}\n", body.trim());

    Ok(ScenarioRecord::new(name, cron, period, code))
}

/// Value of the `key` header expected at `lines[at]`.
fn header_value(lines: &[Line<'_>], at: usize, key: &'static str) -> ScenarioResult<String> {
    let Some(line) = lines.get(at) else {
        let last = lines.last().map_or(1, |l| l.number);
        return Err(ScenarioError::MissingHeader { line: last, key });
    };
    let (found, value) = split_header(line.text).ok_or_else(|| ScenarioError::MalformedHeader {
        line: line.number,
        text: line.text.trim().to_string(),
    })?;
    if found != key {
        return Err(ScenarioError::UnexpectedKey {
            line: line.number,
            found: found.to_string(),
            expected: key,
        });
    }
    Ok(value.to_string())
}

/// Split `key = value` at the first `=`, stripping quotes from the value.
fn split_header(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value.trim().trim_matches('"')))
}

/// Render records back to scenario text that parses to the same records.
pub fn render_scenarios(records: &[ScenarioRecord], variant: GrammarVariant) -> String {
    records
        .iter()
        .map(|record| {
            let mut out = String::new();
            if variant.has_name() {
                out.push_str(&format!("name = \"{}\"\n", record.name));
            }
            out.push_str(&format!("cron = \"{}\"\n", record.cron));
            out.push_str(&format!("period = {}\n", record.period));
            out.push_str(record.code.trim_end());
            out.push('\n');
            out
        })
        .collect::<Vec<_>>()
        .join(&format!("{SEPARATOR}\n"))
}
