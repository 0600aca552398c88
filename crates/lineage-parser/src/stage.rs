//! Scanning of `COPY INTO` and `MERGE INTO` statements
//!
//! sqlparser does not accept every Snowflake stage form (`@~/path`,
//! `FILE_FORMAT = name`) nor the truncated `MERGE INTO … USING (…)` produced
//! by the cleaner, so both shapes are split into their endpoints here. Only
//! `( subquery )` endpoints are handed back to sqlparser.

use regex::Regex;
use std::sync::OnceLock;

use crate::cleaner::{find_matching_paren, strip_leading_comments};
use crate::dialect::DialectConfig;
use crate::models::{Location, Relation, Table};

/// One side of a scanned statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A table or stage reference
    Relation(Relation),
    /// A parenthesized query, without the parentheses
    Subquery(String),
    /// A literal path or URL (`'s3://bucket/path'`)
    External(String),
}

/// A statement whose endpoints were extracted without sqlparser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedStatement {
    /// `COPY INTO <target> FROM <source>`
    CopyInto { target: Endpoint, source: Endpoint },
    /// `MERGE INTO <target> [alias] USING <source>`
    Merge { target: Endpoint, source: Endpoint },
}

fn copy_into_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^copy\s+into\s+").expect("valid regex"))
}

fn merge_into_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^merge\s+into\s+").expect("valid regex"))
}

fn from_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^from\b\s*").expect("valid regex"))
}

fn using_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^(?:(?:as\s+)?[A-Za-z_][\w$]*\s+)?using\b\s*").expect("valid regex"))
}

/// Scan a statement, returning `None` when it is not `COPY INTO` or `MERGE INTO`
pub fn scan(sql: &str, config: DialectConfig) -> Option<ScannedStatement> {
    let body = strip_leading_comments(sql);

    if let Some(prefix) = copy_into_prefix().find(body) {
        let (target, rest) = read_endpoint(&body[prefix.end()..], config)?;
        let rest = skip_column_list(rest);
        let from = from_keyword().find(rest)?;
        let (source, _) = read_endpoint(&rest[from.end()..], config)?;
        return Some(ScannedStatement::CopyInto { target, source });
    }

    if let Some(prefix) = merge_into_prefix().find(body) {
        let (target, rest) = read_endpoint(&body[prefix.end()..], config)?;
        let rest = rest.trim_start();
        let using = using_keyword().find(rest)?;
        let (source, _) = read_endpoint(&rest[using.end()..], config)?;
        return Some(ScannedStatement::Merge { target, source });
    }

    None
}

/// Read one endpoint token and return it with the remaining input
fn read_endpoint(input: &str, config: DialectConfig) -> Option<(Endpoint, &str)> {
    let input = input.trim_start();
    let first = input.chars().next()?;

    match first {
        '(' => {
            let close = find_matching_paren(input, 0)?;
            let inner = input[1..close].trim().to_string();
            Some((Endpoint::Subquery(inner), &input[close + 1..]))
        }
        '\'' => {
            let end = input[1..].find('\'')? + 1;
            let literal = input[1..end].to_string();
            Some((Endpoint::External(literal), &input[end + 1..]))
        }
        '@' => {
            let end = input
                .find(|c: char| c.is_whitespace() || c == ';' || c == '(' || c == ')')
                .unwrap_or(input.len());
            let location = Location::new(&input[..end]);
            Some((Endpoint::Relation(location.into()), &input[end..]))
        }
        _ => {
            let end = identifier_end(input);
            if end == 0 {
                return None;
            }
            let table = Table::with_dialect(&input[..end], config);
            Some((Endpoint::Relation(table.into()), &input[end..]))
        }
    }
}

/// Byte length of a dotted identifier chain, honoring quotes and brackets
fn identifier_end(input: &str) -> usize {
    let mut closing: Option<char> = None;
    for (idx, ch) in input.char_indices() {
        if let Some(close) = closing {
            if ch == close {
                closing = None;
            }
            continue;
        }
        match ch {
            '"' => closing = Some('"'),
            '`' => closing = Some('`'),
            '[' => closing = Some(']'),
            c if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '#') => {}
            _ => return idx,
        }
    }
    input.len()
}

/// Skip an optional `(col, ...)` list after a COPY target
fn skip_column_list(input: &str) -> &str {
    let trimmed = input.trim_start();
    if trimmed.starts_with('(') {
        if let Some(close) = find_matching_paren(trimmed, 0) {
            return trimmed[close + 1..].trim_start();
        }
    }
    trimmed
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;
