//! Raw query cleaning
//!
//! Removes statement shapes that carry no table-level lineage and trims
//! clauses that only confuse the parser. Anything not explicitly recognized
//! passes through untouched.

use log::debug;
use regex::Regex;
use std::sync::OnceLock;

fn copy_grants_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+copy\s+grants\b").expect("valid regex"))
}

fn create_view_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^create\s+(?:or\s+replace\s+)?(?:(?:secure|recursive|materialized|temp|temporary)\s+)*view\b")
            .expect("valid regex")
    })
}

fn procedural_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^create\s+(?:or\s+(?:replace|alter)\s+)?(?:(?:temp|temporary|secure|constraint)\s+)*(?:trigger|function|procedure)\b")
            .expect("valid regex")
    })
}

fn merge_into_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^merge\s+into\b").expect("valid regex"))
}

fn using_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\busing\b").expect("valid regex"))
}

fn on_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bon\b").expect("valid regex"))
}

fn copy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^copy\b").expect("valid regex"))
}

fn copy_into_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^copy\s+into\b").expect("valid regex"))
}

fn stage_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:from|to)\s+@").expect("valid regex"))
}

/// Clean a raw SQL statement before lineage analysis.
///
/// Returns `None` for statements known to carry no extractable lineage
/// (file-based `COPY`, procedural `CREATE TRIGGER/FUNCTION/PROCEDURE`, blank
/// input). `None` is a normal skip signal, not an error.
pub fn clean_raw_query(query: &str) -> Option<String> {
    let query = query.trim();
    let body = strip_leading_comments(query);
    if body.is_empty() {
        return None;
    }
    // `body` is a suffix of `query`; leading comments stay in the output
    let body_start = query.len() - body.len();

    if create_view_re().is_match(body) && copy_grants_re().is_match(body) {
        let stripped = copy_grants_re().replacen(body, 1, "");
        return Some(format!("{}{}", &query[..body_start], stripped));
    }

    if merge_into_re().is_match(body) {
        return Some(truncate_merge(query, body_start));
    }

    if copy_re().is_match(body) && !copy_into_re().is_match(body) {
        if stage_token_re().is_match(body) {
            return Some(query.to_string());
        }
        debug!("Skipping file-based COPY statement without lineage");
        return None;
    }

    if procedural_re().is_match(body) {
        debug!("Skipping procedural CREATE statement");
        return None;
    }

    Some(query.to_string())
}

/// Cut a `MERGE INTO` statement after its `USING` source.
///
/// `WHEN MATCHED` / `WHEN NOT MATCHED` clauses add no table-level lineage.
/// The `USING` search starts at `body_start`, after any leading comments.
fn truncate_merge(query: &str, body_start: usize) -> String {
    let Some(using) = using_re().find_at(query, body_start) else {
        return query.to_string();
    };
    let rest = &query[using.end()..];
    let offset = rest.len() - rest.trim_start().len();
    let source_start = using.end() + offset;

    if query[source_start..].starts_with('(') {
        if let Some(close) = find_matching_paren(query, source_start) {
            return query[..=close].trim_end().to_string();
        }
        return query.to_string();
    }

    match on_re().find(&query[source_start..]) {
        Some(on) => query[..source_start + on.start()].trim_end().to_string(),
        None => query.to_string(),
    }
}

/// Skip leading whitespace, `--` line comments and `/* */` block comments
pub(crate) fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(idx) => after[idx + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(idx) => after[idx + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}

/// Find the byte index of the parenthesis closing the one at `open`.
///
/// Parentheses inside single-quoted strings and quoted identifiers are ignored.
pub(crate) fn find_matching_paren(sql: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in sql[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "cleaner_test.rs"]
mod tests;
