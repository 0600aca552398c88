//! Literal masking, query hashing and statement splitting

use log::debug;
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlparser::tokenizer::{Token, Tokenizer};
use std::sync::OnceLock;

use crate::dialect::DialectConfig;
use crate::error::{LineageError, LineageResult};

const MASK: &str = "?";

fn string_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'(?:[^']|'')*'").expect("valid regex"))
}

fn number_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b").expect("valid regex"))
}

fn tokenize(sql: &str, config: DialectConfig) -> LineageResult<Vec<Token>> {
    let dialect = config.parser_dialect();
    Tokenizer::new(dialect.as_ref(), sql)
        .tokenize()
        .map_err(|e| LineageError::Tokenize(e.to_string()))
}

fn is_literal(token: &Token) -> bool {
    matches!(
        token,
        Token::Number(_, _)
            | Token::SingleQuotedString(_)
            | Token::DoubleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::EscapedStringLiteral(_)
            | Token::HexStringLiteral(_)
    )
}

/// Replace string and numeric literals with `?`.
///
/// Identifiers, keywords, comments and whitespace are kept as written. When
/// the tokenizer rejects the input a regex pass masks quoted strings and
/// bare numbers instead.
pub fn mask_query(sql: &str, config: DialectConfig) -> String {
    match tokenize(sql, config) {
        Ok(tokens) => tokens
            .iter()
            .map(|token| {
                if is_literal(token) {
                    MASK.to_string()
                } else {
                    token.to_string()
                }
            })
            .collect(),
        Err(e) => {
            debug!("Falling back to regex masking: {}", e);
            mask_with_regex(sql)
        }
    }
}

fn mask_with_regex(sql: &str) -> String {
    let masked = string_literal_re().replace_all(sql, MASK);
    number_literal_re().replace_all(&masked, MASK).into_owned()
}

/// SHA-256 hex digest of a (masked) query
pub fn query_hash(masked: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(masked.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Split a script into statements on top-level `;`.
///
/// Semicolons inside strings, quoted identifiers, comments and dollar-quoted
/// bodies do not split. Blank statements are dropped.
pub fn split_statements(sql: &str, config: DialectConfig) -> LineageResult<Vec<String>> {
    let tokens = tokenize(sql, config)?;

    let mut statements = Vec::new();
    let mut current = String::new();
    for token in &tokens {
        if matches!(token, Token::SemiColon) {
            push_statement(&mut statements, &mut current);
        } else {
            current.push_str(&token.to_string());
        }
    }
    push_statement(&mut statements, &mut current);

    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !crate::cleaner::strip_leading_comments(statement).is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

#[cfg(test)]
#[path = "masker_test.rs"]
mod tests;
