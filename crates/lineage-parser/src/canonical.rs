//! Table name canonicalization
//!
//! Normalizes parsed identifiers into comparable table names: quote and
//! bracket stripping, dialect case folding, and stage (`@`) handling.

use sqlparser::ast::{Ident, ObjectName, ObjectNamePart};

use crate::dialect::DialectConfig;
use crate::models::{Location, Relation, Schema, Table};

/// One dot-separated identifier segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text with surrounding quotes removed
    pub value: String,
    /// Whether the segment was quoted (`"x"`, `` `x` `` or `[x]`)
    pub quoted: bool,
}

impl Segment {
    pub fn plain(value: &str) -> Self {
        Self {
            value: value.to_string(),
            quoted: false,
        }
    }

    pub fn from_ident(ident: &Ident) -> Self {
        Self {
            value: ident.value.clone(),
            quoted: ident.quote_style.is_some(),
        }
    }
}

fn closing_quote(open: char) -> Option<char> {
    match open {
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Split a dotted identifier into segments, honoring quotes and brackets.
///
/// `testdb.PUBLIC."lowercase_users"` yields three segments, the last one
/// marked as quoted. Empty segments (`db..table`) are skipped.
pub fn split_identifier(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut closing: Option<char> = None;
    let mut chars = raw.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(close) = closing {
            if ch == close {
                // Doubled quote characters are escapes inside quoted identifiers
                if close != ']' && chars.peek() == Some(&close) {
                    current.push(close);
                    chars.next();
                } else {
                    closing = None;
                }
            } else {
                current.push(ch);
            }
            continue;
        }

        if ch == '.' {
            push_segment(&mut segments, &mut current, quoted);
            quoted = false;
        } else if current.trim().is_empty() && closing_quote(ch).is_some() {
            current.clear();
            closing = closing_quote(ch);
            quoted = true;
        } else {
            current.push(ch);
        }
    }
    push_segment(&mut segments, &mut current, quoted);
    segments
}

fn push_segment(segments: &mut Vec<Segment>, current: &mut String, quoted: bool) {
    let value = if quoted {
        std::mem::take(current)
    } else {
        std::mem::take(current).trim().to_string()
    };
    if !value.is_empty() {
        segments.push(Segment { value, quoted });
    }
}

/// Remove one pair of surrounding quotes or brackets from an identifier
pub fn strip_quotes(value: &str) -> String {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if trimmed.len() >= 2 && closing_quote(open) == Some(close) => {
            trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()].to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Segments of a parsed sqlparser object name
pub fn object_name_segments(name: &ObjectName) -> Vec<Segment> {
    name.0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => Segment::from_ident(ident),
            other => Segment::plain(&other.to_string()),
        })
        .collect()
}

/// Build a table from identifier segments, applying dialect case folding
pub fn table_from_segments(segments: &[Segment], config: DialectConfig) -> Table {
    let parts: Vec<String> = segments
        .iter()
        .map(|s| config.fold(&s.value, s.quoted))
        .collect();
    Table::from_parts(&parts)
}

/// Build a table from a sqlparser object name
pub fn table_from_object_name(name: &ObjectName, config: DialectConfig) -> Table {
    let mut table = table_from_segments(&object_name_segments(name), config);
    table.raw = name.to_string();
    table
}

/// Fold an alias the same way table names are folded
pub fn fold_ident(ident: &Ident, config: DialectConfig) -> String {
    config.fold(&ident.value, ident.quote_style.is_some())
}

fn clean_schema(schema: &Schema) -> Schema {
    Schema::new(schema.raw_name().map(|raw| {
        split_identifier(raw)
            .into_iter()
            .map(|s| s.value)
            .collect::<Vec<_>>()
            .join(".")
    }))
}

/// Normalize a table or stage reference.
///
/// Strips quote/bracket pairs around each segment and the `@` stage marker.
/// A table whose name still carries the stage marker becomes a `Location`.
/// Case is not re-folded, so quoted names keep their case. Stripping repeats
/// until nothing changes, so the result is a fixpoint.
pub fn clean_table_name(relation: &Relation) -> Relation {
    let mut current = clean_once(relation);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(relation: &Relation) -> Relation {
    match relation {
        Relation::Table(table) if table.qualified_name().trim_start().starts_with('@') => {
            let mut location = Location::new(&table.qualified_name());
            location.raw = table.raw.clone();
            clean_once(&Relation::Location(location))
        }
        Relation::Table(table) => Relation::Table(Table {
            schema: clean_schema(&table.schema),
            raw_name: strip_quotes(&table.raw_name),
            raw: table.raw.clone(),
        }),
        Relation::Location(location) => {
            let name = strip_quotes(&location.raw_name);
            Relation::Location(Location {
                schema: clean_schema(&location.schema),
                raw_name: name.trim_start_matches('@').to_string(),
                raw: location.raw.clone(),
            })
        }
    }
}

#[cfg(test)]
#[path = "canonical_test.rs"]
mod tests;
