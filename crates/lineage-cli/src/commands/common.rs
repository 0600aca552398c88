//! Input handling shared by the lineage commands

use anyhow::{bail, Context, Result};
use lineage_parser::{split_statements, Dialect, LineageError, LineageParser};
use log::{debug, warn};
use serde::Serialize;
use std::io::Read;

/// Read SQL from a file path, or stdin for `-`
pub(crate) fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut sql = String::new();
        std::io::stdin()
            .read_to_string(&mut sql)
            .context("Failed to read SQL from stdin")?;
        return Ok(sql);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read SQL file: {}", input))
}

/// Split a script into statements, keeping it whole if the tokenizer rejects it
pub(crate) fn statements(sql: &str, dialect: Dialect) -> Vec<String> {
    match split_statements(sql, dialect.config()) {
        Ok(statements) => statements,
        Err(e) => {
            warn!("Could not split input into statements, analyzing it whole: {}", e);
            vec![sql.trim().to_string()]
        }
    }
}

/// Outcome of analyzing one statement of the input
pub(crate) struct Analyzed {
    /// 1-based position in the input
    pub index: usize,
    pub result: Result<LineageParser, LineageError>,
}

/// Analyze every statement of the input; failures are kept, not raised
pub(crate) fn analyze_all(sql: &str, dialect: Dialect) -> Vec<Analyzed> {
    statements(sql, dialect)
        .iter()
        .enumerate()
        .map(|(idx, statement)| {
            let result = LineageParser::new(statement, dialect);
            match &result {
                Ok(parser) if parser.is_filtered() => {
                    debug!("Statement {} filtered by the cleaner", idx + 1)
                }
                Ok(_) => {}
                Err(e) => warn!("Statement {} failed: {}", idx + 1, e),
            }
            Analyzed {
                index: idx + 1,
                result,
            }
        })
        .collect()
}

/// Per-statement JSON envelope
#[derive(Serialize)]
pub(crate) struct StatementOutput<T: Serialize> {
    pub statement: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build one JSON entry per statement using `render` for successes
pub(crate) fn json_entries<T: Serialize>(
    analyzed: &[Analyzed],
    render: impl Fn(&LineageParser) -> T,
) -> Vec<StatementOutput<T>> {
    analyzed
        .iter()
        .map(|a| match &a.result {
            Ok(parser) => StatementOutput {
                statement: a.index,
                lineage: Some(render(parser)),
                error: None,
            },
            Err(e) => StatementOutput {
                statement: a.index,
                lineage: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

/// Print a text block per statement, errors included
pub(crate) fn print_text(analyzed: &[Analyzed], render: impl Fn(&LineageParser) -> Vec<String>) {
    for a in analyzed {
        println!("-- statement {}", a.index);
        match &a.result {
            Ok(parser) if parser.is_filtered() => println!("  (filtered: no lineage)"),
            Ok(parser) => {
                for line in render(parser) {
                    println!("  {}", line);
                }
            }
            Err(e) => println!("  error: {}", e),
        }
    }
}

/// Fail the command when any statement failed, after output was printed
pub(crate) fn check_failures(analyzed: &[Analyzed]) -> Result<()> {
    let failed = analyzed.iter().filter(|a| a.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} statement(s) failed to parse", failed, analyzed.len());
    }
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
