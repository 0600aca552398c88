//! Summary command implementation

use anyhow::Result;
use lineage_parser::{LineageParser, LineageSummary};

use crate::cli::{GlobalArgs, InputArgs, OutputFormat};
use crate::commands::common;
use crate::config::Settings;

/// Summary with the raw query replaced by its masked form when requested
fn summary_of(parser: &LineageParser, mask_queries: bool) -> LineageSummary {
    let mut summary = parser.summary();
    if mask_queries {
        summary.query = summary.masked_query.clone();
    }
    summary
}

fn summary_lines(summary: &LineageSummary) -> Vec<String> {
    let mut lines = vec![
        format!("query: {}", summary.query.trim()),
        format!("hash: {}", summary.query_hash),
        format!("tables: {}", summary.clean_table_list.join(", ")),
    ];
    for (alias, table) in &summary.table_aliases {
        lines.push(format!("alias {} -> {}", alias, table));
    }
    for edge in &summary.column_lineage {
        lines.push(format!("column {} -> {}", edge.source, edge.target));
    }
    for join in summary.table_joins.values().flatten() {
        let others: Vec<String> = join.joined_with.iter().map(|c| c.to_string()).collect();
        lines.push(format!("join {} = {}", join.table_column, others.join(", ")));
    }
    lines
}

/// Execute the summary command
pub(crate) fn execute(args: &InputArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global, args.output)?;
    let sql = common::read_input(&args.input)?;
    let analyzed = common::analyze_all(&sql, settings.dialect);

    match settings.output {
        OutputFormat::Json => {
            let entries =
                common::json_entries(&analyzed, |p| summary_of(p, settings.mask_queries));
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => common::print_text(&analyzed, |parser| {
            summary_lines(&summary_of(parser, settings.mask_queries))
        }),
    }

    common::check_failures(&analyzed)
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
