//! Joins command implementation

use anyhow::Result;
use lineage_parser::LineageParser;

use crate::cli::{GlobalArgs, InputArgs, OutputFormat};
use crate::commands::common;
use crate::config::Settings;

fn join_lines(parser: &LineageParser) -> Vec<String> {
    let mut lines = Vec::new();
    for (table, joins) in parser.table_joins() {
        lines.push(format!("{}:", table));
        for join in joins {
            let others: Vec<String> = join.joined_with.iter().map(|c| c.to_string()).collect();
            lines.push(format!("  {} = {}", join.table_column.column, others.join(", ")));
        }
    }
    lines
}

/// Execute the joins command
pub(crate) fn execute(args: &InputArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global, args.output)?;
    let sql = common::read_input(&args.input)?;
    let analyzed = common::analyze_all(&sql, settings.dialect);

    match settings.output {
        OutputFormat::Json => {
            let entries = common::json_entries(&analyzed, |p| p.table_joins().clone());
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => common::print_text(&analyzed, join_lines),
    }

    common::check_failures(&analyzed)
}
