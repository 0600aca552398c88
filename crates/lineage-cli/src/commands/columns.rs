//! Columns command implementation

use anyhow::Result;
use lineage_parser::{ColumnLineage, LineageParser};

use crate::cli::{GlobalArgs, InputArgs, OutputFormat};
use crate::commands::common;
use crate::config::Settings;

fn edges_of(parser: &LineageParser) -> Vec<ColumnLineage> {
    parser
        .column_lineage()
        .iter()
        .map(ColumnLineage::from)
        .collect()
}

/// Execute the columns command
pub(crate) fn execute(args: &InputArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global, args.output)?;
    let sql = common::read_input(&args.input)?;
    let analyzed = common::analyze_all(&sql, settings.dialect);

    match settings.output {
        OutputFormat::Json => {
            let entries = common::json_entries(&analyzed, edges_of);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => common::print_text(&analyzed, |parser| {
            edges_of(parser)
                .into_iter()
                .map(|edge| format!("{} -> {}", edge.source, edge.target))
                .collect()
        }),
    }

    common::check_failures(&analyzed)
}
