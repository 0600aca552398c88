//! Tables command implementation

use anyhow::Result;
use lineage_parser::{LineageParser, Relation};
use serde::Serialize;

use crate::cli::{GlobalArgs, InputArgs, OutputFormat};
use crate::commands::common;
use crate::config::Settings;

#[derive(Serialize)]
struct TablesOutput {
    involved: Vec<String>,
    sources: Vec<String>,
    targets: Vec<String>,
}

fn names(relations: &[Relation]) -> Vec<String> {
    relations.iter().map(Relation::qualified_name).collect()
}

fn tables_of(parser: &LineageParser) -> TablesOutput {
    TablesOutput {
        involved: parser.clean_table_list().to_vec(),
        sources: names(parser.source_tables()),
        targets: names(parser.target_tables()),
    }
}

/// Execute the tables command
pub(crate) fn execute(args: &InputArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global, args.output)?;
    let sql = common::read_input(&args.input)?;
    let analyzed = common::analyze_all(&sql, settings.dialect);

    match settings.output {
        OutputFormat::Json => {
            let entries = common::json_entries(&analyzed, tables_of);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => common::print_text(&analyzed, |parser| {
            let tables = tables_of(parser);
            vec![
                format!("involved: {}", tables.involved.join(", ")),
                format!("sources: {}", tables.sources.join(", ")),
                format!("targets: {}", tables.targets.join(", ")),
            ]
        }),
    }

    common::check_failures(&analyzed)
}
