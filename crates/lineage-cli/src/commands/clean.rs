//! Clean command implementation

use anyhow::Result;
use lineage_parser::LineageParser;

use crate::cli::{CleanArgs, GlobalArgs};
use crate::commands::common;
use crate::config::Settings;

/// Execute the clean command
pub(crate) fn execute(args: &CleanArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global, None)?;
    let sql = common::read_input(&args.input)?;

    for (idx, statement) in common::statements(&sql, settings.dialect)
        .iter()
        .enumerate()
    {
        println!("-- statement {}", idx + 1);
        match LineageParser::clean_raw_query(statement) {
            Some(cleaned) => println!("{}", cleaned),
            None => println!("(filtered: no lineage)"),
        }
    }
    Ok(())
}
