//! lineage-parser - table, column and join lineage from raw SQL
//!
//! This crate cleans raw SQL statements, runs them through sqlparser and
//! derives the tables a query reads and writes, column-level lineage,
//! table aliases and the join graph, all in canonical dotted names.

pub mod canonical;
pub mod cleaner;
pub mod dialect;
pub mod error;
pub mod joins;
pub mod masker;
pub mod models;
pub mod parser;
pub mod runner;
pub mod stage;

pub use dialect::{Dialect, DialectConfig};
pub use error::{LineageError, LineageResult};
pub use masker::{mask_query, query_hash, split_statements};
pub use models::{Column, Location, Relation, Schema, Table, TableColumn, TableColumnJoin};
pub use parser::{ColumnLineage, LineageParser, LineageSummary};
pub use runner::{LineageEngine, RawLineage, SqlParserEngine};
