//! `LineageParser`: per-query lineage facade
//!
//! A parser is built once per query. Cleaning and engine analysis run in the
//! constructor so parse failures surface immediately; every derived view
//! (canonical tables, aliases, join graph, masked query) is computed on first
//! access and cached for the lifetime of the instance.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::canonical;
use crate::cleaner;
use crate::dialect::Dialect;
use crate::error::LineageResult;
use crate::joins::build_table_joins;
use crate::masker::{mask_query, query_hash};
use crate::models::{Column, Relation, TableColumnJoin};
use crate::runner::{LineageEngine, RawLineage, SqlParserEngine};

/// Lineage of a single SQL query
#[derive(Debug)]
pub struct LineageParser {
    query: String,
    dialect: Dialect,
    cleaned: Option<String>,
    raw: RawLineage,
    source_tables: OnceLock<Vec<Relation>>,
    target_tables: OnceLock<Vec<Relation>>,
    involved_tables: OnceLock<Vec<Relation>>,
    clean_table_list: OnceLock<Vec<String>>,
    table_aliases: OnceLock<IndexMap<String, String>>,
    table_joins: OnceLock<IndexMap<String, Vec<TableColumnJoin>>>,
    masked_query: OnceLock<String>,
    query_hash: OnceLock<String>,
}

impl LineageParser {
    /// Analyze a query with the default sqlparser engine
    pub fn new(query: &str, dialect: Dialect) -> LineageResult<Self> {
        Self::with_engine(query, dialect, &SqlParserEngine)
    }

    /// Analyze a query with a caller-provided engine
    pub fn with_engine(
        query: &str,
        dialect: Dialect,
        engine: &dyn LineageEngine,
    ) -> LineageResult<Self> {
        let cleaned = cleaner::clean_raw_query(query);
        let raw = match &cleaned {
            Some(sql) => engine.analyze(sql, dialect)?,
            None => {
                debug!("Query filtered before analysis; lineage is empty");
                RawLineage::default()
            }
        };

        Ok(Self {
            query: query.to_string(),
            dialect,
            cleaned,
            raw,
            source_tables: OnceLock::new(),
            target_tables: OnceLock::new(),
            involved_tables: OnceLock::new(),
            clean_table_list: OnceLock::new(),
            table_aliases: OnceLock::new(),
            table_joins: OnceLock::new(),
            masked_query: OnceLock::new(),
            query_hash: OnceLock::new(),
        })
    }

    /// Clean a raw query; `None` means the statement carries no lineage
    pub fn clean_raw_query(query: &str) -> Option<String> {
        cleaner::clean_raw_query(query)
    }

    /// Normalize a table or stage reference
    pub fn clean_table_name(relation: &Relation) -> Relation {
        canonical::clean_table_name(relation)
    }

    /// The query as submitted
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The cleaned statement handed to the engine, if any
    pub fn cleaned_query(&self) -> Option<&str> {
        self.cleaned.as_deref()
    }

    /// True when the cleaner dropped the query
    pub fn is_filtered(&self) -> bool {
        self.cleaned.is_none()
    }

    /// Tables and stages read by the query
    pub fn source_tables(&self) -> &[Relation] {
        self.source_tables
            .get_or_init(|| clean_relations(&self.raw.source_tables))
    }

    /// Tables and stages written by the query
    pub fn target_tables(&self) -> &[Relation] {
        self.target_tables
            .get_or_init(|| clean_relations(&self.raw.target_tables))
    }

    /// Sources followed by targets, without duplicates
    pub fn involved_tables(&self) -> &[Relation] {
        self.involved_tables.get_or_init(|| {
            let mut involved: Vec<Relation> = Vec::new();
            for relation in self.source_tables().iter().chain(self.target_tables()) {
                if !involved.contains(relation) {
                    involved.push(relation.clone());
                }
            }
            involved
        })
    }

    /// Canonical dotted names of the involved tables, default schema omitted
    pub fn clean_table_list(&self) -> &[String] {
        self.clean_table_list.get_or_init(|| {
            self.involved_tables()
                .iter()
                .map(Relation::qualified_name)
                .collect()
        })
    }

    /// Alias → canonical table name
    pub fn table_aliases(&self) -> &IndexMap<String, String> {
        self.table_aliases.get_or_init(|| {
            self.raw
                .aliases
                .iter()
                .map(|(alias, table)| {
                    let cleaned = canonical::clean_table_name(&table.clone().into());
                    (alias.clone(), cleaned.qualified_name())
                })
                .collect()
        })
    }

    /// Join graph keyed by the anchor table's canonical name
    pub fn table_joins(&self) -> &IndexMap<String, Vec<TableColumnJoin>> {
        self.table_joins.get_or_init(|| {
            build_table_joins(
                &self.raw.aliases,
                &self.raw.relations,
                &self.raw.join_predicates,
            )
        })
    }

    /// Ordered (source, target) column pairs
    pub fn column_lineage(&self) -> &[(Column, Column)] {
        &self.raw.column_lineage
    }

    /// The query with literals replaced by `?`
    pub fn masked_query(&self) -> &str {
        self.masked_query
            .get_or_init(|| mask_query(&self.query, self.dialect.config()))
    }

    /// SHA-256 hex of the masked query
    pub fn query_hash(&self) -> &str {
        self.query_hash
            .get_or_init(|| query_hash(self.masked_query()))
    }

    /// Serializable snapshot of everything this parser derived
    pub fn summary(&self) -> LineageSummary {
        LineageSummary {
            query: self.query.clone(),
            dialect: self.dialect,
            filtered: self.is_filtered(),
            masked_query: self.masked_query().to_string(),
            query_hash: self.query_hash().to_string(),
            source_tables: self.source_tables().to_vec(),
            target_tables: self.target_tables().to_vec(),
            clean_table_list: self.clean_table_list().to_vec(),
            table_aliases: self.table_aliases().clone(),
            table_joins: self.table_joins().clone(),
            column_lineage: self.column_lineage().iter().map(ColumnLineage::from).collect(),
        }
    }
}

fn clean_relations(relations: &[Relation]) -> Vec<Relation> {
    let mut cleaned: Vec<Relation> = Vec::new();
    for relation in relations.iter().map(canonical::clean_table_name) {
        if !cleaned.contains(&relation) {
            cleaned.push(relation);
        }
    }
    cleaned
}

fn column_name(column: &Column) -> String {
    format!("{}.{}", column.table.qualified_name(), column.name)
}

/// One column lineage edge, rendered as canonical dotted names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub source: String,
    pub target: String,
}

impl From<&(Column, Column)> for ColumnLineage {
    fn from((source, target): &(Column, Column)) -> Self {
        Self {
            source: column_name(source),
            target: column_name(target),
        }
    }
}

/// Serializable lineage of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageSummary {
    pub query: String,
    pub dialect: Dialect,
    /// The cleaner dropped the query
    pub filtered: bool,
    pub masked_query: String,
    pub query_hash: String,
    pub source_tables: Vec<Relation>,
    pub target_tables: Vec<Relation>,
    pub clean_table_list: Vec<String>,
    pub table_aliases: IndexMap<String, String>,
    pub table_joins: IndexMap<String, Vec<TableColumnJoin>>,
    pub column_lineage: Vec<ColumnLineage>,
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
