//! Lineage data model: tables, stage locations, columns and join records

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::canonical::{split_identifier, strip_quotes};
use crate::dialect::{Dialect, DialectConfig};

/// Placeholder rendered for tables referenced without a schema
pub const DEFAULT_SCHEMA: &str = "<default>";

/// Schema qualifier of a table (`db.schema`, `schema`, or the default schema)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    raw_name: Option<String>,
}

impl Schema {
    /// Create a schema from an optional dotted qualifier
    pub fn new(raw_name: Option<String>) -> Self {
        Self {
            raw_name: raw_name.filter(|name| !name.is_empty()),
        }
    }

    /// The default (unqualified) schema
    pub fn unqualified() -> Self {
        Self::default()
    }

    /// Whether the table was referenced without a schema
    pub fn is_default(&self) -> bool {
        self.raw_name.is_none()
    }

    /// Dotted qualifier, `None` for the default schema
    pub fn raw_name(&self) -> Option<&str> {
        self.raw_name.as_deref()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.raw_name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", DEFAULT_SCHEMA),
        }
    }
}

/// A queryable relation (physical table, view or CTE)
///
/// Equality and hashing use the normalized `(schema, raw_name)` pair; the
/// as-written form is kept for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Schema qualifier
    pub schema: Schema,
    /// Normalized table name
    pub raw_name: String,
    /// Identifier as written in the query
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Table {
    /// Parse a dotted identifier using ANSI case folding
    pub fn new(raw: &str) -> Self {
        Self::with_dialect(raw, Dialect::Ansi.config())
    }

    /// Parse a dotted identifier using a dialect's case folding
    pub fn with_dialect(raw: &str, config: DialectConfig) -> Self {
        let segments = split_identifier(raw);
        let parts: Vec<String> = segments
            .iter()
            .map(|s| config.fold(&s.value, s.quoted))
            .collect();
        let mut table = Self::from_parts(&parts);
        table.raw = raw.trim().to_string();
        table
    }

    /// Build from already-normalized name parts (`[db, schema, name]`)
    pub fn from_parts(parts: &[String]) -> Self {
        let (name, qualifier) = match parts.split_last() {
            Some((name, qualifier)) => (name.clone(), qualifier),
            None => (String::new(), &[][..]),
        };
        Self {
            schema: Schema::new((!qualifier.is_empty()).then(|| qualifier.join("."))),
            raw_name: name,
            raw: String::new(),
        }
    }

    /// Dotted name without the default schema marker (`foo`, `db.grault`)
    pub fn qualified_name(&self) -> String {
        match self.schema.raw_name() {
            Some(schema) => format!("{}.{}", schema, self.raw_name),
            None => self.raw_name.clone(),
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.raw_name == other.raw_name
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
        self.raw_name.hash(state);
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.raw_name)
    }
}

/// A staging/storage reference such as a Snowflake `@stage`
///
/// The stage name keeps its written case; the schema qualifier is folded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Schema qualifier of the stage
    pub schema: Schema,
    /// Stage name without the `@` marker or sub-path
    pub raw_name: String,
    /// Identifier as written in the query
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Location {
    /// Parse a stage reference (`@stage`, `@db.schema.stage/path/`, `[stage]`)
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('@').unwrap_or(trimmed);
        let body = body.split('/').next().unwrap_or(body);
        let body = if body.is_empty() { "~" } else { body };

        let segments = split_identifier(body);
        let config = Dialect::Ansi.config();
        let (name, qualifier) = match segments.split_last() {
            Some((name, qualifier)) => (name.value.clone(), qualifier),
            None => (String::new(), &[][..]),
        };
        let schema = qualifier
            .iter()
            .map(|s| config.fold(&s.value, s.quoted))
            .collect::<Vec<_>>()
            .join(".");

        Self {
            schema: Schema::new(Some(schema)),
            raw_name: name,
            raw: trimmed.to_string(),
        }
    }

    /// Dotted name without the default schema marker
    pub fn qualified_name(&self) -> String {
        match self.schema.raw_name() {
            Some(schema) => format!("{}.{}", schema, self.raw_name),
            None => self.raw_name.clone(),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.raw_name == other.raw_name
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
        self.raw_name.hash(state);
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.raw_name)
    }
}

/// Either side of a table-level lineage edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    Table(Table),
    Location(Location),
}

impl Relation {
    /// Schema qualifier
    pub fn schema(&self) -> &Schema {
        match self {
            Relation::Table(t) => &t.schema,
            Relation::Location(l) => &l.schema,
        }
    }

    /// Normalized name
    pub fn raw_name(&self) -> &str {
        match self {
            Relation::Table(t) => &t.raw_name,
            Relation::Location(l) => &l.raw_name,
        }
    }

    /// Dotted name without the default schema marker
    pub fn qualified_name(&self) -> String {
        match self {
            Relation::Table(t) => t.qualified_name(),
            Relation::Location(l) => l.qualified_name(),
        }
    }

    pub fn is_location(&self) -> bool {
        matches!(self, Relation::Location(_))
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Relation::Table(t) => Some(t),
            Relation::Location(_) => None,
        }
    }
}

impl From<Table> for Relation {
    fn from(table: Table) -> Self {
        Relation::Table(table)
    }
}

impl From<Location> for Relation {
    fn from(location: Location) -> Self {
        Relation::Location(location)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Table(t) => t.fmt(f),
            Relation::Location(l) => l.fmt(f),
        }
    }
}

/// A column scoped to a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Owning table
    pub table: Table,
    /// Normalized column name
    pub name: String,
}

impl Column {
    /// Create a column reference
    pub fn new(table: Table, name: &str) -> Self {
        Self {
            table,
            name: name.to_string(),
        }
    }

    /// Parse `schema.table.column` using ANSI case folding
    pub fn parse(raw: &str) -> Self {
        let segments = split_identifier(raw);
        let config = Dialect::Ansi.config();
        let mut parts: Vec<String> = segments
            .iter()
            .map(|s| config.fold(&s.value, s.quoted))
            .collect();
        let name = parts.pop().unwrap_or_default();
        Self {
            table: Table::from_parts(&parts),
            name,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// Catalog-facing column reference used in join records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Canonical dotted table name
    pub table: String,
    /// Column name as written
    pub column: String,
}

impl TableColumn {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: strip_quotes(column),
        }
    }
}

impl std::fmt::Display for TableColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// All columns joined against one anchor column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumnJoin {
    /// The anchor table's column
    pub table_column: TableColumn,
    /// Columns from other tables equated with the anchor, in clause order
    pub joined_with: Vec<TableColumn>,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
