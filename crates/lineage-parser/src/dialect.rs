//! SQL dialect resolution
//!
//! Each named dialect maps to a small configuration record: which sqlparser
//! dialect backs it, whether `[bracketed]` identifiers are native, and whether
//! unquoted identifiers fold to lower case. Dialects sqlparser has no grammar
//! for are backed by its generic dialect.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    BigQueryDialect, ClickHouseDialect, DatabricksDialect, Dialect as ParserDialect,
    DuckDbDialect, GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;
use std::sync::OnceLock;

use crate::error::{LineageError, LineageResult};

/// Named SQL dialect of an incoming query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Dialect {
    #[default]
    Ansi,
    Athena,
    BigQuery,
    ClickHouse,
    Databricks,
    Db2,
    DuckDb,
    Exasol,
    Hive,
    MySql,
    Oracle,
    Postgres,
    Redshift,
    Snowflake,
    SparkSql,
    Sqlite,
    Teradata,
    Trino,
    Tsql,
}

impl Dialect {
    /// Every supported dialect
    pub const ALL: [Dialect; 19] = [
        Dialect::Ansi,
        Dialect::Athena,
        Dialect::BigQuery,
        Dialect::ClickHouse,
        Dialect::Databricks,
        Dialect::Db2,
        Dialect::DuckDb,
        Dialect::Exasol,
        Dialect::Hive,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::Postgres,
        Dialect::Redshift,
        Dialect::Snowflake,
        Dialect::SparkSql,
        Dialect::Sqlite,
        Dialect::Teradata,
        Dialect::Trino,
        Dialect::Tsql,
    ];

    /// Resolve a dialect from its name. Unknown names fall back to ANSI.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ansi" | "generic" => Dialect::Ansi,
            "athena" => Dialect::Athena,
            "bigquery" => Dialect::BigQuery,
            "clickhouse" => Dialect::ClickHouse,
            "databricks" => Dialect::Databricks,
            "db2" => Dialect::Db2,
            "duckdb" => Dialect::DuckDb,
            "exasol" => Dialect::Exasol,
            "hive" => Dialect::Hive,
            "mysql" | "mariadb" => Dialect::MySql,
            "oracle" => Dialect::Oracle,
            "postgres" | "postgresql" => Dialect::Postgres,
            "redshift" => Dialect::Redshift,
            "snowflake" => Dialect::Snowflake,
            "sparksql" | "spark" => Dialect::SparkSql,
            "sqlite" => Dialect::Sqlite,
            "teradata" => Dialect::Teradata,
            "trino" | "presto" => Dialect::Trino,
            "tsql" | "mssql" | "sqlserver" => Dialect::Tsql,
            other => {
                debug!("Unknown dialect '{}', falling back to ansi", other);
                Dialect::Ansi
            }
        }
    }

    /// Get the configuration record for this dialect
    pub fn config(self) -> DialectConfig {
        let (name, parser) = match self {
            Dialect::Ansi => ("ansi", BackingParser::Generic),
            Dialect::Athena => ("athena", BackingParser::Generic),
            Dialect::BigQuery => ("bigquery", BackingParser::BigQuery),
            Dialect::ClickHouse => ("clickhouse", BackingParser::ClickHouse),
            Dialect::Databricks => ("databricks", BackingParser::Databricks),
            Dialect::Db2 => ("db2", BackingParser::Generic),
            Dialect::DuckDb => ("duckdb", BackingParser::DuckDb),
            Dialect::Exasol => ("exasol", BackingParser::Generic),
            Dialect::Hive => ("hive", BackingParser::Hive),
            Dialect::MySql => ("mysql", BackingParser::MySql),
            Dialect::Oracle => ("oracle", BackingParser::Generic),
            Dialect::Postgres => ("postgres", BackingParser::Postgres),
            Dialect::Redshift => ("redshift", BackingParser::Redshift),
            Dialect::Snowflake => ("snowflake", BackingParser::Snowflake),
            Dialect::SparkSql => ("sparksql", BackingParser::Databricks),
            Dialect::Sqlite => ("sqlite", BackingParser::Sqlite),
            Dialect::Teradata => ("teradata", BackingParser::Generic),
            Dialect::Trino => ("trino", BackingParser::Generic),
            Dialect::Tsql => ("tsql", BackingParser::MsSql),
        };

        DialectConfig {
            name,
            parser,
            bracket_identifiers: self == Dialect::Tsql,
            fold_case: self != Dialect::ClickHouse,
        }
    }

    /// Dialect name
    pub fn name(self) -> &'static str {
        self.config().name
    }
}

impl From<String> for Dialect {
    fn from(name: String) -> Self {
        Dialect::from_name(&name)
    }
}

impl From<&str> for Dialect {
    fn from(name: &str) -> Self {
        Dialect::from_name(name)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// sqlparser grammar backing a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingParser {
    Generic,
    BigQuery,
    ClickHouse,
    Databricks,
    DuckDb,
    Hive,
    MsSql,
    MySql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

/// Parser configuration for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectConfig {
    /// Dialect name
    pub name: &'static str,
    /// Backing sqlparser grammar
    pub parser: BackingParser,
    /// `[ident]` is a native quoted identifier
    pub bracket_identifiers: bool,
    /// Unquoted identifiers fold to lower case
    pub fold_case: bool,
}

impl DialectConfig {
    /// Get the underlying sqlparser dialect
    pub fn parser_dialect(&self) -> Box<dyn ParserDialect> {
        match self.parser {
            BackingParser::Generic => Box::new(GenericDialect {}),
            BackingParser::BigQuery => Box::new(BigQueryDialect {}),
            BackingParser::ClickHouse => Box::new(ClickHouseDialect {}),
            BackingParser::Databricks => Box::new(DatabricksDialect {}),
            BackingParser::DuckDb => Box::new(DuckDbDialect {}),
            BackingParser::Hive => Box::new(HiveDialect {}),
            BackingParser::MsSql => Box::new(MsSqlDialect {}),
            BackingParser::MySql => Box::new(MySqlDialect {}),
            BackingParser::Postgres => Box::new(PostgreSqlDialect {}),
            BackingParser::Redshift => Box::new(RedshiftSqlDialect {}),
            BackingParser::Snowflake => Box::new(SnowflakeDialect {}),
            BackingParser::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> LineageResult<Vec<Statement>> {
        let dialect = self.parser_dialect();
        Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = error_position(&message);
            LineageError::Parse {
                message,
                line,
                column,
            }
        })
    }

    /// Apply case folding to an identifier segment
    pub fn fold(&self, value: &str, quoted: bool) -> String {
        if self.fold_case && !quoted {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }
}

fn error_position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Line: (\d+), Column: (\d+)").expect("valid regex"))
}

/// Line and column of a sqlparser error, `(0, 0)` when the message has none
fn error_position(message: &str) -> (usize, usize) {
    error_position_re()
        .captures(message)
        .and_then(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
        .unwrap_or((0, 0))
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
