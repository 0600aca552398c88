//! End-to-end lineage tests through the public `LineageParser` API

use lineage_parser::{Column, Dialect, LineageParser, Location, Relation, Table, TableColumn, TableColumnJoin};
use std::collections::HashSet;

const COL_LINEAGE: &str = "
    SELECT
      a.col1,
      a.col2 + b.col2 AS col2,
      case
        when col1 = 3 then 'hello'
        else 'bye'
      end as new_col
    FROM foo a
    JOIN db.grault b
      ON a.col1 = b.col1
    JOIN db.holis c
      ON a.col1 = c.abc
    JOIN db.random d
      ON a.col2 = d.col2
    WHERE a.col3 = 'abc'
";

const CAPITALS: &str = r#"
     SELECT
       USERS.ID,
       li.id
    FROM TESTDB.PUBLIC.USERS
    JOIN testdb.PUBLIC."lowercase_users" li
      ON USERS.id = li.ID
    ;
"#;

fn parse(query: &str, dialect: Dialect) -> LineageParser {
    LineageParser::new(query, dialect).unwrap_or_else(|e| panic!("{}: {}", query, e))
}

fn rendered(relations: &[Relation]) -> HashSet<String> {
    relations.iter().map(|r| r.to_string()).collect()
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_involved_tables() {
    let expected = set(&["db.grault", "db.holis", "<default>.foo", "db.random"]);
    for dialect in [Dialect::Ansi, Dialect::Tsql] {
        let parser = parse(COL_LINEAGE, dialect);
        assert_eq!(rendered(parser.involved_tables()), expected, "{}", dialect);
    }
}

#[test]
fn test_clean_parser_table_list() {
    let expected = set(&["db.grault", "db.holis", "foo", "db.random"]);
    for dialect in [Dialect::Ansi, Dialect::Tsql] {
        let parser = parse(COL_LINEAGE, dialect);
        let clean: HashSet<String> = parser.clean_table_list().iter().cloned().collect();
        assert_eq!(clean, expected, "{}", dialect);
    }
}

#[test]
fn test_bracketed_parser_table_list() {
    let query = "create view [test_schema].[test_view] as select * from [test_table];";
    for dialect in [Dialect::Ansi, Dialect::Tsql] {
        let parser = parse(query, dialect);
        let clean: HashSet<String> = parser.clean_table_list().iter().cloned().collect();
        assert_eq!(clean, set(&["test_schema.test_view", "test_table"]), "{}", dialect);
    }
}

#[test]
fn test_parser_table_aliases() {
    for dialect in [Dialect::Ansi, Dialect::Tsql] {
        let parser = parse(COL_LINEAGE, dialect);
        let aliases = parser.table_aliases();
        assert_eq!(aliases.len(), 4);
        assert_eq!(aliases["a"], "foo");
        assert_eq!(aliases["b"], "db.grault");
        assert_eq!(aliases["c"], "db.holis");
        assert_eq!(aliases["d"], "db.random");

        let clean = parser.clean_table_list();
        assert!(aliases.values().all(|table| clean.contains(table)));
    }
}

#[test]
fn test_get_table_joins() {
    let expected = vec![
        TableColumnJoin {
            table_column: TableColumn::new("foo", "col1"),
            joined_with: vec![
                TableColumn::new("db.grault", "col1"),
                TableColumn::new("db.holis", "abc"),
            ],
        },
        TableColumnJoin {
            table_column: TableColumn::new("foo", "col2"),
            joined_with: vec![TableColumn::new("db.random", "col2")],
        },
    ];
    for dialect in [Dialect::Ansi, Dialect::Tsql] {
        let parser = parse(COL_LINEAGE, dialect);
        assert_eq!(parser.table_joins()["foo"], expected, "{}", dialect);
    }
}

#[test]
fn test_capitals_keep_written_column_case() {
    let expected = vec![TableColumnJoin {
        table_column: TableColumn::new("testdb.public.users", "id"),
        joined_with: vec![TableColumn::new("testdb.public.lowercase_users", "ID")],
    }];
    for dialect in [Dialect::Ansi, Dialect::Snowflake] {
        let parser = parse(CAPITALS, dialect);
        assert_eq!(parser.table_joins()["testdb.public.users"], expected, "{}", dialect);
    }
}

#[test]
fn test_ctes_column_lineage() {
    let query = "CREATE TABLE TESTDB.PUBLIC.TARGET AS
     WITH cte_table AS (
       SELECT
         USERS.ID,
         USERS.NAME
       FROM TESTDB.PUBLIC.USERS
    ),
    cte_table2 AS (
       SELECT
          ID,
          NAME
       FROM cte_table
    )
    SELECT
      ID,
      NAME
    FROM cte_table2
    ;";
    let expected = vec![
        (Column::parse("testdb.public.users.id"), Column::parse("testdb.public.target.id")),
        (Column::parse("testdb.public.users.name"), Column::parse("testdb.public.target.name")),
    ];
    for dialect in [Dialect::Ansi, Dialect::MySql] {
        let parser = parse(query, dialect);
        assert_eq!(rendered(parser.source_tables()), set(&["testdb.public.users"]));
        assert_eq!(parser.column_lineage(), expected.as_slice(), "{}", dialect);
    }
}

#[test]
fn test_table_with_single_comment() {
    let query = "CREATE TABLE TESTDB.PUBLIC.TARGET AS
    SELECT
        ID,
        -- A comment here
        NAME
    FROM TESTDB.PUBLIC.USERS
    ;";
    let expected = vec![
        (Column::parse("testdb.public.users.id"), Column::parse("testdb.public.target.id")),
        (Column::parse("testdb.public.users.name"), Column::parse("testdb.public.target.name")),
    ];
    for dialect in [Dialect::Ansi, Dialect::MySql] {
        let parser = parse(query, dialect);
        assert_eq!(
            rendered(parser.involved_tables()),
            set(&["testdb.public.users", "testdb.public.target"])
        );
        assert_eq!(parser.column_lineage(), expected.as_slice(), "{}", dialect);
    }
}

#[test]
fn test_table_with_aliases() {
    let query = "CREATE TABLE TESTDB.PUBLIC.TARGET AS
    SELECT
        ID AS new_identifier,
        NAME new_name
    FROM TESTDB.PUBLIC.USERS
    ;";
    let expected = vec![
        (
            Column::parse("testdb.public.users.id"),
            Column::parse("testdb.public.target.new_identifier"),
        ),
        (
            Column::parse("testdb.public.users.name"),
            Column::parse("testdb.public.target.new_name"),
        ),
    ];
    for dialect in [Dialect::Ansi, Dialect::MySql] {
        let parser = parse(query, dialect);
        assert_eq!(parser.column_lineage(), expected.as_slice(), "{}", dialect);
    }
}

#[test]
fn test_copy_query_yields_empty_lineage() {
    let query = "COPY MY_TABLE col1,col2,col3
    FROM 's3://bucket/schema/table.csv'
    WITH CREDENTIALS ''
    REGION 'US-east-2'
    ";
    for dialect in [Dialect::Ansi, Dialect::MySql] {
        let parser = parse(query, dialect);
        assert!(parser.is_filtered());
        assert!(parser.involved_tables().is_empty());
        assert!(parser.column_lineage().is_empty());
    }
}

#[test]
fn test_copy_into_table_from_stage_lineage() {
    let parser = parse(
        "COPY INTO wine_quality FROM @demo FILE_FORMAT = wine_csv_format;",
        Dialect::Snowflake,
    );
    assert_eq!(parser.source_tables().len(), 1);
    assert_eq!(parser.target_tables().len(), 1);
    assert!(parser.source_tables()[0].is_location());
    assert!(!parser.target_tables()[0].is_location());
    assert_eq!(parser.source_tables()[0].to_string(), "<default>.demo");
    assert_eq!(parser.target_tables()[0].to_string(), "<default>.wine_quality");
}

#[test]
fn test_copy_into_stage_from_table_lineage() {
    let parser = parse("COPY INTO @my_stage FROM my_table", Dialect::Snowflake);
    assert_eq!(parser.source_tables().len(), 1);
    assert_eq!(parser.target_tables().len(), 1);
    assert!(!parser.source_tables()[0].is_location());
    assert!(parser.target_tables()[0].is_location());
    assert_eq!(parser.source_tables()[0].to_string(), "<default>.my_table");
    assert_eq!(parser.target_tables()[0].to_string(), "<default>.my_stage");
}

#[test]
fn test_copy_into_stage_from_select_lineage() {
    let parser = parse(
        "COPY INTO @db.schema.my_stage FROM (SELECT col1, col2 FROM my_table)",
        Dialect::Snowflake,
    );
    assert_eq!(parser.source_tables().len(), 1);
    assert_eq!(parser.target_tables().len(), 1);
    assert!(!parser.source_tables()[0].is_location());
    assert!(parser.target_tables()[0].is_location());
    assert_eq!(parser.source_tables()[0].to_string(), "<default>.my_table");
    assert_eq!(parser.target_tables()[0].to_string(), "db.schema.my_stage");
}

#[test]
fn test_copy_into_fully_qualified_stage_lineage() {
    let parser = parse(
        "COPY INTO my_table FROM @my_db.my_schema.my_stage FILE_FORMAT=(TYPE=CSV)",
        Dialect::Snowflake,
    );
    assert!(parser.source_tables()[0].is_location());
    assert_eq!(parser.source_tables()[0].to_string(), "my_db.my_schema.my_stage");
    assert_eq!(parser.target_tables()[0].to_string(), "<default>.my_table");
}

#[test]
fn test_copy_into_stage_with_path_lineage() {
    let parser = parse(
        "COPY INTO @my_stage/daily/2024/ FROM reporting.public.daily_metrics",
        Dialect::Snowflake,
    );
    assert_eq!(parser.source_tables().len(), 1);
    assert_eq!(parser.target_tables().len(), 1);
    assert!(parser.target_tables()[0].is_location());
    assert_eq!(
        parser.source_tables()[0].to_string(),
        "reporting.public.daily_metrics"
    );
}

#[test]
fn test_copy_into_case_insensitivity() {
    let parser = parse("copy INTO @MY_STAGE from MY_TABLE", Dialect::Snowflake);
    assert_eq!(parser.source_tables().len(), 1);
    assert_eq!(parser.target_tables().len(), 1);
    assert!(!parser.source_tables()[0].is_location());
    assert!(parser.target_tables()[0].is_location());
}

#[test]
fn test_involved_tables_with_stage_lineage() {
    let parser = parse("COPY INTO my_table FROM @my_stage", Dialect::Snowflake);
    let involved = parser.involved_tables();
    assert_eq!(involved.len(), 2);
    assert!(involved.iter().any(Relation::is_location));
    assert!(involved.iter().any(|r| !r.is_location()));
}

#[test]
fn test_clean_table_name_locations() {
    let cleaned = LineageParser::clean_table_name(&Location::new("@STAGE_01").into());
    assert!(cleaned.is_location());
    assert_eq!(cleaned.raw_name(), "STAGE_01");

    let cleaned = LineageParser::clean_table_name(&Location::new("@DB.SCHEMA.STAGE_01").into());
    assert_eq!(cleaned.raw_name(), "STAGE_01");
    assert_eq!(cleaned.schema().to_string(), "db.schema");

    let cleaned = LineageParser::clean_table_name(&Location::new("[STAGE_01]").into());
    assert!(cleaned.is_location());
    assert_eq!(cleaned.raw_name(), "STAGE_01");

    let cleaned = LineageParser::clean_table_name(&Table::new("my_table").into());
    assert!(!cleaned.is_location());
    assert_eq!(cleaned.raw_name(), "my_table");
}

#[test]
fn test_clean_table_name_is_idempotent() {
    let inputs: Vec<Relation> = vec![
        Table::new("\"Db\".\"Orders\"").into(),
        Table::new("[dbo].[t]").into(),
        Location::new("@DB.SCHEMA.STAGE_01").into(),
    ];
    for relation in inputs {
        let once = LineageParser::clean_table_name(&relation);
        assert_eq!(LineageParser::clean_table_name(&once), once);
    }
}

#[test]
fn test_masked_queries_share_hash() {
    let first = parse("SELECT * FROM events WHERE day = '2024-01-01' LIMIT 10", Dialect::Postgres);
    let second = parse("SELECT * FROM events WHERE day = '2025-06-30' LIMIT 500", Dialect::Postgres);
    assert_eq!(first.masked_query(), second.masked_query());
    assert_eq!(first.query_hash(), second.query_hash());
}

#[test]
fn test_column_lineage_with_renaming() {
    let parser = parse(
        "CREATE TABLE t AS SELECT id AS new_id, name new_name FROM users",
        Dialect::Ansi,
    );
    assert_eq!(
        parser.column_lineage(),
        [
            (Column::parse("users.id"), Column::parse("t.new_id")),
            (Column::parse("users.name"), Column::parse("t.new_name")),
        ]
    );
}

#[test]
fn test_anchor_on_right_side_of_predicate() {
    let parser = parse(
        "SELECT 1 FROM foo a JOIN db.grault b ON b.col1 = a.col1",
        Dialect::Ansi,
    );
    let joins = parser.table_joins();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins["foo"][0].table_column, TableColumn::new("foo", "col1"));
}

#[test]
fn test_cte_inside_subquery_keeps_outer_table() {
    let query = "SELECT * FROM (WITH users AS (SELECT 1 AS id) SELECT id FROM users) s JOIN users u ON s.id = u.id";
    let parser = parse(query, Dialect::Ansi);
    assert_eq!(parser.clean_table_list(), ["users".to_string()]);
    assert_eq!(parser.table_aliases()["u"], "users");
}

#[test]
fn test_comment_only_query_is_filtered() {
    for query in ["", "  \n ", "/* nothing */ -- here"] {
        let parser = parse(query, Dialect::Snowflake);
        assert!(parser.is_filtered());
        assert!(parser.clean_table_list().is_empty());
    }
}
