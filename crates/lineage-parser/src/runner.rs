//! Statement runner: raw table/column lineage on top of sqlparser
//!
//! The runner walks the sqlparser AST and records, per query, the tables it
//! reads and writes, ordered column lineage pairs, the alias map and the raw
//! equality predicates found in `JOIN … ON` clauses. Callers reach it through
//! the [`LineageEngine`] trait so the SQL engine can be swapped without
//! touching the cleaner, canonicalizer or join builder.

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments,
    JoinConstraint, JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, TableObject, TableWithJoins, Visit, Visitor,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use crate::canonical::{fold_ident, split_identifier, table_from_object_name};
use crate::dialect::{Dialect, DialectConfig};
use crate::error::LineageResult;
use crate::models::{Column, Relation, Table};
use crate::stage::{self, Endpoint, ScannedStatement};

/// A column as referenced in SQL, before table resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// Folded table qualifier or alias (`a`, `db.grault`), if any
    pub qualifier: Option<String>,
    /// Column name as written, without quotes
    pub column: String,
    /// Whether the column name was quoted
    pub quoted: bool,
}

/// An `x = y` equality found in a `JOIN … ON` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPredicate {
    pub left: ColumnReference,
    pub right: ColumnReference,
}

/// Raw lineage produced by an engine for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLineage {
    /// Tables and stages read by the query
    pub source_tables: Vec<Relation>,
    /// Tables and stages written by the query
    pub target_tables: Vec<Relation>,
    /// Ordered (source, target) column pairs
    pub column_lineage: Vec<(Column, Column)>,
    /// Alias → table, first definition wins
    pub aliases: IndexMap<String, Table>,
    /// Physical tables in FROM/JOIN order
    pub relations: Vec<Table>,
    /// Equality predicates from ON clauses, in clause order
    pub join_predicates: Vec<JoinPredicate>,
}

impl RawLineage {
    fn add_source(&mut self, relation: Relation) {
        if !self.source_tables.contains(&relation) {
            self.source_tables.push(relation);
        }
    }

    fn add_target(&mut self, relation: Relation) {
        if !self.target_tables.contains(&relation) {
            self.target_tables.push(relation);
        }
    }

    fn add_relation(&mut self, table: Table) {
        if !self.relations.contains(&table) {
            self.relations.push(table);
        }
    }

    fn add_alias(&mut self, alias: String, table: Table) {
        self.aliases.entry(alias).or_insert(table);
    }

    fn add_column_lineage(&mut self, source: Column, target: Column) {
        let pair = (source, target);
        if !self.column_lineage.contains(&pair) {
            self.column_lineage.push(pair);
        }
    }

    /// Fold everything another result reads into this one
    fn merge_reads(&mut self, other: RawLineage) {
        for relation in other.source_tables {
            self.add_source(relation);
        }
        for table in other.relations {
            self.add_relation(table);
        }
        for (alias, table) in other.aliases {
            self.add_alias(alias, table);
        }
        self.join_predicates.extend(other.join_predicates);
    }
}

/// Engine producing raw lineage from cleaned SQL
pub trait LineageEngine: Send + Sync {
    /// Analyze one cleaned statement. Parse failures are returned, never swallowed.
    fn analyze(&self, sql: &str, dialect: Dialect) -> LineageResult<RawLineage>;
}

/// Default engine backed by the sqlparser crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParserEngine;

impl LineageEngine for SqlParserEngine {
    fn analyze(&self, sql: &str, dialect: Dialect) -> LineageResult<RawLineage> {
        let config = dialect.config();
        match stage::scan(sql, config) {
            Some(scanned) => analyze_scanned(scanned, config),
            None => analyze_sql(sql, config),
        }
    }
}

fn bracket_identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(^|[\s.,(=])\[([A-Za-z_#@][^\[\]",]*)\]"#).expect("valid regex")
    })
}

/// Rewrite `[ident]` to `"ident"` for dialects without native bracket quoting
pub fn normalize_brackets(sql: &str, config: DialectConfig) -> Cow<'_, str> {
    if config.bracket_identifiers || !sql.contains('[') {
        return Cow::Borrowed(sql);
    }
    bracket_identifier_re().replace_all(sql, "${1}\"${2}\"")
}

fn analyze_sql(sql: &str, config: DialectConfig) -> LineageResult<RawLineage> {
    let sql = normalize_brackets(sql, config);
    let statements = config.parse(&sql)?;

    let mut analyzer = Analyzer::new(config);
    for statement in &statements {
        analyzer.analyze_statement(statement);
    }
    Ok(analyzer.out)
}

fn analyze_scanned(scanned: ScannedStatement, config: DialectConfig) -> LineageResult<RawLineage> {
    let (target, source) = match scanned {
        ScannedStatement::CopyInto { target, source } | ScannedStatement::Merge { target, source } => {
            (target, source)
        }
    };

    let mut out = RawLineage::default();
    for (endpoint, is_target) in [(source, false), (target, true)] {
        match endpoint {
            Endpoint::Relation(relation) if is_target => out.add_target(relation),
            Endpoint::Relation(relation) => out.add_source(relation),
            Endpoint::Subquery(sql) => out.merge_reads(analyze_sql(&sql, config)?),
            Endpoint::External(path) => debug!("No catalog relation for external path '{}'", path),
        }
    }
    Ok(out)
}

/// Extract the ON expression from a join operator, if present.
fn join_on_expr(op: &JoinOperator) -> Option<&Expr> {
    let constraint = match op {
        JoinOperator::Join(c)
        | JoinOperator::Inner(c)
        | JoinOperator::Left(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::Right(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => Some(c),
        _ => None,
    };
    match constraint {
        Some(JoinConstraint::On(expr)) => Some(expr),
        _ => None,
    }
}

/// An output column of a (sub)query with the base columns feeding it
#[derive(Debug, Clone, Default)]
struct OutputColumn {
    name: Option<String>,
    sources: Vec<Column>,
}

#[derive(Debug)]
enum ScopeSource {
    Table(Table),
    Derived(Vec<OutputColumn>),
}

#[derive(Debug)]
struct ScopeEntry {
    alias: Option<String>,
    name: Option<String>,
    source: ScopeSource,
}

impl ScopeEntry {
    fn has_column(&self, column: &str) -> bool {
        match &self.source {
            ScopeSource::Table(_) => false,
            ScopeSource::Derived(columns) => {
                columns.iter().any(|c| c.name.as_deref() == Some(column))
            }
        }
    }
}

/// Relations visible to one SELECT
#[derive(Debug, Default)]
struct Scope {
    entries: Vec<ScopeEntry>,
}

impl Scope {
    fn find(&self, qualifier: &str) -> Option<&ScopeEntry> {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.alias.as_deref() == Some(qualifier))
        {
            return Some(entry);
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.name.as_deref() == Some(qualifier))
        {
            return Some(entry);
        }
        let last = qualifier.rsplit('.').next()?;
        self.entries
            .iter()
            .find(|e| matches!(&e.source, ScopeSource::Table(t) if t.raw_name == last))
    }

    /// Resolve an unqualified column; ambiguous references resolve to nothing
    fn find_bare(&self, column: &str) -> Option<&ScopeEntry> {
        if self.entries.len() == 1 {
            return self.entries.first();
        }
        let mut candidates = self.entries.iter().filter(|e| e.has_column(column));
        match (candidates.next(), candidates.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    fn expand_wildcard(&self) -> Vec<OutputColumn> {
        self.entries
            .iter()
            .filter_map(|e| match &e.source {
                ScopeSource::Derived(columns) => Some(columns.iter().cloned()),
                ScopeSource::Table(_) => None,
            })
            .flatten()
            .collect()
    }
}

/// CTEs visible to the query being analyzed, innermost `WITH` last
type CteScopes = Vec<HashMap<String, Vec<OutputColumn>>>;

struct Analyzer {
    config: DialectConfig,
    ctes: CteScopes,
    out: RawLineage,
}

impl Analyzer {
    fn new(config: DialectConfig) -> Self {
        Self {
            config,
            ctes: Vec::new(),
            out: RawLineage::default(),
        }
    }

    fn analyze_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query) => {
                self.analyze_query(query);
            }
            Statement::Insert(insert) => {
                let TableObject::TableName(name) = &insert.table else {
                    debug!("Skipping INSERT into a table function");
                    return;
                };
                let target = table_from_object_name(name, self.config);
                self.out.add_target(target.clone().into());
                if let Some(source) = &insert.source {
                    let outputs = self.analyze_query(source);
                    let names: Vec<String> = insert
                        .columns
                        .iter()
                        .map(|c| self.column_name(&c.to_string()))
                        .collect();
                    self.emit_column_lineage(&target, &names, &outputs);
                }
            }
            Statement::CreateTable(create) => {
                let target = table_from_object_name(&create.name, self.config);
                self.out.add_target(target.clone().into());
                if let Some(query) = &create.query {
                    let outputs = self.analyze_query(query);
                    let names: Vec<String> = create
                        .columns
                        .iter()
                        .map(|c| fold_ident(&c.name, self.config))
                        .collect();
                    self.emit_column_lineage(&target, &names, &outputs);
                }
            }
            Statement::CreateView(view) => {
                let target = table_from_object_name(&view.name, self.config);
                self.out.add_target(target.clone().into());
                let outputs = self.analyze_query(&view.query);
                let names: Vec<String> = view
                    .columns
                    .iter()
                    .map(|c| fold_ident(&c.name, self.config))
                    .collect();
                self.emit_column_lineage(&target, &names, &outputs);
            }
            other => {
                let text = other.to_string();
                let preview: String = text.chars().take(40).collect();
                debug!("No table lineage extracted from statement: {}", preview);
            }
        }
    }

    /// Normalized last segment of a possibly qualified column name
    fn column_name(&self, raw: &str) -> String {
        split_identifier(raw)
            .last()
            .map(|s| self.config.fold(&s.value, s.quoted))
            .unwrap_or_default()
    }

    fn emit_column_lineage(&mut self, target: &Table, names: &[String], outputs: &[OutputColumn]) {
        for (idx, output) in outputs.iter().enumerate() {
            let Some(name) = names.get(idx).or(output.name.as_ref()) else {
                continue;
            };
            let target_column = Column::new(target.clone(), name);
            for source in &output.sources {
                self.out
                    .add_column_lineage(source.clone(), target_column.clone());
            }
        }
    }

    fn analyze_query(&mut self, query: &Query) -> Vec<OutputColumn> {
        let Some(with) = &query.with else {
            return self.analyze_set_expr(&query.body);
        };

        self.ctes.push(HashMap::new());
        for cte in &with.cte_tables {
            let name = fold_ident(&cte.alias.name, self.config);
            // Registered up front so recursive references are not read as tables
            self.define_cte(name.clone(), Vec::new());
            let columns = self.analyze_query(&cte.query);
            self.define_cte(name, columns);
        }
        let outputs = self.analyze_set_expr(&query.body);
        self.ctes.pop();
        outputs
    }

    fn define_cte(&mut self, name: String, columns: Vec<OutputColumn>) {
        if let Some(scope) = self.ctes.last_mut() {
            scope.insert(name, columns);
        }
    }

    fn analyze_set_expr(&mut self, body: &SetExpr) -> Vec<OutputColumn> {
        match body {
            SetExpr::Select(select) => self.analyze_select(select),
            SetExpr::Query(query) => self.analyze_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                // Output names come from the leftmost branch
                let mut columns = self.analyze_set_expr(left);
                let right = self.analyze_set_expr(right);
                for (column, other) in columns.iter_mut().zip(right) {
                    for source in other.sources {
                        if !column.sources.contains(&source) {
                            column.sources.push(source);
                        }
                    }
                }
                columns
            }
            _ => Vec::new(),
        }
    }

    fn analyze_select(&mut self, select: &Select) -> Vec<OutputColumn> {
        let mut scope = Scope::default();
        for table in &select.from {
            self.register_table_with_joins(table, &mut scope);
        }

        if let Some(selection) = &select.selection {
            self.register_nested_relations(selection);
        }
        self.register_nested_relations(&select.group_by);
        if let Some(having) = &select.having {
            self.register_nested_relations(having);
        }

        let mut outputs = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    self.register_nested_relations(expr);
                    outputs.push(OutputColumn {
                        name: self.output_name(expr),
                        sources: self.resolve_expr(expr, &scope),
                    });
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    self.register_nested_relations(expr);
                    outputs.push(OutputColumn {
                        name: Some(fold_ident(alias, self.config)),
                        sources: self.resolve_expr(expr, &scope),
                    });
                }
                SelectItem::Wildcard(_) => outputs.extend(scope.expand_wildcard()),
                _ => {}
            }
        }
        outputs
    }

    fn register_table_with_joins(&mut self, table: &TableWithJoins, scope: &mut Scope) {
        self.register_factor(&table.relation, scope);
        for join in &table.joins {
            self.register_factor(&join.relation, scope);
            if let Some(on) = join_on_expr(&join.join_operator) {
                self.collect_join_predicates(on);
                self.register_nested_relations(on);
            }
        }
    }

    fn register_factor(&mut self, factor: &TableFactor, scope: &mut Scope) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let table = table_from_object_name(name, self.config);
                let alias = alias.as_ref().map(|a| fold_ident(&a.name, self.config));

                if let Some(columns) = self.cte_columns(&table) {
                    scope.entries.push(ScopeEntry {
                        alias,
                        name: Some(table.raw_name.clone()),
                        source: ScopeSource::Derived(columns),
                    });
                    return;
                }

                self.out.add_source(table.clone().into());
                self.out.add_relation(table.clone());
                if let Some(alias) = &alias {
                    self.out.add_alias(alias.clone(), table.clone());
                }
                scope.entries.push(ScopeEntry {
                    alias,
                    name: Some(table.qualified_name()),
                    source: ScopeSource::Table(table),
                });
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let columns = self.analyze_query(subquery);
                scope.entries.push(ScopeEntry {
                    alias: alias.as_ref().map(|a| fold_ident(&a.name, self.config)),
                    name: None,
                    source: ScopeSource::Derived(columns),
                });
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.register_table_with_joins(table_with_joins, scope),
            _ => {}
        }
    }

    fn cte_columns(&self, table: &Table) -> Option<Vec<OutputColumn>> {
        if !table.schema.is_default() {
            return None;
        }
        self.ctes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&table.raw_name))
            .cloned()
    }

    /// Record tables read only from subqueries inside an expression
    fn register_nested_relations<V: Visit>(&mut self, node: &V) {
        let mut visitor = NestedRelations {
            config: self.config,
            local_ctes: Vec::new(),
            found: Vec::new(),
        };
        let _ = node.visit(&mut visitor);
        for table in visitor.found {
            if self.cte_columns(&table).is_none() {
                self.out.add_source(table.into());
            }
        }
    }

    fn collect_join_predicates(&mut self, expr: &Expr) {
        match expr {
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.collect_join_predicates(left);
                self.collect_join_predicates(right);
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                if let (Some(left), Some(right)) =
                    (self.column_reference(left), self.column_reference(right))
                {
                    self.out
                        .join_predicates
                        .push(JoinPredicate { left, right });
                }
            }
            Expr::Nested(inner) => self.collect_join_predicates(inner),
            _ => {}
        }
    }

    fn column_reference(&self, expr: &Expr) -> Option<ColumnReference> {
        match expr {
            Expr::Identifier(ident) => Some(ColumnReference {
                qualifier: None,
                column: ident.value.clone(),
                quoted: ident.quote_style.is_some(),
            }),
            Expr::CompoundIdentifier(idents) if idents.len() >= 2 => {
                let (column, qualifier) = idents.split_last()?;
                Some(ColumnReference {
                    qualifier: Some(
                        qualifier
                            .iter()
                            .map(|i| fold_ident(i, self.config))
                            .collect::<Vec<_>>()
                            .join("."),
                    ),
                    column: column.value.clone(),
                    quoted: column.quote_style.is_some(),
                })
            }
            Expr::Nested(inner) => self.column_reference(inner),
            _ => None,
        }
    }

    fn output_name(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Identifier(ident) => Some(fold_ident(ident, self.config)),
            Expr::CompoundIdentifier(idents) => {
                idents.last().map(|i| fold_ident(i, self.config))
            }
            _ => None,
        }
    }

    fn resolve_expr(&self, expr: &Expr, scope: &Scope) -> Vec<Column> {
        let mut references = Vec::new();
        self.collect_column_refs(expr, &mut references);

        let mut columns: Vec<Column> = Vec::new();
        for reference in references {
            for column in self.resolve_reference(&reference, scope) {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        columns
    }

    fn resolve_reference(&self, reference: &ColumnReference, scope: &Scope) -> Vec<Column> {
        let column = self.config.fold(&reference.column, reference.quoted);
        let entry = match &reference.qualifier {
            Some(qualifier) => scope.find(qualifier),
            None => scope.find_bare(&column),
        };
        let Some(entry) = entry else {
            debug!("Unresolved column reference '{}'", column);
            return Vec::new();
        };
        match &entry.source {
            ScopeSource::Table(table) => vec![Column::new(table.clone(), &column)],
            ScopeSource::Derived(columns) => columns
                .iter()
                .find(|c| c.name.as_deref() == Some(column.as_str()))
                .map(|c| c.sources.clone())
                .unwrap_or_default(),
        }
    }

    /// Collect column references from an expression, not descending into subqueries
    fn collect_column_refs(&self, expr: &Expr, refs: &mut Vec<ColumnReference>) {
        match expr {
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
                if let Some(reference) = self.column_reference(expr) {
                    refs.push(reference);
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                self.collect_column_refs(left, refs);
                self.collect_column_refs(right, refs);
            }
            Expr::UnaryOp { expr, .. }
            | Expr::Cast { expr, .. }
            | Expr::Nested(expr)
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr) => self.collect_column_refs(expr, refs),
            Expr::Function(func) => {
                if let FunctionArguments::List(arg_list) = &func.args {
                    for arg in &arg_list.args {
                        let arg_expr = match arg {
                            FunctionArg::Unnamed(e)
                            | FunctionArg::Named { arg: e, .. }
                            | FunctionArg::ExprNamed { arg: e, .. } => e,
                        };
                        if let FunctionArgExpr::Expr(inner) = arg_expr {
                            self.collect_column_refs(inner, refs);
                        }
                    }
                }
            }
            Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } => {
                if let Some(op) = operand {
                    self.collect_column_refs(op, refs);
                }
                for case_when in conditions {
                    self.collect_column_refs(&case_when.condition, refs);
                    self.collect_column_refs(&case_when.result, refs);
                }
                if let Some(else_expr) = else_result {
                    self.collect_column_refs(else_expr, refs);
                }
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.collect_column_refs(expr, refs);
                self.collect_column_refs(low, refs);
                self.collect_column_refs(high, refs);
            }
            Expr::InList { expr, list, .. } => {
                self.collect_column_refs(expr, refs);
                for item in list {
                    self.collect_column_refs(item, refs);
                }
            }
            _ => {}
        }
    }
}

/// Collects tables referenced by subqueries, skipping CTEs those subqueries define
struct NestedRelations {
    config: DialectConfig,
    local_ctes: Vec<Vec<String>>,
    found: Vec<Table>,
}

impl Visitor for NestedRelations {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        let names = query
            .with
            .iter()
            .flat_map(|with| &with.cte_tables)
            .map(|cte| fold_ident(&cte.alias.name, self.config))
            .collect();
        self.local_ctes.push(names);
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.local_ctes.pop();
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        let table = table_from_object_name(relation, self.config);
        let is_local_cte = table.schema.is_default()
            && self
                .local_ctes
                .iter()
                .any(|names| names.contains(&table.raw_name));
        if !is_local_cte {
            self.found.push(table);
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
