//! Join graph construction from `JOIN … ON` equality predicates

use indexmap::IndexMap;
use log::debug;

use crate::models::{Table, TableColumn, TableColumnJoin};
use crate::runner::{ColumnReference, JoinPredicate};

/// Group join predicates by the table that anchors them.
///
/// For each `x = y` predicate the side whose table appears first in
/// `relations` (FROM/JOIN order) becomes the anchor; on a tie the left side
/// wins. The result maps the anchor table's canonical name to one record per
/// anchor column, listing every column equated with it in clause order.
/// Predicates whose qualifier does not resolve to a known table are skipped.
pub fn build_table_joins(
    aliases: &IndexMap<String, Table>,
    relations: &[Table],
    predicates: &[JoinPredicate],
) -> IndexMap<String, Vec<TableColumnJoin>> {
    let mut joins: IndexMap<String, Vec<TableColumnJoin>> = IndexMap::new();

    for predicate in predicates {
        let (Some(left), Some(right)) = (
            resolve(&predicate.left, aliases, relations),
            resolve(&predicate.right, aliases, relations),
        ) else {
            debug!("Skipping join predicate with unresolved side: {:?}", predicate);
            continue;
        };
        if left == right {
            continue;
        }

        let (anchor, other) = if right.position < left.position {
            (right, left)
        } else {
            (left, right)
        };

        let records = joins.entry(anchor.column.table.clone()).or_default();
        match records
            .iter_mut()
            .find(|record| record.table_column == anchor.column)
        {
            Some(record) => {
                if !record.joined_with.contains(&other.column) {
                    record.joined_with.push(other.column);
                }
            }
            None => records.push(TableColumnJoin {
                table_column: anchor.column,
                joined_with: vec![other.column],
            }),
        }
    }

    joins
}

#[derive(Debug, PartialEq, Eq)]
struct ResolvedColumn {
    column: TableColumn,
    position: usize,
}

fn resolve(
    reference: &ColumnReference,
    aliases: &IndexMap<String, Table>,
    relations: &[Table],
) -> Option<ResolvedColumn> {
    let qualifier = reference.qualifier.as_deref()?;

    let table = aliases.get(qualifier).cloned().or_else(|| {
        let last = qualifier.rsplit('.').next().unwrap_or(qualifier);
        relations
            .iter()
            .find(|t| t.qualified_name() == qualifier)
            .or_else(|| relations.iter().find(|t| t.raw_name == last))
            .cloned()
    })?;

    let position = relations
        .iter()
        .position(|t| *t == table)
        .unwrap_or(relations.len());

    Some(ResolvedColumn {
        column: TableColumn::new(&table.qualified_name(), &reference.column),
        position,
    })
}

#[cfg(test)]
#[path = "joins_test.rs"]
mod tests;
