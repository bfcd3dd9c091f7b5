//! Tree walk shared by both compilers.
//!
//! The walk owns the rules; a [`FieldLocator`] owns physical placement.
//! The "inside an OR" flag only ever turns on while descending.

use crate::{
    compile::{
        CompileError, CompileReport, escape_like,
        storage::{
            DEDICATED_ENTITY_COLUMN, DEDICATED_REVISION_COLUMN, EntityTables, FieldStorage,
        },
    },
    config::CompileOptions,
    filter::{CompareOp, Conjunction, FieldRef, FilterNode, FilterTree, Predicate},
    query::{ALWAYS_FALSE, Anchor, Clause, ClauseOp, GroupId, JoinKind, JoinSpec, QueryTarget},
    value::Value,
};

///
/// Location
///
/// Where a predicate's column ended up, and which joins it needed.
///

#[derive(Debug)]
pub(crate) struct Location {
    pub(crate) column: String,
    pub(crate) case_sensitive: bool,
    pub(crate) joins: Vec<String>,
}

///
/// FieldLocator
///

pub(crate) trait FieldLocator {
    /// `Ok(None)` skips the predicate.
    fn locate(
        &self,
        query: &mut dyn QueryTarget,
        field: &FieldRef,
        join: JoinKind,
    ) -> Result<Option<Location>, CompileError>;
}

/// Compile `tree` into `query`'s root group.
pub(crate) fn compile_tree(
    locator: &dyn FieldLocator,
    options: &CompileOptions,
    query: &mut dyn QueryTarget,
    tree: &FilterTree,
) -> Result<CompileReport, CompileError> {
    let mut walk = Walk {
        locator,
        options,
        report: CompileReport::default(),
    };

    if tree.is_always_false() {
        rowgate_log!(
            log::Level::Debug,
            "compile.always_false",
            "table={}",
            query.base_table()
        );
        query.add_expression(GroupId::ROOT, ALWAYS_FALSE);
        walk.report.clauses = 1;
        walk.report.always_false = true;

        return Ok(walk.report);
    }

    if tree.is_empty() {
        rowgate_log!(
            log::Level::Debug,
            "compile.unrestricted",
            "table={}",
            query.base_table()
        );

        return Ok(walk.report);
    }

    let group = query.add_group(GroupId::ROOT, tree.conjunction());
    walk.tree(query, tree, group, false)?;

    Ok(walk.report)
}

///
/// Walk
///

struct Walk<'a> {
    locator: &'a dyn FieldLocator,
    options: &'a CompileOptions,
    report: CompileReport,
}

impl Walk<'_> {
    fn tree(
        &mut self,
        query: &mut dyn QueryTarget,
        tree: &FilterTree,
        group: GroupId,
        in_or: bool,
    ) -> Result<(), CompileError> {
        let in_or = in_or || tree.conjunction() == Conjunction::Or;

        for child in tree.children() {
            match child {
                FilterNode::Tree(subtree) if subtree.is_always_false() => {
                    query.add_expression(group, ALWAYS_FALSE);
                    self.report.clauses += 1;
                }
                FilterNode::Tree(subtree) if subtree.is_empty() => {}
                FilterNode::Tree(subtree) => {
                    let nested = query.add_group(group, subtree.conjunction());
                    self.tree(query, subtree, nested, in_or)?;
                }
                FilterNode::Predicate(predicate) => {
                    self.predicate(query, predicate, group, in_or)?;
                }
            }
        }

        Ok(())
    }

    fn predicate(
        &mut self,
        query: &mut dyn QueryTarget,
        predicate: &Predicate,
        group: GroupId,
        in_or: bool,
    ) -> Result<(), CompileError> {
        let field = predicate.field_ref()?;
        let join = if in_or || predicate.op().is_null_check() {
            JoinKind::Left
        } else {
            JoinKind::Inner
        };

        let Some(location) = self.locator.locate(query, &field, join)? else {
            rowgate_log!(
                log::Level::Debug,
                "compile.skip_field",
                "field={} table={}",
                field,
                query.base_table()
            );
            self.report.skipped_fields.push(field.to_string());

            return Ok(());
        };

        let clause = lower(predicate, location.column, location.case_sensitive, self.options)?;
        query.add_clause(group, clause);
        self.report.clauses += 1;

        for alias in location.joins {
            if !self.report.joins.contains(&alias) {
                self.report.joins.push(alias);
            }
        }

        Ok(())
    }
}

// Predicate → backend clause, including operand shape checks and the
// case-insensitive LIKE rewrite.
fn lower(
    predicate: &Predicate,
    column: String,
    case_sensitive: bool,
    options: &CompileOptions,
) -> Result<Clause, CompileError> {
    let op = predicate.op();
    let value = predicate.value();

    let value = match op {
        CompareOp::In | CompareOp::NotIn if !value.is_list() => Value::List(vec![value.clone()]),
        CompareOp::Between | CompareOp::NotBetween
            if value.as_list().is_none_or(|items| items.len() != 2) =>
        {
            return Err(CompileError::InvalidOperand {
                field: predicate.field().to_string(),
                op,
            });
        }
        _ => value.clone(),
    };

    let escape = options.like_escape;
    let pattern = value
        .as_text()
        .filter(|_| !case_sensitive && options.case_insensitive_like)
        .map(|text| Value::Text(escape_like(text, escape)));

    let clause = match (op, pattern) {
        (CompareOp::Eq, Some(pattern)) => Clause::new(column, ClauseOp::Like(escape), pattern),
        (CompareOp::Ne, Some(pattern)) => Clause::new(column, ClauseOp::NotLike(escape), pattern),
        _ => Clause::new(column, op, value),
    };

    Ok(clause)
}

/// Place `storage` relative to `anchor`, registering whatever join it needs,
/// and return the qualified column.
pub(crate) fn place_field(
    query: &mut dyn QueryTarget,
    tables: &EntityTables,
    storage: &FieldStorage,
    anchor: &Anchor,
    revision_scoped: bool,
    join: JoinKind,
) -> Location {
    let mut joins = Vec::new();

    let alias = if storage.dedicated {
        let revisions = revision_scoped
            && storage.revision_table.is_some()
            && tables.revision_key.is_some();
        let right = if revisions {
            DEDICATED_REVISION_COLUMN
        } else {
            DEDICATED_ENTITY_COLUMN
        };
        let spec = JoinSpec::new(
            storage.table_for(revisions),
            join,
            format!("{}.{}", anchor.alias, tables.join_key(revisions)),
            right,
        );

        let alias = query.ensure_join(spec);
        joins.push(alias.clone());
        alias
    } else {
        let table = storage.table_for(revision_scoped);

        if table == anchor.table {
            anchor.alias.clone()
        } else if let Some(alias) = query.find_join(table, &anchor.alias) {
            alias
        } else {
            // shared table not reachable from the anchor yet: join it on the
            // entity key by hand
            let key = tables.join_key(revision_scoped);
            let spec = JoinSpec::new(
                table,
                JoinKind::Inner,
                format!("{}.{key}", anchor.alias),
                key,
            );

            let alias = query.ensure_join(spec);
            joins.push(alias.clone());
            alias
        }
    };

    Location {
        column: format!("{alias}.{}", storage.column),
        case_sensitive: storage.case_sensitive,
        joins,
    }
}
