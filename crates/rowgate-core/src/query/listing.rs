use crate::{
    filter::Conjunction,
    query::{
        Anchor, Clause, ConditionSet, GroupId, JoinKind, JoinSet, JoinSpec, QueryTarget, Rendered,
    },
};
use std::collections::BTreeMap;

///
/// ListingQuery
///
/// Listing query with named relationships. A relationship is a join from the
/// base table (or another relationship) that fields can be anchored to;
/// joins made on behalf of a relationship are aliased `{anchor}_{table}`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListingQuery {
    base_table: String,
    base_alias: String,
    joins: JoinSet,
    relationships: BTreeMap<String, String>,
    conditions: ConditionSet,
}

impl ListingQuery {
    #[must_use]
    pub fn new(base_table: impl Into<String>) -> Self {
        let base_table = base_table.into();

        Self {
            base_alias: base_table.clone(),
            base_table,
            joins: JoinSet::new(),
            relationships: BTreeMap::new(),
            conditions: ConditionSet::new(),
        }
    }

    /// Register a named relationship joining `table` on
    /// `{from}.{left_column} = {table}.{right_column}`, where `from` is
    /// another relationship or the base when `None`.
    pub fn add_relationship(
        &mut self,
        name: impl Into<String>,
        from: Option<&str>,
        table: impl Into<String>,
        kind: JoinKind,
        columns: (&str, &str),
    ) -> Option<String> {
        let anchor = match from {
            Some(from) => self.relationship(from)?,
            None => self.base_anchor(),
        };
        let (left_column, right_column) = columns;
        let spec = JoinSpec::new(
            table,
            kind,
            format!("{}.{left_column}", anchor.alias),
            right_column,
        );

        let alias = self.ensure_join(spec);
        self.relationships.insert(name.into(), alias.clone());

        Some(alias)
    }

    #[must_use]
    pub const fn joins(&self) -> &JoinSet {
        &self.joins
    }

    #[must_use]
    pub const fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    #[must_use]
    pub fn render(&self) -> Rendered {
        let mut sql = format!(
            "SELECT {}.* FROM {} {}",
            self.base_alias, self.base_table, self.base_alias
        );
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_string());
        }

        let mut params = Vec::new();
        if let Some(filter) = self.conditions.render() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.sql);
            params = filter.params;
        }

        Rendered { sql, params }
    }
}

impl QueryTarget for ListingQuery {
    fn base_table(&self) -> &str {
        &self.base_table
    }

    fn base_alias(&self) -> &str {
        &self.base_alias
    }

    fn add_group(&mut self, parent: GroupId, conjunction: Conjunction) -> GroupId {
        self.conditions.add_group(parent, conjunction)
    }

    fn add_clause(&mut self, group: GroupId, clause: Clause) {
        self.conditions.add_clause(group, clause);
    }

    fn add_expression(&mut self, group: GroupId, expression: &str) {
        self.conditions.add_expression(group, expression);
    }

    fn find_join(&self, table: &str, anchor: &str) -> Option<String> {
        self.joins.find(table, anchor).map(|join| join.alias.clone())
    }

    fn ensure_join(&mut self, spec: JoinSpec) -> String {
        let preferred = if spec.anchor() == self.base_alias {
            spec.table.clone()
        } else {
            format!("{}_{}", spec.anchor(), spec.table)
        };

        self.joins.ensure(spec, &preferred, &[&self.base_alias])
    }

    fn relationship(&self, name: &str) -> Option<Anchor> {
        let alias = self.relationships.get(name)?;
        let join = self.joins.by_alias(alias)?;

        Some(Anchor {
            alias: alias.clone(),
            table: join.table.clone(),
        })
    }
}
