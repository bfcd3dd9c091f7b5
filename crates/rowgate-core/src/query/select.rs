use crate::{
    filter::Conjunction,
    query::{Clause, ConditionSet, GroupId, JoinSet, JoinSpec, QueryTarget, Rendered},
};

///
/// SelectQuery
///
/// Generic per-record query over one base table. Joined tables are aliased
/// by table name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectQuery {
    base_table: String,
    base_alias: String,
    joins: JoinSet,
    conditions: ConditionSet,
}

impl SelectQuery {
    #[must_use]
    pub fn new(base_table: impl Into<String>) -> Self {
        let base_table = base_table.into();

        Self {
            base_alias: base_table.clone(),
            base_table,
            joins: JoinSet::new(),
            conditions: ConditionSet::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.base_alias = alias.into();
        self
    }

    #[must_use]
    pub const fn joins(&self) -> &JoinSet {
        &self.joins
    }

    #[must_use]
    pub const fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    /// `SELECT` statement with positional parameters.
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

impl QueryTarget for SelectQuery {
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
        let preferred = spec.table.clone();
        self.joins.ensure(spec, &preferred, &[&self.base_alias])
    }
}
