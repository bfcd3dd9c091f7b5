use crate::{
    filter::{CompareOp, Conjunction},
    query::{ALWAYS_FALSE, ALWAYS_TRUE, Clause, ClauseOp, GroupId, Rendered},
    value::Value,
};

///
/// Condition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Condition {
    Clause(Clause),
    Expression(String),
    Group(GroupId),
}

///
/// Group
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    conjunction: Conjunction,
    items: Vec<Condition>,
}

impl Group {
    const fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub const fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    #[must_use]
    pub fn items(&self) -> &[Condition] {
        &self.items
    }
}

///
/// ConditionSet
///
/// Arena of nested condition groups. Group 0 is the root AND; handles are
/// indexes into the arena and stay valid for the life of the set.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionSet {
    groups: Vec<Group>,
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self {
            groups: vec![Group::new(Conjunction::And)],
        }
    }
}

impl ConditionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a group under `parent`.
    ///
    /// `parent` must come from this set. A foreign id is a caller bug: debug
    /// builds panic, release builds log it and attach to the root.
    pub fn add_group(&mut self, parent: GroupId, conjunction: Conjunction) -> GroupId {
        let parent = self.checked(parent);
        let id = GroupId(self.groups.len());
        self.groups.push(Group::new(conjunction));
        self.groups[parent].items.push(Condition::Group(id));

        id
    }

    pub fn add_clause(&mut self, group: GroupId, clause: Clause) {
        self.push(group, Condition::Clause(clause));
    }

    pub fn add_expression(&mut self, group: GroupId, expression: impl Into<String>) {
        self.push(group, Condition::Expression(expression.into()));
    }

    fn push(&mut self, group: GroupId, condition: Condition) {
        let index = self.checked(group);
        self.groups[index].items.push(condition);
    }

    fn checked(&self, group: GroupId) -> usize {
        let index = group.index();
        debug_assert!(
            index < self.groups.len(),
            "unknown condition group {index}"
        );
        if index < self.groups.len() {
            return index;
        }

        rowgate_log!(
            log::Level::Warn,
            "query.unknown_group",
            "group={} groups={}",
            index,
            self.groups.len()
        );

        GroupId::ROOT.index()
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index())
    }

    #[must_use]
    pub fn root(&self) -> &Group {
        &self.groups[GroupId::ROOT.index()]
    }

    /// Every clause in the set, in insertion order per group.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.groups.iter().flat_map(|group| {
            group.items.iter().filter_map(|item| match item {
                Condition::Clause(clause) => Some(clause),
                _ => None,
            })
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| {
            group
                .items
                .iter()
                .all(|item| matches!(item, Condition::Group(_)))
        })
    }

    /// Render the root group as a WHERE body. Empty groups disappear.
    #[must_use]
    pub fn render(&self) -> Option<Rendered> {
        let mut params = Vec::new();
        let parts = self.render_items(GroupId::ROOT, &mut params);
        if parts.is_empty() {
            return None;
        }

        Some(Rendered {
            sql: parts.join(" AND "),
            params,
        })
    }

    fn render_group(&self, id: GroupId, params: &mut Vec<Value>) -> Option<String> {
        let group = self.group(id)?;
        let parts = self.render_items(id, params);

        match parts.len() {
            0 => None,
            1 => parts.into_iter().next(),
            _ => Some(format!(
                "({})",
                parts.join(&format!(" {} ", group.conjunction))
            )),
        }
    }

    fn render_items(&self, id: GroupId, params: &mut Vec<Value>) -> Vec<String> {
        let Some(group) = self.group(id) else {
            return Vec::new();
        };

        group
            .items
            .iter()
            .filter_map(|item| match item {
                Condition::Clause(clause) => Some(render_clause(clause, params)),
                Condition::Expression(expression) => Some(expression.clone()),
                Condition::Group(child) => self.render_group(*child, params),
            })
            .collect()
    }
}

fn render_clause(clause: &Clause, params: &mut Vec<Value>) -> String {
    let column = &clause.column;

    match clause.op {
        ClauseOp::Like(escape) | ClauseOp::NotLike(escape) => {
            params.push(clause.value.clone());
            format!("{column} {} ? ESCAPE '{escape}'", clause.op)
        }
        ClauseOp::Compare(op) if op.is_null_check() => format!("{column} {op}"),
        ClauseOp::Compare(op @ (CompareOp::In | CompareOp::NotIn)) => {
            let items = list_items(&clause.value);
            if items.is_empty() {
                return if op == CompareOp::In {
                    ALWAYS_FALSE.to_string()
                } else {
                    ALWAYS_TRUE.to_string()
                };
            }

            let placeholders = vec!["?"; items.len()].join(", ");
            params.extend(items);
            format!("{column} {op} ({placeholders})")
        }
        ClauseOp::Compare(op @ (CompareOp::Between | CompareOp::NotBetween)) => {
            params.extend(list_items(&clause.value));
            format!("{column} {op} ? AND ?")
        }
        ClauseOp::Compare(op) => {
            params.push(clause.value.clone());
            format!("{column} {op} ?")
        }
    }
}

fn list_items(value: &Value) -> Vec<Value> {
    value
        .as_list()
        .map_or_else(|| vec![value.clone()], <[Value]>::to_vec)
}
