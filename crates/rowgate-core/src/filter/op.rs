use crate::filter::FilterError;
use std::{fmt, str::FromStr};

///
/// CompareOp
///
/// Closed operator set a predicate may carry. Anything outside this set is
/// rejected at construction time.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum CompareOp {
    Between,
    Eq,
    Gt,
    Gte,
    In,
    IsNotNull,
    IsNull,
    Lt,
    Lte,
    Ne,
    NotBetween,
    NotIn,
}

impl CompareOp {
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Between,
        Self::NotBetween,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// SQL keyword form of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// True for `IS NULL` / `IS NOT NULL`, which carry no operand.
    #[must_use]
    pub const fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// True for operators whose operand is a list.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(
            self,
            Self::In | Self::NotIn | Self::Between | Self::NotBetween
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for CompareOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // keywords compare case-insensitively with collapsed whitespace
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");

        Self::ALL
            .into_iter()
            .find(|op| op.as_sql().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| FilterError::InvalidOperator {
                operator: s.to_string(),
            })
    }
}
