use crate::{
    filter::{CompareOp, FieldRef, FilterError},
    value::Value,
};
use std::fmt;

///
/// Predicate
///
/// Immutable leaf comparison: a field reference, an operator from the closed
/// [`CompareOp`] set, and its operand. Cloning copies by value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Predicate {
    field: String,
    op: CompareOp,
    value: Value,
}

impl Predicate {
    /// Construct from a textual operator.
    ///
    /// When `operator` is omitted the default is `IN` for list operands and
    /// `=` otherwise.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<Value>,
        operator: Option<&str>,
    ) -> Result<Self, FilterError> {
        let value = value.into();
        let op = match operator {
            Some(operator) => operator.parse()?,
            None => Self::default_op(&value),
        };

        Ok(Self::with_op(field, value, op))
    }

    #[must_use]
    pub fn with_op(field: impl Into<String>, value: impl Into<Value>, op: CompareOp) -> Self {
        let value = if op.is_null_check() {
            Value::Null
        } else {
            value.into()
        };

        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Construct with the default operator for the operand.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let op = Self::default_op(&value);

        Self::with_op(field, value, op)
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::with_op(field, Value::Null, CompareOp::IsNull)
    }

    #[must_use]
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::with_op(field, Value::Null, CompareOp::IsNotNull)
    }

    const fn default_op(value: &Value) -> CompareOp {
        if value.is_list() {
            CompareOp::In
        } else {
            CompareOp::Eq
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn op(&self) -> CompareOp {
        self.op
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Parse the dotted field path into its field and column parts.
    pub fn field_ref(&self) -> Result<FieldRef, FilterError> {
        FieldRef::parse(&self.field)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op.is_null_check() {
            return write!(f, "{} {}", self.field, self.op);
        }

        match &self.value {
            Value::List(values) => {
                write!(f, "{} {} [", self.field, self.op)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "'{value}'")?;
                }
                f.write_str("]")
            }
            value => write!(f, "{} {} '{value}'", self.field, self.op),
        }
    }
}
