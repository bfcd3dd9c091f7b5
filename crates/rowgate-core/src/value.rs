use std::fmt;

///
/// Value
///
/// Literal operand carried by predicates and query clauses.
/// Lists only appear as the operand of `IN`, `NOT IN`, and the
/// `BETWEEN` family; `Null` is the operand of the null checks.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Collect a list of text literals into a `Value::List`.
    #[must_use]
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", u8::from(*b)),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }

                Ok(())
            }
        }
    }
}

macro_rules! impl_from_value {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    String => Text,
    &str => Text,
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_bools_as_integers() {
        assert_eq!(Value::from(true).to_string(), "1");
        assert_eq!(Value::from(false).to_string(), "0");
    }

    #[test]
    fn vec_conversion_builds_list() {
        let value = Value::from(vec!["page", "article"]);

        assert_eq!(
            value,
            Value::List(vec![Value::Text("page".into()), Value::Text("article".into())])
        );
        assert_eq!(value.to_string(), "page, article");
    }

    #[test]
    fn none_converts_to_null() {
        assert!(Value::from(None::<u64>).is_null());
        assert_eq!(Value::from(Some(7u64)), Value::Uint(7));
    }
}
