use crate::filter::FilterError;
use std::fmt;

///
/// FieldRef
///
/// Logical `field` or `field.column` reference. A missing column means the
/// field's primary property.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldRef {
    field: String,
    column: Option<String>,
}

impl FieldRef {
    pub fn parse(path: &str) -> Result<Self, FilterError> {
        let (field, column) = match path.split_once('.') {
            Some((field, column)) => (field, Some(column)),
            None => (path, None),
        };

        if field.trim().is_empty() || column.is_some_and(|c| c.trim().is_empty()) {
            return Err(FilterError::InvalidFieldReference {
                field: path.to_string(),
            });
        }

        Ok(Self {
            field: field.to_string(),
            column: column.map(ToString::to_string),
        })
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{}.{column}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}
