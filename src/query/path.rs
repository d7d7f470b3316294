use std::fmt;

use crate::util::Slice;

/// Address of a column family, a super column within it, or a single column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryPath {
    pub column_family: String,
    pub super_column_name: Option<Slice>,
    pub column_name: Option<Slice>,
}

impl QueryPath {
    /// The whole row of `column_family`.
    pub fn new(column_family: impl Into<String>) -> Self {
        QueryPath {
            column_family: column_family.into(),
            super_column_name: None,
            column_name: None,
        }
    }

    pub fn super_column(column_family: impl Into<String>, super_column_name: impl Into<Slice>) -> Self {
        QueryPath {
            column_family: column_family.into(),
            super_column_name: Some(super_column_name.into()),
            column_name: None,
        }
    }

    pub fn column(column_family: impl Into<String>, column_name: impl Into<Slice>) -> Self {
        QueryPath {
            column_family: column_family.into(),
            super_column_name: None,
            column_name: Some(column_name.into()),
        }
    }

    pub fn sub_column(
        column_family: impl Into<String>,
        super_column_name: impl Into<Slice>,
        column_name: impl Into<Slice>,
    ) -> Self {
        QueryPath {
            column_family: column_family.into(),
            super_column_name: Some(super_column_name.into()),
            column_name: Some(column_name.into()),
        }
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_family)?;
        if let Some(sc) = &self.super_column_name {
            write!(f, ":{sc}")?;
        }
        if let Some(c) = &self.column_name {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(QueryPath::new("Standard1").to_string(), "Standard1");
        assert_eq!(QueryPath::column("Standard1", "col1").to_string(), "Standard1:col1");
        assert_eq!(
            QueryPath::sub_column("Super1", "sc1", "col1").to_string(),
            "Super1:sc1:col1"
        );
    }
}
