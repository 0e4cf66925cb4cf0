//! Column type mapping.

use crate::ir::Column;

/// Every column is emitted as text of this width.
pub const COLUMN_TYPE: &str = "VARCHAR(40)";

/// Map a derived column to its SQL type.
pub fn column_type(_column: &Column) -> &'static str {
    COLUMN_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_type() {
        assert_eq!(column_type(&Column::new("id")), "VARCHAR(40)");
        let key = Column {
            key: true,
            foreign_key: Some("Other".to_string()),
            ..Column::new("other_id")
        };
        assert_eq!(column_type(&key), COLUMN_TYPE);
    }
}
