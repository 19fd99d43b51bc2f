//! Validation of caller-supplied quantities

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::RequiredLine;
use crate::types::{Quantity, StockItemId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be negative")]
    NegativeQuantity { field: &'static str },

    #[error("stock item {0} appears more than once")]
    DuplicateItem(StockItemId),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NegativeQuantity { field } => field,
            ValidationError::DuplicateItem(_) => "lines",
        }
    }
}

/// A required quantity may be zero but never negative
pub fn validate_required_quantity(required: Quantity) -> Result<(), ValidationError> {
    if required < Decimal::ZERO {
        return Err(ValidationError::NegativeQuantity { field: "required" });
    }
    Ok(())
}

/// Validate the lines of a planned dispatch: non-negative, one line per item
pub fn validate_required_lines(lines: &[RequiredLine]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for line in lines {
        if line.quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity { field: "quantity" });
        }
        if !seen.insert(line.stock_item_id) {
            return Err(ValidationError::DuplicateItem(line.stock_item_id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(item: u128, qty: i64) -> RequiredLine {
        RequiredLine {
            stock_item_id: StockItemId(Uuid::from_u128(item)),
            quantity: Decimal::from(qty),
        }
    }

    #[test]
    fn test_required_quantity() {
        assert!(validate_required_quantity(Decimal::ZERO).is_ok());
        assert!(validate_required_quantity(Decimal::new(5, 1)).is_ok());
        assert_eq!(
            validate_required_quantity(Decimal::from(-1)),
            Err(ValidationError::NegativeQuantity { field: "required" })
        );
    }

    #[test]
    fn test_required_lines_valid() {
        assert!(validate_required_lines(&[]).is_ok());
        assert!(validate_required_lines(&[line(1, 3), line(2, 0)]).is_ok());
    }

    #[test]
    fn test_required_lines_invalid() {
        assert!(validate_required_lines(&[line(1, -3)]).is_err());

        let err = validate_required_lines(&[line(1, 3), line(1, 2)]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateItem(StockItemId(Uuid::from_u128(1))));
        assert_eq!(err.field(), "lines");
    }
}
