use std::fmt;
use uuid::Uuid;

use super::value_objects::MeasureField;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Missing,
    NotNumeric,
    NotPositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: MeasureField,
    pub problem: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            Violation::Missing => write!(f, "{} is required", self.field),
            Violation::NotNumeric => write!(f, "{} must be a number", self.field),
            Violation::NotPositive => write!(f, "{} must be greater than zero", self.field),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid custom size: {}", join_violations(.0))]
    InvalidCustomSize(Vec<FieldViolation>),

    #[error("Order item {item_id} not found in order {order_id}")]
    ItemNotFound { order_id: Uuid, item_id: Uuid },

    #[error("Could not bind a measurement record after {attempts} attempts")]
    MeasurementUnavailable { attempts: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_custom_size_message_lists_fields() {
        let err = OrderError::InvalidCustomSize(vec![
            FieldViolation { field: MeasureField::Chest, problem: Violation::NotPositive },
            FieldViolation { field: MeasureField::Hips, problem: Violation::Missing },
        ]);

        assert_eq!(
            err.to_string(),
            "Invalid custom size: chest must be greater than zero, hips is required"
        );
    }

    #[test]
    fn test_item_not_found_message() {
        let order_id = Uuid::nil();
        let item_id = Uuid::nil();
        let err = OrderError::ItemNotFound { order_id, item_id };
        assert!(err.to_string().contains("not found in order"));
    }
}
