use crate::domain::customer::CustomerError;
use crate::domain::order::OrderError;
use crate::store::StoreError;

// ============================================================================
// Service Error Taxonomy
// ============================================================================
//
// Every failure that reaches a caller is one of four kinds:
// - InvalidArgument: malformed or out-of-range input          (400)
// - NotFound:        id does not resolve or scoping mismatch   (404)
// - Conflict:        uniqueness violation                      (409)
// - StoreFailure:    backing datastore error                   (500)
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store failure: {0}")]
    StoreFailure(#[source] StoreError),
}

impl CrmError {
    pub fn kind(&self) -> &'static str {
        match self {
            CrmError::InvalidArgument(_) => "invalid_argument",
            CrmError::NotFound(_) => "not_found",
            CrmError::Conflict(_) => "conflict",
            CrmError::StoreFailure(_) => "store_failure",
        }
    }
}

impl From<StoreError> for CrmError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => CrmError::NotFound(err.to_string()),
            StoreError::UniqueViolation(_) => CrmError::Conflict(err.to_string()),
            other => CrmError::StoreFailure(other),
        }
    }
}

impl From<OrderError> for CrmError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidCustomSize(_) => CrmError::InvalidArgument(err.to_string()),
            OrderError::ItemNotFound { .. } => CrmError::NotFound(err.to_string()),
            OrderError::MeasurementUnavailable { .. } => {
                CrmError::StoreFailure(StoreError::Backend(err.to_string()))
            }
        }
    }
}

impl From<CustomerError> for CrmError {
    fn from(err: CustomerError) -> Self {
        CrmError::InvalidArgument(err.to_string())
    }
}
