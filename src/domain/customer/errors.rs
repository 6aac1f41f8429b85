// ============================================================================
// Customer Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name is too long ({0} characters, at most {max})", max = super::command_handler::MAX_NAME_CHARS)]
    NameTooLong(usize),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Unknown customer status: {0:?} (expected active, churned or prospect)")]
    UnknownStatus(String),
}
