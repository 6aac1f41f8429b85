use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::errors::CustomerError;

// ============================================================================
// Customer Value Objects
// ============================================================================

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Customer email address, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, CustomerError> {
        let email = raw.trim();
        if email.is_empty() {
            return Err(CustomerError::EmptyEmail);
        }
        if !EMAIL_REGEX.is_match(email) {
            return Err(CustomerError::InvalidEmail(email.to_string()));
        }
        Ok(Self(email.to_lowercase()))
    }

    /// Wrap an address already stored by the backend.
    pub fn from_stored(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer lifecycle status, kept in the `customer_statuses` lookup table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Churned,
    #[default]
    Prospect,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 3] = [CustomerStatus::Active, CustomerStatus::Churned, CustomerStatus::Prospect];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Churned => "churned",
            CustomerStatus::Prospect => "prospect",
        }
    }

    /// Primary key of the status row in `customer_statuses`.
    pub fn lookup_id(&self) -> i16 {
        match self {
            CustomerStatus::Active => 1,
            CustomerStatus::Churned => 2,
            CustomerStatus::Prospect => 3,
        }
    }
}

impl FromStr for CustomerStatus {
    type Err = CustomerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CustomerStatus::Active),
            "churned" => Ok(CustomerStatus::Churned),
            "prospect" => Ok(CustomerStatus::Prospect),
            other => Err(CustomerError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
