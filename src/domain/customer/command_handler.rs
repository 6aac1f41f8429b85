use chrono::Utc;
use std::sync::Arc;

use super::commands::{ChangeCustomerStatus, RegisterCustomer};
use super::errors::CustomerError;
use super::value_objects::{CustomerStatus, Email};
use crate::error::CrmError;
use crate::models::{Customer, NewCustomer};
use crate::store::{CrmStore, CustomerStore, StoreError};

// ============================================================================
// Customer Command Handler
// ============================================================================
//
// Orchestrates: Command → validation → Store
//
// ============================================================================

pub const MAX_NAME_CHARS: usize = 200;

/// Result of a status change request.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub customer: Customer,
    /// False when the customer already had the requested status.
    pub changed: bool,
}

pub struct CustomerCommandHandler {
    store: Arc<dyn CrmStore>,
}

impl CustomerCommandHandler {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, command: RegisterCustomer) -> Result<Customer, CrmError> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(CustomerError::EmptyName.into());
        }
        let length = name.chars().count();
        if length > MAX_NAME_CHARS {
            return Err(CustomerError::NameTooLong(length).into());
        }

        let email = Email::parse(&command.email)?;
        let status = match command.status.as_deref() {
            Some(raw) => raw.parse::<CustomerStatus>()?,
            None => CustomerStatus::default(),
        };

        let customer = self
            .store
            .create_customer(
                NewCustomer {
                    name: name.to_string(),
                    email,
                    status,
                },
                Utc::now(),
            )
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => {
                    CrmError::Conflict("A customer with this email already exists".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(
            customer_id = %customer.id,
            status = %customer.status,
            "✅ Customer registered"
        );
        Ok(customer)
    }

    pub async fn change_status(&self, command: ChangeCustomerStatus) -> Result<StatusChange, CrmError> {
        let status = command.status.parse::<CustomerStatus>()?;

        let current = self
            .store
            .get_customer(command.customer_id)
            .await?
            .ok_or_else(|| CrmError::NotFound(format!("Customer not found: {}", command.customer_id)))?;

        if current.status == status {
            tracing::debug!(customer_id = %current.id, status = %status, "Status unchanged, skipping write");
            return Ok(StatusChange {
                customer: current,
                changed: false,
            });
        }

        let customer = self
            .store
            .update_customer_status(command.customer_id, status, command.requested_at)
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            from = %current.status,
            to = %customer.status,
            "✅ Customer status changed"
        );
        Ok(StatusChange {
            customer,
            changed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use uuid::Uuid;

    fn handler() -> (Arc<InMemoryStore>, CustomerCommandHandler) {
        let store = Arc::new(InMemoryStore::new());
        let handler = CustomerCommandHandler::new(store.clone());
        (store, handler)
    }

    fn register(name: &str, email: &str, status: Option<&str>) -> RegisterCustomer {
        RegisterCustomer {
            name: name.to_string(),
            email: email.to_string(),
            status: status.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_input() {
        let (store, handler) = handler();

        let customer = handler
            .register(register("  Ada Lovelace ", " Ada@Example.COM", None))
            .await
            .unwrap();

        assert_eq!(customer.name, "Ada Lovelace");
        assert_eq!(customer.email.as_str(), "ada@example.com");
        assert_eq!(customer.status, CustomerStatus::Prospect);
        assert!(store.get_customer(customer.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let (_store, handler) = handler();

        let cases = [
            register("   ", "a@b.co", None),
            register(&"x".repeat(MAX_NAME_CHARS + 1), "a@b.co", None),
            register("Ada", "not-an-email", None),
            register("Ada", "a@b.co", Some("vip")),
        ];
        for case in cases {
            let err = handler.register(case).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "{err}");
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (_store, handler) = handler();
        handler.register(register("Ada", "ada@example.com", Some("active"))).await.unwrap();

        let err = handler
            .register(register("Other Ada", "ADA@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_change_status() {
        let (_store, handler) = handler();
        let customer = handler.register(register("Ada", "ada@example.com", None)).await.unwrap();

        let change = handler
            .change_status(ChangeCustomerStatus {
                customer_id: customer.id,
                status: "Active".to_string(),
                requested_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(change.changed);
        assert_eq!(change.customer.status, CustomerStatus::Active);

        let again = handler
            .change_status(ChangeCustomerStatus {
                customer_id: customer.id,
                status: "active".to_string(),
                requested_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(!again.changed);
        assert_eq!(again.customer.modified_at, change.customer.modified_at);
    }

    #[tokio::test]
    async fn test_change_status_unknown_customer() {
        let (_store, handler) = handler();
        let err = handler
            .change_status(ChangeCustomerStatus {
                customer_id: Uuid::new_v4(),
                status: "churned".to_string(),
                requested_at: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::NotFound(_)));
    }
}
