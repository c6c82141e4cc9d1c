use super::value_objects::{EntityKind, MobileNumber};
use crate::store::StoreError;

// ============================================================================
// Accounts Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("Customer already registered with given mobileNumber {mobile_number}")]
    DuplicateCustomer { mobile_number: MobileNumber },

    #[error("{entity} not found with the given input data {field} : '{value}'")]
    NotFound {
        entity: EntityKind,
        field: &'static str,
        value: String,
    },

    #[error("No unused account number found after {attempts} attempts")]
    AccountNumberExhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountsError {
    pub fn not_found(entity: EntityKind, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Whether the caller, rather than the service or its store, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DuplicateCustomer { .. } | Self::NotFound { .. })
    }
}

/// Field-level problems in a request, reported all at once
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid input: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AccountsError::not_found(EntityKind::Customer, "mobileNumber", "9876543210");
        assert_eq!(
            err.to_string(),
            "Customer not found with the given input data mobileNumber : '9876543210'"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_store_errors_are_server_side() {
        let err = AccountsError::from(StoreError::Unavailable("connection reset".to_string()));
        assert!(!err.is_client_error());
        assert!(!AccountsError::AccountNumberExhausted { attempts: 5 }.is_client_error());
    }

    #[test]
    fn test_validation_error_joins_violations() {
        let err = ValidationError {
            violations: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid input: a; b");
    }
}
