// ============================================================================
// Accounts Domain - Customer + Savings Account Provisioning
// ============================================================================
//
// This module contains ALL account-provisioning code:
// - Value objects (MobileNumber, AccountNumber, CustomerId)
// - Entities (Customer, NewCustomer, Account, AuditContext)
// - Contracts (CustomerInput, AccountInput, CustomerView)
// - Errors (AccountsError, ValidationError)
// - Generator (AccountNumberGenerator)
// - Service (AccountsService)
//
// ============================================================================

pub mod value_objects;
pub mod entities;
pub mod contracts;
pub mod errors;
pub mod generator;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use entities::*;
pub use contracts::*;
pub use errors::*;
pub use generator::*;
pub use service::*;
