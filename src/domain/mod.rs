// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The accounts domain owns the customer ↔ account pairing:
// - Value objects (MobileNumber, AccountNumber, CustomerId)
// - Entities (Customer, Account) and their audit metadata
// - Input/view contracts used by the request layer
// - Errors (AccountsError)
// - Account number generation policy
// - The provisioning service orchestrating both stores
//
// Persistence lives in src/store/ behind the traits this layer depends on.
//
// ============================================================================

pub mod accounts;
