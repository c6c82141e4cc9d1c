// ============================================================================
// Persistence Layer - Customer & Account Stores
// ============================================================================
//
// The service only sees these traits. A `Database` hands out transactions;
// every transaction is both a customer store and an account store, and
// nothing it wrote survives unless `commit` is called. Dropping an
// uncommitted transaction rolls it back.
//
// Adapters:
// - memory:   in-process store used by tests and the demo binary
// - postgres: sqlx-backed PostgreSQL store
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::accounts::{
    Account, AccountNumber, Customer, CustomerId, MobileNumber, NewCustomer,
};
use crate::utils::IsTransient;

pub use memory::{FailPoint, InMemoryDatabase, MemoryTransaction};
pub use postgres::{PgDatabase, PgTransaction};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("No {table} row with key {key}")]
    RowMissing { table: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if db.is_unique_violation() {
                return StoreError::UniqueViolation(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db.message().to_string());
            }
        }
        StoreError::Database(error)
    }
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(error) => matches!(
                error,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}

/// Customer records, keyed by customer id, unique by mobile number
#[async_trait]
pub trait CustomerStore: Send {
    async fn find_customer_by_mobile_number(
        &mut self,
        mobile_number: &MobileNumber,
    ) -> StoreResult<Option<Customer>>;

    async fn find_customer_by_id(&mut self, customer_id: CustomerId)
        -> StoreResult<Option<Customer>>;

    /// Persist a new customer, returning it with its assigned id
    async fn insert_customer(&mut self, customer: NewCustomer) -> StoreResult<Customer>;

    /// Overwrite an existing customer's mutable fields
    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer>;

    async fn delete_customer(&mut self, customer_id: CustomerId) -> StoreResult<()>;
}

/// Account records, keyed by account number, referencing one customer
#[async_trait]
pub trait AccountStore: Send {
    async fn find_account_by_customer_id(
        &mut self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Account>>;

    async fn find_account_by_number(
        &mut self,
        account_number: AccountNumber,
    ) -> StoreResult<Option<Account>>;

    /// Fails with `StoreError::UniqueViolation` when the number is already taken
    async fn insert_account(&mut self, account: &Account) -> StoreResult<Account>;

    /// Rewrites type, branch and update audit; owner and number stay fixed
    async fn update_account(&mut self, account: &Account) -> StoreResult<Account>;

    async fn delete_account(&mut self, account_number: AccountNumber) -> StoreResult<()>;
}

/// A unit of work spanning both stores
#[async_trait]
pub trait Transaction: CustomerStore + AccountStore + Sized {
    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}

/// Transaction boundary supplied by the persistence layer
#[async_trait]
pub trait Database: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}
