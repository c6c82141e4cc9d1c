use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::accounts::{
    Account, AccountNumber, Customer, CustomerId, MobileNumber, NewCustomer,
};

use super::{AccountStore, CustomerStore, Database, StoreError, StoreResult, Transaction};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// A transaction holds the store lock for its whole lifetime, so transactions
// are fully serialized. Writes go straight into the shared state; a snapshot
// taken at `begin` is restored on rollback or drop.
//
// The same constraints a relational schema would enforce are checked here:
// unique mobile number, account primary key, one account per customer and the
// account → customer foreign key.
//
// ============================================================================

/// Store operation that can be made to fail once, for tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    FindCustomer,
    InsertCustomer,
    UpdateCustomer,
    DeleteCustomer,
    FindAccount,
    InsertAccount,
    UpdateAccount,
    DeleteAccount,
    Commit,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryState {
    customers: BTreeMap<CustomerId, Customer>,
    accounts: BTreeMap<AccountNumber, Account>,
    next_customer_id: i64,
}

#[derive(Debug, Default)]
struct Shared {
    state: MemoryState,
    fail_point: Option<FailPoint>,
}

impl Shared {
    fn trip(&mut self, point: FailPoint) -> StoreResult<()> {
        if self.fail_point == Some(point) {
            self.fail_point = None;
            return Err(StoreError::Unavailable(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<Mutex<Shared>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `point` fail with `StoreError::Unavailable`
    pub async fn fail_next(&self, point: FailPoint) {
        self.inner.lock().await.fail_point = Some(point);
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.inner.lock().await.state.customers.values().cloned().collect()
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.inner.lock().await.state.accounts.values().cloned().collect()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        let mut guard = self.inner.clone().lock_owned().await;
        guard.trip(FailPoint::Begin)?;
        let snapshot = guard.state.clone();

        Ok(MemoryTransaction {
            guard,
            snapshot: Some(snapshot),
        })
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Shared>,
    snapshot: Option<MemoryState>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            tracing::debug!("Rolling back uncommitted in-memory transaction");
            self.guard.state = snapshot;
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self) -> StoreResult<()> {
        // A failed commit leaves the snapshot in place, so drop rolls back
        self.guard.trip(FailPoint::Commit)?;
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryTransaction {
    async fn find_customer_by_mobile_number(
        &mut self,
        mobile_number: &MobileNumber,
    ) -> StoreResult<Option<Customer>> {
        self.guard.trip(FailPoint::FindCustomer)?;
        Ok(self
            .guard
            .state
            .customers
            .values()
            .find(|c| &c.mobile_number == mobile_number)
            .cloned())
    }

    async fn find_customer_by_id(
        &mut self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        self.guard.trip(FailPoint::FindCustomer)?;
        Ok(self.guard.state.customers.get(&customer_id).cloned())
    }

    async fn insert_customer(&mut self, customer: NewCustomer) -> StoreResult<Customer> {
        self.guard.trip(FailPoint::InsertCustomer)?;
        let state = &mut self.guard.state;

        if state
            .customers
            .values()
            .any(|c| c.mobile_number == customer.mobile_number)
        {
            return Err(StoreError::UniqueViolation("customer.mobile_number".to_string()));
        }

        state.next_customer_id += 1;
        let saved = customer.into_customer(CustomerId::new(state.next_customer_id));
        state.customers.insert(saved.customer_id, saved.clone());
        Ok(saved)
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        self.guard.trip(FailPoint::UpdateCustomer)?;
        let state = &mut self.guard.state;

        let Some(stored) = state.customers.get_mut(&customer.customer_id) else {
            return Err(StoreError::RowMissing {
                table: "customer",
                key: customer.customer_id.to_string(),
            });
        };

        // Mobile number is the lookup key and never rewritten
        stored.name = customer.name.clone();
        stored.email = customer.email.clone();
        stored.audit.updated_at = customer.audit.updated_at;
        stored.audit.updated_by = customer.audit.updated_by.clone();
        Ok(stored.clone())
    }

    async fn delete_customer(&mut self, customer_id: CustomerId) -> StoreResult<()> {
        self.guard.trip(FailPoint::DeleteCustomer)?;
        let state = &mut self.guard.state;

        if state.accounts.values().any(|a| a.customer_id == customer_id) {
            return Err(StoreError::ForeignKeyViolation("accounts.customer_id".to_string()));
        }
        match state.customers.remove(&customer_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::RowMissing {
                table: "customer",
                key: customer_id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl AccountStore for MemoryTransaction {
    async fn find_account_by_customer_id(
        &mut self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Account>> {
        self.guard.trip(FailPoint::FindAccount)?;
        Ok(self
            .guard
            .state
            .accounts
            .values()
            .find(|a| a.customer_id == customer_id)
            .cloned())
    }

    async fn find_account_by_number(
        &mut self,
        account_number: AccountNumber,
    ) -> StoreResult<Option<Account>> {
        self.guard.trip(FailPoint::FindAccount)?;
        Ok(self.guard.state.accounts.get(&account_number).cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<Account> {
        self.guard.trip(FailPoint::InsertAccount)?;
        let state = &mut self.guard.state;

        if state.accounts.contains_key(&account.account_number) {
            return Err(StoreError::UniqueViolation("accounts.account_number".to_string()));
        }
        if !state.customers.contains_key(&account.customer_id) {
            return Err(StoreError::ForeignKeyViolation("accounts.customer_id".to_string()));
        }
        if state.accounts.values().any(|a| a.customer_id == account.customer_id) {
            return Err(StoreError::UniqueViolation("accounts.customer_id".to_string()));
        }

        state.accounts.insert(account.account_number, account.clone());
        Ok(account.clone())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<Account> {
        self.guard.trip(FailPoint::UpdateAccount)?;

        let stored = self
            .guard
            .state
            .accounts
            .get_mut(&account.account_number)
            .filter(|a| a.customer_id == account.customer_id);
        let Some(stored) = stored else {
            return Err(StoreError::RowMissing {
                table: "accounts",
                key: account.account_number.to_string(),
            });
        };

        stored.account_type = account.account_type.clone();
        stored.branch_address = account.branch_address.clone();
        stored.audit.updated_at = account.audit.updated_at;
        stored.audit.updated_by = account.audit.updated_by.clone();
        Ok(stored.clone())
    }

    async fn delete_account(&mut self, account_number: AccountNumber) -> StoreResult<()> {
        self.guard.trip(FailPoint::DeleteAccount)?;
        match self.guard.state.accounts.remove(&account_number) {
            Some(_) => Ok(()),
            None => Err(StoreError::RowMissing {
                table: "accounts",
                key: account_number.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::accounts::{AuditContext, AuditStamp, ProvisioningDefaults};

    fn new_customer(mobile: &str) -> NewCustomer {
        NewCustomer {
            name: "Madan Reddy".to_string(),
            email: "madan@example.com".to_string(),
            mobile_number: MobileNumber::new(mobile),
            audit: AuditStamp::created(&AuditContext::new("test")),
        }
    }

    fn account_for(customer: &Customer, number: i64) -> Account {
        Account::open(
            AccountNumber::new(number),
            customer,
            &ProvisioningDefaults::default(),
            &AuditContext::new("test"),
        )
    }

    #[tokio::test]
    async fn test_commit_persists_writes() {
        let db = InMemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        let customer = tx.insert_customer(new_customer("9876543210")).await.unwrap();
        tx.insert_account(&account_for(&customer, 1_234_567_890)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.customers().await.len(), 1);
        assert_eq!(db.accounts().await.len(), 1);
        assert_eq!(customer.customer_id, CustomerId::new(1));
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let db = InMemoryDatabase::new();

        {
            let mut tx = db.begin().await.unwrap();
            tx.insert_customer(new_customer("9876543210")).await.unwrap();
        }

        assert!(db.customers().await.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_rollback_discards_writes() {
        let db = InMemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        tx.insert_customer(new_customer("9876543210")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(db.customers().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let db = InMemoryDatabase::new();
        db.fail_next(FailPoint::Commit).await;

        let mut tx = db.begin().await.unwrap();
        tx.insert_customer(new_customer("9876543210")).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert!(db.customers().await.is_empty());
    }

    #[tokio::test]
    async fn test_mobile_number_is_unique() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        tx.insert_customer(new_customer("9876543210")).await.unwrap();

        let err = tx.insert_customer(new_customer("9876543210")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_account_constraints() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let customer = tx.insert_customer(new_customer("9876543210")).await.unwrap();

        let orphan = Account {
            customer_id: CustomerId::new(99),
            ..account_for(&customer, 1_111_111_111)
        };
        assert!(matches!(
            tx.insert_account(&orphan).await.unwrap_err(),
            StoreError::ForeignKeyViolation(_)
        ));

        tx.insert_account(&account_for(&customer, 1_111_111_111)).await.unwrap();
        assert!(matches!(
            tx.insert_account(&account_for(&customer, 1_222_222_222)).await.unwrap_err(),
            StoreError::UniqueViolation(_)
        ));

        assert!(matches!(
            tx.delete_customer(customer.customer_id).await.unwrap_err(),
            StoreError::ForeignKeyViolation(_)
        ));
    }

    #[tokio::test]
    async fn test_taken_account_number_is_not_reassigned() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let first = tx.insert_customer(new_customer("9876543210")).await.unwrap();
        let second = tx.insert_customer(new_customer("9123456780")).await.unwrap();

        tx.insert_account(&account_for(&first, 1_234_567_890)).await.unwrap();
        let err = tx
            .insert_account(&account_for(&second, 1_234_567_890))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(ref c) if c == "accounts.account_number"));

        let owned = tx.find_account_by_customer_id(first.customer_id).await.unwrap().unwrap();
        assert_eq!(owned.account_number, AccountNumber::new(1_234_567_890));
        assert!(tx.find_account_by_customer_id(second.customer_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_account_keeps_owner_and_number() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let first = tx.insert_customer(new_customer("9876543210")).await.unwrap();
        let second = tx.insert_customer(new_customer("9123456780")).await.unwrap();
        tx.insert_account(&account_for(&first, 1_234_567_890)).await.unwrap();

        let moved = Account {
            branch_address: "9 harbour road".to_string(),
            ..account_for(&second, 1_234_567_890)
        };
        assert!(matches!(
            tx.update_account(&moved).await.unwrap_err(),
            StoreError::RowMissing { table: "accounts", .. }
        ));

        let changed = Account {
            account_type: "Current".to_string(),
            ..account_for(&first, 1_234_567_890)
        };
        let saved = tx.update_account(&changed).await.unwrap();
        assert_eq!(saved.customer_id, first.customer_id);
        assert_eq!(saved.account_type, "Current");
        assert!(matches!(
            tx.update_account(&account_for(&first, 1_999_999_999)).await.unwrap_err(),
            StoreError::RowMissing { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_customer_keeps_mobile_number() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let customer = tx.insert_customer(new_customer("9876543210")).await.unwrap();

        let changed = Customer {
            name: "Madan Kumar".to_string(),
            mobile_number: MobileNumber::new("9000000000"),
            ..customer.clone()
        };
        let saved = tx.update_customer(&changed).await.unwrap();

        assert_eq!(saved.name, "Madan Kumar");
        assert_eq!(saved.mobile_number, customer.mobile_number);
    }

    #[tokio::test]
    async fn test_deleting_missing_rows_fails() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        assert!(matches!(
            tx.delete_account(AccountNumber::new(1_234_567_890)).await.unwrap_err(),
            StoreError::RowMissing { table: "accounts", .. }
        ));
        assert!(matches!(
            tx.delete_customer(CustomerId::new(1)).await.unwrap_err(),
            StoreError::RowMissing { table: "customer", .. }
        ));
    }

    #[tokio::test]
    async fn test_fail_point_fires_once() {
        let db = InMemoryDatabase::new();
        db.fail_next(FailPoint::InsertCustomer).await;

        let mut tx = db.begin().await.unwrap();
        assert!(matches!(
            tx.insert_customer(new_customer("9876543210")).await.unwrap_err(),
            StoreError::Unavailable(_)
        ));
        assert!(tx.insert_customer(new_customer("9876543210")).await.is_ok());
    }
}
