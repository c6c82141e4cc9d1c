use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;
use crate::store::{AccountStore, CustomerStore, Database, Transaction};

use super::contracts::{CustomerInput, CustomerView};
use super::entities::{Account, AuditContext, ProvisioningDefaults};
use super::errors::AccountsError;
use super::generator::AccountNumberGenerator;
use super::value_objects::{AccountNumber, EntityKind, MobileNumber};

// ============================================================================
// Accounts Service
// ============================================================================
//
// Orchestrates: Request → Transaction → Customer/Account stores → Commit
//
// Every operation opens exactly one transaction. Any early return drops the
// transaction uncommitted, so a failure partway through leaves no writes.
// Store failures propagate unchanged and are never retried here.
//
// ============================================================================

pub const DEFAULT_ACCOUNT_NUMBER_ATTEMPTS: u32 = 5;

pub struct AccountsService<D, G> {
    database: D,
    generator: G,
    defaults: ProvisioningDefaults,
    account_number_attempts: u32,
    metrics: Arc<Metrics>,
}

impl<D, G> AccountsService<D, G>
where
    D: Database,
    G: AccountNumberGenerator,
{
    pub fn new(database: D, generator: G, metrics: Arc<Metrics>) -> Self {
        Self {
            database,
            generator,
            defaults: ProvisioningDefaults::default(),
            account_number_attempts: DEFAULT_ACCOUNT_NUMBER_ATTEMPTS,
            metrics,
        }
    }

    pub fn with_defaults(mut self, defaults: ProvisioningDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// How many generated numbers to try before giving up on a create
    pub fn with_account_number_attempts(mut self, attempts: u32) -> Self {
        self.account_number_attempts = attempts.max(1);
        self
    }

    /// Register a customer and open its savings account in one transaction
    pub async fn create_account(
        &self,
        input: &CustomerInput,
        audit: &AuditContext,
    ) -> Result<(), AccountsError> {
        let started = Instant::now();
        let result = self.provision(input, audit).await;
        self.record("create", outcome(&result), started);
        result
    }

    /// Customer and account details for a mobile number
    pub async fn fetch_account(
        &self,
        mobile_number: &MobileNumber,
    ) -> Result<CustomerView, AccountsError> {
        let started = Instant::now();
        let result = self.fetch(mobile_number).await;
        self.record("fetch", outcome(&result), started);
        result
    }

    /// Apply the embedded account payload and the customer fields.
    ///
    /// Returns `Ok(false)` without touching the stores when the input carries
    /// no account payload. Missing records are errors, not `false`.
    pub async fn update_account(
        &self,
        input: &CustomerInput,
        audit: &AuditContext,
    ) -> Result<bool, AccountsError> {
        let started = Instant::now();
        let result = self.update(input, audit).await;
        let label = match &result {
            Ok(false) => "no_payload",
            _ => outcome(&result),
        };
        self.record("update", label, started);
        result
    }

    /// Remove the account, then its customer
    pub async fn delete_account(&self, mobile_number: &MobileNumber) -> Result<bool, AccountsError> {
        let started = Instant::now();
        let result = self.delete(mobile_number).await;
        self.record("delete", outcome(&result), started);
        result
    }

    async fn provision(
        &self,
        input: &CustomerInput,
        audit: &AuditContext,
    ) -> Result<(), AccountsError> {
        let customer = input.to_new_customer(audit);
        let mut tx = self.database.begin().await?;

        if tx
            .find_customer_by_mobile_number(&customer.mobile_number)
            .await?
            .is_some()
        {
            tracing::warn!(
                mobile_number = %customer.mobile_number,
                "Rejected provisioning, mobile number already registered"
            );
            return Err(AccountsError::DuplicateCustomer {
                mobile_number: customer.mobile_number,
            });
        }

        let customer = tx.insert_customer(customer).await?;
        let account_number = self.draw_account_number(&mut tx).await?;
        let account = Account::open(account_number, &customer, &self.defaults, audit);
        let account = tx.insert_account(&account).await?;
        tx.commit().await?;

        tracing::info!(
            customer_id = %customer.customer_id,
            account_number = %account.account_number,
            mobile_number = %customer.mobile_number,
            "✅ Provisioned customer and savings account"
        );
        Ok(())
    }

    async fn draw_account_number(&self, tx: &mut D::Tx) -> Result<AccountNumber, AccountsError> {
        for attempt in 1..=self.account_number_attempts {
            let candidate = self.generator.next_account_number();
            if tx.find_account_by_number(candidate).await?.is_none() {
                return Ok(candidate);
            }

            self.metrics.record_account_number_redraw();
            tracing::warn!(
                attempt = attempt,
                account_number = %candidate,
                "Generated account number already taken, drawing again"
            );
        }

        Err(AccountsError::AccountNumberExhausted {
            attempts: self.account_number_attempts,
        })
    }

    async fn fetch(&self, mobile_number: &MobileNumber) -> Result<CustomerView, AccountsError> {
        let mut tx = self.database.begin().await?;

        let customer = tx
            .find_customer_by_mobile_number(mobile_number)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Customer, "mobileNumber", mobile_number)
            })?;

        let account = tx
            .find_account_by_customer_id(customer.customer_id)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Account, "customerId", customer.customer_id)
            })?;

        tx.commit().await?;

        tracing::debug!(
            customer_id = %customer.customer_id,
            account_number = %account.account_number,
            "Fetched account details"
        );
        Ok(CustomerView::assemble(&customer, &account))
    }

    async fn update(&self, input: &CustomerInput, audit: &AuditContext) -> Result<bool, AccountsError> {
        let Some(changes) = &input.account else {
            tracing::debug!(
                mobile_number = %input.mobile_number,
                "Update carries no account payload, nothing to do"
            );
            return Ok(false);
        };

        let mut tx = self.database.begin().await?;

        let mut account = tx
            .find_account_by_number(changes.account_number)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Account, "accountNumber", changes.account_number)
            })?;
        changes.apply_to(&mut account, audit);
        let account = tx.update_account(&account).await?;

        let mut customer = tx
            .find_customer_by_id(account.customer_id)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Customer, "customerId", account.customer_id)
            })?;
        input.apply_to(&mut customer, audit);
        tx.update_customer(&customer).await?;

        tx.commit().await?;

        tracing::info!(
            customer_id = %customer.customer_id,
            account_number = %account.account_number,
            "Updated account details"
        );
        Ok(true)
    }

    async fn delete(&self, mobile_number: &MobileNumber) -> Result<bool, AccountsError> {
        let mut tx = self.database.begin().await?;

        let customer = tx
            .find_customer_by_mobile_number(mobile_number)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Customer, "mobileNumber", mobile_number)
            })?;

        let account = tx
            .find_account_by_customer_id(customer.customer_id)
            .await?
            .ok_or_else(|| {
                AccountsError::not_found(EntityKind::Account, "customerId", customer.customer_id)
            })?;

        tx.delete_account(account.account_number).await?;
        tx.delete_customer(customer.customer_id).await?;
        tx.commit().await?;

        tracing::info!(
            customer_id = %customer.customer_id,
            account_number = %account.account_number,
            "Deleted customer and account"
        );
        Ok(true)
    }

    fn record(&self, operation: &str, outcome: &str, started: Instant) {
        self.metrics
            .record_operation(operation, outcome, started.elapsed().as_secs_f64());
    }
}

fn outcome<T>(result: &Result<T, AccountsError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(AccountsError::DuplicateCustomer { .. }) => "duplicate_customer",
        Err(AccountsError::NotFound { .. }) => "not_found",
        Err(AccountsError::AccountNumberExhausted { .. }) => "number_exhausted",
        Err(AccountsError::Store(_)) => "store_error",
    }
}
