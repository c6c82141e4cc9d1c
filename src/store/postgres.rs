use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};

use crate::domain::accounts::{
    Account, AccountNumber, AuditStamp, Customer, CustomerId, MobileNumber, NewCustomer,
};

use super::{AccountStore, CustomerStore, Database, StoreError, StoreResult, Transaction};

// ============================================================================
// PostgreSQL Store (sqlx)
// ============================================================================
//
// Tables:
// - customer: customer_id BIGSERIAL PK, mobile_number UNIQUE
// - accounts: account_number BIGINT PK, customer_id UNIQUE FK → customer
//
// Each service operation runs inside one `sqlx::Transaction`; sqlx rolls it
// back when it is dropped without a commit.
//
// ============================================================================

const CUSTOMER_COLUMNS: &str =
    "customer_id, name, email, mobile_number, created_at, created_by, updated_at, updated_by";

const ACCOUNT_COLUMNS: &str =
    "account_number, customer_id, account_type, branch_address, created_at, created_by, updated_at, updated_by";

// Mobile number is the lookup key and is never rewritten
const UPDATE_CUSTOMER: &str = "UPDATE customer
     SET name = $2, email = $3, updated_at = $4, updated_by = $5
     WHERE customer_id = $1";

// Owner and number are fixed once an account is opened
const UPDATE_ACCOUNT: &str = "UPDATE accounts
     SET account_type = $3, branch_address = $4, updated_at = $5, updated_by = $6
     WHERE account_number = $1 AND customer_id = $2";

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS customer (
        customer_id   BIGSERIAL PRIMARY KEY,
        name          VARCHAR(100) NOT NULL,
        email         VARCHAR(100) NOT NULL,
        mobile_number VARCHAR(20)  NOT NULL UNIQUE,
        created_at    TIMESTAMPTZ  NOT NULL,
        created_by    VARCHAR(20)  NOT NULL,
        updated_at    TIMESTAMPTZ,
        updated_by    VARCHAR(20)
    )",
    "CREATE TABLE IF NOT EXISTS accounts (
        account_number BIGINT       PRIMARY KEY,
        customer_id    BIGINT       NOT NULL UNIQUE REFERENCES customer (customer_id),
        account_type   VARCHAR(100) NOT NULL,
        branch_address VARCHAR(200) NOT NULL,
        created_at     TIMESTAMPTZ  NOT NULL,
        created_by     VARCHAR(20)  NOT NULL,
        updated_at     TIMESTAMPTZ,
        updated_by     VARCHAR(20)
    )",
];

#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        tracing::info!(max_connections = max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Create the customer and accounts tables if they do not exist
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Accounts schema ready");
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Tx = PgTransaction;

    async fn begin(&self) -> StoreResult<PgTransaction> {
        Ok(PgTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn audit_from_row(row: &PgRow) -> Result<AuditStamp, sqlx::Error> {
    Ok(AuditStamp {
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        mobile_number: MobileNumber::new(row.try_get::<String, _>("mobile_number")?),
        audit: audit_from_row(row)?,
    })
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        account_number: AccountNumber::new(row.try_get("account_number")?),
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        account_type: row.try_get("account_type")?,
        branch_address: row.try_get("branch_address")?,
        audit: audit_from_row(row)?,
    })
}

fn expect_affected(result: sqlx::postgres::PgQueryResult, table: &'static str, key: String) -> StoreResult<()> {
    if result.rows_affected() == 0 {
        return Err(StoreError::RowMissing { table, key });
    }
    Ok(())
}

#[async_trait]
impl CustomerStore for PgTransaction {
    async fn find_customer_by_mobile_number(
        &mut self,
        mobile_number: &MobileNumber,
    ) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customer WHERE mobile_number = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(mobile_number.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(customer_from_row).transpose()?)
    }

    async fn find_customer_by_id(
        &mut self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customer WHERE customer_id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(customer_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(customer_from_row).transpose()?)
    }

    async fn insert_customer(&mut self, customer: NewCustomer) -> StoreResult<Customer> {
        let row = sqlx::query(
            "INSERT INTO customer (name, email, mobile_number, created_at, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING customer_id",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.mobile_number.as_str())
        .bind(customer.audit.created_at)
        .bind(&customer.audit.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        let customer_id = CustomerId::new(row.try_get("customer_id")?);
        tracing::debug!(customer_id = %customer_id, "Inserted customer row");
        Ok(customer.into_customer(customer_id))
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        let result = sqlx::query(UPDATE_CUSTOMER)
            .bind(customer.customer_id.value())
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(customer.audit.updated_at)
            .bind(&customer.audit.updated_by)
            .execute(&mut *self.tx)
            .await?;

        expect_affected(result, "customer", customer.customer_id.to_string())?;
        Ok(customer.clone())
    }

    async fn delete_customer(&mut self, customer_id: CustomerId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM customer WHERE customer_id = $1")
            .bind(customer_id.value())
            .execute(&mut *self.tx)
            .await?;

        expect_affected(result, "customer", customer_id.to_string())
    }
}

#[async_trait]
impl AccountStore for PgTransaction {
    async fn find_account_by_customer_id(
        &mut self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE customer_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(customer_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn find_account_by_number(
        &mut self,
        account_number: AccountNumber,
    ) -> StoreResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE account_number = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(account_number.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<Account> {
        // A taken number hits the primary key and maps to UniqueViolation
        let row = sqlx::query(&format!(
            "INSERT INTO accounts ({})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            ACCOUNT_COLUMNS, ACCOUNT_COLUMNS
        ))
        .bind(account.account_number.value())
        .bind(account.customer_id.value())
        .bind(&account.account_type)
        .bind(&account.branch_address)
        .bind(account.audit.created_at)
        .bind(&account.audit.created_by)
        .bind(account.audit.updated_at)
        .bind(&account.audit.updated_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(account_from_row(&row)?)
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<Account> {
        let result = sqlx::query(UPDATE_ACCOUNT)
            .bind(account.account_number.value())
            .bind(account.customer_id.value())
            .bind(&account.account_type)
            .bind(&account.branch_address)
            .bind(account.audit.updated_at)
            .bind(&account.audit.updated_by)
            .execute(&mut *self.tx)
            .await?;

        expect_affected(result, "accounts", account.account_number.to_string())?;
        Ok(account.clone())
    }

    async fn delete_account(&mut self, account_number: AccountNumber) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE account_number = $1")
            .bind(account_number.value())
            .execute(&mut *self.tx)
            .await?;

        expect_affected(result, "accounts", account_number.to_string())
    }
}
