use serde::{Deserialize, Serialize};

use super::entities::{Account, AuditContext, AuditStamp, Customer, NewCustomer};
use super::errors::ValidationError;
use super::value_objects::{AccountNumber, MobileNumber};

// ============================================================================
// Input & View Contracts
// ============================================================================
//
// What the request layer hands to the service, and what fetch hands back.
// Identifiers never flow from these shapes into a record: the customer id is
// assigned by the store and the account number by the generator.
//
// ============================================================================

const NAME_MIN_LEN: usize = 5;
const NAME_MAX_LEN: usize = 30;

/// Customer fields plus an optional embedded account payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub mobile_number: MobileNumber,
    #[serde(rename = "accountsDto", alias = "account", default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    pub account_number: AccountNumber,
    pub account_type: String,
    pub branch_address: String,
}

/// Read-only combined view of a customer and its account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub name: String,
    pub email: String,
    pub mobile_number: MobileNumber,
    #[serde(rename = "accountsDto")]
    pub account: AccountView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub account_number: AccountNumber,
    pub account_type: String,
    pub branch_address: String,
}

impl CustomerInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        mobile_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            mobile_number: MobileNumber::new(mobile_number),
            account: None,
        }
    }

    pub fn with_account(mut self, account: AccountInput) -> Self {
        self.account = Some(account);
        self
    }

    /// Field checks the request layer runs before calling the service
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        let name_len = self.name.trim().chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name_len) {
            violations.push(format!(
                "name must be between {} and {} characters",
                NAME_MIN_LEN, NAME_MAX_LEN
            ));
        }

        if !is_email(&self.email) {
            violations.push(format!("email is not a valid address: {}", self.email));
        }

        if !self.mobile_number.is_well_formed() {
            violations.push(format!(
                "mobile number must be {} digits",
                MobileNumber::LENGTH
            ));
        }

        if let Some(account) = &self.account {
            if account.account_type.trim().is_empty() {
                violations.push("account type can not be empty".to_string());
            }
            if account.branch_address.trim().is_empty() {
                violations.push("branch address can not be empty".to_string());
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    pub fn to_new_customer(&self, ctx: &AuditContext) -> NewCustomer {
        NewCustomer {
            name: self.name.clone(),
            email: self.email.clone(),
            mobile_number: self.mobile_number.clone(),
            audit: AuditStamp::created(ctx),
        }
    }

    /// Copy the mutable customer fields. The mobile number is the lookup key
    /// and stays as stored.
    pub fn apply_to(&self, customer: &mut Customer, ctx: &AuditContext) {
        customer.name = self.name.clone();
        customer.email = self.email.clone();
        customer.audit.touch(ctx);
    }
}

impl AccountInput {
    pub fn new(
        account_number: i64,
        account_type: impl Into<String>,
        branch_address: impl Into<String>,
    ) -> Self {
        Self {
            account_number: AccountNumber::new(account_number),
            account_type: account_type.into(),
            branch_address: branch_address.into(),
        }
    }

    /// Copy the mutable account fields onto a stored account
    pub fn apply_to(&self, account: &mut Account, ctx: &AuditContext) {
        account.account_type = self.account_type.clone();
        account.branch_address = self.branch_address.clone();
        account.audit.touch(ctx);
    }
}

impl CustomerView {
    pub fn assemble(customer: &Customer, account: &Account) -> Self {
        Self {
            name: customer.name.clone(),
            email: customer.email.clone(),
            mobile_number: customer.mobile_number.clone(),
            account: AccountView {
                account_number: account.account_number,
                account_type: account.account_type.clone(),
                branch_address: account.branch_address.clone(),
            },
        }
    }
}

fn is_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    }
}
