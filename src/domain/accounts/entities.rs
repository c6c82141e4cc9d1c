use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{AccountNumber, CustomerId, MobileNumber};

// ============================================================================
// Accounts Entities
// ============================================================================

/// Who is performing a write, and when. Supplied by the request layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl AuditContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            at: Utc::now(),
        }
    }

    pub fn at(actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            actor: actor.into(),
            at,
        }
    }
}

/// Creation and last-update metadata carried by every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl AuditStamp {
    pub fn created(ctx: &AuditContext) -> Self {
        Self {
            created_at: ctx.at,
            created_by: ctx.actor.clone(),
            updated_at: None,
            updated_by: None,
        }
    }

    pub fn touch(&mut self, ctx: &AuditContext) {
        self.updated_at = Some(ctx.at);
        self.updated_by = Some(ctx.actor.clone());
    }
}

/// A customer that has not been persisted yet (no identifier)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub mobile_number: MobileNumber,
    pub audit: AuditStamp,
}

impl NewCustomer {
    /// Attach the identifier assigned by the store
    pub fn into_customer(self, customer_id: CustomerId) -> Customer {
        Customer {
            customer_id,
            name: self.name,
            email: self.email,
            mobile_number: self.mobile_number,
            audit: self.audit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub mobile_number: MobileNumber,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: AccountNumber,
    pub customer_id: CustomerId,
    pub account_type: String,
    pub branch_address: String,
    pub audit: AuditStamp,
}

/// Fixed values every newly provisioned account starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningDefaults {
    pub account_type: String,
    pub branch_address: String,
}

impl ProvisioningDefaults {
    pub const SAVINGS: &'static str = "Savings";
    pub const ADDRESS: &'static str = "123 main street, montaza";
}

impl Default for ProvisioningDefaults {
    fn default() -> Self {
        Self {
            account_type: Self::SAVINGS.to_string(),
            branch_address: Self::ADDRESS.to_string(),
        }
    }
}

impl Account {
    /// Build the account that is paired with a freshly inserted customer
    pub fn open(
        account_number: AccountNumber,
        customer: &Customer,
        defaults: &ProvisioningDefaults,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            account_number,
            customer_id: customer.customer_id,
            account_type: defaults.account_type.clone(),
            branch_address: defaults.branch_address.clone(),
            audit: AuditStamp::created(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        NewCustomer {
            name: "Madan Reddy".to_string(),
            email: "madan@example.com".to_string(),
            mobile_number: MobileNumber::new("9876543210"),
            audit: AuditStamp::created(&AuditContext::new("ACCOUNTS_MS")),
        }
        .into_customer(CustomerId::new(7))
    }

    #[test]
    fn test_open_account_uses_defaults_and_customer_reference() {
        let ctx = AuditContext::new("ACCOUNTS_MS");
        let account = Account::open(
            AccountNumber::new(1_234_567_890),
            &customer(),
            &ProvisioningDefaults::default(),
            &ctx,
        );

        assert_eq!(account.customer_id, CustomerId::new(7));
        assert_eq!(account.account_type, "Savings");
        assert_eq!(account.branch_address, "123 main street, montaza");
        assert_eq!(account.audit.created_by, "ACCOUNTS_MS");
        assert!(account.audit.updated_at.is_none());
    }

    #[test]
    fn test_touch_records_updater() {
        let mut stamp = AuditStamp::created(&AuditContext::new("creator"));
        let later = AuditContext::new("updater");
        stamp.touch(&later);

        assert_eq!(stamp.created_by, "creator");
        assert_eq!(stamp.updated_by.as_deref(), Some("updater"));
        assert_eq!(stamp.updated_at, Some(later.at));
    }
}
