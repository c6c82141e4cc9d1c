use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Accounts Value Objects
// ============================================================================

/// Store-assigned customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl CustomerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account number, the primary key of the account store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(pub i64);

impl AccountNumber {
    /// Smallest 10-digit account number
    pub const MIN: i64 = 1_000_000_000;
    /// Largest 10-digit account number
    pub const MAX: i64 = 9_999_999_999;

    pub fn new(number: i64) -> Self {
        Self(number)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_ten_digit(&self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self.0)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer mobile number, unique across all customers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobileNumber(pub String);

impl MobileNumber {
    pub const LENGTH: usize = 10;

    pub fn new(mobile: impl Into<String>) -> Self {
        Self(mobile.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exactly ten ASCII digits
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LENGTH && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of record a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Account,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => f.write_str("Customer"),
            EntityKind::Account => f.write_str("Account"),
        }
    }
}
