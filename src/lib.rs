//! Customer + savings account provisioning.
//!
//! [`domain::accounts::AccountsService`] keeps the one-customer-one-account
//! pairing consistent on top of the stores in [`store`].

pub mod config;
pub mod domain;
pub mod metrics;
pub mod store;
pub mod utils;
