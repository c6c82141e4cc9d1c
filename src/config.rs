//! Service configuration, read from `ACCOUNTS_*` environment variables

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use crate::domain::accounts::{ProvisioningDefaults, DEFAULT_ACCOUNT_NUMBER_ATTEMPTS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub metrics_port: u16,
    pub provisioning: ProvisioningDefaults,
    pub account_number_attempts: u32,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; `None` runs against the in-memory store
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_attempts: u32,
}

/// Support contacts published on `/contact-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub message: String,
    pub contact_details: BTreeMap<String, String>,
    pub on_call_support: Vec<String>,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            message: "Welcome to the accounts service".to_string(),
            contact_details: BTreeMap::new(),
            on_call_support: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connect_attempts: 5,
            },
            metrics_port: 9090,
            provisioning: ProvisioningDefaults::default(),
            account_number_attempts: DEFAULT_ACCOUNT_NUMBER_ATTEMPTS,
            contact: ContactInfo::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, starting from the defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("ACCOUNTS_DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            config.database.url = Some(url);
        }
        if let Some(value) = lookup("ACCOUNTS_MAX_DB_CONNECTIONS") {
            config.database.max_connections = parse("ACCOUNTS_MAX_DB_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("ACCOUNTS_CONNECT_ATTEMPTS") {
            config.database.connect_attempts = parse("ACCOUNTS_CONNECT_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("ACCOUNTS_METRICS_PORT") {
            config.metrics_port = parse("ACCOUNTS_METRICS_PORT", &value)?;
        }
        if let Some(value) = lookup("ACCOUNTS_ACCOUNT_TYPE") {
            config.provisioning.account_type = value;
        }
        if let Some(value) = lookup("ACCOUNTS_BRANCH_ADDRESS") {
            config.provisioning.branch_address = value;
        }
        if let Some(value) = lookup("ACCOUNTS_ACCOUNT_NUMBER_ATTEMPTS") {
            config.account_number_attempts = parse("ACCOUNTS_ACCOUNT_NUMBER_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("ACCOUNTS_CONTACT_MESSAGE") {
            config.contact.message = value;
        }
        if let Some(value) = lookup("ACCOUNTS_CONTACT_DETAILS") {
            config.contact.contact_details = parse_pairs("ACCOUNTS_CONTACT_DETAILS", &value)?;
        }
        if let Some(value) = lookup("ACCOUNTS_CONTACT_ON_CALL") {
            config.contact.on_call_support = split_list(&value);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.account_number_attempts == 0 {
            bail!("ACCOUNTS_ACCOUNT_NUMBER_ATTEMPTS must be at least 1");
        }
        if self.database.max_connections == 0 {
            bail!("ACCOUNTS_MAX_DB_CONNECTIONS must be at least 1");
        }
        if self.provisioning.account_type.trim().is_empty()
            || self.provisioning.branch_address.trim().is_empty()
        {
            bail!("Provisioning account type and branch address can not be empty");
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `name=John Doe,email=john@example.com` → ordered map
fn parse_pairs(key: &str, value: &str) -> anyhow::Result<BTreeMap<String, String>> {
    split_list(value)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
            _ => bail!("{} has an entry without a key: {:?}", key, pair),
        })
        .collect()
}
