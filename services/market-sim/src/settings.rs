use anyhow::{Context, Result};
use nm_api_types::{AccountId, CatalogItem};
use std::path::PathBuf;

const BUNDLED_CATALOG: &str = include_str!("../catalog.json");

pub const DEFAULT_ACCOUNT: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
pub const DEFAULT_STARTING_BALANCE: u64 = 2_000;

/// Simulator wiring read from `NM_CATALOG_PATH`, `NM_ACCOUNTS`, `NM_STARTING_BALANCE` and
/// `NM_LEDGER_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSettings {
    pub catalog_path: Option<PathBuf>,
    /// Empty means no wallet is installed.
    pub accounts: Vec<AccountId>,
    pub starting_balance: u64,
    /// Use the HTTP ledger instead of the in-memory one.
    pub ledger_url: Option<String>,
}

impl SimSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let accounts = match lookup("NM_ACCOUNTS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|account| !account.is_empty())
                .map(|account| AccountId(account.to_owned()))
                .collect(),
            None => vec![AccountId(DEFAULT_ACCOUNT.to_owned())],
        };

        let starting_balance = match lookup("NM_STARTING_BALANCE") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("NM_STARTING_BALANCE must be a whole number, got '{raw}'"))?,
            None => DEFAULT_STARTING_BALANCE,
        };

        Ok(Self {
            catalog_path: lookup("NM_CATALOG_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            accounts,
            starting_balance,
            ledger_url: lookup("NM_LEDGER_URL").filter(|v| !v.trim().is_empty()),
        })
    }

    pub fn load_catalog(&self) -> Result<Vec<CatalogItem>> {
        match &self.catalog_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog {}", path.display()))?;
                parse_catalog(&raw).with_context(|| format!("invalid catalog {}", path.display()))
            }
            None => parse_catalog(BUNDLED_CATALOG).context("invalid bundled catalog"),
        }
    }
}

fn parse_catalog(raw: &str) -> Result<Vec<CatalogItem>> {
    Ok(serde_json::from_str(raw)?)
}
