use nm_api_types::ItemId;
use nm_provider_client::{IdentityError, LedgerError};
use thiserror::Error;

/// Every way a storefront operation can end without success.
///
/// Provider messages are carried verbatim so the presentation layer can show them as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("{0}")]
    ProviderUnavailable(String),
    #[error("{0}")]
    UserRejected(String),
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("purchase of item {0} is already in progress")]
    AlreadyInFlight(ItemId),
    #[error("item {0} is not in the catalog")]
    UnknownItem(ItemId),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    NetworkError(String),
    #[error("response belongs to a superseded request")]
    StaleResponse,
}

impl MarketError {
    /// Internal errors are discarded silently and never rendered.
    pub fn is_internal(&self) -> bool {
        matches!(self, MarketError::StaleResponse)
    }
}

impl From<IdentityError> for MarketError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::ProviderUnavailable(msg) => MarketError::ProviderUnavailable(msg),
            IdentityError::UserRejected(msg) => MarketError::UserRejected(msg),
        }
    }
}

impl From<LedgerError> for MarketError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds(msg) => MarketError::InsufficientFunds(msg),
            LedgerError::Rejected(msg) => MarketError::Rejected(msg),
            LedgerError::NetworkError(msg) => MarketError::NetworkError(msg),
        }
    }
}
