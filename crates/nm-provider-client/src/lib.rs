//! Contracts between the storefront core and the outside world.
//!
//! The browser runs everything on one thread, so the async traits are `?Send` and the
//! implementations are free to hold `RefCell`/`Closure` state.

use anyhow::Result;
use async_trait::async_trait;
use nm_api_types::{AccountId, ItemId, RenderInstruction, TxRef};
use std::rc::Rc;
use thiserror::Error;

pub mod sim;
pub mod wire;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{0}")]
    ProviderUnavailable(String),
    #[error("{0}")]
    UserRejected(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    NetworkError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub item_id: ItemId,
    pub account_id: AccountId,
    pub price: u64,
}

/// Wallet-style identity provider (an injected browser wallet in production).
#[async_trait(?Send)]
pub trait IdentityProvider {
    async fn request_accounts(&self) -> Result<Vec<AccountId>, IdentityError>;

    /// Start delivering `accountsChanged` / `chainChanged` push-events.
    fn subscribe(&self);

    fn unsubscribe(&self);
}

#[async_trait(?Send)]
pub trait LedgerService {
    async fn submit(&self, req: PurchaseRequest) -> Result<TxRef, LedgerError>;
}

/// Loads balances and owned items for the active account.
#[async_trait(?Send)]
pub trait UserDataService {
    async fn refresh(&self, account_id: &AccountId) -> Result<()>;
}

pub trait AppHost {
    /// Full reload of the surrounding application.
    fn reload(&self);
}

pub trait Presenter {
    fn render(&self, instruction: &RenderInstruction);
}

// Shared handles so callers can keep inspecting a collaborator after handing it over.

#[async_trait(?Send)]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Rc<T> {
    async fn request_accounts(&self) -> Result<Vec<AccountId>, IdentityError> {
        (**self).request_accounts().await
    }

    fn subscribe(&self) {
        (**self).subscribe()
    }

    fn unsubscribe(&self) {
        (**self).unsubscribe()
    }
}

#[async_trait(?Send)]
impl<T: LedgerService + ?Sized> LedgerService for Rc<T> {
    async fn submit(&self, req: PurchaseRequest) -> Result<TxRef, LedgerError> {
        (**self).submit(req).await
    }
}

#[async_trait(?Send)]
impl<T: UserDataService + ?Sized> UserDataService for Rc<T> {
    async fn refresh(&self, account_id: &AccountId) -> Result<()> {
        (**self).refresh(account_id).await
    }
}

impl<T: AppHost + ?Sized> AppHost for Rc<T> {
    fn reload(&self) {
        (**self).reload()
    }
}

impl<T: Presenter + ?Sized> Presenter for Rc<T> {
    fn render(&self, instruction: &RenderInstruction) {
        (**self).render(instruction)
    }
}
