//! In-memory collaborators for the headless simulator and tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use nm_api_types::{AccountId, RenderInstruction, TxRef};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{
    AppHost, IdentityError, IdentityProvider, LedgerError, LedgerService, Presenter,
    PurchaseRequest, UserDataService,
};

/// Wallet that answers every account request from a fixed list.
#[derive(Default)]
pub struct SimulatedIdentity {
    accounts: RefCell<Vec<AccountId>>,
    failure: RefCell<Option<IdentityError>>,
    subscribed: Cell<bool>,
    requests: Cell<usize>,
}

impl SimulatedIdentity {
    pub fn new(accounts: Vec<AccountId>) -> Self {
        Self {
            accounts: RefCell::new(accounts),
            ..Self::default()
        }
    }

    /// No wallet installed in the browser.
    pub fn unavailable() -> Self {
        let identity = Self::default();
        identity.fail_with(IdentityError::ProviderUnavailable(
            "Please install a Web3 wallet to connect".to_owned(),
        ));
        identity
    }

    pub fn set_accounts(&self, accounts: Vec<AccountId>) {
        *self.accounts.borrow_mut() = accounts;
    }

    pub fn fail_with(&self, error: IdentityError) {
        *self.failure.borrow_mut() = Some(error);
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

#[async_trait(?Send)]
impl IdentityProvider for SimulatedIdentity {
    async fn request_accounts(&self) -> Result<Vec<AccountId>, IdentityError> {
        self.requests.set(self.requests.get() + 1);
        if let Some(error) = self.failure.borrow().clone() {
            return Err(error);
        }
        Ok(self.accounts.borrow().clone())
    }

    fn subscribe(&self) {
        self.subscribed.set(true);
    }

    fn unsubscribe(&self) {
        self.subscribed.set(false);
    }
}

/// Ledger with per-account balances. Unknown accounts start at `starting_balance`.
pub struct SimulatedLedger {
    starting_balance: u64,
    balances: RefCell<HashMap<AccountId, u64>>,
    submissions: RefCell<Vec<PurchaseRequest>>,
    fail_next: RefCell<Option<LedgerError>>,
}

impl SimulatedLedger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            starting_balance,
            balances: RefCell::new(HashMap::new()),
            submissions: RefCell::new(Vec::new()),
            fail_next: RefCell::new(None),
        }
    }

    pub fn balance(&self, account_id: &AccountId) -> u64 {
        self.balances
            .borrow()
            .get(account_id)
            .copied()
            .unwrap_or(self.starting_balance)
    }

    pub fn submissions(&self) -> Vec<PurchaseRequest> {
        self.submissions.borrow().clone()
    }

    /// Make the next submission fail with `error` regardless of balance.
    pub fn fail_next(&self, error: LedgerError) {
        *self.fail_next.borrow_mut() = Some(error);
    }
}

#[async_trait(?Send)]
impl LedgerService for SimulatedLedger {
    async fn submit(&self, req: PurchaseRequest) -> Result<TxRef, LedgerError> {
        let sequence = {
            let mut submissions = self.submissions.borrow_mut();
            submissions.push(req.clone());
            submissions.len()
        };

        if let Some(error) = self.fail_next.borrow_mut().take() {
            return Err(error);
        }

        let balance = self.balance(&req.account_id);
        if req.price > balance {
            return Err(LedgerError::InsufficientFunds(format!(
                "insufficient funds: balance {balance} is below price {}",
                req.price
            )));
        }
        self.balances
            .borrow_mut()
            .insert(req.account_id.clone(), balance - req.price);

        let payload = format!(
            "{}:{}:{}:{sequence}",
            req.item_id.0, req.account_id.0, req.price
        );
        let digest = Sha256::digest(payload.as_bytes());
        let tx_ref = TxRef(format!("txn_{}", hex_lower(&digest[..16])));
        debug!(item = %req.item_id, tx_ref = %tx_ref.0, "simulated ledger accepted purchase");
        Ok(tx_ref)
    }
}

/// Records refreshed accounts; can be told to fail.
#[derive(Default)]
pub struct SimulatedUserData {
    refreshed: RefCell<Vec<AccountId>>,
    failing: Cell<bool>,
}

impl SimulatedUserData {
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn refreshed(&self) -> Vec<AccountId> {
        self.refreshed.borrow().clone()
    }
}

#[async_trait(?Send)]
impl UserDataService for SimulatedUserData {
    async fn refresh(&self, account_id: &AccountId) -> Result<()> {
        self.refreshed.borrow_mut().push(account_id.clone());
        if self.failing.get() {
            bail!("user data backend unavailable for {account_id}");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingHost {
    reloads: Cell<usize>,
}

impl RecordingHost {
    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }
}

impl AppHost for RecordingHost {
    fn reload(&self) {
        info!("application reload requested");
        self.reloads.set(self.reloads.get() + 1);
    }
}

/// Keeps every render instruction it receives.
#[derive(Default)]
pub struct RecordingPresenter {
    frames: RefCell<Vec<RenderInstruction>>,
}

impl RecordingPresenter {
    pub fn frames(&self) -> Vec<RenderInstruction> {
        self.frames.borrow().clone()
    }

    pub fn last(&self) -> Option<RenderInstruction> {
        self.frames.borrow().last().cloned()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, instruction: &RenderInstruction) {
        self.frames.borrow_mut().push(instruction.clone());
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
