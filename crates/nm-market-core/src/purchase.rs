//! Transaction Coordinator: single-flight purchase attempts keyed by item id.

use nm_api_types::{AccountId, ItemId, PurchaseAttempt, PurchaseState, Session, TxRef};
use nm_provider_client::{LedgerError, PurchaseRequest};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::error::MarketError;

/// An attempt in `Submitting`; must be handed back to [`TransactionCoordinator::complete`].
#[derive(Debug)]
pub struct PurchaseTicket {
    item_id: ItemId,
    account_id: AccountId,
    price: u64,
}

impl PurchaseTicket {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn request(&self) -> PurchaseRequest {
        PurchaseRequest {
            item_id: self.item_id,
            account_id: self.account_id.clone(),
            price: self.price,
        }
    }
}

#[derive(Debug, Default)]
pub struct TransactionCoordinator {
    attempts: BTreeMap<ItemId, PurchaseAttempt>,
}

impl TransactionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate a purchase: session first, then single-flight, then pricing.
    /// Nothing is recorded unless every gate passes.
    pub fn begin(
        &mut self,
        item_id: ItemId,
        session: &Session,
        catalog: &CatalogStore,
    ) -> Result<PurchaseTicket, MarketError> {
        let Some(account_id) = session.account_id() else {
            return Err(MarketError::NotConnected);
        };
        if self.is_in_flight(item_id) {
            return Err(MarketError::AlreadyInFlight(item_id));
        }
        let Some(item) = catalog.item(item_id) else {
            return Err(MarketError::UnknownItem(item_id));
        };

        self.attempts.insert(
            item_id,
            PurchaseAttempt {
                item_id,
                state: PurchaseState::Submitting,
            },
        );
        info!(item = %item_id, account = %account_id, price = item.price, "submitting purchase");

        Ok(PurchaseTicket {
            item_id,
            account_id: account_id.clone(),
            price: item.price,
        })
    }

    /// Record the ledger's answer and free the item. Returns the terminal attempt.
    pub fn complete(
        &mut self,
        ticket: PurchaseTicket,
        result: Result<TxRef, LedgerError>,
    ) -> PurchaseAttempt {
        if self.attempts.remove(&ticket.item_id).is_none() {
            warn!(item = %ticket.item_id, "completed purchase had no attempt record");
        }

        let state = match result {
            Ok(tx_ref) => {
                info!(item = %ticket.item_id, tx_ref = %tx_ref.0, "purchase succeeded");
                PurchaseState::Succeeded { tx_ref }
            }
            Err(err) => {
                warn!(item = %ticket.item_id, error = %err, "purchase failed");
                PurchaseState::Failed {
                    error: err.to_string(),
                }
            }
        };

        PurchaseAttempt {
            item_id: ticket.item_id,
            state,
        }
    }

    pub fn is_in_flight(&self, item_id: ItemId) -> bool {
        self.attempts
            .get(&item_id)
            .is_some_and(|attempt| !attempt.state.is_terminal())
    }

    /// Items with a purchase in `Submitting`, ascending by id.
    pub fn in_flight(&self) -> Vec<ItemId> {
        self.attempts
            .values()
            .filter(|attempt| !attempt.state.is_terminal())
            .map(|attempt| attempt.item_id)
            .collect()
    }

    pub fn attempt(&self, item_id: ItemId) -> Option<&PurchaseAttempt> {
        self.attempts.get(&item_id)
    }

    /// `Idle` when the item has no attempt on record.
    pub fn state(&self, item_id: ItemId) -> PurchaseState {
        self.attempts
            .get(&item_id)
            .map_or(PurchaseState::Idle, |attempt| attempt.state.clone())
    }
}
