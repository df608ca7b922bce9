//! JSON contract of the HTTP ledger, shared by the native and browser clients.
//!
//! `POST {endpoint}/purchases` with [`PurchaseBody`]. A 2xx answer carries `{"tx_ref": ...}`,
//! 402 means insufficient funds and any other status is a rejection with `{"error": ...}`.

use nm_api_types::{ItemId, TxRef};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, PurchaseRequest};

pub const PURCHASES_PATH: &str = "/purchases";

#[derive(Debug, Serialize)]
pub struct PurchaseBody<'a> {
    pub item_id: ItemId,
    pub account_id: &'a str,
    pub price: u64,
}

impl<'a> From<&'a PurchaseRequest> for PurchaseBody<'a> {
    fn from(req: &'a PurchaseRequest) -> Self {
        Self {
            item_id: req.item_id,
            account_id: &req.account_id.0,
            price: req.price,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PurchaseAccepted {
    tx_ref: String,
}

#[derive(Debug, Deserialize)]
struct LedgerErrorResponse {
    error: String,
}

/// Map a ledger HTTP answer to the purchase outcome.
pub fn classify(status: u16, body: &str) -> Result<TxRef, LedgerError> {
    if (200..300).contains(&status) {
        return match serde_json::from_str::<PurchaseAccepted>(body) {
            Ok(accepted) => Ok(TxRef(accepted.tx_ref)),
            Err(err) => Err(LedgerError::Rejected(format!(
                "ledger accepted the purchase but sent an unreadable receipt: {err}"
            ))),
        };
    }

    let message = serde_json::from_str::<LedgerErrorResponse>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| format!("ledger HTTP {status}: {body}"));

    if status == 402 {
        Err(LedgerError::InsufficientFunds(message))
    } else {
        Err(LedgerError::Rejected(message))
    }
}
