//! Ledger client over `fetch`, speaking the same JSON contract as the native HTTP ledger.

use async_trait::async_trait;
use gloo_net::http::Request;
use nm_api_types::TxRef;
use nm_provider_client::wire::{self, PurchaseBody};
use nm_provider_client::{LedgerError, LedgerService, PurchaseRequest};

use crate::dom;

pub struct FetchLedger {
    endpoint: String,
}

impl FetchLedger {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Determine the ledger base URL.
///
/// Priority: `data-ledger-url` on `<body>` → same host on port `:3000`.
pub fn ledger_url() -> String {
    if let Some(url) = dom::document()
        .body()
        .and_then(|body| body.get_attribute("data-ledger-url"))
        .filter(|url| !url.trim().is_empty())
    {
        return url.trim().to_string();
    }

    let loc = dom::window().location();
    let host = loc.hostname().unwrap_or_default();
    let protocol = loc.protocol().unwrap_or_else(|_| "http:".into());
    format!("{}//{}:3000", protocol, host)
}

#[async_trait(?Send)]
impl LedgerService for FetchLedger {
    async fn submit(&self, req: PurchaseRequest) -> Result<TxRef, LedgerError> {
        let url = format!("{}{}", self.endpoint, wire::PURCHASES_PATH);
        let response = Request::post(&url)
            .json(&PurchaseBody::from(&req))
            .map_err(|e| LedgerError::NetworkError(format!("request not built: {e}")))?
            .send()
            .await
            .map_err(|e| LedgerError::NetworkError(format!("ledger unreachable: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerError::NetworkError(format!("ledger response truncated: {e}")))?;

        wire::classify(status, &text)
    }
}
