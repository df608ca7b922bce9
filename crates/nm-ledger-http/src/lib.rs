use async_trait::async_trait;
use nm_api_types::TxRef;
use nm_provider_client::wire::{self, PurchaseBody};
use nm_provider_client::{LedgerError, LedgerService, PurchaseRequest};
use tracing::{debug, warn};

pub const DEFAULT_LEDGER_URL: &str = "http://localhost:3000";

/// HTTP adapter for the marketplace ledger.
///
/// Reads `NM_LEDGER_URL` from environment at construction time
/// (default: `http://localhost:3000`).
pub struct HttpLedger {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for HttpLedger {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpLedger {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("NM_LEDGER_URL").ok())
            .unwrap_or_else(|| DEFAULT_LEDGER_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl LedgerService for HttpLedger {
    async fn submit(&self, req: PurchaseRequest) -> Result<TxRef, LedgerError> {
        let url = format!("{}{}", self.endpoint, wire::PURCHASES_PATH);
        let response = self
            .http
            .post(&url)
            .json(&PurchaseBody::from(&req))
            .send()
            .await
            .map_err(|err| {
                warn!(item = %req.item_id, error = %err, "ledger transport failure");
                LedgerError::NetworkError(format!("ledger unreachable: {err}"))
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| LedgerError::NetworkError(format!("ledger response truncated: {err}")))?;

        debug!(item = %req.item_id, status, "ledger answered");
        wire::classify(status, &text)
    }
}
