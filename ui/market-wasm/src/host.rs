//! Page-level collaborators: full reload and the account's balance panel.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use nm_api_types::AccountId;
use nm_provider_client::{AppHost, UserDataService};

use crate::dom::{self, Elements};

pub struct BrowserHost;

impl AppHost for BrowserHost {
    fn reload(&self) {
        if let Err(err) = dom::window().location().reload() {
            gloo_console::error!("reload failed", err);
        }
    }
}

/// Fills the balance panel for the active account.
///
/// There is no balance endpoint yet, so the panel shows the starter allowance after a short
/// delay.
pub struct BalancePanel {
    els: Elements,
}

impl BalancePanel {
    pub const STARTER_POGS: &'static str = "1,000 POGs";
    pub const STARTER_Y2K: &'static str = "500 Y2K";

    pub fn new(els: Elements) -> Self {
        Self { els }
    }
}

#[async_trait(?Send)]
impl UserDataService for BalancePanel {
    async fn refresh(&self, account_id: &AccountId) -> Result<()> {
        TimeoutFuture::new(1_000).await;
        if dom::by_id("pogsBalance").is_none() {
            return Err(anyhow!("balance panel missing for {account_id}"));
        }
        self.els.pogs_balance.set_text_content(Some(Self::STARTER_POGS));
        self.els.y2k_balance.set_text_content(Some(Self::STARTER_Y2K));
        Ok(())
    }
}
