//! Intent dispatcher tying the components to their collaborators.
//!
//! All state sits in one `RefCell` and every method takes `&self`, so several operations can
//! be in flight on the same thread. A borrow is never held across an `.await`.

use nm_api_types::{
    AccountId, CatalogItem, FilterPatch, Intent, ItemId, Notice, ProviderEvent, RenderInstruction,
    Session, TxRef,
};
use nm_provider_client::{AppHost, IdentityProvider, LedgerService, Presenter, UserDataService};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::error::MarketError;
use crate::projector::ViewProjector;
use crate::purchase::TransactionCoordinator;
use crate::session::{AccountsChange, SessionController};

/// Collaborators without a suspension point the core has to reason about.
pub struct StorefrontHooks {
    pub user_data: Rc<dyn UserDataService>,
    pub host: Rc<dyn AppHost>,
    pub presenter: Rc<dyn Presenter>,
}

#[derive(Default)]
struct MarketState {
    catalog: CatalogStore,
    session: SessionController,
    purchases: TransactionCoordinator,
}

pub struct Storefront<I, L> {
    identity: I,
    ledger: L,
    hooks: StorefrontHooks,
    projector: ViewProjector,
    state: RefCell<MarketState>,
}

impl<I, L> Storefront<I, L>
where
    I: IdentityProvider,
    L: LedgerService,
{
    pub fn new(identity: I, ledger: L, hooks: StorefrontHooks, config: &StorefrontConfig) -> Self {
        Self {
            identity,
            ledger,
            hooks,
            projector: ViewProjector::new(config),
            state: RefCell::new(MarketState::default()),
        }
    }

    /// Handle one presentation intent. Failures have already been rendered as notices by the
    /// time this returns; the error is handed back for callers that want it.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), MarketError> {
        let result = match intent {
            Intent::Load { items } => {
                self.load(items);
                Ok(())
            }
            Intent::SetFilter { patch } => {
                self.set_filter(patch);
                Ok(())
            }
            Intent::Connect => self.connect().await,
            Intent::Disconnect => {
                self.disconnect();
                Ok(())
            }
            Intent::Purchase { item_id } => self.purchase(item_id).await.map(|_| ()),
        };
        match result {
            Err(err) if err.is_internal() => Ok(()),
            other => other,
        }
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged { accounts } => self.accounts_changed(&accounts).await,
            ProviderEvent::ChainChanged => self.chain_changed(),
        }
    }

    pub fn load(&self, items: Vec<CatalogItem>) {
        self.state.borrow_mut().catalog.load(items);
        self.render(None);
    }

    /// Returns the new visible set.
    pub fn set_filter(&self, patch: FilterPatch) -> Vec<CatalogItem> {
        let visible = {
            let mut state = self.state.borrow_mut();
            state.catalog.set_filter(patch).into_iter().cloned().collect()
        };
        self.render(None);
        visible
    }

    pub async fn connect(&self) -> Result<(), MarketError> {
        let Some(ticket) = self.state.borrow_mut().session.begin_connect() else {
            return Ok(());
        };
        self.render(None);

        let response = self.identity.request_accounts().await;

        let outcome = self.state.borrow_mut().session.complete_connect(ticket, response);
        match outcome {
            Ok(account_id) => {
                self.identity.subscribe();
                self.render(Some(Notice::success("Wallet connected successfully!")));
                self.refresh_user_data(&account_id).await;
                Ok(())
            }
            Err(MarketError::StaleResponse) => {
                debug!("connect response arrived after the session moved on");
                Err(MarketError::StaleResponse)
            }
            Err(err) => {
                self.render(Some(Notice::error(err.to_string())));
                Err(err)
            }
        }
    }

    pub fn disconnect(&self) {
        let outcome = self.state.borrow_mut().session.disconnect();
        if outcome.unsubscribe {
            self.identity.unsubscribe();
        }
        let notice = outcome.changed.then(|| Notice::info("Wallet disconnected"));
        self.render(notice);
    }

    pub async fn purchase(&self, item_id: ItemId) -> Result<TxRef, MarketError> {
        let begun = {
            let mut state = self.state.borrow_mut();
            let MarketState {
                catalog,
                session,
                purchases,
            } = &mut *state;
            purchases.begin(item_id, session.session(), catalog)
        };
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(err) => {
                self.render(Some(Notice::error(err.to_string())));
                return Err(err);
            }
        };
        self.render(None);

        let result = self.ledger.submit(ticket.request()).await;

        let mapped = result.clone().map_err(MarketError::from);
        self.state.borrow_mut().purchases.complete(ticket, result);
        match &mapped {
            Ok(_) => self.render(Some(Notice::success("Purchase successful!"))),
            Err(err) => self.render(Some(Notice::error(format!("Purchase failed: {err}")))),
        }
        mapped
    }

    pub async fn accounts_changed(&self, accounts: &[AccountId]) {
        let change = self.state.borrow_mut().session.accounts_changed(accounts);
        match change {
            AccountsChange::Ignored | AccountsChange::Unchanged => {}
            AccountsChange::Disconnected => {
                self.identity.unsubscribe();
                self.render(Some(Notice::info("Wallet disconnected")));
            }
            AccountsChange::Switched(account_id) => {
                self.render(Some(Notice::info("Account changed")));
                self.refresh_user_data(&account_id).await;
            }
        }
    }

    pub fn chain_changed(&self) {
        self.hooks.host.reload();
    }

    pub fn session(&self) -> Session {
        self.state.borrow().session.session().clone()
    }

    pub fn visible(&self) -> Vec<CatalogItem> {
        self.state.borrow().catalog.visible().into_iter().cloned().collect()
    }

    pub fn featured(&self) -> Vec<CatalogItem> {
        self.state.borrow().catalog.featured().into_iter().cloned().collect()
    }

    pub fn in_flight(&self) -> Vec<ItemId> {
        self.state.borrow().purchases.in_flight()
    }

    /// Current render instruction without a transient message.
    pub fn snapshot(&self) -> RenderInstruction {
        self.project(None)
    }

    async fn refresh_user_data(&self, account_id: &AccountId) {
        if let Err(err) = self.hooks.user_data.refresh(account_id).await {
            warn!(account = %account_id, error = %err, "user data refresh failed");
            // the account may have been switched or disconnected while we waited
            if self.session().account_id() == Some(account_id) {
                self.render(Some(Notice::error("Error loading user data")));
            }
        }
    }

    fn project(&self, notice: Option<&Notice>) -> RenderInstruction {
        let state = self.state.borrow();
        self.projector.project(
            &state.catalog,
            state.session.session(),
            &state.purchases,
            notice,
        )
    }

    fn render(&self, notice: Option<Notice>) {
        let instruction = self.project(notice.as_ref());
        self.hooks.presenter.render(&instruction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nm_api_types::{Category, NoticeKind, RarityTier, SessionStatus, SortKey};
    use nm_provider_client::sim::{
        RecordingHost, RecordingPresenter, SimulatedIdentity, SimulatedLedger, SimulatedUserData,
    };
    use nm_provider_client::{IdentityError, LedgerError};

    struct Harness {
        identity: Rc<SimulatedIdentity>,
        ledger: Rc<SimulatedLedger>,
        user_data: Rc<SimulatedUserData>,
        host: Rc<RecordingHost>,
        presenter: Rc<RecordingPresenter>,
        store: Storefront<Rc<SimulatedIdentity>, Rc<SimulatedLedger>>,
    }

    fn harness(identity: SimulatedIdentity) -> Harness {
        let identity = Rc::new(identity);
        let ledger = Rc::new(SimulatedLedger::new(1_000));
        let user_data = Rc::new(SimulatedUserData::default());
        let host = Rc::new(RecordingHost::default());
        let presenter = Rc::new(RecordingPresenter::default());
        let store = Storefront::new(
            identity.clone(),
            ledger.clone(),
            StorefrontHooks {
                user_data: user_data.clone(),
                host: host.clone(),
                presenter: presenter.clone(),
            },
            &StorefrontConfig::default(),
        );
        store.load(vec![
            bot(1, RarityTier::Legendary, 1000),
            bot(2, RarityTier::Epic, 750),
        ]);
        Harness {
            identity,
            ledger,
            user_data,
            host,
            presenter,
            store,
        }
    }

    fn bot(id: u64, rarity: RarityTier, price: u64) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            name: format!("CyberNeoBot #00{id}"),
            category: Category::new("neobot"),
            rarity,
            price,
            attributes: Default::default(),
            image: None,
        }
    }

    fn alice() -> AccountId {
        AccountId("0x71C7656EC7ab88b098defB751B7401B5f6d8976F".into())
    }

    fn last_notice(presenter: &RecordingPresenter) -> Option<Notice> {
        presenter.last().and_then(|frame| frame.message)
    }

    #[tokio::test]
    async fn connect_subscribes_and_refreshes_user_data() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));

        h.store.connect().await.unwrap();

        assert_eq!(h.store.session().account_id(), Some(&alice()));
        assert!(h.identity.is_subscribed());
        assert_eq!(h.user_data.refreshed(), vec![alice()]);
        let frames = h.presenter.frames();
        let connecting = &frames[frames.len() - 2];
        assert_eq!(connecting.progress.as_deref(), Some("Connecting wallet..."));
        assert_eq!(
            last_notice(&h.presenter),
            Some(Notice::success("Wallet connected successfully!"))
        );
    }

    #[tokio::test]
    async fn connect_while_connected_does_not_ask_provider_again() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();
        h.store.connect().await.unwrap();
        assert_eq!(h.identity.request_count(), 1);
    }

    #[tokio::test]
    async fn missing_wallet_fails_with_install_hint() {
        let h = harness(SimulatedIdentity::unavailable());

        let err = h.store.connect().await.unwrap_err();
        assert!(matches!(err, MarketError::ProviderUnavailable(_)));
        assert_eq!(h.store.session().status(), SessionStatus::Failed);
        let notice = last_notice(&h.presenter).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Please install a Web3 wallet to connect");
    }

    #[tokio::test]
    async fn user_rejection_is_shown_verbatim() {
        let identity = SimulatedIdentity::new(vec![alice()]);
        identity.fail_with(IdentityError::UserRejected("User rejected the request.".into()));
        let h = harness(identity);

        assert!(h.store.dispatch(Intent::Connect).await.is_err());
        assert_eq!(
            last_notice(&h.presenter).map(|n| n.text),
            Some("User rejected the request.".to_owned())
        );
    }

    #[tokio::test]
    async fn purchase_debits_ledger_and_reports_success() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();

        let tx_ref = h.store.purchase(ItemId(2)).await.unwrap();
        assert!(tx_ref.0.starts_with("txn_"));
        assert_eq!(h.ledger.balance(&alice()), 250);
        assert!(h.store.in_flight().is_empty());
        assert_eq!(
            last_notice(&h.presenter),
            Some(Notice::success("Purchase successful!"))
        );
    }

    #[tokio::test]
    async fn ledger_failure_is_prefixed_and_frees_the_item() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();
        h.ledger.fail_next(LedgerError::Rejected("item sold out".into()));

        let err = h.store.purchase(ItemId(1)).await.unwrap_err();
        assert_eq!(err, MarketError::Rejected("item sold out".into()));
        assert_eq!(
            last_notice(&h.presenter).map(|n| n.text),
            Some("Purchase failed: item sold out".to_owned())
        );

        // the balance covers item 1 exactly
        assert!(h.store.purchase(ItemId(1)).await.is_ok());
        assert_eq!(h.ledger.balance(&alice()), 0);
    }

    #[tokio::test]
    async fn insufficient_funds_surfaces_ledger_message() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();
        h.store.purchase(ItemId(2)).await.unwrap();

        let err = h.store.purchase(ItemId(1)).await.unwrap_err();
        assert!(matches!(err, MarketError::InsufficientFunds(_)));
        let text = last_notice(&h.presenter).map(|n| n.text).unwrap_or_default();
        assert!(text.starts_with("Purchase failed: insufficient funds"));
    }

    #[tokio::test]
    async fn disconnect_notice_only_when_something_changed() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();

        h.store.disconnect();
        assert!(!h.identity.is_subscribed());
        assert_eq!(
            last_notice(&h.presenter),
            Some(Notice::info("Wallet disconnected"))
        );

        h.store.disconnect();
        assert_eq!(last_notice(&h.presenter), None);
    }

    #[tokio::test]
    async fn reconnect_uses_the_wallet_current_account() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();
        h.store.disconnect();

        let bob = AccountId("0xb0b".into());
        h.identity.set_accounts(vec![bob.clone(), alice()]);
        h.store.connect().await.unwrap();

        assert_eq!(h.store.session().account_id(), Some(&bob));
        assert_eq!(h.identity.request_count(), 2);
        assert_eq!(h.user_data.refreshed(), vec![alice(), bob]);
    }

    #[tokio::test]
    async fn account_switch_refreshes_and_empty_list_disconnects() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.connect().await.unwrap();
        let bob = AccountId("0xb0b".into());

        h.store
            .handle_event(ProviderEvent::AccountsChanged {
                accounts: vec![bob.clone()],
            })
            .await;
        assert_eq!(h.store.session().account_id(), Some(&bob));
        assert_eq!(h.user_data.refreshed(), vec![alice(), bob]);
        assert_eq!(last_notice(&h.presenter), Some(Notice::info("Account changed")));

        h.store
            .handle_event(ProviderEvent::AccountsChanged { accounts: vec![] })
            .await;
        assert_eq!(h.store.session(), Session::Disconnected);
        assert!(!h.identity.is_subscribed());
    }

    #[tokio::test]
    async fn user_data_failure_is_reported_for_active_account() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.user_data.set_failing(true);

        h.store.connect().await.unwrap();
        assert_eq!(
            last_notice(&h.presenter),
            Some(Notice::error("Error loading user data"))
        );
        assert_eq!(h.store.session().account_id(), Some(&alice()));
    }

    #[tokio::test]
    async fn chain_change_reloads_host() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store.handle_event(ProviderEvent::ChainChanged).await;
        assert_eq!(h.host.reloads(), 1);
    }

    #[tokio::test]
    async fn filter_intent_rerenders_visible_set() {
        let h = harness(SimulatedIdentity::new(vec![alice()]));
        h.store
            .dispatch(Intent::SetFilter {
                patch: FilterPatch::sort(SortKey::PriceAscending),
            })
            .await
            .unwrap();

        let ids: Vec<ItemId> = h.store.visible().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId(2), ItemId(1)]);
        let frame = h.presenter.last().unwrap();
        assert_eq!(frame.catalog[0].id, ItemId(2));
        assert_eq!(frame.filter.sort_key, SortKey::PriceAscending);
        assert_eq!(h.store.featured().len(), 1);
    }
}
