//! Interleaving scenarios: collaborators answer only when the test releases them, and
//! `tokio::join!` runs both sides on the test's single thread.

use async_trait::async_trait;
use nm_api_types::{
    AccountId, BuyState, CatalogItem, Category, Intent, ItemId, Notice, ProviderEvent, RarityTier,
    Session, SessionStatus, TxRef,
};
use nm_market_core::{MarketError, Storefront, StorefrontConfig, StorefrontHooks};
use nm_provider_client::sim::{RecordingHost, RecordingPresenter, SimulatedUserData};
use nm_provider_client::{
    IdentityError, IdentityProvider, LedgerError, LedgerService, PurchaseRequest,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::oneshot;

type AccountsReply = Result<Vec<AccountId>, IdentityError>;
type LedgerReply = Result<TxRef, LedgerError>;

/// Identity provider whose answers are handed out one gate per request.
#[derive(Default)]
struct GatedIdentity {
    gates: RefCell<VecDeque<oneshot::Receiver<AccountsReply>>>,
    requests: Cell<usize>,
    subscribed: Cell<bool>,
}

impl GatedIdentity {
    fn gate(&self) -> oneshot::Sender<AccountsReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }
}

#[async_trait(?Send)]
impl IdentityProvider for GatedIdentity {
    async fn request_accounts(&self) -> AccountsReply {
        self.requests.set(self.requests.get() + 1);
        let gate = self.gates.borrow_mut().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(IdentityError::ProviderUnavailable("gate dropped".into()))),
            None => Err(IdentityError::ProviderUnavailable("no gate".into())),
        }
    }

    fn subscribe(&self) {
        self.subscribed.set(true);
    }

    fn unsubscribe(&self) {
        self.subscribed.set(false);
    }
}

/// Ledger that blocks on a gate when one is queued and accepts immediately otherwise.
#[derive(Default)]
struct GatedLedger {
    gates: RefCell<VecDeque<oneshot::Receiver<LedgerReply>>>,
    calls: RefCell<Vec<PurchaseRequest>>,
}

impl GatedLedger {
    fn gate(&self) -> oneshot::Sender<LedgerReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }

    fn calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl LedgerService for GatedLedger {
    async fn submit(&self, req: PurchaseRequest) -> LedgerReply {
        let sequence = {
            let mut calls = self.calls.borrow_mut();
            calls.push(req);
            calls.len()
        };
        let gate = self.gates.borrow_mut().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(LedgerError::NetworkError("gate dropped".into()))),
            None => Ok(TxRef(format!("txn_auto_{sequence}"))),
        }
    }
}

struct Fixture {
    identity: Rc<GatedIdentity>,
    ledger: Rc<GatedLedger>,
    host: Rc<RecordingHost>,
    presenter: Rc<RecordingPresenter>,
    store: Storefront<Rc<GatedIdentity>, Rc<GatedLedger>>,
}

fn neobot(id: u64, rarity: RarityTier, price: u64) -> CatalogItem {
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

fn fixture() -> Fixture {
    let identity = Rc::new(GatedIdentity::default());
    let ledger = Rc::new(GatedLedger::default());
    let host = Rc::new(RecordingHost::default());
    let presenter = Rc::new(RecordingPresenter::default());
    let store = Storefront::new(
        identity.clone(),
        ledger.clone(),
        StorefrontHooks {
            user_data: Rc::new(SimulatedUserData::default()),
            host: host.clone(),
            presenter: presenter.clone(),
        },
        &StorefrontConfig::default(),
    );
    store.load(vec![
        neobot(1, RarityTier::Legendary, 1000),
        neobot(2, RarityTier::Epic, 750),
    ]);
    Fixture {
        identity,
        ledger,
        host,
        presenter,
        store,
    }
}

fn buyer() -> AccountId {
    AccountId("0x71C7656EC7ab88b098defB751B7401B5f6d8976F".into())
}

async fn connected_fixture() -> Fixture {
    let f = fixture();
    f.identity.gate().send(Ok(vec![buyer()])).unwrap();
    f.store.connect().await.unwrap();
    f
}

#[tokio::test]
async fn disconnect_before_provider_answers_keeps_session_disconnected() {
    let f = fixture();
    let reply = f.identity.gate();

    let (connected, ()) = tokio::join!(f.store.connect(), async {
        assert_eq!(f.store.session().status(), SessionStatus::Connecting);
        f.store.disconnect();
        reply.send(Ok(vec![buyer()])).unwrap();
    });

    assert_eq!(connected, Err(MarketError::StaleResponse));
    assert_eq!(f.store.session(), Session::Disconnected);
    assert!(!f.identity.subscribed.get());

    // the stale answer must not have produced a success notice
    let notices: Vec<Notice> = f
        .presenter
        .frames()
        .into_iter()
        .filter_map(|frame| frame.message)
        .collect();
    assert_eq!(notices, vec![Notice::info("Wallet disconnected")]);
}

#[tokio::test]
async fn stale_connect_is_swallowed_by_dispatch() {
    let f = fixture();
    let reply = f.identity.gate();

    let (dispatched, ()) = tokio::join!(f.store.dispatch(Intent::Connect), async {
        f.store.dispatch(Intent::Disconnect).await.unwrap();
        reply.send(Ok(vec![buyer()])).unwrap();
    });

    assert_eq!(dispatched, Ok(()));
    assert_eq!(f.store.session(), Session::Disconnected);
}

#[tokio::test]
async fn old_answer_cannot_complete_a_newer_connect() {
    let f = fixture();
    let first = f.identity.gate();
    let second = f.identity.gate();

    let (old, new, ()) = tokio::join!(
        f.store.connect(),
        async {
            f.store.disconnect();
            f.store.connect().await
        },
        async {
            first.send(Ok(vec![AccountId("0xold".into())])).unwrap();
            second.send(Ok(vec![buyer()])).unwrap();
        }
    );

    assert_eq!(old, Err(MarketError::StaleResponse));
    assert_eq!(new, Ok(()));
    assert_eq!(f.store.session().account_id(), Some(&buyer()));
}

#[tokio::test]
async fn second_connect_while_pending_is_ignored() {
    let f = fixture();
    let reply = f.identity.gate();

    let (first, second) = tokio::join!(f.store.connect(), async {
        let outcome = f.store.connect().await;
        reply.send(Ok(vec![buyer()])).unwrap();
        outcome
    });

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(f.identity.requests.get(), 1);
}

#[tokio::test]
async fn accounts_changed_while_connecting_is_ignored() {
    let f = fixture();
    let reply = f.identity.gate();

    let (connected, ()) = tokio::join!(f.store.connect(), async {
        f.store
            .handle_event(ProviderEvent::AccountsChanged {
                accounts: vec![AccountId("0xother".into())],
            })
            .await;
        reply.send(Ok(vec![buyer()])).unwrap();
    });

    assert_eq!(connected, Ok(()));
    assert_eq!(f.store.session().account_id(), Some(&buyer()));
}

#[tokio::test]
async fn purchase_is_single_flight_per_item() {
    let f = connected_fixture().await;
    let reply = f.ledger.gate();

    let (first, ()) = tokio::join!(f.store.purchase(ItemId(1)), async {
        assert_eq!(f.store.in_flight(), vec![ItemId(1)]);
        let snapshot = f.store.snapshot();
        let card = snapshot.catalog.iter().find(|card| card.id == ItemId(1)).unwrap();
        assert_eq!(card.buy, BuyState::Pending);
        assert_eq!(snapshot.progress.as_deref(), Some("Processing purchase..."));

        let second = f.store.purchase(ItemId(1)).await;
        assert_eq!(second, Err(MarketError::AlreadyInFlight(ItemId(1))));
        reply.send(Ok(TxRef("txn_first".into()))).unwrap();
    });

    assert_eq!(first, Ok(TxRef("txn_first".into())));
    assert_eq!(f.ledger.calls(), 1);
    assert!(f.store.in_flight().is_empty());

    let third = f.store.purchase(ItemId(1)).await;
    assert!(third.is_ok());
    assert_eq!(f.ledger.calls(), 2);
}

#[tokio::test]
async fn different_items_proceed_concurrently() {
    let f = connected_fixture().await;
    let one = f.ledger.gate();
    let two = f.ledger.gate();

    let (first, second, ()) = tokio::join!(
        f.store.purchase(ItemId(1)),
        f.store.purchase(ItemId(2)),
        async {
            assert_eq!(f.store.in_flight(), vec![ItemId(1), ItemId(2)]);
            two.send(Err(LedgerError::InsufficientFunds("balance too low".into())))
                .unwrap();
            one.send(Ok(TxRef("txn_one".into()))).unwrap();
        }
    );

    assert_eq!(first, Ok(TxRef("txn_one".into())));
    assert_eq!(
        second,
        Err(MarketError::InsufficientFunds("balance too low".into()))
    );
    assert!(f.store.in_flight().is_empty());
}

#[tokio::test]
async fn purchase_while_disconnected_never_reaches_ledger() {
    let f = fixture();

    let err = f.store.purchase(ItemId(1)).await.unwrap_err();

    assert_eq!(err, MarketError::NotConnected);
    assert_eq!(f.ledger.calls(), 0);
    assert_eq!(
        f.presenter.last().and_then(|frame| frame.message),
        Some(Notice::error("Please connect your wallet first"))
    );
}

#[tokio::test]
async fn purchase_result_still_lands_after_disconnect() {
    let f = connected_fixture().await;
    let reply = f.ledger.gate();

    let (result, ()) = tokio::join!(f.store.purchase(ItemId(2)), async {
        f.store.disconnect();
        reply.send(Ok(TxRef("txn_late".into()))).unwrap();
    });

    assert_eq!(result, Ok(TxRef("txn_late".into())));
    assert_eq!(f.store.session(), Session::Disconnected);
    assert!(f.store.in_flight().is_empty());
    let last = f.presenter.last().unwrap();
    assert_eq!(last.message, Some(Notice::success("Purchase successful!")));
    assert!(last.catalog.iter().all(|card| card.buy == BuyState::WalletRequired));
}

#[tokio::test]
async fn chain_change_asks_host_to_reload() {
    let f = connected_fixture().await;
    f.store.handle_event(ProviderEvent::ChainChanged).await;
    assert_eq!(f.host.reloads(), 1);
}
