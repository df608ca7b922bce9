//! Page-wide state.
//!
//! The storefront lives in a `thread_local!` (WASM is single-threaded) so DOM and wallet
//! callbacks can reach it without owning it. Carousel scroll position is purely visual and
//! kept beside it.

use nm_api_types::{BuyState, CatalogItem, Intent, ProviderEvent};
use nm_market_core::Storefront;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ledger::FetchLedger;
use crate::provider::EthereumProvider;

pub type Market = Storefront<EthereumProvider, FetchLedger>;

/// Cards visible at once in the featured carousel.
pub const CAROUSEL_WINDOW: usize = 3;
/// Width of one featured card plus gap, in pixels.
pub const CAROUSEL_CARD_PX: f64 = 320.0;

// ── Thread-local singleton ──

thread_local! {
    static MARKET: RefCell<Option<Rc<Market>>> = const { RefCell::new(None) };
    static CAROUSEL: Cell<usize> = const { Cell::new(0) };
}

pub fn install(market: Rc<Market>) {
    MARKET.with(|m| *m.borrow_mut() = Some(market));
}

pub fn market() -> Option<Rc<Market>> {
    MARKET.with(|m| m.borrow().clone())
}

/// Hand an intent to the storefront without blocking the caller.
pub fn raise(intent: Intent) {
    let Some(market) = market() else {
        gloo_console::warn!("storefront not ready, intent dropped");
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        // failures were already shown as toasts
        let _ = market.dispatch(intent).await;
    });
}

pub fn raise_event(event: ProviderEvent) {
    let Some(market) = market() else {
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        market.handle_event(event).await;
    });
}

pub fn find_item(id: u64) -> Option<CatalogItem> {
    let market = market()?;
    market
        .visible()
        .into_iter()
        .chain(market.featured())
        .find(|item| item.id.0 == id)
}

/// Buy state the current frame shows for `id`, if it has a card.
pub fn buy_state(id: u64) -> Option<BuyState> {
    let frame = market()?.snapshot();
    frame
        .catalog
        .iter()
        .chain(&frame.featured)
        .find(|card| card.id.0 == id)
        .map(|card| card.buy)
}

/// Move the carousel by `step` cards, clamped to the featured list. Returns the new position.
pub fn step_carousel(step: isize, featured: usize) -> usize {
    let max = featured.saturating_sub(CAROUSEL_WINDOW);
    CAROUSEL.with(|pos| {
        let next = pos.get().saturating_add_signed(step).min(max);
        pos.set(next);
        next
    })
}
