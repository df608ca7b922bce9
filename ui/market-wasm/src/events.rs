//! Event binding.
//!
//! Turns clicks and input into storefront intents. Anything touching the storefront goes
//! through `app::raise`, which spawns the dispatch with `wasm_bindgen_futures::spawn_local`.

use nm_api_types::{BuyState, Category, FilterPatch, Intent, ItemId, RarityTier, Selection, SortKey};
use nm_market_core::StorefrontConfig;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, EventTarget, ScrollBehavior, ScrollToOptions};

use crate::app;
use crate::dom::{self, Elements};
use crate::markup;

/// Helper: attach a handler for `$event` to an element.
macro_rules! on {
    ($el:expr, $event:expr, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::Event)>);
        if let Err(err) = $el.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref()) {
            gloo_console::error!("listener not attached", err);
        }
        cb.forget();
    }};
}

/// Helper: click handler that only raises an intent.
macro_rules! on_click_intent {
    ($el:expr, $intent:expr) => {
        on!($el, "click", move |_: web_sys::Event| app::raise($intent))
    };
}

/// Parse a `<select>` value through the same serde rules the wire format uses.
fn parse_select<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_owned())).ok()
}

fn target_element(event: &web_sys::Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements, config: &StorefrontConfig) {
    // ── Wallet ──
    on_click_intent!(els.connect_wallet, Intent::Connect);
    on_click_intent!(els.disconnect_wallet, Intent::Disconnect);

    // ── Filters ──
    {
        let input = els.search_input.clone();
        on!(els.search_input, "input", move |_: web_sys::Event| {
            app::raise(Intent::SetFilter {
                patch: FilterPatch::search(dom::get_input_value(&input)),
            });
        });
    }
    {
        let select = els.category_filter.clone();
        on!(els.category_filter, "change", move |_: web_sys::Event| {
            let value = dom::get_select_value(&select);
            if let Some(category) = parse_select::<Selection<Category>>(&value) {
                app::raise(Intent::SetFilter {
                    patch: FilterPatch {
                        category: Some(category),
                        ..FilterPatch::default()
                    },
                });
            }
        });
    }
    {
        let select = els.rarity_filter.clone();
        on!(els.rarity_filter, "change", move |_: web_sys::Event| {
            let value = dom::get_select_value(&select);
            match parse_select::<Selection<RarityTier>>(&value) {
                Some(rarity) => app::raise(Intent::SetFilter {
                    patch: FilterPatch {
                        rarity: Some(rarity),
                        ..FilterPatch::default()
                    },
                }),
                None => gloo_console::warn!(format!("unknown rarity option '{value}'")),
            }
        });
    }
    {
        let select = els.price_filter.clone();
        on!(els.price_filter, "change", move |_: web_sys::Event| {
            let value = dom::get_select_value(&select);
            if let Some(sort_key) = parse_select::<SortKey>(&value) {
                app::raise(Intent::SetFilter {
                    patch: FilterPatch::sort(sort_key),
                });
            }
        });
    }

    // ── Buy / preview (delegated, cards are re-rendered on every frame) ──
    {
        let els2 = els.clone();
        let currency = config.currency.clone();
        let document: EventTarget = dom::document().into();
        on!(document, "click", move |event: web_sys::Event| {
            let Some(target) = target_element(&event) else {
                return;
            };
            let id = dom::closest_data(&target, "id").and_then(|id| id.parse::<u64>().ok());
            let Some(id) = id else {
                return;
            };

            if target.class_list().contains("buy-btn") {
                dom::remove_class(&els2.nft_modal, "active");
                app::raise(Intent::Purchase { item_id: ItemId(id) });
            } else if target.class_list().contains("preview-btn") {
                if let Some(item) = app::find_item(id) {
                    let buy = app::buy_state(id).unwrap_or(BuyState::WalletRequired);
                    els2.modal_content.set_inner_html(&markup::preview(&item, buy, &currency));
                    dom::add_class(&els2.nft_modal, "active");
                }
            }
        });
    }

    // ── Modal: close on backdrop click ──
    {
        let modal = els.nft_modal.clone();
        on!(els.nft_modal, "click", move |event: web_sys::Event| {
            let on_backdrop = match (event.target(), event.current_target()) {
                (Some(target), Some(current)) => target == current,
                _ => false,
            };
            if on_backdrop {
                dom::remove_class(&modal, "active");
            }
        });
    }

    // ── Carousel ──
    for (button, step) in [(&els.carousel_prev, -1isize), (&els.carousel_next, 1)] {
        let carousel = els.featured_carousel.clone();
        on!(button, "click", move |_: web_sys::Event| {
            let featured = carousel.child_element_count() as usize;
            let position = app::step_carousel(step, featured);
            let opts = ScrollToOptions::new();
            opts.set_left(position as f64 * app::CAROUSEL_CARD_PX);
            opts.set_behavior(ScrollBehavior::Smooth);
            carousel.scroll_to_with_scroll_to_options(&opts);
        });
    }
}
