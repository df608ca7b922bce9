//! NeoMarket storefront WASM frontend.
//!
//! The storefront core runs in the page; this crate binds the DOM, wraps the injected wallet,
//! renders instructions and raises intents. Each concern lives in its own module.

pub mod app;
pub mod dom;
pub mod events;
pub mod host;
pub mod ledger;
pub mod markup;
pub mod provider;
pub mod render;

use gloo_net::http::Request;
use nm_api_types::{CatalogItem, Intent, Notice};
use nm_market_core::{Storefront, StorefrontConfig, StorefrontHooks};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

/// Catalog location: `data-catalog-url` on `<body>`, else `catalog.json` next to the page.
fn catalog_url() -> String {
    dom::document()
        .body()
        .and_then(|body| body.get_attribute("data-catalog-url"))
        .unwrap_or_else(|| "catalog.json".to_string())
}

async fn fetch_catalog(url: &str) -> Result<Vec<CatalogItem>, String> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !response.ok() {
        return Err(format!("{} {}", response.status(), response.status_text()));
    }
    response
        .json::<Vec<CatalogItem>>()
        .await
        .map_err(|e| format!("catalog parse error: {e}"))
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    let config = StorefrontConfig::default();

    let ledger = ledger::FetchLedger::new(ledger::ledger_url());
    gloo_console::log!(format!("ledger endpoint {}", ledger.endpoint()));

    let market = Storefront::new(
        provider::EthereumProvider::default(),
        ledger,
        StorefrontHooks {
            user_data: Rc::new(host::BalancePanel::new(els.clone())),
            host: Rc::new(host::BrowserHost),
            presenter: Rc::new(render::DomPresenter::new(els.clone())),
        },
        &config,
    );
    app::install(Rc::new(market));
    events::bind_events(&els, &config);

    let url = catalog_url();
    match fetch_catalog(&url).await {
        Ok(items) => app::raise(Intent::Load { items }),
        Err(err) => {
            gloo_console::error!(format!("catalog {url} not loaded: {err}"));
            render::show_toast(&Notice::error("Failed to load the catalog"));
        }
    }

    Ok(())
}
