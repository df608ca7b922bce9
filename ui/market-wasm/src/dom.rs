//! DOM element bindings.
//!
//! All fields are resolved once at startup. To add new UI elements, add a field here and bind
//! it in `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

// ── Helpers ──

pub fn window() -> web_sys::Window {
    gloo_utils::window()
}

pub fn document() -> Document {
    gloo_utils::document()
}

pub fn by_id(id: &str) -> Option<Element> {
    document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn query(selector: &str) -> Option<Element> {
    document().query_selector(selector).ok()?
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document().create_element(tag)
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn get_select_value(el: &HtmlSelectElement) -> String {
    el.value()
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn remove_class(el: &Element, cls: &str) {
    let _ = el.class_list().remove_1(cls);
}

pub fn set_display(el: &HtmlElement, value: &str) {
    let _ = el.style().set_property("display", value);
}

pub fn set_opacity(el: &HtmlElement, value: &str) {
    let _ = el.style().set_property("opacity", value);
}

/// Value of `data-{name}` on the element or its closest ancestor carrying it.
pub fn closest_data(el: &Element, name: &str) -> Option<String> {
    let selector = format!("[data-{name}]");
    el.closest(&selector).ok()??.get_attribute(&format!("data-{name}"))
}

// ── Elements struct ──

/// All DOM element references used by the storefront.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Wallet
    pub connect_wallet: HtmlElement,
    pub disconnect_wallet: HtmlElement,
    pub wallet_info: HtmlElement,
    pub wallet_address: Element,
    pub pogs_balance: Element,
    pub y2k_balance: Element,

    // Catalog
    pub nft_grid: Element,
    pub featured_carousel: Element,
    pub carousel_prev: HtmlElement,
    pub carousel_next: HtmlElement,

    // Filters
    pub search_input: HtmlInputElement,
    pub category_filter: HtmlSelectElement,
    pub rarity_filter: HtmlSelectElement,
    pub price_filter: HtmlSelectElement,

    // Overlays
    pub loading_screen: HtmlElement,
    pub loading_text: Element,
    pub nft_modal: Element,
    pub modal_content: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_select {
    ($id:expr) => {
        by_id_typed::<HtmlSelectElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing select #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

macro_rules! query_el {
    ($selector:expr) => {
        query($selector).ok_or_else(|| JsValue::from_str(&format!("missing {}", $selector)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        let nft_modal = get_el!("nftModal");
        let modal_content = nft_modal
            .query_selector(".nft-preview")?
            .ok_or_else(|| JsValue::from_str("missing #nftModal .nft-preview"))?;

        Ok(Elements {
            connect_wallet: get_html!("connectWallet"),
            disconnect_wallet: get_html!("disconnectWallet"),
            wallet_info: query_el!(".wallet-info").dyn_into()?,
            wallet_address: get_el!("walletAddress"),
            pogs_balance: get_el!("pogsBalance"),
            y2k_balance: get_el!("y2kBalance"),

            nft_grid: get_el!("nftGrid"),
            featured_carousel: get_el!("featuredCarousel"),
            carousel_prev: query_el!(".control-btn.prev").dyn_into()?,
            carousel_next: query_el!(".control-btn.next").dyn_into()?,

            search_input: get_input!("searchInput"),
            category_filter: get_select!("categoryFilter"),
            rarity_filter: get_select!("rarityFilter"),
            price_filter: get_select!("priceFilter"),

            loading_screen: get_html!("loadingScreen"),
            loading_text: query_el!("#loadingScreen .loading-text"),
            nft_modal,
            modal_content,
        })
    }
}
