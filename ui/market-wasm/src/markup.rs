//! HTML fragments for catalog cards, the featured carousel and the preview modal.
//!
//! Pure string building over render-instruction data, so it runs under native tests.

use nm_api_types::{BuyState, CatalogItem, Category, ItemCard, ItemId, Selection};

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x400/1a1a2e/ffffff?text=NeoMarket";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn buy_button(id: ItemId, buy: BuyState) -> String {
    let (label, disabled) = match buy {
        BuyState::Available => ("Buy Now", ""),
        BuyState::WalletRequired => ("Connect to Buy", ""),
        BuyState::Pending => ("Processing...", " disabled"),
    };
    format!(
        r#"<button class="cyber-button primary buy-btn" data-id="{}"{disabled}>{label}</button>"#,
        id.0
    )
}

fn rarity_badge(label: &str) -> String {
    format!(r#"<span class="rarity-badge rarity-{0}">{0}</span>"#, escape(label))
}

fn image(src: Option<&str>, alt: &str) -> String {
    format!(
        r#"<img src="{}" alt="{}">"#,
        escape(src.unwrap_or(PLACEHOLDER_IMAGE)),
        escape(alt)
    )
}

pub fn grid(cards: &[ItemCard]) -> String {
    cards.iter().map(grid_card).collect()
}

fn grid_card(card: &ItemCard) -> String {
    let attributes: String = card
        .attributes
        .iter()
        .map(|attr| {
            format!(
                r#"<div class="attribute"><span class="attribute-key">{}</span><span class="attribute-value">{}</span></div>"#,
                escape(&attr.label),
                escape(&attr.value)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<div class="nft-card" data-id="{id}">"#,
            r#"<div class="nft-image">{img}<div class="nft-overlay">"#,
            r#"<button class="preview-btn" data-id="{id}">Preview</button></div></div>"#,
            r#"<div class="nft-info"><h3>{name}</h3>{badge}"#,
            r#"<div class="nft-attributes">{attributes}</div>"#,
            r#"<div class="price-tag"><span class="price-amount">{price}</span>{buy}</div>"#,
            r#"</div></div>"#,
        ),
        id = card.id.0,
        img = image(card.image.as_deref(), &card.name),
        name = escape(&card.name),
        badge = rarity_badge(card.rarity.label()),
        attributes = attributes,
        price = escape(&card.price_label),
        buy = buy_button(card.id, card.buy),
    )
}

pub fn carousel(cards: &[ItemCard]) -> String {
    cards
        .iter()
        .map(|card| {
            format!(
                concat!(
                    r#"<div class="featured-card" data-id="{id}">"#,
                    r#"<div class="featured-image">{img}<div class="featured-overlay">{badge}</div></div>"#,
                    r#"<div class="featured-info"><h3>{name}</h3>"#,
                    r#"<div class="price-tag"><span class="price-amount">{price}</span>{buy}</div>"#,
                    r#"</div></div>"#,
                ),
                id = card.id.0,
                img = image(card.image.as_deref(), &card.name),
                badge = rarity_badge(card.rarity.label()),
                name = escape(&card.name),
                price = escape(&card.price_label),
                buy = buy_button(card.id, card.buy),
            )
        })
        .collect()
}

/// Full attribute list, unlike the catalog card. The buy button mirrors the card's state.
pub fn preview(item: &CatalogItem, buy: BuyState, currency: &str) -> String {
    let attributes: String = item
        .attributes
        .iter()
        .map(|(label, value)| {
            let value = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!(
                r#"<div class="attribute-item"><span class="attribute-key">{}</span><span class="attribute-value">{}</span></div>"#,
                escape(label),
                escape(&value)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<div class="preview-image">{img}</div>"#,
            r#"<div class="preview-info"><h2>{name}</h2>{badge}"#,
            r#"<div class="preview-attributes">{attributes}</div>"#,
            r#"<div class="preview-actions"><div class="price-tag"><span class="price-amount">{price} {currency}</span></div>"#,
            r#"{buy}</div>"#,
            r#"</div>"#,
        ),
        img = image(item.image.as_deref(), &item.name),
        name = escape(&item.name),
        badge = rarity_badge(item.rarity.label()),
        attributes = attributes,
        price = item.price,
        currency = escape(currency),
        buy = buy_button(item.id, buy),
    )
}

/// `<option>` list for the category select, "all" first.
pub fn category_options(categories: &[Category], active: &Selection<Category>) -> String {
    let selected = |is: bool| if is { " selected" } else { "" };
    let mut out = format!(
        r#"<option value="all"{}>All Categories</option>"#,
        selected(*active == Selection::All)
    );
    for category in categories {
        let is_active = matches!(active, Selection::Only(c) if c == category);
        out.push_str(&format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(&category.0),
            selected(is_active)
        ));
    }
    out
}
