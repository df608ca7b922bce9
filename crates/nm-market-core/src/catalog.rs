//! Catalog Store: the loaded items plus the active filter.
//!
//! The visible set is recomputed from `(items, filter)` on every read and never cached, so
//! nothing but those two values can influence it.

use nm_api_types::{CatalogItem, Category, FilterPatch, FilterSpec, ItemId, SortKey};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    items: Vec<CatalogItem>,
    filter: FilterSpec,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole catalog and reset the filter to its defaults.
    pub fn load(&mut self, items: Vec<CatalogItem>) {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                warn!(item = %item.id, "catalog contains a duplicate item id");
            }
        }
        debug!(count = items.len(), "catalog loaded");
        self.items = items;
        self.filter = FilterSpec::default();
    }

    /// Merge `patch` into the active filter and return the new visible set.
    pub fn set_filter(&mut self, patch: FilterPatch) -> Vec<&CatalogItem> {
        self.filter.apply(patch);
        self.visible()
    }

    pub fn visible(&self) -> Vec<&CatalogItem> {
        derive_visible(&self.items, &self.filter)
    }

    /// Items of the highest rarity tier present, in catalog order.
    pub fn featured(&self) -> Vec<&CatalogItem> {
        let Some(top) = self.items.iter().map(|item| item.rarity).max() else {
            return Vec::new();
        };
        self.items.iter().filter(|item| item.rarity == top).collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        categories
    }
}

pub fn matches(item: &CatalogItem, filter: &FilterSpec) -> bool {
    if !filter.category.admits(&item.category) {
        return false;
    }
    if !filter.rarity.admits(&item.rarity) {
        return false;
    }
    let needle = filter.search_text.to_lowercase();
    item.name.to_lowercase().contains(&needle) || item.rarity.label().contains(&needle)
}

/// Filter then stable-sort. Equal keys keep catalog order.
pub fn derive_visible<'a>(items: &'a [CatalogItem], filter: &FilterSpec) -> Vec<&'a CatalogItem> {
    let mut visible: Vec<&CatalogItem> = items.iter().filter(|item| matches(item, filter)).collect();
    match filter.sort_key {
        SortKey::PriceAscending => visible.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceDescending => visible.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::RecencyDescending => visible.sort_by(|a, b| b.id.cmp(&a.id)),
    }
    visible
}
