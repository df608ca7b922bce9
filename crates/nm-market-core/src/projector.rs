//! View Projector: turns component state into a [`RenderInstruction`].
//!
//! `project` reads its inputs and nothing else. Two calls with equal inputs serialize to the
//! same bytes, which is what lets the presentation layer be swapped out and the core be
//! tested without a display.

use nm_api_types::{
    AttributeView, BuyState, CatalogItem, ItemCard, Notice, RenderInstruction, Session,
    SessionBadge,
};

use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::purchase::TransactionCoordinator;

pub const CONNECTING_PROGRESS: &str = "Connecting wallet...";
pub const PURCHASE_PROGRESS: &str = "Processing purchase...";

#[derive(Debug, Clone)]
pub struct ViewProjector {
    currency: String,
    attribute_preview: usize,
}

impl Default for ViewProjector {
    fn default() -> Self {
        Self::new(&StorefrontConfig::default())
    }
}

impl ViewProjector {
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            attribute_preview: config.attribute_preview,
        }
    }

    pub fn project(
        &self,
        catalog: &CatalogStore,
        session: &Session,
        purchases: &TransactionCoordinator,
        notice: Option<&Notice>,
    ) -> RenderInstruction {
        let card = |item: &CatalogItem| self.card(item, session, purchases);

        let progress = if matches!(session, Session::Connecting) {
            Some(CONNECTING_PROGRESS.to_owned())
        } else if !purchases.in_flight().is_empty() {
            Some(PURCHASE_PROGRESS.to_owned())
        } else {
            None
        };

        RenderInstruction {
            catalog: catalog.visible().into_iter().map(card).collect(),
            featured: catalog.featured().into_iter().map(card).collect(),
            categories: catalog.categories(),
            filter: catalog.filter().clone(),
            badge: badge(session),
            progress,
            message: notice.cloned(),
        }
    }

    fn card(&self, item: &CatalogItem, session: &Session, purchases: &TransactionCoordinator) -> ItemCard {
        let buy = if purchases.is_in_flight(item.id) {
            BuyState::Pending
        } else if session.account_id().is_none() {
            BuyState::WalletRequired
        } else {
            BuyState::Available
        };

        ItemCard {
            id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            rarity: item.rarity,
            price_label: format!("{} {}", item.price, self.currency),
            image: item.image.clone(),
            attributes: item
                .attributes
                .iter()
                .take(self.attribute_preview)
                .map(|(label, value)| AttributeView {
                    label: label.clone(),
                    value: display_value(value),
                })
                .collect(),
            buy,
        }
    }
}

fn badge(session: &Session) -> SessionBadge {
    match session {
        Session::Disconnected => SessionBadge::Disconnected,
        Session::Connecting => SessionBadge::Connecting,
        Session::Connected { account_id } => SessionBadge::Connected {
            short: account_id.short(),
            account_id: account_id.clone(),
        },
        Session::Failed { last_error } => SessionBadge::Failed {
            reason: last_error.clone(),
        },
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
