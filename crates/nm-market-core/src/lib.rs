pub mod catalog;
pub mod config;
pub mod error;
pub mod projector;
pub mod purchase;
pub mod session;
pub mod storefront;

pub use catalog::CatalogStore;
pub use config::StorefrontConfig;
pub use error::MarketError;
pub use projector::ViewProjector;
pub use purchase::TransactionCoordinator;
pub use session::SessionController;
pub use storefront::{Storefront, StorefrontHooks};
