use indexmap::IndexMap;
use serde::de::{self, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── Identifiers ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// `0x1234...abcd` style short form used on the session badge.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference returned by the ledger for an accepted purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TxRef(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

// ── Catalog ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RarityTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    pub fn label(self) -> &'static str {
        match self {
            RarityTier::Common => "common",
            RarityTier::Rare => "rare",
            RarityTier::Epic => "epic",
            RarityTier::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub rarity: RarityTier,
    pub price: u64,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Either every value ("all") or exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("all"),
            Selection::Only(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "all" {
            return Ok(Selection::All);
        }
        let inner: de::value::StringDeserializer<D::Error> = raw.into_deserializer();
        T::deserialize(inner).map(Selection::Only)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[serde(alias = "price-low")]
    PriceAscending,
    #[serde(alias = "price-high")]
    PriceDescending,
    #[default]
    #[serde(alias = "newest")]
    RecencyDescending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub search_text: String,
    pub category: Selection<Category>,
    pub rarity: Selection<RarityTier>,
    pub sort_key: SortKey,
}

/// Partial filter update; `None` fields keep their current value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FilterPatch {
    pub search_text: Option<String>,
    pub category: Option<Selection<Category>>,
    pub rarity: Option<Selection<RarityTier>>,
    pub sort_key: Option<SortKey>,
}

impl FilterPatch {
    pub fn sort(sort_key: SortKey) -> Self {
        Self {
            sort_key: Some(sort_key),
            ..Self::default()
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: Some(text.into()),
            ..Self::default()
        }
    }
}

impl FilterSpec {
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(search_text) = patch.search_text {
            self.search_text = search_text;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(rarity) = patch.rarity {
            self.rarity = rarity;
        }
        if let Some(sort_key) = patch.sort_key {
            self.sort_key = sort_key;
        }
    }
}

// ── Session ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Wallet session. The account only exists on `Connected` and the error only on `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Disconnected,
    Connecting,
    Connected { account_id: AccountId },
    Failed { last_error: String },
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Session::Disconnected => SessionStatus::Disconnected,
            Session::Connecting => SessionStatus::Connecting,
            Session::Connected { .. } => SessionStatus::Connected,
            Session::Failed { .. } => SessionStatus::Failed,
        }
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Session::Connected { account_id } => Some(account_id),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            Session::Failed { last_error } => Some(last_error),
            _ => None,
        }
    }
}

// ── Purchases ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PurchaseState {
    Idle,
    Submitting,
    Succeeded { tx_ref: TxRef },
    Failed { error: String },
}

impl PurchaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::Succeeded { .. } | PurchaseState::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseAttempt {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub state: PurchaseState,
}

// ── Intents (presentation -> core) ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Load { items: Vec<CatalogItem> },
    SetFilter { patch: FilterPatch },
    Connect,
    Disconnect,
    Purchase { item_id: ItemId },
}

/// Events pushed by the identity provider while connected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    AccountsChanged { accounts: Vec<AccountId> },
    ChainChanged,
}

// ── Render instructions (core -> presentation) ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuyState {
    Available,
    Pending,
    WalletRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeView {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCard {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub rarity: RarityTier,
    pub price_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub attributes: Vec<AttributeView>,
    pub buy: BuyState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionBadge {
    Disconnected,
    Connecting,
    Connected { account_id: AccountId, short: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderInstruction {
    pub catalog: Vec<ItemCard>,
    pub featured: Vec<ItemCard>,
    pub categories: Vec<Category>,
    pub filter: FilterSpec,
    pub badge: SessionBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Notice>,
}
