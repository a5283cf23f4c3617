//! Request and response types for the recommendation API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::UserLocation;

/// Identifies a store by canonical id or by street address.
/// When a record carries both, the id wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    ById(String),
    ByAddress(String),
}

impl StoreKey {
    /// Builds a key from optional id/address fields, preferring the id.
    /// Returns `None` when neither field carries a usable value.
    pub fn from_parts(store_id: Option<&str>, store_address: Option<&str>) -> Option<Self> {
        if let Some(id) = store_id {
            let id = id.trim();
            if !id.is_empty() {
                return Some(StoreKey::ById(normalize_store_id(id)));
            }
        }
        if let Some(addr) = store_address {
            let addr = addr.trim();
            if !addr.is_empty() {
                return Some(StoreKey::ByAddress(addr.to_string()));
            }
        }
        None
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::ById(id) => write!(f, "id:{}", id),
            StoreKey::ByAddress(addr) => write!(f, "address:{}", addr),
        }
    }
}

/// Widens bare numeric ids to the canonical zero-padded form,
/// so "1" and "store0001" address the same store.
pub fn normalize_store_id(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(n) => format!("store{:04}", n),
        Err(_) => raw.trim().to_string(),
    }
}

/// One visit record supplied by the client or fetched from history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    pub visit_count: u64,
}

impl VisitRecord {
    pub fn key(&self) -> Option<StoreKey> {
        StoreKey::from_parts(self.store_id.as_deref(), self.store_address.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStoreCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    pub exp_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStoreCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    pub joined_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularStoreCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    pub visit_count: u64,
}

impl EventStoreCandidate {
    pub fn key(&self) -> Option<StoreKey> {
        StoreKey::from_parts(self.store_id.as_deref(), self.store_address.as_deref())
    }
}

impl NewStoreCandidate {
    pub fn key(&self) -> Option<StoreKey> {
        StoreKey::from_parts(self.store_id.as_deref(), self.store_address.as_deref())
    }
}

impl PopularStoreCandidate {
    pub fn key(&self) -> Option<StoreKey> {
        StoreKey::from_parts(self.store_id.as_deref(), self.store_address.as_deref())
    }
}

/// Body of `POST /api/v1/recommendations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub location: UserLocation,
    #[serde(default)]
    pub event_stores: Vec<EventStoreCandidate>,
    #[serde(default)]
    pub new_stores: Vec<NewStoreCandidate>,
    #[serde(default)]
    pub popular_stores: Vec<PopularStoreCandidate>,
    #[serde(default)]
    pub visits: Vec<VisitRecord>,
}

/// Category labels in presentation order.
pub const CATEGORY_AI: &str = "ai";
pub const CATEGORY_EVENT: &str = "event";
pub const CATEGORY_NEW: &str = "new";
pub const CATEGORY_POPULAR: &str = "popular";
pub const CATEGORY_NEARBY: &str = "nearby";

/// A recommended store as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleStore {
    pub name: String,
    pub address: String,
}

/// One category block in the response, holding at most two stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub stores: Vec<SimpleStore>,
}

/// Top-level response of `POST /api/v1/recommendations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub user_id: String,
    pub recommendations: Vec<CategoryResult>,
}

impl RecommendationResponse {
    /// Response used when recommendation generation fails as a whole.
    pub fn failed(user_id: impl Into<String>) -> Self {
        Self {
            success: false,
            user_id: user_id.into(),
            recommendations: Vec::new(),
        }
    }
}
