//! Store catalog: CSV snapshot loading, id assignment, and lookup.
//!
//! Snapshot rows are numbered `store0001`, `store0002`, ... in raw row
//! order, before any filtering, so the numbering stays stable for
//! external systems that reference stores by number. Rows without
//! coordinates keep their number but are excluded from the catalog.

use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{RecsError, Result};
use crate::geo::Coordinate;
use crate::types::StoreKey;

/// A store as loaded from the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
    pub category: String,
    pub location: Coordinate,
    pub rating: f64,
    pub review_count: u64,
}

/// One raw snapshot row. Rating and review count may be blank; they get
/// deterministic defaults derived from the row position.
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    name: String,
    address: String,
    #[serde(default)]
    category: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    rating: Option<f64>,
    review_count: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreCatalog {
    stores: Vec<Store>,
}

impl StoreCatalog {
    pub fn new(stores: Vec<Store>) -> Self {
        Self { stores }
    }

    /// Loads the catalog from a CSV snapshot with the columns
    /// `name,address,category,latitude,longitude,rating,review_count`.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| RecsError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

        let mut stores = Vec::new();
        let mut skipped = 0usize;
        for (row_index, record) in reader.deserialize::<SnapshotRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable snapshot row {}: {}", row_index + 1, e);
                    skipped += 1;
                    continue;
                }
            };
            let location = match (row.latitude, row.longitude) {
                (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            stores.push(Store {
                id: format!("store{:04}", row_index + 1),
                name: row.name,
                address: row.address,
                category: row.category,
                location,
                rating: row.rating.unwrap_or(4.0 + (row_index % 10) as f64 / 10.0),
                review_count: row.review_count.unwrap_or(50 + (row_index % 20) as u64 * 10),
            });
        }

        info!(
            "Loaded store catalog from {}: {} stores ({} rows skipped)",
            path.display(),
            stores.len(),
            skipped
        );
        Ok(Self { stores })
    }

    /// Minimal catalog used when the snapshot cannot be loaded at all.
    pub fn placeholder() -> Self {
        Self {
            stores: vec![Store {
                id: "store0001".to_string(),
                name: "Stamp Cafe".to_string(),
                address: "123 Mapo-daero, Mapo-gu, Seoul".to_string(),
                category: "cafe".to_string(),
                location: Coordinate::new(37.5665, 126.9780),
                rating: 4.5,
                review_count: 100,
            }],
        }
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == id)
    }

    /// Finds a store by address in three tiers, each tried only when
    /// the previous one found nothing: exact equality, whitespace-
    /// trimmed equality, then catalog-address-contains-query. Within a
    /// tier the first store in catalog order wins.
    pub fn find_by_address(&self, query: &str) -> Option<&Store> {
        if let Some(store) = self.stores.iter().find(|s| s.address == query) {
            return Some(store);
        }
        let trimmed = query.trim();
        if let Some(store) = self.stores.iter().find(|s| s.address.trim() == trimmed) {
            return Some(store);
        }
        self.stores.iter().find(|s| s.address.contains(trimmed))
    }

    /// Resolves a store key through the matching finder.
    pub fn resolve(&self, key: &StoreKey) -> Option<&Store> {
        match key {
            StoreKey::ById(id) => self.find_by_id(id),
            StoreKey::ByAddress(address) => self.find_by_address(address),
        }
    }
}

/// Process-wide lazily-loaded catalog. The first access loads the
/// snapshot; a load failure resolves to the placeholder catalog, and
/// whichever outcome is cached for the process lifetime.
#[derive(Debug)]
pub struct CatalogHandle {
    snapshot_path: String,
    catalog: OnceLock<StoreCatalog>,
}

impl CatalogHandle {
    pub fn new(snapshot_path: impl Into<String>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            catalog: OnceLock::new(),
        }
    }

    /// Handle that never touches the filesystem. Used in tests.
    pub fn preloaded(catalog: StoreCatalog) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(catalog);
        Self {
            snapshot_path: String::new(),
            catalog: cell,
        }
    }

    pub fn get(&self) -> &StoreCatalog {
        self.catalog
            .get_or_init(|| match StoreCatalog::load_csv(&self.snapshot_path) {
                Ok(catalog) => catalog,
                Err(e) => {
                    error!("{}, falling back to placeholder catalog", e);
                    StoreCatalog::placeholder()
                }
            })
    }
}
