//! stamp-recs: store recommendation service.
//!
//! Recommends stores across five fixed categories: AI picks from
//! user-based collaborative filtering, event-participating stores,
//! newly-joined stores, popular stores, and nearby stores. The AI
//! category trains a fresh model per request from merged visit data;
//! the other categories rank request-supplied candidates (or the whole
//! catalog, for nearby) with fixed scoring formulas.

pub mod catalog;
pub mod collaborative;
pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod matrix;
pub mod recommender;
pub mod scoring;
pub mod types;
pub mod visits;

pub use catalog::{CatalogHandle, Store, StoreCatalog};
pub use collaborative::CollaborativeFilteringEngine;
pub use error::{RecsError, Result};
pub use geo::{haversine_km, Coordinate, UserLocation};
pub use recommender::RecommendationService;
pub use types::{RecommendationRequest, RecommendationResponse, StoreKey};
pub use visits::{NoVisitHistory, PostgresVisitHistory, VisitHistory};
