//! Per-request orchestration of the five recommendation categories.
//!
//! Categories run in fixed priority order: AI first, then event, new,
//! popular, and nearby. Stores the AI category picks are protected:
//! no later category may show them again. A category that fails
//! degrades to an empty list without affecting the others.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogHandle, Store, StoreCatalog};
use crate::collaborative::CollaborativeFilteringEngine;
use crate::error::Result;
use crate::geo::{haversine_km, UserLocation};
use crate::scoring::{
    rank_top, score_collaborative, score_event, score_nearby, score_new, score_popular,
    ScoredStore, MAX_RESULTS_PER_CATEGORY,
};
use crate::types::{
    CategoryResult, EventStoreCandidate, NewStoreCandidate, PopularStoreCandidate,
    RecommendationRequest, RecommendationResponse, SimpleStore, StoreKey, CATEGORY_AI,
    CATEGORY_EVENT, CATEGORY_NEARBY, CATEGORY_NEW, CATEGORY_POPULAR,
};
use crate::visits::{merge_visits, VisitHistory};

/// Affinity predictions requested from the engine per user.
pub const PREDICTED_STORE_LIMIT: usize = 10;

pub struct RecommendationService {
    catalog: CatalogHandle,
    history: Box<dyn VisitHistory>,
}

impl RecommendationService {
    pub fn new(catalog: CatalogHandle, history: Box<dyn VisitHistory>) -> Self {
        Self { catalog, history }
    }

    /// Produces the five-category response for one request. Never
    /// fails: an orchestration-level error yields `success: false`
    /// with no recommendations.
    pub async fn recommend(&self, request: RecommendationRequest) -> RecommendationResponse {
        let user_id = request.user_id.clone();
        match self.generate(&request).await {
            Ok(recommendations) => RecommendationResponse {
                success: true,
                user_id,
                recommendations,
            },
            Err(e) => {
                error!("Recommendation generation failed for {}: {}", user_id, e);
                RecommendationResponse::failed(user_id)
            }
        }
    }

    async fn generate(&self, request: &RecommendationRequest) -> Result<Vec<CategoryResult>> {
        info!(
            "Generating recommendations for {} ({} event, {} new, {} popular, {} visits)",
            request.user_id,
            request.event_stores.len(),
            request.new_stores.len(),
            request.popular_stores.len(),
            request.visits.len()
        );
        let catalog = self.catalog.get();
        let location = request.location;

        let ai = self.run_category(CATEGORY_AI, self.recommend_ai(request, catalog).await);
        let protected: HashSet<String> = ai.iter().map(|s| s.store.address.clone()).collect();

        let mut event = self.run_category(
            CATEGORY_EVENT,
            self.recommend_event(&request.event_stores, catalog, location),
        );
        event.retain(|s| !protected.contains(&s.store.address));

        let mut new = self.run_category(
            CATEGORY_NEW,
            self.recommend_new(&request.new_stores, catalog, location),
        );
        new.retain(|s| !protected.contains(&s.store.address));

        let mut popular = self.run_category(
            CATEGORY_POPULAR,
            self.recommend_popular(&request.popular_stores, catalog, location),
        );
        popular.retain(|s| !protected.contains(&s.store.address));

        // Nearby never repeats a store another category already chose.
        let mut taken: HashSet<String> = protected.clone();
        for scored in event.iter().chain(new.iter()).chain(popular.iter()) {
            taken.insert(scored.store.address.clone());
        }
        let mut nearby = self.run_category(
            CATEGORY_NEARBY,
            self.recommend_nearby(catalog, location, &taken),
        );
        // AI-protected addresses are already in `taken`, so this filter
        // currently drops nothing.
        nearby.retain(|s| !protected.contains(&s.store.address));

        let results = vec![
            category_result(CATEGORY_AI, ai),
            category_result(CATEGORY_EVENT, event),
            category_result(CATEGORY_NEW, new),
            category_result(CATEGORY_POPULAR, popular),
            category_result(CATEGORY_NEARBY, nearby),
        ];
        let total: usize = results.iter().map(|r| r.stores.len()).sum();
        info!(
            "Generated {} stores across {} categories for {}",
            total,
            results.len(),
            request.user_id
        );
        Ok(results)
    }

    /// Unwraps a category outcome, degrading failures to empty output
    /// so the remaining categories still run.
    fn run_category(&self, category: &str, result: Result<Vec<ScoredStore>>) -> Vec<ScoredStore> {
        match result {
            Ok(stores) => stores,
            Err(e) => {
                error!("{} category failed, degrading to empty: {}", category, e);
                Vec::new()
            }
        }
    }

    /// Trains the engine on merged request and stored visits, predicts
    /// affinities for the requesting user, and scores the resolvable
    /// predictions within the collaborative radius.
    async fn recommend_ai(
        &self,
        request: &RecommendationRequest,
        catalog: &StoreCatalog,
    ) -> Result<Vec<ScoredStore>> {
        let started = Instant::now();
        let fetched = match self.history.fetch_all().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Visit history fetch failed, training on request visits only: {}", e);
                Vec::new()
            }
        };
        let merged = merge_visits(request.visits.clone(), fetched);

        let mut engine = CollaborativeFilteringEngine::new();
        engine.fit(&merged);
        debug!("Model stats: {:?}", engine.stats());

        let predictions = engine.predict(&request.user_id, PREDICTED_STORE_LIMIT, true);

        let mut candidates = Vec::new();
        for (key, affinity) in predictions {
            let store = match self.resolve(catalog, &key) {
                Some(store) => store,
                None => continue,
            };
            let distance = haversine_km(request.location, store.location);
            if let Some((score, reasons)) = score_collaborative(affinity, distance) {
                candidates.push(ScoredStore {
                    store: store.clone(),
                    distance_km: distance,
                    score,
                    reasons,
                });
            }
        }
        let ranked = rank_top(candidates, MAX_RESULTS_PER_CATEGORY);
        debug!("ai category produced {} stores in {:?}", ranked.len(), started.elapsed());
        Ok(ranked)
    }

    fn recommend_event(
        &self,
        candidates: &[EventStoreCandidate],
        catalog: &StoreCatalog,
        location: UserLocation,
    ) -> Result<Vec<ScoredStore>> {
        let started = Instant::now();
        let mut scored = Vec::new();
        for candidate in candidates {
            let store = match self.resolve_parts(catalog, candidate.key()) {
                Some(store) => store,
                None => continue,
            };
            let distance = haversine_km(location, store.location);
            let (score, reasons) = score_event(candidate.exp_multiplier, distance);
            scored.push(ScoredStore {
                store: store.clone(),
                distance_km: distance,
                score,
                reasons,
            });
        }
        let ranked = rank_top(scored, MAX_RESULTS_PER_CATEGORY);
        debug!("event category produced {} stores in {:?}", ranked.len(), started.elapsed());
        Ok(ranked)
    }

    fn recommend_new(
        &self,
        candidates: &[NewStoreCandidate],
        catalog: &StoreCatalog,
        location: UserLocation,
    ) -> Result<Vec<ScoredStore>> {
        let started = Instant::now();
        let now = Utc::now();
        let mut scored = Vec::new();
        for candidate in candidates {
            let store = match self.resolve_parts(catalog, candidate.key()) {
                Some(store) => store,
                None => continue,
            };
            let days_since_joined = (now - candidate.joined_date).num_days();
            let distance = haversine_km(location, store.location);
            let (score, reasons) = score_new(days_since_joined, distance);
            scored.push(ScoredStore {
                store: store.clone(),
                distance_km: distance,
                score,
                reasons,
            });
        }
        let ranked = rank_top(scored, MAX_RESULTS_PER_CATEGORY);
        debug!("new category produced {} stores in {:?}", ranked.len(), started.elapsed());
        Ok(ranked)
    }

    fn recommend_popular(
        &self,
        candidates: &[PopularStoreCandidate],
        catalog: &StoreCatalog,
        location: UserLocation,
    ) -> Result<Vec<ScoredStore>> {
        let started = Instant::now();
        let mut scored = Vec::new();
        for candidate in candidates {
            let store = match self.resolve_parts(catalog, candidate.key()) {
                Some(store) => store,
                None => continue,
            };
            let distance = haversine_km(location, store.location);
            let (score, reasons) = score_popular(candidate.visit_count, distance);
            scored.push(ScoredStore {
                store: store.clone(),
                distance_km: distance,
                score,
                reasons,
            });
        }
        let ranked = rank_top(scored, MAX_RESULTS_PER_CATEGORY);
        debug!("popular category produced {} stores in {:?}", ranked.len(), started.elapsed());
        Ok(ranked)
    }

    /// Scans the whole catalog for stores within the nearby radius,
    /// skipping addresses already chosen by earlier categories.
    fn recommend_nearby(
        &self,
        catalog: &StoreCatalog,
        location: UserLocation,
        excluded: &HashSet<String>,
    ) -> Result<Vec<ScoredStore>> {
        let started = Instant::now();
        let mut scored = Vec::new();
        for store in catalog.stores() {
            if excluded.contains(&store.address) {
                continue;
            }
            let distance = haversine_km(location, store.location);
            if let Some((score, reasons)) = score_nearby(store.rating, distance) {
                scored.push(ScoredStore {
                    store: store.clone(),
                    distance_km: distance,
                    score,
                    reasons,
                });
            }
        }
        let ranked = rank_top(scored, MAX_RESULTS_PER_CATEGORY);
        debug!("nearby category produced {} stores in {:?}", ranked.len(), started.elapsed());
        Ok(ranked)
    }

    /// Resolves an optional candidate key, logging drops.
    fn resolve_parts<'a>(
        &self,
        catalog: &'a StoreCatalog,
        key: Option<StoreKey>,
    ) -> Option<&'a Store> {
        match key {
            Some(key) => self.resolve(catalog, &key),
            None => {
                warn!("Dropping candidate without store id or address");
                None
            }
        }
    }

    fn resolve<'a>(&self, catalog: &'a StoreCatalog, key: &StoreKey) -> Option<&'a Store> {
        let store = catalog.resolve(key);
        if store.is_none() {
            warn!("Store not found in catalog, dropping candidate: {}", key);
        }
        store
    }
}

fn category_result(category: &str, stores: Vec<ScoredStore>) -> CategoryResult {
    CategoryResult {
        category: category.to_string(),
        stores: stores.iter().map(SimpleStore::from).collect(),
    }
}
