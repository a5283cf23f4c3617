//! Per-category scoring formulas and ranking.
//!
//! Scores blend distance with category-specific signals using fixed
//! weights. The weights are locked by tests; do not normalize the units.

use std::cmp::Ordering;

use crate::catalog::Store;
use crate::types::SimpleStore;

/// Stores per category in the final response.
pub const MAX_RESULTS_PER_CATEGORY: usize = 2;

/// Nearby stores beyond this distance are not eligible.
pub const NEARBY_MAX_DISTANCE_KM: f64 = 5.0;

/// Collaborative picks beyond this distance are not eligible.
pub const COLLABORATIVE_MAX_DISTANCE_KM: f64 = 10.0;

/// A candidate with its computed score and display reasons.
#[derive(Debug, Clone)]
pub struct ScoredStore {
    pub store: Store,
    pub distance_km: f64,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl From<&ScoredStore> for SimpleStore {
    fn from(scored: &ScoredStore) -> Self {
        SimpleStore {
            name: scored.store.name.clone(),
            address: scored.store.address.clone(),
        }
    }
}

fn distance_reason(distance_km: f64) -> String {
    format!("{:.1} km away", distance_km)
}

/// Event stores: the XP multiplier dominates, distance pulls down.
pub fn score_event(exp_multiplier: f64, distance_km: f64) -> (f64, Vec<String>) {
    let score = exp_multiplier * 30.0 - distance_km * 2.0;
    let reasons = vec![
        format!("XP x{} event", exp_multiplier),
        distance_reason(distance_km),
    ];
    (score, reasons)
}

/// New stores: freshness decays over 30 days, then only distance counts.
/// Stores with a future join date get no freshness credit.
pub fn score_new(days_since_joined: i64, distance_km: f64) -> (f64, Vec<String>) {
    let freshness = if days_since_joined < 0 {
        0.0
    } else {
        ((30 - days_since_joined).max(0) * 2) as f64
    };
    let score = freshness - distance_km * 2.0;
    let reasons = vec![
        format!("Joined {} days ago", days_since_joined),
        distance_reason(distance_km),
    ];
    (score, reasons)
}

/// Popular stores: visit volume against distance.
pub fn score_popular(visit_count: u64, distance_km: f64) -> (f64, Vec<String>) {
    let score = visit_count as f64 / 10.0 - distance_km * 2.0;
    let reasons = vec![
        format!("Visited {} times", visit_count),
        distance_reason(distance_km),
        "Popular with users".to_string(),
    ];
    (score, reasons)
}

/// Nearby stores: distance-dominated with a rating bonus. Only stores
/// within `NEARBY_MAX_DISTANCE_KM` are eligible.
pub fn score_nearby(rating: f64, distance_km: f64) -> Option<(f64, Vec<String>)> {
    if distance_km > NEARBY_MAX_DISTANCE_KM {
        return None;
    }
    let score = 30.0 - distance_km * 5.0 + rating * 2.0;
    let reasons = vec![distance_reason(distance_km), format!("Rated {:.1}", rating)];
    Some((score, reasons))
}

/// Collaborative picks: predicted affinity against distance. Only
/// stores within `COLLABORATIVE_MAX_DISTANCE_KM` are eligible.
pub fn score_collaborative(
    predicted_affinity: f64,
    distance_km: f64,
) -> Option<(f64, Vec<String>)> {
    if distance_km > COLLABORATIVE_MAX_DISTANCE_KM {
        return None;
    }
    let score = predicted_affinity * 10.0 - distance_km;
    let reasons = vec![
        "Similar users visited this store".to_string(),
        distance_reason(distance_km),
    ];
    Some((score, reasons))
}

/// Sorts candidates by descending score and keeps the best `limit`.
/// The sort is stable, so ties keep their original candidate order.
pub fn rank_top(mut candidates: Vec<ScoredStore>, limit: usize) -> Vec<ScoredStore> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn store(name: &str) -> Store {
        Store {
            id: "store0001".to_string(),
            name: name.to_string(),
            address: format!("{} address", name),
            category: "cafe".to_string(),
            location: Coordinate::new(37.5665, 126.9780),
            rating: 4.5,
            review_count: 100,
        }
    }

    fn scored(name: &str, score: f64) -> ScoredStore {
        ScoredStore {
            store: store(name),
            distance_km: 1.0,
            score,
            reasons: vec![],
        }
    }

    #[test]
    fn test_event_score_reference_value() {
        let (score, reasons) = score_event(2.0, 0.5);
        assert_eq!(score, 59.0);
        assert_eq!(reasons, vec!["XP x2 event", "0.5 km away"]);
    }

    #[test]
    fn test_new_score_within_window() {
        let (score, _) = score_new(10, 1.0);
        assert_eq!(score, 38.0);
    }

    #[test]
    fn test_new_score_overdue_clamps_freshness() {
        let (score, _) = score_new(35, 2.0);
        assert_eq!(score, -4.0);
    }

    #[test]
    fn test_new_score_future_join_date_gets_no_credit() {
        let (score, _) = score_new(-3, 1.0);
        assert_eq!(score, -2.0);
    }

    #[test]
    fn test_popular_score() {
        let (score, reasons) = score_popular(150, 2.0);
        assert_eq!(score, 11.0);
        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0], "Visited 150 times");
        assert_eq!(reasons[2], "Popular with users");
    }

    #[test]
    fn test_nearby_score_and_radius() {
        let (score, reasons) = score_nearby(4.5, 5.0).unwrap();
        assert_eq!(score, 14.0);
        assert_eq!(reasons[1], "Rated 4.5");
        assert!(score_nearby(4.5, 5.01).is_none());
    }

    #[test]
    fn test_collaborative_score_and_radius() {
        let (score, _) = score_collaborative(3.0, 2.0).unwrap();
        assert_eq!(score, 28.0);
        assert!(score_collaborative(3.0, 10.01).is_none());
        assert!(score_collaborative(3.0, 10.0).is_some());
    }

    #[test]
    fn test_rank_top_orders_and_truncates() {
        let ranked = rank_top(
            vec![scored("low", 1.0), scored("high", 9.0), scored("mid", 5.0)],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].store.name, "high");
        assert_eq!(ranked[1].store.name, "mid");
    }

    #[test]
    fn test_rank_top_ties_keep_candidate_order() {
        let ranked = rank_top(
            vec![scored("first", 5.0), scored("second", 5.0)],
            MAX_RESULTS_PER_CATEGORY,
        );
        assert_eq!(ranked[0].store.name, "first");
        assert_eq!(ranked[1].store.name, "second");
    }
}
