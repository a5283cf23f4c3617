//! User-based collaborative filtering over the interaction matrix.
//!
//! Nearest neighbors are found by brute-force cosine similarity, and
//! store affinities are predicted as the similarity-weighted average of
//! neighbor visit counts. Users the model has never seen fall back to
//! store popularity.

use ndarray::ArrayView1;
use serde::Serialize;
use tracing::{info, warn};

use crate::matrix::{InteractionMatrix, UserVisit};
use crate::types::StoreKey;

/// Neighbors consulted when predicting store affinities.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 10;

/// Cosine similarity of two visit vectors. Zero-norm vectors have no
/// direction, so their similarity is defined as 0.0.
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// Diagnostic snapshot of the trained model, mirroring what gets logged
/// after training.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModelStats {
    Untrained {
        is_trained: bool,
        message: String,
    },
    Trained {
        is_trained: bool,
        n_users: usize,
        n_stores: usize,
        total_visits: u64,
        sparsity: String,
        avg_visits_per_user: f64,
    },
}

impl ModelStats {
    fn untrained() -> Self {
        ModelStats::Untrained {
            is_trained: false,
            message: "Model has not been trained yet".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollaborativeFilteringEngine {
    neighbor_count: usize,
    matrix: Option<InteractionMatrix>,
}

impl Default for CollaborativeFilteringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CollaborativeFilteringEngine {
    pub fn new() -> Self {
        Self::with_neighbor_count(DEFAULT_NEIGHBOR_COUNT)
    }

    pub fn with_neighbor_count(neighbor_count: usize) -> Self {
        Self {
            neighbor_count,
            matrix: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.matrix.is_some()
    }

    /// Trains the model on a visit list. An empty list leaves the
    /// engine untrained.
    pub fn fit(&mut self, visits: &[UserVisit]) {
        if visits.is_empty() {
            warn!("No visit data supplied, model left untrained");
            self.matrix = None;
            return;
        }
        let matrix = InteractionMatrix::from_visits(visits);
        info!(
            "Trained collaborative model: {} users x {} stores, {} total visits",
            matrix.n_users(),
            matrix.n_stores(),
            matrix.total_visits()
        );
        self.matrix = Some(matrix);
    }

    /// Finds up to `neighbor_count` users most similar to `user_id`,
    /// ordered by descending similarity. Unknown users and single-user
    /// models yield nothing.
    pub fn similar_users(&self, user_id: &str, neighbor_count: usize) -> Vec<(String, f64)> {
        let matrix = match &self.matrix {
            Some(m) => m,
            None => return Vec::new(),
        };
        if matrix.n_users() <= 1 {
            return Vec::new();
        }
        let position = match matrix.user_position(user_id) {
            Some(p) => p,
            None => return Vec::new(),
        };

        let user_vector = matrix.user_row(position);
        let mut by_distance: Vec<(usize, f64)> = (0..matrix.n_users())
            .map(|other| {
                let distance = 1.0 - cosine_similarity(user_vector, matrix.user_row(other));
                (other, distance)
            })
            .collect();
        by_distance.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let keep = neighbor_count.saturating_add(1).min(matrix.n_users());
        by_distance
            .into_iter()
            .take(keep)
            .filter(|(other, _)| *other != position)
            .map(|(other, distance)| (matrix.user_id_at(other).to_string(), 1.0 - distance))
            .collect()
    }

    /// Predicts store affinities for a user as the similarity-weighted
    /// average of neighbor visits, highest first. Falls back to store
    /// popularity when the user is unknown or the model has a single
    /// user; an untrained model predicts nothing.
    pub fn predict(
        &self,
        user_id: &str,
        limit: usize,
        exclude_visited: bool,
    ) -> Vec<(StoreKey, f64)> {
        let matrix = match &self.matrix {
            Some(m) => m,
            None => return Vec::new(),
        };

        if matrix.n_users() < 2 {
            warn!(
                "Only {} user(s) in the model, using popularity fallback",
                matrix.n_users()
            );
            return self.popularity_fallback(limit);
        }
        let position = match matrix.user_position(user_id) {
            Some(p) => p,
            None => return self.popularity_fallback(limit),
        };

        let neighbors = self.similar_users(user_id, self.neighbor_count);
        if neighbors.is_empty() {
            warn!("No similar users found for {}, using popularity fallback", user_id);
            return self.popularity_fallback(limit);
        }

        let mut scores = vec![0.0f64; matrix.n_stores()];
        let mut total_similarity = 0.0;
        for (neighbor_id, similarity) in &neighbors {
            if let Some(neighbor_pos) = matrix.user_position(neighbor_id) {
                let visits = matrix.user_row(neighbor_pos);
                for (col, score) in scores.iter_mut().enumerate() {
                    *score += similarity * visits[col];
                }
                total_similarity += similarity;
            }
        }
        if total_similarity > 0.0 {
            for score in scores.iter_mut() {
                *score /= total_similarity;
            }
        }

        if exclude_visited {
            let own_visits = matrix.user_row(position);
            for (col, score) in scores.iter_mut().enumerate() {
                if own_visits[col] > 0.0 {
                    *score = -1.0;
                }
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        ranked
            .into_iter()
            .take(limit)
            .filter(|(_, score)| *score > 0.0)
            .map(|(col, score)| (matrix.store_key_at(col).clone(), score))
            .collect()
    }

    /// Cold-start ranking: stores by total visit count across all users.
    pub fn popularity_fallback(&self, limit: usize) -> Vec<(StoreKey, f64)> {
        let matrix = match &self.matrix {
            Some(m) => m,
            None => return Vec::new(),
        };
        let mut ranked: Vec<(usize, f64)> = matrix.column_sums().into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        ranked
            .into_iter()
            .take(limit)
            .filter(|(_, score)| *score > 0.0)
            .map(|(col, score)| (matrix.store_key_at(col).clone(), score))
            .collect()
    }

    pub fn stats(&self) -> ModelStats {
        let matrix = match &self.matrix {
            Some(m) => m,
            None => return ModelStats::untrained(),
        };
        let total_cells = matrix.n_users() * matrix.n_stores();
        let sparsity = if total_cells == 0 {
            0.0
        } else {
            1.0 - (matrix.nonzero_cells() as f64 / total_cells as f64)
        };
        ModelStats::Trained {
            is_trained: true,
            n_users: matrix.n_users(),
            n_stores: matrix.n_stores(),
            total_visits: matrix.total_visits() as u64,
            sparsity: format!("{:.2}%", sparsity * 100.0),
            avg_visits_per_user: matrix.total_visits() / matrix.n_users() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(user: &str, store: &str, count: u64) -> UserVisit {
        UserVisit {
            user_id: user.to_string(),
            store: StoreKey::ById(store.to_string()),
            visit_count: count,
        }
    }

    fn two_user_engine() -> CollaborativeFilteringEngine {
        let mut engine = CollaborativeFilteringEngine::new();
        engine.fit(&[
            visit("user1", "storeA", 5),
            visit("user1", "storeB", 1),
            visit("user2", "storeA", 4),
            visit("user2", "storeC", 3),
        ]);
        engine
    }

    #[test]
    fn test_untrained_predicts_nothing() {
        let engine = CollaborativeFilteringEngine::new();
        assert!(!engine.is_trained());
        assert!(engine.predict("user1", 10, true).is_empty());
        assert!(engine.similar_users("user1", 10).is_empty());
    }

    #[test]
    fn test_empty_fit_leaves_untrained() {
        let mut engine = CollaborativeFilteringEngine::new();
        engine.fit(&[]);
        assert!(!engine.is_trained());
    }

    #[test]
    fn test_similar_users_finds_the_overlapping_visitor() {
        let engine = two_user_engine();
        let similar = engine.similar_users("user1", 10);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].0, "user2");
        assert!(similar[0].1 > 0.0);

        // sim = 20 / (sqrt(26) * 5)
        let expected = 20.0 / (26.0f64.sqrt() * 5.0);
        assert!((similar[0].1 - expected).abs() < 1e-9);
    }

    #[test]
    fn test_similar_users_never_includes_self() {
        let engine = two_user_engine();
        for (user_id, _) in engine.similar_users("user2", 10) {
            assert_ne!(user_id, "user2");
        }
    }

    #[test]
    fn test_predict_surfaces_unvisited_store_from_neighbor() {
        let engine = two_user_engine();
        let predictions = engine.predict("user1", 10, true);
        // user1 already visited storeA and storeB, so only storeC remains.
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].0, StoreKey::ById("storeC".to_string()));
        assert!((predictions[0].1 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_without_exclusion_keeps_visited_stores() {
        let engine = two_user_engine();
        let predictions = engine.predict("user1", 10, false);
        let keys: Vec<&StoreKey> = predictions.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                &StoreKey::ById("storeA".to_string()),
                &StoreKey::ById("storeC".to_string()),
            ]
        );
        // storeB scores zero for the neighbor and is dropped.
        assert!(predictions.iter().all(|(_, score)| *score > 0.0));
    }

    #[test]
    fn test_single_user_model_falls_back_to_popularity() {
        let mut engine = CollaborativeFilteringEngine::new();
        engine.fit(&[visit("user1", "storeA", 5), visit("user1", "storeB", 2)]);
        let predictions = engine.predict("user1", 10, true);
        assert_eq!(predictions, engine.popularity_fallback(10));
        assert_eq!(
            predictions,
            vec![
                (StoreKey::ById("storeA".to_string()), 5.0),
                (StoreKey::ById("storeB".to_string()), 2.0),
            ]
        );
    }

    #[test]
    fn test_unknown_user_falls_back_to_popularity() {
        let engine = two_user_engine();
        let predictions = engine.predict("stranger", 10, true);
        assert_eq!(predictions[0].0, StoreKey::ById("storeA".to_string()));
        assert_eq!(predictions[0].1, 9.0);
    }

    #[test]
    fn test_popularity_fallback_respects_limit() {
        let engine = two_user_engine();
        let predictions = engine.predict("stranger", 1, true);
        assert_eq!(predictions.len(), 1);
    }

    #[test]
    fn test_zero_norm_user_has_zero_similarity_everywhere() {
        let mut engine = CollaborativeFilteringEngine::new();
        engine.fit(&[
            visit("user1", "storeA", 0),
            visit("user2", "storeA", 4),
            visit("user2", "storeB", 1),
        ]);
        let similar = engine.similar_users("user1", 10);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].1, 0.0);

        // Weighted scores all come out zero, so nothing is predicted.
        assert!(engine.predict("user1", 10, true).is_empty());
    }

    #[test]
    fn test_neighbor_count_is_capped_by_user_count() {
        let engine = two_user_engine();
        let similar = engine.similar_users("user1", 50);
        assert_eq!(similar.len(), 1);
    }

    #[test]
    fn test_stats_untrained_and_trained() {
        let engine = CollaborativeFilteringEngine::new();
        match engine.stats() {
            ModelStats::Untrained { is_trained, .. } => assert!(!is_trained),
            ModelStats::Trained { .. } => panic!("expected untrained stats"),
        }

        let engine = two_user_engine();
        match engine.stats() {
            ModelStats::Trained {
                is_trained,
                n_users,
                n_stores,
                total_visits,
                sparsity,
                avg_visits_per_user,
            } => {
                assert!(is_trained);
                assert_eq!(n_users, 2);
                assert_eq!(n_stores, 3);
                assert_eq!(total_visits, 13);
                // 4 of 6 cells are set.
                assert_eq!(sparsity, "33.33%");
                assert!((avg_visits_per_user - 6.5).abs() < 1e-9);
            }
            ModelStats::Untrained { .. } => panic!("expected trained stats"),
        }
    }
}
