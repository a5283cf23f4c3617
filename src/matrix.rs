//! User-store interaction matrix backing the collaborative filter.
//!
//! Rows are users and columns are stores, both in first-seen order of
//! the visit list the matrix was built from. Cell values are visit
//! counts; absent pairs are zero.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1};

use crate::types::StoreKey;

/// A normalized visit tuple ready for matrix construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVisit {
    pub user_id: String,
    pub store: StoreKey,
    pub visit_count: u64,
}

#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    cells: Array2<f64>,
    user_ids: Vec<String>,
    store_keys: Vec<StoreKey>,
    user_index: HashMap<String, usize>,
    store_index: HashMap<StoreKey, usize>,
}

impl InteractionMatrix {
    /// Builds the matrix from a visit list. Row and column order follow
    /// the first appearance of each user and store in `visits`; a
    /// repeated (user, store) pair overwrites the earlier cell.
    pub fn from_visits(visits: &[UserVisit]) -> Self {
        let mut user_ids: Vec<String> = Vec::new();
        let mut store_keys: Vec<StoreKey> = Vec::new();
        let mut user_index: HashMap<String, usize> = HashMap::new();
        let mut store_index: HashMap<StoreKey, usize> = HashMap::new();

        for visit in visits {
            if !user_index.contains_key(&visit.user_id) {
                user_index.insert(visit.user_id.clone(), user_ids.len());
                user_ids.push(visit.user_id.clone());
            }
            if !store_index.contains_key(&visit.store) {
                store_index.insert(visit.store.clone(), store_keys.len());
                store_keys.push(visit.store.clone());
            }
        }

        let mut cells = Array2::zeros((user_ids.len(), store_keys.len()));
        for visit in visits {
            let row = user_index[&visit.user_id];
            let col = store_index[&visit.store];
            cells[[row, col]] = visit.visit_count as f64;
        }

        Self {
            cells,
            user_ids,
            store_keys,
            user_index,
            store_index,
        }
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_stores(&self) -> usize {
        self.store_keys.len()
    }

    pub fn user_position(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn user_id_at(&self, position: usize) -> &str {
        &self.user_ids[position]
    }

    pub fn store_key_at(&self, position: usize) -> &StoreKey {
        &self.store_keys[position]
    }

    pub fn user_row(&self, position: usize) -> ArrayView1<'_, f64> {
        self.cells.row(position)
    }

    /// Per-store visit totals, used as the popularity fallback.
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.n_stores())
            .map(|col| self.cells.column(col).sum())
            .collect()
    }

    pub fn total_visits(&self) -> f64 {
        self.cells.sum()
    }

    pub fn nonzero_cells(&self) -> usize {
        self.cells.iter().filter(|&&v| v > 0.0).count()
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

    #[test]
    fn test_rows_and_columns_follow_first_seen_order() {
        let visits = vec![
            visit("user2", "storeB", 1),
            visit("user1", "storeA", 2),
            visit("user2", "storeA", 3),
        ];
        let matrix = InteractionMatrix::from_visits(&visits);

        assert_eq!(matrix.n_users(), 2);
        assert_eq!(matrix.n_stores(), 2);
        assert_eq!(matrix.user_id_at(0), "user2");
        assert_eq!(matrix.user_id_at(1), "user1");
        assert_eq!(
            matrix.store_key_at(0),
            &StoreKey::ById("storeB".to_string())
        );
        assert_eq!(
            matrix.store_key_at(1),
            &StoreKey::ById("storeA".to_string())
        );
    }

    #[test]
    fn test_cells_hold_visit_counts() {
        let visits = vec![
            visit("user1", "storeA", 5),
            visit("user1", "storeB", 1),
            visit("user2", "storeA", 4),
        ];
        let matrix = InteractionMatrix::from_visits(&visits);
        let row = matrix.user_row(matrix.user_position("user1").unwrap());
        assert_eq!(row[0], 5.0);
        assert_eq!(row[1], 1.0);

        let row2 = matrix.user_row(matrix.user_position("user2").unwrap());
        assert_eq!(row2[0], 4.0);
        assert_eq!(row2[1], 0.0);
    }

    #[test]
    fn test_repeated_pair_overwrites() {
        let visits = vec![visit("user1", "storeA", 5), visit("user1", "storeA", 2)];
        let matrix = InteractionMatrix::from_visits(&visits);
        let row = matrix.user_row(0);
        assert_eq!(row[0], 2.0);
        assert_eq!(matrix.total_visits(), 2.0);
    }

    #[test]
    fn test_column_sums_and_totals() {
        let visits = vec![
            visit("user1", "storeA", 5),
            visit("user1", "storeB", 1),
            visit("user2", "storeA", 4),
            visit("user2", "storeC", 3),
        ];
        let matrix = InteractionMatrix::from_visits(&visits);
        assert_eq!(matrix.column_sums(), vec![9.0, 1.0, 3.0]);
        assert_eq!(matrix.total_visits(), 13.0);
        assert_eq!(matrix.nonzero_cells(), 4);
    }

    #[test]
    fn test_empty_visit_list_builds_empty_matrix() {
        let matrix = InteractionMatrix::from_visits(&[]);
        assert_eq!(matrix.n_users(), 0);
        assert_eq!(matrix.n_stores(), 0);
        assert_eq!(matrix.total_visits(), 0.0);
    }
}
