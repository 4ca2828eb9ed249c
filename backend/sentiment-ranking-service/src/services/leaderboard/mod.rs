// ============================================
// Leaderboard (排行榜)
// ============================================
//
// Array-backed sequence of (id, score) entries kept in non-decreasing
// score order at all times between public calls.
//
// - locate: binary search on score, O(log n)
// - insert / remove: splice, O(n) worst case
// - top-k / bottom-k: slice of the ends
//
// Several entries may share a score. Removal therefore needs both the id
// and the score the entry is currently filed under: binary search lands
// somewhere inside the run of equal scores, then a local scan finds the id.
// Splicing never reorders entries it does not touch, so ties keep their
// relative order across unrelated updates.

use crate::services::scoring::Score;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    /// The caller's recorded score for `id` does not match the board.
    /// Indicates a bookkeeping bug upstream; the board is left untouched.
    #[error("No entry for id {id} filed under score {value}")]
    EntryNotFound { id: String, value: Score },

    #[error("Entry for id {0} already exists")]
    DuplicateEntry(String),
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    #[serde(rename = "score")]
    pub value: Score,
}

impl LeaderboardEntry {
    pub fn new(id: impl Into<String>, value: Score) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    members: HashSet<String>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score change for `id`.
    ///
    /// `previous` is the score the entry is currently filed under, or `None`
    /// when this is the first observation of `id`.
    pub fn update(&mut self, id: &str, value: Score, previous: Option<Score>) -> Result<()> {
        match previous {
            None => self.insert(LeaderboardEntry::new(id, value))?,
            Some(old) if old == value => return Ok(()),
            Some(old) => {
                let mut entry = self.remove(id, old)?;
                entry.value = value;
                self.insert(entry)?;
            }
        }

        debug_assert!(self.is_sorted(), "leaderboard out of order after update");
        Ok(())
    }

    /// Top `k` entries, highest score first
    pub fn get_highest(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().rev().take(k).cloned().collect()
    }

    /// Bottom `k` entries, lowest score first
    pub fn get_lowest(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().take(k).cloned().collect()
    }

    /// 1-based standing of `value`: one more than the number of entries
    /// scoring strictly higher. Tied entries share a rank.
    pub fn rank(&self, value: Score) -> usize {
        let not_above = self.entries.partition_point(|entry| entry.value <= value);
        self.entries.len() - not_above + 1
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending score order
    pub fn iter(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.entries.iter()
    }

    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|pair| pair[0].value <= pair[1].value)
    }

    /// Binary search for `target`. Returns the index of some entry holding
    /// exactly `target` if one exists, otherwise the index at which an entry
    /// with that score would have to be spliced in.
    pub fn find_index(&self, target: Score) -> usize {
        let mut low = 0;
        let mut high = self.entries.len();

        while low < high {
            let mid = low + (high - low) / 2;
            let value = self.entries[mid].value;
            if value == target {
                return mid;
            } else if value < target {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        low
    }

    pub fn insert(&mut self, entry: LeaderboardEntry) -> Result<()> {
        if self.members.contains(&entry.id) {
            return Err(LeaderboardError::DuplicateEntry(entry.id));
        }

        // Either a slot inside the run of equal scores or the first slot
        // whose score is greater; both keep the sequence sorted.
        let index = self.find_index(entry.value);
        self.members.insert(entry.id.clone());
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Remove the entry for `id`, which must currently be filed under `value`.
    pub fn remove(&mut self, id: &str, value: Score) -> Result<LeaderboardEntry> {
        let start = self.find_index(value);

        let forward = self.entries[start..]
            .iter()
            .take_while(|entry| entry.value == value)
            .position(|entry| entry.id == id)
            .map(|offset| start + offset);

        let found = forward.or_else(|| {
            self.entries[..start]
                .iter()
                .rev()
                .take_while(|entry| entry.value == value)
                .position(|entry| entry.id == id)
                .map(|offset| start - 1 - offset)
        });

        match found {
            Some(index) => {
                let entry = self.entries.remove(index);
                self.members.remove(&entry.id);
                Ok(entry)
            }
            None => {
                error!(
                    entity_id = id,
                    value,
                    present = self.members.contains(id),
                    "Leaderboard removal for an id/score pair that is not on the board"
                );
                Err(LeaderboardError::EntryNotFound {
                    id: id.to_string(),
                    value,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    fn board_with(entries: &[(&str, Score)]) -> Leaderboard {
        let mut board = Leaderboard::new();
        for &(id, value) in entries {
            board.update(id, value, None).unwrap();
        }
        board
    }

    fn ids(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_top_and_bottom_with_ties() {
        let board = board_with(&[("A", 50), ("B", 70), ("C", 70), ("D", 90)]);

        let top = board.get_highest(2);
        assert_eq!(top[0], LeaderboardEntry::new("D", 90));
        assert_eq!(top[1].value, 70);
        assert!(top[1].id == "B" || top[1].id == "C");

        assert_eq!(board.get_lowest(1), vec![LeaderboardEntry::new("A", 50)]);
    }

    #[test]
    fn test_update_repositions_single_entry() {
        let mut board = board_with(&[("A", 50), ("B", 70), ("C", 70), ("D", 90)]);
        board.update("A", 60, Some(50)).unwrap();

        assert_eq!(board.len(), 4);
        assert!(board.is_sorted());
        assert_eq!(board.iter().filter(|e| e.id == "A").count(), 1);
        assert_eq!(board.get_lowest(1), vec![LeaderboardEntry::new("A", 60)]);
    }

    #[test]
    fn test_update_past_neighbours() {
        let mut board = board_with(&[("A", 50), ("B", 70), ("C", 70), ("D", 90)]);
        board.update("A", 95, Some(50)).unwrap();

        assert_eq!(ids(&board.get_highest(1)), vec!["A"]);
        assert_eq!(board.get_lowest(1)[0].value, 70);
        assert!(board.is_sorted());
    }

    #[test]
    fn test_same_value_is_noop() {
        let mut board = board_with(&[("A", 50), ("B", 50)]);
        let before: Vec<_> = board.iter().cloned().collect();

        board.update("B", 50, Some(50)).unwrap();

        let after: Vec<_> = board.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_k_larger_than_board() {
        let board = board_with(&[("A", 1), ("B", 2)]);

        assert_eq!(ids(&board.get_highest(10)), vec!["B", "A"]);
        assert_eq!(ids(&board.get_lowest(10)), vec!["A", "B"]);
        assert!(Leaderboard::new().get_highest(3).is_empty());
        assert!(board.get_lowest(0).is_empty());
    }

    #[test]
    fn test_find_index_insertion_points() {
        let board = board_with(&[("A", 10), ("B", 20), ("C", 30)]);

        assert_eq!(board.find_index(5), 0);
        assert_eq!(board.find_index(25), 2);
        assert_eq!(board.find_index(35), 3);
        assert_eq!(board.find_index(20), 1);
        assert_eq!(Leaderboard::new().find_index(7), 0);
    }

    #[test]
    fn test_remove_scans_both_directions_through_ties() {
        let mut board = board_with(&[
            ("A", 5),
            ("B", 5),
            ("C", 5),
            ("D", 5),
            ("E", 5),
            ("F", 9),
        ]);

        for id in ["A", "E", "C", "B", "D"] {
            let entry = board.remove(id, 5).unwrap();
            assert_eq!(entry.id, id);
            assert!(board.is_sorted());
        }
        assert_eq!(ids(&board.get_lowest(5)), vec!["F"]);
    }

    #[test]
    fn test_remove_with_wrong_value_is_rejected() {
        let mut board = board_with(&[("A", 50), ("B", 70)]);

        let err = board.remove("A", 70).unwrap_err();
        assert_eq!(
            err,
            LeaderboardError::EntryNotFound {
                id: "A".to_string(),
                value: 70
            }
        );
        assert_eq!(board.len(), 2);

        assert!(board.update("Z", 10, Some(40)).is_err());
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_duplicate_first_insert_rejected() {
        let mut board = board_with(&[("A", 50)]);
        assert_eq!(
            board.update("A", 60, None),
            Err(LeaderboardError::DuplicateEntry("A".to_string()))
        );
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_unrelated_update_keeps_tie_order() {
        let mut board = board_with(&[("A", 10), ("B", 10), ("C", 10), ("X", 3)]);
        let ties_before: Vec<String> = board
            .iter()
            .filter(|e| e.value == 10)
            .map(|e| e.id.clone())
            .collect();

        board.update("X", 20, Some(3)).unwrap();
        board.update("X", 1, Some(20)).unwrap();

        let ties_after: Vec<String> = board
            .iter()
            .filter(|e| e.value == 10)
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ties_before, ties_after);
    }

    #[test]
    fn test_rank_shares_ties() {
        let board = board_with(&[("A", 50), ("B", 70), ("C", 70), ("D", 90)]);

        assert_eq!(board.rank(90), 1);
        assert_eq!(board.rank(70), 2);
        assert_eq!(board.rank(50), 4);
    }

    #[test]
    fn test_random_updates_preserve_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Leaderboard::new();
        let mut current: HashMap<String, Score> = HashMap::new();

        for _ in 0..2_000 {
            let id = format!("E{}", rng.gen_range(0..60));
            let value = rng.gen_range(0..25);
            let previous = current.get(&id).copied();

            board.update(&id, value, previous).unwrap();
            current.insert(id.clone(), value);

            assert!(board.is_sorted());
            assert_eq!(board.iter().filter(|e| e.id == id).count(), 1);
        }

        assert_eq!(board.len(), current.len());
        for entry in board.iter() {
            assert_eq!(current[&entry.id], entry.value);
        }

        let mut expected: Vec<Score> = current.values().copied().collect();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        let top: Vec<Score> = board.get_highest(10).iter().map(|e| e.value).collect();
        assert_eq!(top, expected[..10].to_vec());
    }
}
