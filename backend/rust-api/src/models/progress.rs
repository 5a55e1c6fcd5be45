use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::dataset::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// Rows remain to be annotated
    Active,
    /// Every row of the dataset has been annotated by this teacher
    Complete,
}

/// Annotation progress of one teacher in one dataset.
///
/// `remaining` and `annotated` are disjoint and together cover every row id
/// of the dataset. Both are kept ordered so the next row is always the
/// smallest remaining id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    remaining: BTreeSet<RowId>,
    annotated: BTreeSet<RowId>,
}

impl Progress {
    /// Splits `all_row_ids` into remaining and annotated using the ids the
    /// store reports as already annotated. Stored ids outside the dataset
    /// are ignored.
    pub fn compute<I>(all_row_ids: I, stored: &BTreeSet<RowId>) -> Self
    where
        I: IntoIterator<Item = RowId>,
    {
        let (annotated, remaining): (BTreeSet<RowId>, BTreeSet<RowId>) = all_row_ids
            .into_iter()
            .partition(|row_id| stored.contains(row_id));

        Self {
            remaining,
            annotated,
        }
    }

    pub fn next_row(&self) -> Option<RowId> {
        self.remaining.first().copied()
    }

    /// Moves `row_id` from remaining to annotated.
    ///
    /// Returns `true` when the row moved. Recording an already annotated row
    /// is a no-op, as is recording an id the dataset does not contain.
    pub fn record_submission(&mut self, row_id: RowId) -> bool {
        if self.remaining.remove(&row_id) {
            self.annotated.insert(row_id);
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> ProgressState {
        if self.remaining.is_empty() {
            ProgressState::Complete
        } else {
            ProgressState::Active
        }
    }

    pub fn remaining(&self) -> &BTreeSet<RowId> {
        &self.remaining
    }

    pub fn annotated(&self) -> &BTreeSet<RowId> {
        &self.annotated
    }

    pub fn total(&self) -> usize {
        self.remaining.len() + self.annotated.len()
    }

    pub fn summary(&self) -> ProgressSummary {
        let total = self.total();
        let annotated = self.annotated.len();
        ProgressSummary {
            annotated,
            remaining: self.remaining.len(),
            total,
            fraction: if total > 0 {
                annotated as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Counts shown in the progress sidebar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub annotated: usize,
    pub remaining: usize,
    pub total: usize,
    pub fraction: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[RowId]) -> BTreeSet<RowId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn fresh_teacher_gets_every_row_in_order() {
        let progress = Progress::compute(vec![3, 1, 2], &BTreeSet::new());
        assert_eq!(progress.remaining(), &BTreeSet::from([1, 2, 3]));
        assert!(progress.annotated().is_empty());
        assert_eq!(progress.state(), ProgressState::Active);
    }

    #[test]
    fn submitting_first_row_moves_it() {
        let mut progress = Progress::compute(vec![1, 2, 3], &BTreeSet::new());
        assert!(progress.record_submission(1));
        assert_eq!(progress.remaining(), &BTreeSet::from([2, 3]));
        assert_eq!(progress.annotated(), &set(&[1]));
    }

    #[test]
    fn next_row_is_minimum_remaining() {
        let progress = Progress::compute(vec![5, 2, 9], &BTreeSet::new());
        assert_eq!(progress.next_row(), Some(2));
    }

    #[test]
    fn stored_rows_are_excluded_and_unknown_ones_ignored() {
        let progress = Progress::compute(vec![1, 2, 3, 4], &set(&[2, 4, 99]));
        assert_eq!(progress.remaining(), &BTreeSet::from([1, 3]));
        assert_eq!(progress.annotated(), &set(&[2, 4]));
        assert_eq!(progress.total(), 4);
    }

    #[test]
    fn record_submission_is_idempotent() {
        let mut progress = Progress::compute(vec![1, 2], &BTreeSet::new());
        assert!(progress.record_submission(2));
        let snapshot = progress.clone();
        assert!(!progress.record_submission(2));
        assert_eq!(progress, snapshot);
    }

    #[test]
    fn unknown_row_does_not_break_partition() {
        let mut progress = Progress::compute(vec![1, 2], &BTreeSet::new());
        assert!(!progress.record_submission(42));
        assert!(!progress.remaining().contains(&42));
        assert!(!progress.annotated().contains(&42));
        assert_eq!(progress.total(), 2);
    }

    #[test]
    fn submitting_everything_completes() {
        let mut progress = Progress::compute(vec![10, 4, 7], &set(&[7]));
        while let Some(row_id) = progress.next_row() {
            progress.record_submission(row_id);
        }
        assert_eq!(progress.state(), ProgressState::Complete);
        assert!(progress.remaining().is_empty());
        assert_eq!(progress.annotated(), &set(&[4, 7, 10]));
    }

    #[test]
    fn partition_invariant_holds_throughout() {
        let all = set(&[1, 2, 3, 5, 8, 13]);
        let mut progress = Progress::compute(all.iter().copied(), &set(&[3, 13]));
        for row_id in [8, 8, 1, 21, 5] {
            progress.record_submission(row_id);
            let union: BTreeSet<_> = progress
                .remaining()
                .union(progress.annotated())
                .copied()
                .collect();
            assert_eq!(union, all);
            assert!(progress.remaining().is_disjoint(progress.annotated()));
        }
    }

    #[test]
    fn empty_dataset_is_complete() {
        let progress = Progress::compute(Vec::new(), &BTreeSet::new());
        assert_eq!(progress.state(), ProgressState::Complete);
        assert_eq!(progress.next_row(), None);
        assert_eq!(progress.summary().fraction, 0.0);
    }

    #[test]
    fn summary_counts() {
        let progress = Progress::compute(vec![1, 2, 3, 4], &set(&[1]));
        let summary = progress.summary();
        assert_eq!(summary.annotated, 1);
        assert_eq!(summary.remaining, 3);
        assert_eq!(summary.total, 4);
        assert!((summary.fraction - 0.25).abs() < f64::EPSILON);
    }
}
