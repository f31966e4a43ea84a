//! Sweep table aggregation
//!
//! Collects the per-run records of one invocation, preserving directory
//! enumeration order, and answers the two questions the reporters ask:
//! which runs are finished, and which finished run is best.

use tracing::warn;

use super::record::RunRecord;

/// The ordered collection of run records for one sweep invocation.
///
/// Insertion order follows directory enumeration order. No two rows share
/// a run name; a duplicate insert is dropped with a warning rather than
/// silently replacing the earlier row.
#[derive(Debug, Default)]
pub struct SweepTable {
    records: Vec<RunRecord>,
}

impl SweepTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, enforcing the unique-run-name invariant.
    ///
    /// Returns `false` (and keeps the earlier record) when a record with
    /// the same run name is already present.
    pub fn push(&mut self, record: RunRecord) -> bool {
        if self
            .records
            .iter()
            .any(|r| r.run_name() == record.run_name())
        {
            warn!(run = record.run_name(), "duplicate run name, keeping the first record");
            return false;
        }
        self.records.push(record);
        true
    }

    /// All records, complete and incomplete, in enumeration order.
    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of records (including incomplete ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The finished runs: records with both metrics present, in their
    /// original enumeration order.
    #[must_use]
    pub fn finished(&self) -> Vec<RunRecord> {
        self.records
            .iter()
            .filter(|r| r.is_finished())
            .cloned()
            .collect()
    }
}

/// Select the best run: arg-max by ROC AUC, first-seen wins ties.
///
/// Records without a primary metric are never candidates, and an empty
/// input yields `None`; callers must handle "no result" explicitly
/// instead of receiving a placeholder row.
#[must_use]
pub fn best(records: &[RunRecord]) -> Option<&RunRecord> {
    let mut best: Option<(&RunRecord, f64)> = None;
    for record in records {
        let Some(value) = record.roc_auc() else {
            continue;
        };
        // Strict comparison keeps the earliest record on ties.
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((record, value)),
        }
    }
    best.map(|(record, _)| record)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::sweep::ident::RunIdent;

    fn record(name: &str, roc_auc: Option<f64>, accuracy: Option<f64>) -> RunRecord {
        RunRecord::new(
            name.to_string(),
            RunIdent::new(2, 1, 64, 1e-3),
            roc_auc,
            accuracy,
            None,
            PathBuf::from("all_config.yaml"),
        )
    }

    #[test]
    fn test_finished_preserves_order_and_drops_incomplete() {
        let mut table = SweepTable::new();
        table.push(record("a", Some(0.8), Some(0.7)));
        table.push(record("b", Some(0.9), None));
        table.push(record("c", None, None));
        table.push(record("d", Some(0.85), Some(0.8)));

        let finished = table.finished();
        let names: Vec<_> = finished.iter().map(RunRecord::run_name).collect();
        assert_eq!(names, vec!["a", "d"]);
    }

    #[test]
    fn test_duplicate_run_name_keeps_first() {
        let mut table = SweepTable::new();
        assert!(table.push(record("a", Some(0.8), Some(0.7))));
        assert!(!table.push(record("a", Some(0.99), Some(0.9))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].roc_auc(), Some(0.8));
    }

    #[test]
    fn test_best_is_argmax_by_roc_auc() {
        let records = vec![
            record("a", Some(0.88), Some(0.8)),
            record("b", Some(0.91), Some(0.8)),
            record("c", Some(0.90), Some(0.8)),
        ];
        assert_eq!(best(&records).unwrap().run_name(), "b");
    }

    #[test]
    fn test_best_tie_break_is_first_seen() {
        let records = vec![
            record("a", Some(0.91), Some(0.8)),
            record("b", Some(0.91), Some(0.9)),
        ];
        assert_eq!(best(&records).unwrap().run_name(), "a");
    }

    #[test]
    fn test_best_of_empty_is_none() {
        assert!(best(&[]).is_none());
    }

    #[test]
    fn test_best_ignores_records_without_primary_metric() {
        let records = vec![record("a", None, Some(0.9))];
        assert!(best(&records).is_none());
    }
}
