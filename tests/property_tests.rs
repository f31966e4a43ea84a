//! Property-based tests for clinvar-sweep
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use std::path::PathBuf;

use proptest::prelude::*;

use clinvar_sweep::report::{Axis, MetricGrid};
use clinvar_sweep::sweep::{best, RunIdent, RunRecord};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Generate a valid identifier with realistic sweep values.
fn arb_ident() -> impl Strategy<Value = RunIdent> {
    (
        1u32..=64,
        1u32..=16,
        1u32..=4096,
        prop_oneof![
            1e-6f64..1.0,
            Just(1e-3),
            Just(5e-4),
            Just(1e-4),
        ],
    )
        .prop_map(|(cycles, layers, hidden, lr)| RunIdent::new(cycles, layers, hidden, lr))
}

fn arb_records(max: usize) -> impl Strategy<Value = Vec<RunRecord>> {
    proptest::collection::vec(0.0f64..1.0, 1..=max).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                RunRecord::new(
                    format!("run-{i}"),
                    RunIdent::new(2, 1, 64, 1e-3),
                    Some(v),
                    Some(0.5),
                    None,
                    PathBuf::from("all_config.yaml"),
                )
            })
            .collect()
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Identifier Grammar Properties
    // ========================================================================

    /// Property: valid identifiers round-trip through their directory name
    #[test]
    fn prop_ident_round_trips(ident in arb_ident()) {
        let name = ident.to_string();
        let parsed = RunIdent::parse(&name).expect("rendered name must parse");
        prop_assert_eq!(parsed.cycles(), ident.cycles());
        prop_assert_eq!(parsed.layers(), ident.layers());
        prop_assert_eq!(parsed.hidden_size(), ident.hidden_size());
        // f64 Display round-trips exactly.
        prop_assert_eq!(parsed.lr().to_bits(), ident.lr().to_bits());
    }

    /// Property: parsing never panics, whatever the directory name
    #[test]
    fn prop_parse_never_panics(name in ".*") {
        let _ = RunIdent::parse(&name);
    }

    /// Property: a mutated (non-grammar) name is rejected, not misparsed
    #[test]
    fn prop_prefixed_garbage_is_rejected(suffix in "[a-z_]{1,12}") {
        let name = format!("arch.L_cycles={suffix}");
        prop_assert!(RunIdent::parse(&name).is_err());
    }

    // ========================================================================
    // Best-Run Selection Properties
    // ========================================================================

    /// Property: best() always returns a member of the input
    #[test]
    fn prop_best_is_a_member(records in arb_records(16)) {
        let chosen = best(&records).expect("non-empty input has a best run");
        prop_assert!(records.iter().any(|r| r.run_name() == chosen.run_name()));
    }

    /// Property: nothing in the input beats best()
    #[test]
    fn prop_best_is_maximal(records in arb_records(16)) {
        let chosen = best(&records).expect("non-empty input has a best run");
        let top = chosen.roc_auc().unwrap();
        prop_assert!(records.iter().all(|r| r.roc_auc().unwrap() <= top));
    }

    /// Property: best() is the FIRST record achieving the maximum
    #[test]
    fn prop_best_tie_breaks_first_seen(records in arb_records(16)) {
        let chosen = best(&records).expect("non-empty input has a best run");
        let top = chosen.roc_auc().unwrap();
        let first = records
            .iter()
            .find(|r| r.roc_auc().unwrap() == top)
            .unwrap();
        prop_assert_eq!(first.run_name(), chosen.run_name());
    }

    // ========================================================================
    // Grid Properties
    // ========================================================================

    /// Property: every record with a distinct identifier occupies a cell,
    /// and the grid never holds more cells than records
    #[test]
    fn prop_grid_covers_records(records in arb_records(8), idents in proptest::collection::vec(arb_ident(), 8)) {
        let rows: Vec<_> = records
            .iter()
            .zip(idents.iter())
            .enumerate()
            .map(|(i, (record, ident))| clinvar_sweep::export::SummaryRow {
                run: format!("run-{i}"),
                roc_auc: record.roc_auc().unwrap(),
                accuracy: record.accuracy().unwrap(),
                hidden_size: ident.hidden_size(),
                layers: ident.layers(),
                cycles: ident.cycles(),
                lr: ident.lr(),
                checkpoint: String::new(),
                config: String::new(),
            })
            .collect();
        prop_assume!(!rows.is_empty());

        let grid = MetricGrid::pivot(&rows, Axis::HiddenSize).unwrap();
        let filled: usize = (0..grid.n_rows())
            .map(|r| (0..grid.n_cols()).filter(|&c| grid.cell(r, c).is_some()).count())
            .sum();
        prop_assert!(filled >= 1);
        prop_assert!(filled <= rows.len());

        // Shared scale brackets every cell value.
        for r in 0..grid.n_rows() {
            for c in 0..grid.n_cols() {
                if let Some(v) = grid.cell(r, c) {
                    prop_assert!(v >= grid.vmin() && v <= grid.vmax());
                }
            }
        }
    }
}
