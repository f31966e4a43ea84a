//! End-to-end aggregation tests over real sweep directory trees.
//!
//! Each test builds a sweep root in a temp directory, runs the pipeline,
//! and asserts on the outcome plus the exported artifacts.

use std::path::Path;

use pretty_assertions::assert_eq;

use clinvar_sweep::config::SweepLayout;
use clinvar_sweep::export;
use clinvar_sweep::pipeline::{run_pipeline, PipelineOutcome};
use clinvar_sweep::sweep::RunIdent;
use clinvar_sweep::Error;

// =============================================================================
// Fixture helpers
// =============================================================================

fn layout_at(root: &Path) -> SweepLayout {
    SweepLayout {
        sweep_root: root.to_path_buf(),
        summary_file: root.join("sweep_summary.csv"),
        heatmap_file: root.join("figures/heatmap.png"),
        ..SweepLayout::default()
    }
}

/// Create one run directory with a config document matching its name.
fn make_run(root: &Path, ident: &RunIdent) -> std::path::PathBuf {
    let dir = root.join(ident.to_string());
    std::fs::create_dir(&dir).unwrap();
    let config = format!(
        "arch:\n  hidden_size: {}\n  L_layers: {}\n  L_cycles: {}\nlr: {}\n",
        ident.hidden_size(),
        ident.layers(),
        ident.cycles(),
        ident.lr(),
    );
    std::fs::write(dir.join("all_config.yaml"), config).unwrap();
    dir
}

fn write_metrics(dir: &Path, roc_auc: f64, accuracy: f64) {
    std::fs::write(
        dir.join("ClinVarEvaluator_metrics.json"),
        format!(r#"{{"ClinVar/roc_auc": {roc_auc}, "ClinVar/accuracy": {accuracy}}}"#),
    )
    .unwrap();
}

// =============================================================================
// Scenario A: mixed finished/unfinished sweep
// =============================================================================

#[test]
fn test_mixed_sweep_aggregates_finished_runs_only() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let run_a = make_run(tmp.path(), &RunIdent::new(2, 1, 64, 1e-3));
    let run_b = make_run(tmp.path(), &RunIdent::new(2, 1, 64, 5e-4));
    make_run(tmp.path(), &RunIdent::new(4, 1, 64, 1e-3)); // never evaluated
    write_metrics(&run_a, 0.91, 0.85);
    write_metrics(&run_b, 0.88, 0.83);

    let outcome = run_pipeline(&layout).unwrap();
    let PipelineOutcome::Reported { total, finished, best, summary_file, .. } = outcome else {
        panic!("expected a report, got {outcome:?}");
    };
    assert_eq!(total, 3);
    assert_eq!(finished, 2);
    assert_eq!(best.run, run_a.file_name().unwrap().to_str().unwrap());
    assert!((best.roc_auc - 0.91).abs() < 1e-12);

    // Exported table: header + exactly one row per finished run.
    let text = std::fs::read_to_string(&summary_file).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with("run,roc_auc,accuracy,hidden_size,L_layers,L_cycles,lr,checkpoint,config"));

    let rows = export::read_summary(&summary_file).unwrap();
    assert_eq!(rows.len(), 2);
    // Enumeration order is lexicographic: lr=0.0005 sorts before lr=0.001,
    // so the best run is the second exported row.
    assert_eq!(rows[0].run, run_b.file_name().unwrap().to_str().unwrap());
    assert_eq!(rows[1].run, best.run);
}

// =============================================================================
// Scenario B: foreign directories alongside valid runs
// =============================================================================

#[test]
fn test_foreign_directories_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let run = make_run(tmp.path(), &RunIdent::new(2, 1, 64, 1e-3));
    write_metrics(&run, 0.9, 0.8);
    std::fs::create_dir(tmp.path().join("garbage_folder")).unwrap();
    // Matches the run prefix but not the full grammar.
    std::fs::create_dir(tmp.path().join("arch.L_cycles=2,oops")).unwrap();

    let outcome = run_pipeline(&layout).unwrap();
    let PipelineOutcome::Reported { total, finished, .. } = outcome else {
        panic!("expected a report, got {outcome:?}");
    };
    assert_eq!(total, 1);
    assert_eq!(finished, 1);
}

// =============================================================================
// Scenario C: metrics file present but empty
// =============================================================================

#[test]
fn test_empty_metrics_document_is_incomplete_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let run = make_run(tmp.path(), &RunIdent::new(2, 1, 64, 1e-3));
    std::fs::write(run.join("ClinVarEvaluator_metrics.json"), "{}").unwrap();

    let outcome = run_pipeline(&layout).unwrap();
    assert!(matches!(outcome, PipelineOutcome::NoFinished { total: 1 }));
}

// =============================================================================
// Empty and missing sweep roots
// =============================================================================

#[test]
fn test_empty_root_reports_no_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let outcome = run_pipeline(&layout_at(tmp.path())).unwrap();
    assert!(matches!(outcome, PipelineOutcome::NoRuns));
}

#[test]
fn test_missing_root_is_fatal() {
    let layout = layout_at(Path::new("/nonexistent/sweep"));
    assert!(matches!(
        run_pipeline(&layout),
        Err(Error::SweepRootNotFound(_))
    ));
}

// =============================================================================
// Config document handling
// =============================================================================

#[test]
fn test_run_without_config_document_is_a_hard_error() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let ident = RunIdent::new(2, 1, 64, 1e-3);
    let dir = tmp.path().join(ident.to_string());
    std::fs::create_dir(&dir).unwrap();
    write_metrics(&dir, 0.9, 0.8);

    assert!(matches!(
        run_pipeline(&layout),
        Err(Error::MissingRunConfig(_))
    ));
}

#[test]
fn test_derived_eval_config_satisfies_the_config_requirement() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let ident = RunIdent::new(2, 1, 64, 1e-3);
    let dir = tmp.path().join(ident.to_string());
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(
        dir.join("eval_config.yaml"),
        "arch:\n  hidden_size: 64\n  L_layers: 1\n  L_cycles: 2\nlr: 0.001\n",
    )
    .unwrap();
    write_metrics(&dir, 0.9, 0.8);

    let outcome = run_pipeline(&layout).unwrap();
    let PipelineOutcome::Reported { finished, best, .. } = outcome else {
        panic!("expected a report, got {outcome:?}");
    };
    assert_eq!(finished, 1);
    assert!(best.config.ends_with("eval_config.yaml"));
}

// =============================================================================
// Checkpoint column
// =============================================================================

#[test]
fn test_latest_checkpoint_lands_in_the_exported_row() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = layout_at(tmp.path());

    let run = make_run(tmp.path(), &RunIdent::new(2, 1, 64, 1e-3));
    write_metrics(&run, 0.9, 0.8);
    std::fs::write(run.join("step_1000"), b"").unwrap();
    std::fs::write(run.join("step_1560"), b"").unwrap();

    let PipelineOutcome::Reported { best, .. } = run_pipeline(&layout).unwrap() else {
        panic!("expected a report");
    };
    assert!(best.checkpoint.ends_with("step_1560"));
}
