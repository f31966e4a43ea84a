//! Evaluation of incomplete runs
//!
//! The write side of the pipeline: for every located run that has no
//! results file, materialize a derived per-run config and invoke the
//! external evaluation procedure against the run's most recent
//! checkpoint. See [`driver`] for the execution model.

pub mod driver;

pub use driver::{
    CancellationToken, DriverConfig, DriverReport, EvalDriver, EvalOutcome, EvalStatus, SkipReason,
};
