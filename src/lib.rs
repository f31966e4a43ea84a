//! # ClinVar Sweep: Aggregation & Reporting Pipeline
//!
//! Aggregates results from a hyperparameter sweep of independently trained
//! checkpoints (one run directory per hyperparameter combination) into a
//! single tabular summary and a heatmap comparison of ROC AUC across the
//! swept dimensions. A companion driver evaluates any run that has no
//! results file yet, so aggregation always operates over finished runs.
//!
//! ## Pipeline
//!
//! ```text
//! locator ──> ident ──> eval::driver (fills missing metrics files)
//!                │
//!                └────> record ──> table ──> { export, report }
//! ```
//!
//! ## Tolerance policy
//!
//! A sweep in progress is the normal case, not an error: directories that
//! do not parse as run identifiers are skipped, runs without metrics are
//! carried as incomplete records and excluded from ranking/export/plotting,
//! and a rendering failure never invalidates an already-written summary.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use clinvar_sweep::config::SweepLayout;
//! use clinvar_sweep::pipeline::{run_pipeline, PipelineOutcome};
//!
//! let layout = SweepLayout::default();
//! match run_pipeline(&layout)? {
//!     PipelineOutcome::Reported { finished, .. } => {
//!         println!("aggregated {finished} finished runs");
//!     }
//!     outcome => println!("{}", outcome.message()),
//! }
//! # Ok::<(), clinvar_sweep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod eval;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod sweep;

pub use error::{Error, Result};
