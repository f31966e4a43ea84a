//! External evaluation driver
//!
//! Ensures every located run has a results file before aggregation, by
//! invoking the evaluation procedure out-of-process. The driver is
//! idempotent: a run whose results file already exists costs nothing.
//!
//! Execution model: derived configs are materialized sequentially in
//! enumeration order, then the pending invocations go through a bounded
//! worker pool. Each run produces its own [`EvalOutcome`]; a failing run
//! never aborts the rest of the sweep; failures are collected and
//! reported at the end.

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{EvalConfig, SweepLayout};
use crate::sweep::locator::{self, SweepRun};
use crate::{Error, Result};

/// How many trailing stderr bytes a failure outcome keeps.
const STDERR_TAIL: usize = 2048;

/// Driver settings, constructed at the CLI boundary.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Base evaluation config cloned and overlaid per run.
    pub base_config: PathBuf,
    /// Device string handed to the evaluator (`cpu`, `cuda`, ...).
    pub device: String,
    /// Evaluator command: program followed by leading arguments.
    pub evaluator: Vec<String>,
    /// Worker pool size; 1 preserves strict enumeration-order execution.
    pub workers: usize,
    /// Overall deadline; runs not started before it are skipped.
    pub timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_config: PathBuf::from("outputs/clinvar_config_eval.yaml"),
            device: "cpu".to_string(),
            evaluator: vec![
                "python".to_string(),
                "tools/evaluate_clinvar_checkpoint.py".to_string(),
            ],
            workers: 1,
            timeout: None,
        }
    }
}

/// Why a run was skipped without invoking the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The run directory holds no checkpoint to evaluate.
    NoCheckpoint,
    /// A results file already exists (idempotence).
    AlreadyEvaluated,
    /// The overall deadline passed, or the token was cancelled, before
    /// this run started.
    Cancelled,
}

/// Terminal state of one run under the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalStatus {
    /// The evaluator ran and exited zero.
    Evaluated,
    /// The evaluator was not invoked.
    Skipped(SkipReason),
    /// The evaluator failed to start or exited non-zero.
    Failed {
        /// Exit code, when the process ran at all.
        code: Option<i32>,
        /// Failure detail: a stderr excerpt or the spawn error.
        detail: String,
    },
}

/// Per-run result captured by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOutcome {
    run_name: String,
    status: EvalStatus,
}

impl EvalOutcome {
    /// The run this outcome belongs to.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// What happened to the run.
    #[must_use]
    pub const fn status(&self) -> &EvalStatus {
        &self.status
    }
}

/// Summary of one driver invocation, in enumeration order.
#[derive(Debug, Default)]
pub struct DriverReport {
    outcomes: Vec<EvalOutcome>,
}

impl DriverReport {
    /// All per-run outcomes, in enumeration order.
    #[must_use]
    pub fn outcomes(&self) -> &[EvalOutcome] {
        &self.outcomes
    }

    /// Number of runs the evaluator was actually invoked for.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == EvalStatus::Evaluated)
            .count()
    }

    /// The runs that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&EvalOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EvalStatus::Failed { .. }))
            .collect()
    }

    /// Number of runs skipped for the given reason.
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == EvalStatus::Skipped(reason))
            .count()
    }
}

/// Cooperative cancellation shared by the driver's workers.
///
/// Cancellation is checked before each run's invocation; an in-flight
/// evaluator process is never killed, only further launches are stopped.
#[derive(Debug)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// A token that cancels when `timeout` elapses (never, for `None`).
    #[must_use]
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Cancel now.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.cancel();
            return true;
        }
        false
    }
}

/// A run that still needs the evaluator.
#[derive(Debug)]
struct EvalJob {
    index: usize,
    run_name: String,
    eval_config: PathBuf,
    checkpoint: PathBuf,
    metrics: PathBuf,
}

enum Prepared {
    Job(EvalJob),
    Skip(usize, EvalOutcome),
}

/// Drives external evaluation over a sweep.
pub struct EvalDriver {
    layout: SweepLayout,
    config: DriverConfig,
}

impl EvalDriver {
    /// Create a driver for the given layout and settings.
    #[must_use]
    pub fn new(layout: SweepLayout, config: DriverConfig) -> Self {
        Self { layout, config }
    }

    /// Evaluate every located run that is missing a results file.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing sweep root, an unreadable or
    /// invalid base config, or a worker-pool setup failure. Per-run
    /// evaluator failures are captured in the report, not returned.
    pub fn run(&self) -> Result<DriverReport> {
        let token = CancellationToken::with_timeout(self.config.timeout);
        self.run_with_token(&token)
    }

    /// [`run`](Self::run) with an externally controlled cancellation token.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_token(&self, token: &CancellationToken) -> Result<DriverReport> {
        let program = self.config.evaluator.first().ok_or_else(|| Error::EvaluatorSpawn {
            command: String::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty evaluator command",
            ),
        })?;

        let runs = locator::parsed_runs(&self.layout)?;
        let mut outcomes: Vec<(usize, EvalOutcome)> = Vec::with_capacity(runs.len());
        let mut jobs: Vec<EvalJob> = Vec::new();
        for (index, run) in runs.iter().enumerate() {
            match self.prepare(index, run)? {
                Prepared::Job(job) => jobs.push(job),
                Prepared::Skip(index, outcome) => outcomes.push((index, outcome)),
            }
        }

        let workers = self.config.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;
        let invoked: Vec<(usize, EvalOutcome)> = pool.install(|| {
            jobs.par_iter()
                .map(|job| (job.index, self.invoke(program, job, token)))
                .collect()
        });

        outcomes.extend(invoked);
        outcomes.sort_by_key(|(index, _)| *index);
        Ok(DriverReport {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
        })
    }

    /// Steps 1-4 for one run: overlay and persist the derived config,
    /// select the checkpoint, and check idempotence.
    fn prepare(&self, index: usize, run: &SweepRun) -> Result<Prepared> {
        // The base document is read fresh for each run so overlays can
        // never leak across runs.
        let mut config = EvalConfig::load(&self.config.base_config)?;
        config.overlay(run.ident())?;
        let eval_config = self.layout.eval_config_path(run.dir());
        config.write(&eval_config)?;

        let Some(checkpoint) =
            locator::latest_checkpoint(run.dir(), &self.layout.checkpoint_prefix)?
        else {
            info!(run = run.name(), "no checkpoints (skipping)");
            return Ok(Prepared::Skip(
                index,
                EvalOutcome {
                    run_name: run.name().to_string(),
                    status: EvalStatus::Skipped(SkipReason::NoCheckpoint),
                },
            ));
        };

        let metrics = self.layout.metrics_path(run.dir());
        if metrics.is_file() {
            info!(run = run.name(), "metrics already present");
            return Ok(Prepared::Skip(
                index,
                EvalOutcome {
                    run_name: run.name().to_string(),
                    status: EvalStatus::Skipped(SkipReason::AlreadyEvaluated),
                },
            ));
        }

        Ok(Prepared::Job(EvalJob {
            index,
            run_name: run.name().to_string(),
            eval_config,
            checkpoint,
            metrics,
        }))
    }

    /// Step 5: one synchronous external invocation.
    fn invoke(&self, program: &str, job: &EvalJob, token: &CancellationToken) -> EvalOutcome {
        let status = if token.is_cancelled() {
            info!(run = %job.run_name, "cancelled before evaluation started");
            EvalStatus::Skipped(SkipReason::Cancelled)
        } else {
            info!(run = %job.run_name, device = %self.config.device, "evaluating");
            self.spawn_evaluator(program, job)
        };
        if let EvalStatus::Failed { code, detail } = &status {
            warn!(run = %job.run_name, ?code, %detail, "evaluation failed");
        }
        EvalOutcome {
            run_name: job.run_name.clone(),
            status,
        }
    }

    fn spawn_evaluator(&self, program: &str, job: &EvalJob) -> EvalStatus {
        let output = Command::new(program)
            .args(&self.config.evaluator[1..])
            .arg("--config")
            .arg(&job.eval_config)
            .arg("--checkpoint")
            .arg(&job.checkpoint)
            .arg("--device")
            .arg(&self.config.device)
            .arg("--output")
            .arg(&job.metrics)
            .output();

        match output {
            Ok(out) if out.status.success() => EvalStatus::Evaluated,
            Ok(out) => EvalStatus::Failed {
                code: out.status.code(),
                detail: stderr_tail(&out.stderr),
            },
            Err(err) => EvalStatus::Failed {
                code: None,
                detail: format!("failed to launch `{program}`: {err}"),
            },
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim_end();
    let start = trimmed.len().saturating_sub(STDERR_TAIL);
    // Keep to a char boundary when the tail cut lands inside one.
    let start = (start..trimmed.len())
        .find(|&i| trimmed.is_char_boundary(i))
        .unwrap_or(trimmed.len());
    trimmed[start..].to_string()
}
