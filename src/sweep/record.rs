//! Per-run records and the metrics loader
//!
//! One [`RunRecord`] per located run. Metrics are nullable by design: a
//! sweep in progress has runs whose results file does not exist yet, and
//! that is an expected state, not an error. The config document is the
//! opposite: it is required, because the hyperparameters must be
//! cross-checked and displayed even for incomplete runs.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::ident::RunIdent;
use super::locator::{self, SweepRun};
use crate::config::{ConfigHyperparams, EvalConfig, SweepLayout};
use crate::{Error, Result};

/// The three states a run's results file can be in.
///
/// `Absent` and `Malformed` both yield null metrics downstream; the
/// distinction exists so the malformed case can be surfaced as a warning
/// while a merely absent file stays silent.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsFile {
    /// The file exists and parsed as a JSON object.
    Present(serde_json::Map<String, serde_json::Value>),
    /// No results file: the run has not been evaluated yet.
    Absent,
    /// The file exists but is unreadable or not a JSON object.
    Malformed(String),
}

impl MetricsFile {
    /// Read a results file into its tri-state.
    ///
    /// Never fails: every IO or parse problem collapses into
    /// [`MetricsFile::Malformed`], a missing file into
    /// [`MetricsFile::Absent`].
    #[must_use]
    pub fn read(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::Absent,
            Err(err) => return Self::Malformed(err.to_string()),
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => Self::Present(map),
            Ok(_) => Self::Malformed("not a JSON object".to_string()),
            Err(err) => Self::Malformed(err.to_string()),
        }
    }

    /// Look up a metric by key.
    ///
    /// `None` for an absent/malformed file, and for a present document
    /// that is missing the key or holds a non-numeric value there.
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        match self {
            Self::Present(map) => map.get(key).and_then(serde_json::Value::as_f64),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

/// One row of the sweep: a run's identity, metrics, and artifact paths.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    run_name: String,
    ident: RunIdent,
    roc_auc: Option<f64>,
    accuracy: Option<f64>,
    checkpoint: Option<PathBuf>,
    config: PathBuf,
}

impl RunRecord {
    /// Load the record for a located run.
    ///
    /// Reads the run's config document (required), its results file
    /// (optional, tri-state), and its latest checkpoint path. When the
    /// config document disagrees with the identifier parsed from the
    /// directory name, the mismatch is logged per field and the parsed
    /// identifier stays canonical.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRunConfig`] when neither `all_config.yaml`
    /// nor the derived eval config exists, or a parse/IO error for an
    /// unreadable config document.
    pub fn load(layout: &SweepLayout, run: &SweepRun) -> Result<Self> {
        let config_path = find_config(layout, run.dir())?;
        let config = EvalConfig::load(&config_path)?;
        cross_check(run.name(), run.ident(), &config.hyperparams());

        let metrics = MetricsFile::read(&layout.metrics_path(run.dir()));
        if let MetricsFile::Malformed(reason) = &metrics {
            warn!(run = run.name(), %reason, "malformed metrics file");
        }

        let checkpoint = locator::latest_checkpoint(run.dir(), &layout.checkpoint_prefix)?;

        Ok(Self {
            run_name: run.name().to_string(),
            ident: *run.ident(),
            roc_auc: metrics.metric(&layout.metric_primary),
            accuracy: metrics.metric(&layout.metric_secondary),
            checkpoint,
            config: config_path,
        })
    }

    /// Construct a record directly (tests, external tables).
    #[must_use]
    pub fn new(
        run_name: String,
        ident: RunIdent,
        roc_auc: Option<f64>,
        accuracy: Option<f64>,
        checkpoint: Option<PathBuf>,
        config: PathBuf,
    ) -> Self {
        Self {
            run_name,
            ident,
            roc_auc,
            accuracy,
            checkpoint,
            config,
        }
    }

    /// The run's directory name.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// The run's hyperparameter tuple.
    #[must_use]
    pub const fn ident(&self) -> &RunIdent {
        &self.ident
    }

    /// Primary metric (ROC AUC), if evaluated.
    #[must_use]
    pub const fn roc_auc(&self) -> Option<f64> {
        self.roc_auc
    }

    /// Secondary metric (accuracy), if evaluated.
    #[must_use]
    pub const fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// Latest checkpoint file, if the run has one.
    #[must_use]
    pub fn checkpoint(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    /// The config document the record was loaded from.
    #[must_use]
    pub fn config(&self) -> &Path {
        &self.config
    }

    /// Whether both metrics are present (the run is eligible for
    /// ranking, export, and plotting).
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.roc_auc.is_some() && self.accuracy.is_some()
    }
}

fn find_config(layout: &SweepLayout, run_dir: &Path) -> Result<PathBuf> {
    let primary = layout.config_path(run_dir);
    if primary.is_file() {
        return Ok(primary);
    }
    let derived = layout.eval_config_path(run_dir);
    if derived.is_file() {
        return Ok(derived);
    }
    Err(Error::MissingRunConfig(run_dir.to_path_buf()))
}

fn cross_check(run: &str, ident: &RunIdent, claimed: &ConfigHyperparams) {
    let mut check_int = |field: &str, parsed: u32, claimed: Option<u64>| {
        if let Some(value) = claimed {
            if value != u64::from(parsed) {
                warn!(run, field, config = value, name = parsed, "config disagrees with directory name");
            }
        }
    };
    check_int("L_cycles", ident.cycles(), claimed.cycles);
    check_int("L_layers", ident.layers(), claimed.layers);
    check_int("hidden_size", ident.hidden_size(), claimed.hidden_size);
    if let Some(lr) = claimed.lr {
        if (lr - ident.lr()).abs() > ident.lr().abs() * 1e-9 {
            warn!(run, field = "lr", config = lr, name = ident.lr(), "config disagrees with directory name");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_metrics_file() {
        let metrics = MetricsFile::read(Path::new("/nonexistent/metrics.json"));
        assert_eq!(metrics, MetricsFile::Absent);
        assert_eq!(metrics.metric("ClinVar/roc_auc"), None);
    }

    #[test]
    fn test_present_metrics_with_missing_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.json");
        std::fs::write(&path, r#"{"ClinVar/roc_auc": 0.91}"#).unwrap();

        let metrics = MetricsFile::read(&path);
        assert_eq!(metrics.metric("ClinVar/roc_auc"), Some(0.91));
        assert_eq!(metrics.metric("ClinVar/accuracy"), None);
    }

    #[test]
    fn test_empty_object_yields_all_nulls() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.json");
        std::fs::write(&path, "{}").unwrap();

        let metrics = MetricsFile::read(&path);
        assert!(matches!(metrics, MetricsFile::Present(_)));
        assert_eq!(metrics.metric("ClinVar/roc_auc"), None);
    }

    #[test]
    fn test_truncated_json_is_malformed_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.json");
        std::fs::write(&path, r#"{"ClinVar/roc_auc": 0.9"#).unwrap();

        let metrics = MetricsFile::read(&path);
        assert!(matches!(metrics, MetricsFile::Malformed(_)));
        assert_eq!(metrics.metric("ClinVar/roc_auc"), None);
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(MetricsFile::read(&path), MetricsFile::Malformed(_)));
    }

    #[test]
    fn test_is_finished_requires_both_metrics() {
        let ident = RunIdent::new(2, 1, 64, 1e-3);
        let partial = RunRecord::new(
            "r".to_string(),
            ident,
            Some(0.9),
            None,
            None,
            PathBuf::from("c.yaml"),
        );
        assert!(!partial.is_finished());

        let full = RunRecord::new(
            "r".to_string(),
            ident,
            Some(0.9),
            Some(0.8),
            None,
            PathBuf::from("c.yaml"),
        );
        assert!(full.is_finished());
    }
}
