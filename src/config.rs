//! Sweep layout and evaluation-config documents
//!
//! All filesystem naming conventions live in one [`SweepLayout`] value that
//! is constructed at the CLI boundary and passed into each component.
//! Components never reach for module-level path constants, so the layout a
//! pipeline sees is always the one its caller chose.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::sweep::ident::RunIdent;
use crate::{Error, Result};

/// Filesystem conventions for one sweep.
///
/// The defaults describe the conventional project layout; every field can
/// be overridden before the layout is handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepLayout {
    /// Directory holding one subdirectory per run.
    pub sweep_root: PathBuf,
    /// Prefix a directory name must carry to be considered a run.
    pub run_prefix: String,
    /// Training config document inside a run directory.
    pub config_file: String,
    /// Derived per-run evaluation config written by the driver.
    pub eval_config_file: String,
    /// Checkpoint file name prefix (`step_<N>`).
    pub checkpoint_prefix: String,
    /// Results file recording a run's evaluated metrics.
    pub metrics_file: String,
    /// Key of the primary (ranking) metric inside the results file.
    pub metric_primary: String,
    /// Key of the secondary metric inside the results file.
    pub metric_secondary: String,
    /// Destination of the exported summary table.
    pub summary_file: PathBuf,
    /// Destination of the rendered heatmap.
    pub heatmap_file: PathBuf,
}

impl Default for SweepLayout {
    fn default() -> Self {
        Self {
            sweep_root: PathBuf::from("checkpoints/Clinvar_trm-ACT-torch"),
            run_prefix: RunIdent::DIR_PREFIX.to_string(),
            config_file: "all_config.yaml".to_string(),
            eval_config_file: "eval_config.yaml".to_string(),
            checkpoint_prefix: "step_".to_string(),
            metrics_file: "ClinVarEvaluator_metrics.json".to_string(),
            metric_primary: "ClinVar/roc_auc".to_string(),
            metric_secondary: "ClinVar/accuracy".to_string(),
            summary_file: PathBuf::from("sweep_summary.csv"),
            heatmap_file: PathBuf::from("docs/figures/clinvar_sweep_heatmap.png"),
        }
    }
}

impl SweepLayout {
    /// Path of a run's results file.
    #[must_use]
    pub fn metrics_path(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(&self.metrics_file)
    }

    /// Path of a run's training config document.
    #[must_use]
    pub fn config_path(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(&self.config_file)
    }

    /// Path of a run's derived evaluation config.
    #[must_use]
    pub fn eval_config_path(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(&self.eval_config_file)
    }
}

/// Hyperparameters a config document claims, for cross-checking against
/// the values parsed out of the run directory name.
///
/// Fields are `None` when the document does not carry them; the loader
/// only warns on a present-and-different value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigHyperparams {
    /// `arch.L_cycles`
    pub cycles: Option<u64>,
    /// `arch.L_layers`
    pub layers: Option<u64>,
    /// `arch.hidden_size`
    pub hidden_size: Option<u64>,
    /// Top-level `lr`
    pub lr: Option<f64>,
}

/// A YAML evaluation-config document.
///
/// The driver reads the base document fresh for every run before overlaying
/// that run's hyperparameters, so no overlay can leak across runs.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    doc: Value,
}

impl EvalConfig {
    /// Load a config document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let doc = serde_yaml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { doc })
    }

    /// Overlay a run's hyperparameters onto the document.
    ///
    /// Writes `arch.L_cycles`, `arch.L_layers`, `arch.hidden_size` and the
    /// top-level `lr`, mirroring how the sweep varied them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] if the document is not a mapping or
    /// has no `arch` mapping to receive the architecture fields.
    pub fn overlay(&mut self, ident: &RunIdent) -> Result<()> {
        let arch = self
            .doc
            .get_mut("arch")
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| Error::ConfigField("arch".to_string()))?;
        arch.insert(
            Value::String("L_cycles".to_string()),
            Value::from(u64::from(ident.cycles())),
        );
        arch.insert(
            Value::String("L_layers".to_string()),
            Value::from(u64::from(ident.layers())),
        );
        arch.insert(
            Value::String("hidden_size".to_string()),
            Value::from(u64::from(ident.hidden_size())),
        );

        let top = self
            .doc
            .as_mapping_mut()
            .ok_or_else(|| Error::ConfigField("<root mapping>".to_string()))?;
        top.insert(Value::String("lr".to_string()), Value::from(ident.lr()));
        Ok(())
    }

    /// Write the document to a YAML file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(&self.doc).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The hyperparameters this document claims, for cross-checking.
    #[must_use]
    pub fn hyperparams(&self) -> ConfigHyperparams {
        let arch = self.doc.get("arch");
        let int = |field: &str| -> Option<u64> {
            arch.and_then(|a| a.get(field)).and_then(Value::as_u64)
        };
        ConfigHyperparams {
            cycles: int("L_cycles"),
            layers: int("L_layers"),
            hidden_size: int("hidden_size"),
            lr: self.doc.get("lr").and_then(Value::as_f64),
        }
    }

    /// The underlying YAML document.
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.doc
    }
}
