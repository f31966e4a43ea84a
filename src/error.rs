//! Error types for clinvar-sweep
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// clinvar-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Sweep root directory does not exist
    #[error("Sweep root not found: {0}\nPass the directory that holds the per-run sweep folders")]
    SweepRootNotFound(PathBuf),

    /// Run config document missing (hyperparameters cannot be cross-checked)
    #[error("No config document in {0}\nExpected all_config.yaml or eval_config.yaml")]
    MissingRunConfig(PathBuf),

    /// Config document failed to parse
    #[error("Config parse error in {path}: {source}")]
    ConfigParse {
        /// Document that failed to parse
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// Config document is missing a field the overlay must write
    #[error("Config field missing: {0}\nThe base config must carry an `arch` mapping and a top-level `lr`")]
    ConfigField(String),

    /// Summary table error (CSV read/write)
    #[error("Summary table error: {0}")]
    Table(#[from] csv::Error),

    /// Summary table row failed validation
    #[error("Summary row {row}: {reason}")]
    TableRow {
        /// 1-based data row index
        row: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// Row-axis name not one of the swept hyperparameters
    #[error("Unknown axis: {0}\nKnown axes: hidden_size, L_layers, L_cycles, lr")]
    UnknownAxis(String),

    /// Color palette name not known to the renderer
    #[error("Unknown palette: {0}\nKnown palettes: coolwarm, viridis, magma, grayscale")]
    UnknownPalette(String),

    /// Heatmap rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// No rows to pivot (the grid is undefined on an empty table)
    #[error("Nothing to plot: the summary table has no finished runs")]
    EmptyGrid,

    /// Worker pool could not be built
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// External evaluator could not be spawned
    #[error("Failed to launch evaluator `{command}`: {source}")]
    EvaluatorSpawn {
        /// Command line that failed to start
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
