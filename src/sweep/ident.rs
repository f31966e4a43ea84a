//! Run identifier grammar
//!
//! A run directory encodes its hyperparameter tuple in its name:
//!
//! ```text
//! arch.L_cycles=<int>,arch.L_layers=<int>,arch.hidden_size=<int>,lr=<float>
//! ```
//!
//! Parsing is a typed, total function: a conforming name yields a
//! [`RunIdent`], anything else yields an [`IdentReject`] carrying the
//! reason. Nothing in this module panics on foreign input, so directory
//! enumeration can route every rejection to a skip/log path.

use std::fmt;

use thiserror::Error;

/// Keys of the four grammar fields, in directory-name order.
const FIELD_KEYS: [&str; 4] = [
    "arch.L_cycles=",
    "arch.L_layers=",
    "arch.hidden_size=",
    "lr=",
];

/// Why a directory name is not a run identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentReject {
    /// The name does not have exactly four comma-separated fields.
    #[error("expected 4 comma-separated fields, found {0}")]
    FieldCount(usize),

    /// A field does not start with the key the grammar puts there.
    #[error("field {index} must start with `{expected}`")]
    Key {
        /// Zero-based field position.
        index: usize,
        /// The `key=` prefix the grammar expects at that position.
        expected: &'static str,
    },

    /// An integer field holds something other than base-10 digits.
    #[error("`{0}` is not a base-10 integer")]
    Int(String),

    /// The learning-rate field is not a decimal or exponential literal.
    #[error("`{0}` is not a learning rate")]
    Lr(String),
}

/// The hyperparameter tuple identifying one sweep run.
///
/// Derived deterministically from the run directory's name;
/// [`fmt::Display`] reconstructs that name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunIdent {
    cycles: u32,
    layers: u32,
    hidden_size: u32,
    lr: f64,
}

impl RunIdent {
    /// Literal prefix every run directory name carries.
    pub const DIR_PREFIX: &'static str = "arch.L_cycles=";

    /// Create an identifier from explicit hyperparameter values.
    #[must_use]
    pub const fn new(cycles: u32, layers: u32, hidden_size: u32, lr: f64) -> Self {
        Self {
            cycles,
            layers,
            hidden_size,
            lr,
        }
    }

    /// Parse a directory name against the identifier grammar.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentReject`] naming the first grammar violation.
    /// Non-conforming names are expected input (sibling directories of a
    /// sweep root), not exceptional conditions.
    pub fn parse(name: &str) -> Result<Self, IdentReject> {
        let fields: Vec<&str> = name.split(',').collect();
        if fields.len() != FIELD_KEYS.len() {
            return Err(IdentReject::FieldCount(fields.len()));
        }
        let cycles = parse_int(fields[0], 0)?;
        let layers = parse_int(fields[1], 1)?;
        let hidden_size = parse_int(fields[2], 2)?;
        let lr = parse_lr(fields[3])?;
        Ok(Self {
            cycles,
            layers,
            hidden_size,
            lr,
        })
    }

    /// Cycle count (`arch.L_cycles`).
    #[must_use]
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Layer count (`arch.L_layers`).
    #[must_use]
    pub const fn layers(&self) -> u32 {
        self.layers
    }

    /// Hidden size (`arch.hidden_size`).
    #[must_use]
    pub const fn hidden_size(&self) -> u32 {
        self.hidden_size
    }

    /// Learning rate (`lr`).
    #[must_use]
    pub const fn lr(&self) -> f64 {
        self.lr
    }
}

impl fmt::Display for RunIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arch.L_cycles={},arch.L_layers={},arch.hidden_size={},lr={}",
            self.cycles, self.layers, self.hidden_size, self.lr
        )
    }
}

fn strip_key(field: &str, index: usize) -> Result<&str, IdentReject> {
    let expected = FIELD_KEYS[index];
    field
        .strip_prefix(expected)
        .ok_or(IdentReject::Key { index, expected })
}

fn parse_int(field: &str, index: usize) -> Result<u32, IdentReject> {
    let value = strip_key(field, index)?;
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentReject::Int(value.to_string()));
    }
    value
        .parse()
        .map_err(|_| IdentReject::Int(value.to_string()))
}

/// Learning rates appear in plain decimal (`0.0005`) or exponential
/// (`5e-4`) notation. The accepted charset matches the directory-name
/// convention: a digits-and-dots mantissa, optionally `e` or `e-` and a
/// digit exponent. `f64` parsing then settles whether the literal is a
/// number at all (`1e-` or `0..1` are rejected there).
fn parse_lr(field: &str) -> Result<f64, IdentReject> {
    let value = strip_key(field, 3)?;
    let reject = || IdentReject::Lr(value.to_string());

    let (mantissa, exponent) = match value.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (value, None),
    };
    if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(reject());
    }
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix('-').unwrap_or(exp);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(reject());
        }
    }
    value.parse().map_err(|_| reject())
}
