/// Core data types for the disdrometer DSD service.
///
/// This module defines the shared domain model imported by all other modules:
/// raw count matrices, labeled outputs, and the error type. It contains no
/// numerical logic and no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::VariableAttrs;

// ---------------------------------------------------------------------------
// Raw counts
// ---------------------------------------------------------------------------

/// One integration interval of particle counts, indexed
/// `[diameter bin][velocity bin]`.
///
/// The shape is checked against the classification tables when the matrix
/// is built, so every `RawCounts` that exists is rectangular and matches the
/// tables it was validated against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCounts {
    counts: Vec<Vec<u32>>,
}

impl RawCounts {
    /// Validates `counts` against the expected (diameter, velocity) shape.
    pub fn new(
        counts: Vec<Vec<u32>>,
        n_diameter: usize,
        n_velocity: usize,
    ) -> Result<Self, DsdError> {
        if counts.len() != n_diameter {
            return Err(DsdError::ShapeMismatch {
                what: "diameter rows",
                expected: n_diameter,
                found: counts.len(),
            });
        }
        if let Some(row) = counts.iter().find(|row| row.len() != n_velocity) {
            return Err(DsdError::ShapeMismatch {
                what: "velocity columns",
                expected: n_velocity,
                found: row.len(),
            });
        }
        Ok(Self { counts })
    }

    /// An all-zero matrix of the given shape.
    pub fn zeros(n_diameter: usize, n_velocity: usize) -> Self {
        Self {
            counts: vec![vec![0; n_velocity]; n_diameter],
        }
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.counts
    }

    pub fn n_diameter(&self) -> usize {
        self.counts.len()
    }

    pub fn n_velocity(&self) -> usize {
        self.counts.first().map(Vec::len).unwrap_or(0)
    }

    /// Total particles in the interval.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .flat_map(|row| row.iter())
            .map(|&c| u64::from(c))
            .sum()
    }
}

/// A timestamped raw count record as delivered by a data loader.
///
/// `raw` is unvalidated here; it becomes a `RawCounts` once checked against
/// the classification tables.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub time: DateTime<Utc>,
    pub raw: Vec<Vec<u32>>,
}

// ---------------------------------------------------------------------------
// Labeled output
// ---------------------------------------------------------------------------

/// A one-dimensional labeled array along the time axis.
///
/// Missing values (undefined ratios) are `None` and serialize as `null`,
/// which keeps them distinct from a measured zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub attrs: VariableAttrs,
    pub time: Vec<DateTime<Utc>>,
    pub values: Vec<Option<f64>>,
}

impl LabeledSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A one-dimensional labeled array along the diameter axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledProfile {
    pub attrs: VariableAttrs,
    pub diameter: Vec<f64>,
    pub values: Vec<f64>,
}

/// A (time × diameter) labeled array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSpectra {
    pub attrs: VariableAttrs,
    pub time: Vec<DateTime<Utc>>,
    pub diameter: Vec<f64>,
    /// Indexed `[time][diameter]`.
    pub values: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural errors raised by the DSD pipeline.
///
/// Arithmetic edge cases (zero denominators, undefined ratios) never surface
/// here; they are resolved to zero contributions or `None` where they occur.
#[derive(Debug, Clone, PartialEq)]
pub enum DsdError {
    /// An input array does not have the dimensions the tables require.
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Class tables are empty, non-positive or not strictly increasing.
    InvalidClasses(String),
    /// A time axis and its values differ in length.
    LengthMismatch { times: usize, values: usize },
    /// Timestamps are not strictly ascending at `index`.
    UnorderedTimeIndex { index: usize },
    /// A numeric parameter is outside its valid domain.
    InvalidParameter(String),
}

impl std::fmt::Display for DsdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DsdError::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "Shape mismatch: expected {} {}, found {}", expected, what, found),
            DsdError::InvalidClasses(msg) => write!(f, "Invalid classification table: {}", msg),
            DsdError::LengthMismatch { times, values } => write!(
                f,
                "Length mismatch: {} timestamps but {} values",
                times, values
            ),
            DsdError::UnorderedTimeIndex { index } => {
                write!(f, "Time index not strictly ascending at position {}", index)
            }
            DsdError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for DsdError {}

/// Checks that `times` is strictly ascending and matches `values_len`.
pub(crate) fn check_time_axis(
    times: &[DateTime<Utc>],
    values_len: usize,
) -> Result<(), DsdError> {
    if times.len() != values_len {
        return Err(DsdError::LengthMismatch {
            times: times.len(),
            values: values_len,
        });
    }
    if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
        return Err(DsdError::UnorderedTimeIndex { index: i + 1 });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
