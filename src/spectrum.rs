/// Drop-size spectrum estimation.
///
/// Converts one interval of raw (diameter × velocity) counts into the number
/// density N(D) per diameter class, in mm⁻¹ m⁻³:
///
/// ```text
/// N(D_i) = Σ_j  n_ij / (Δt · ΔD_i · v_j · A(D_i))
/// ```
///
/// after Tokay, Wolff & Petersen (2014), "Evaluation of the New Version of
/// the Laser-Optical Disdrometer, OTT Parsivel2", JTECH 31(6).

use crate::attributes::ND;
use crate::classes::ClassificationTables;
use crate::model::{DsdError, LabeledProfile, RawCounts};

/// Default integration interval of the instrument, in seconds.
pub const DEFAULT_DELTA_T_SECS: f64 = 60.0;

/// N(D) for one integration interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    values: Vec<f64>,
    /// Cells holding counts whose normalization denominator was zero or
    /// non-finite. Their counts are excluded from `values`.
    undefined_cells: usize,
}

impl Spectrum {
    /// Wraps precomputed densities, one per diameter class.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            undefined_cells: 0,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn undefined_cells(&self) -> usize {
        self.undefined_cells
    }

    /// Σ N(D) over all diameter classes.
    pub fn total_density(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Labeled view along the diameter axis of `tables`.
    pub fn labeled(&self, tables: &ClassificationTables<'_>) -> LabeledProfile {
        LabeledProfile {
            attrs: ND,
            diameter: tables.diameter().to_vec(),
            values: self.values.clone(),
        }
    }
}

/// Precomputes the per-class normalization terms for a fixed set of tables
/// and integration interval, so a long series only pays for them once.
#[derive(Debug, Clone)]
pub struct SpectrumEstimator<'a> {
    tables: ClassificationTables<'a>,
    delta_t_secs: f64,
    /// Δt · ΔD_i · A(D_i) per diameter class; multiplied by v_j per cell.
    diameter_terms: Vec<f64>,
}

impl<'a> SpectrumEstimator<'a> {
    pub fn new(tables: ClassificationTables<'a>, delta_t_secs: f64) -> Result<Self, DsdError> {
        if !(delta_t_secs.is_finite() && delta_t_secs > 0.0) {
            return Err(DsdError::InvalidParameter(format!(
                "integration interval must be positive, got {} s",
                delta_t_secs
            )));
        }
        let diameter_terms = tables
            .bin_widths()
            .iter()
            .zip(tables.sampling_areas())
            .map(|(width, area)| delta_t_secs * width * area)
            .collect();
        Ok(Self {
            tables,
            delta_t_secs,
            diameter_terms,
        })
    }

    pub fn tables(&self) -> &ClassificationTables<'a> {
        &self.tables
    }

    pub fn delta_t_secs(&self) -> f64 {
        self.delta_t_secs
    }

    /// Estimates N(D) from one interval of counts.
    ///
    /// A cell whose denominator is zero or non-finite contributes nothing;
    /// if it held counts, it is tallied in `Spectrum::undefined_cells`.
    pub fn estimate(&self, raw: &RawCounts) -> Result<Spectrum, DsdError> {
        if raw.n_diameter() != self.tables.n_diameter() {
            return Err(DsdError::ShapeMismatch {
                what: "diameter rows",
                expected: self.tables.n_diameter(),
                found: raw.n_diameter(),
            });
        }
        if raw.n_velocity() != self.tables.n_velocity() {
            return Err(DsdError::ShapeMismatch {
                what: "velocity columns",
                expected: self.tables.n_velocity(),
                found: raw.n_velocity(),
            });
        }

        let mut undefined_cells = 0;
        let values = raw
            .rows()
            .iter()
            .zip(&self.diameter_terms)
            .map(|(row, &diameter_term)| {
                row.iter()
                    .zip(self.tables.velocity())
                    .map(|(&count, &velocity)| {
                        let denominator = diameter_term * velocity;
                        if denominator.is_finite() && denominator > 0.0 {
                            f64::from(count) / denominator
                        } else {
                            if count > 0 {
                                undefined_cells += 1;
                            }
                            0.0
                        }
                    })
                    .sum::<f64>()
            })
            .collect();

        Ok(Spectrum {
            values,
            undefined_cells,
        })
    }
}

/// Estimates N(D) for one interval with a one-off estimator.
pub fn calculate_nd(
    raw: &RawCounts,
    tables: &ClassificationTables<'_>,
    delta_t_secs: f64,
) -> Result<Spectrum, DsdError> {
    SpectrumEstimator::new(*tables, delta_t_secs)?.estimate(raw)
}
