/// Bulk DSD parameters integrated from N(D).
///
/// All integrals are weighted sums over the diameter classes with the class
/// width ΔD as measure (Tokay, Wolff & Petersen, 2014):
///
/// | variable | expression                                  | units     |
/// |----------|---------------------------------------------|-----------|
/// | R        | 6π·10⁻⁴ Σ D³ v(D) N(D) ΔD                  | mm/h      |
/// | W        | π ρw / 6000 Σ D³ N(D) ΔD                    | g m⁻³     |
/// | N_T      | Σ N(D) ΔD                                   | m⁻³       |
/// | Z        | Σ D⁶ N(D) ΔD                                | mm⁶/m³    |
/// | D_m      | Σ D⁴ N(D) ΔD / Σ D³ N(D) ΔD                 | mm        |
/// | N_w      | 4⁴/π ρw · 10³ W / D_m⁴                      | m⁻³ mm⁻¹  |

use std::f64::consts::PI;

use crate::attributes::{
    LIQUID_WATER_CONTENT, MEAN_DIAMETER, NORMALIZED_INTERCEPT, RAIN_RATE, REFLECTIVITY,
    TOTAL_CONCENTRATION, VariableAttrs,
};
use crate::classes::ClassificationTables;
use crate::fall_speed::atlas_ulbrich_velocity;
use crate::model::DsdError;
use crate::spectrum::Spectrum;

/// Density of liquid water, g/cm³.
pub const RHO_W: f64 = 1.0;

/// Bulk variables for one time step.
///
/// `mean_diameter` and `normalized_intercept` are `None` when their ratio is
/// undefined (no drops in the spectrum). The four plain sums are always
/// defined and are exactly zero for an empty spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkParameters {
    pub rain_rate: f64,
    pub liquid_water_content: f64,
    pub total_concentration: f64,
    pub reflectivity: f64,
    pub mean_diameter: Option<f64>,
    pub normalized_intercept: Option<f64>,
}

impl BulkParameters {
    /// Attributes of the six variables, in output order.
    pub const ATTRIBUTES: [VariableAttrs; 6] = [
        RAIN_RATE,
        LIQUID_WATER_CONTENT,
        TOTAL_CONCENTRATION,
        REFLECTIVITY,
        MEAN_DIAMETER,
        NORMALIZED_INTERCEPT,
    ];

    /// The six variables paired with their attributes, in output order.
    pub fn labeled(&self) -> [(VariableAttrs, Option<f64>); 6] {
        let values = [
            Some(self.rain_rate),
            Some(self.liquid_water_content),
            Some(self.total_concentration),
            Some(self.reflectivity),
            self.mean_diameter,
            self.normalized_intercept,
        ];
        std::array::from_fn(|k| (Self::ATTRIBUTES[k], values[k]))
    }

    /// Reflectivity in dBZ, `None` when Z is zero.
    pub fn reflectivity_dbz(&self) -> Option<f64> {
        (self.reflectivity > 0.0).then(|| 10.0 * self.reflectivity.log10())
    }
}

/// Integration weights for a fixed diameter grid.
#[derive(Debug, Clone)]
pub struct BulkIntegrator {
    diameters: Vec<f64>,
    widths: Vec<f64>,
    fall_speeds: Vec<f64>,
}

impl BulkIntegrator {
    pub fn new(tables: &ClassificationTables<'_>) -> Self {
        let diameters = tables.diameter().to_vec();
        // Validated tables only hold positive diameters.
        let fall_speeds = diameters
            .iter()
            .map(|&d| atlas_ulbrich_velocity(d).unwrap_or(0.0))
            .collect();
        Self {
            widths: tables.bin_widths(),
            diameters,
            fall_speeds,
        }
    }

    pub fn n_diameter(&self) -> usize {
        self.diameters.len()
    }

    /// Integrates one spectrum given as N(D) per diameter class.
    pub fn integrate(&self, nd: &[f64]) -> Result<BulkParameters, DsdError> {
        if nd.len() != self.diameters.len() {
            return Err(DsdError::ShapeMismatch {
                what: "spectrum diameter bins",
                expected: self.diameters.len(),
                found: nd.len(),
            });
        }

        let mut third = 0.0; // Σ D³ N ΔD
        let mut fourth = 0.0; // Σ D⁴ N ΔD
        let mut sixth = 0.0; // Σ D⁶ N ΔD
        let mut flux = 0.0; // Σ D³ v N ΔD
        let mut total = 0.0; // Σ N ΔD

        for (((&d, &width), &v), &n) in self
            .diameters
            .iter()
            .zip(&self.widths)
            .zip(&self.fall_speeds)
            .zip(nd)
        {
            let weighted = n * width;
            let d3 = d.powi(3);
            total += weighted;
            third += d3 * weighted;
            fourth += d3 * d * weighted;
            sixth += d3 * d3 * weighted;
            flux += d3 * v * weighted;
        }

        let liquid_water_content = PI * RHO_W / 6000.0 * third;
        let mean_diameter = ratio(fourth, third);
        let normalized_intercept = mean_diameter.filter(|&dm| dm != 0.0).and_then(|dm| {
            let scaled_content = 1e3 * liquid_water_content / dm.powi(4);
            finite(4f64.powi(4) / PI * RHO_W * scaled_content)
        });

        Ok(BulkParameters {
            rain_rate: 6.0 * PI / 1e4 * flux,
            liquid_water_content,
            total_concentration: total,
            reflectivity: sixth,
            mean_diameter,
            normalized_intercept,
        })
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Integrates one spectrum over the diameter grid of `tables`.
pub fn calculate_parameters_dsd(
    nd: &Spectrum,
    tables: &ClassificationTables<'_>,
) -> Result<BulkParameters, DsdError> {
    BulkIntegrator::new(tables).integrate(nd.values())
}
