/// Diameter and velocity classification tables.
///
/// Defines the instrument discretization shared by the spectrum estimator
/// and the bulk integrator. The default tables describe the laser-optical
/// disdrometer's 22 diameter classes and 20 velocity classes; all other
/// modules should take their grid from here rather than hardcoding values.

use crate::model::DsdError;

// ---------------------------------------------------------------------------
// Instrument tables
// ---------------------------------------------------------------------------

/// Diameter classes in mm, strictly increasing.
pub static DIAMETER_CLASSES: [f64; 22] = [
    0.125, 0.250, 0.375, 0.500, 0.750, 1.000, 1.250, 1.500, 1.750, 2.000, 2.500, 3.000, 3.500,
    4.000, 4.500, 5.000, 5.500, 6.000, 6.500, 7.000, 7.500, 8.000,
];

/// Velocity classes in m/s, strictly increasing.
pub static VELOCITY_CLASSES: [f64; 20] = [
    0.100, 0.200, 0.400, 0.600, 0.800, 1.000, 1.400, 1.800, 2.200, 2.600, 3.000, 3.400, 4.200,
    5.000, 5.800, 6.600, 7.400, 8.200, 9.000, 10.000,
];

/// Sensor beam length in mm (the long side of the sampling area).
pub const BEAM_LENGTH_MM: f64 = 228.0;

/// Sensor beam width in mm. A drop of diameter D is only counted when it
/// falls entirely inside the beam, hence the `D / 2` edge correction.
pub const BEAM_WIDTH_MM: f64 = 20.0;

const MM2_PER_M2: f64 = 1e6;

// ---------------------------------------------------------------------------
// Derived quantities
// ---------------------------------------------------------------------------

/// Width of each diameter class, used as the integration measure.
///
/// The first class has no lower neighbour, so its width is approximated by
/// its own value. The result always has the same length as `diameters`.
pub fn bin_widths(diameters: &[f64]) -> Vec<f64> {
    diameters
        .iter()
        .enumerate()
        .map(|(i, &d)| if i == 0 { d } else { d - diameters[i - 1] })
        .collect()
}

/// Effective sampling area in m² for drops of diameter `diameter_mm`:
/// `A = 228 * (20 - D / 2)` mm².
pub fn effective_sampling_area(diameter_mm: f64) -> f64 {
    BEAM_LENGTH_MM * (BEAM_WIDTH_MM - diameter_mm / 2.0) / MM2_PER_M2
}

// ---------------------------------------------------------------------------
// Classification tables
// ---------------------------------------------------------------------------

/// A validated pair of diameter and velocity class tables.
///
/// Every table reachable through this type is non-empty, strictly positive
/// and strictly increasing, and every diameter yields a positive sampling
/// area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationTables<'a> {
    diameter: &'a [f64],
    velocity: &'a [f64],
}

impl ClassificationTables<'static> {
    /// The built-in instrument tables.
    pub fn instrument() -> Self {
        Self {
            diameter: &DIAMETER_CLASSES,
            velocity: &VELOCITY_CLASSES,
        }
    }
}

impl Default for ClassificationTables<'static> {
    fn default() -> Self {
        Self::instrument()
    }
}

impl<'a> ClassificationTables<'a> {
    /// Validates a custom pair of tables.
    pub fn new(diameter: &'a [f64], velocity: &'a [f64]) -> Result<Self, DsdError> {
        check_increasing("diameter", diameter)?;
        check_increasing("velocity", velocity)?;
        if let Some(&d) = diameter
            .iter()
            .find(|&&d| effective_sampling_area(d) <= 0.0)
        {
            return Err(DsdError::InvalidClasses(format!(
                "diameter {} mm exceeds the sensor width (sampling area would be non-positive)",
                d
            )));
        }
        Ok(Self { diameter, velocity })
    }

    pub fn diameter(&self) -> &'a [f64] {
        self.diameter
    }

    pub fn velocity(&self) -> &'a [f64] {
        self.velocity
    }

    pub fn n_diameter(&self) -> usize {
        self.diameter.len()
    }

    pub fn n_velocity(&self) -> usize {
        self.velocity.len()
    }

    pub fn bin_widths(&self) -> Vec<f64> {
        bin_widths(self.diameter)
    }

    /// Effective sampling area in m² for each diameter class.
    pub fn sampling_areas(&self) -> Vec<f64> {
        self.diameter
            .iter()
            .map(|&d| effective_sampling_area(d))
            .collect()
    }
}

fn check_increasing(name: &str, classes: &[f64]) -> Result<(), DsdError> {
    if classes.is_empty() {
        return Err(DsdError::InvalidClasses(format!("{} table is empty", name)));
    }
    if let Some(&v) = classes.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(DsdError::InvalidClasses(format!(
            "{} class {} is not a positive finite value",
            name, v
        )));
    }
    if let Some(i) = classes.windows(2).position(|w| w[1] <= w[0]) {
        return Err(DsdError::InvalidClasses(format!(
            "{} table not strictly increasing at position {}",
            name,
            i + 1
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
