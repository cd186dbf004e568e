/// Terminal fall speed of raindrops.
///
/// Atlas & Ulbrich (1977) power law, `v = 17.67 * (D / 10)^0.67`, with D in
/// mm (D / 10 is the diameter in cm) and v in m/s.

use crate::attributes::FALL_SPEED;
use crate::model::LabeledProfile;

const COEFFICIENT: f64 = 17.67;
const EXPONENT: f64 = 0.67;

/// Fall speed in m/s for a drop of `diameter_mm`.
///
/// Returns `None` for negative or non-finite diameters, where the power law
/// is undefined.
pub fn atlas_ulbrich_velocity(diameter_mm: f64) -> Option<f64> {
    if !diameter_mm.is_finite() || diameter_mm < 0.0 {
        return None;
    }
    Some(COEFFICIENT * (diameter_mm / 10.0).powf(EXPONENT))
}

/// Fall speed for each diameter, labeled `vd`.
///
/// Diameters come from a validated classification table, so an undefined
/// entry is reported as 0 m/s.
pub fn fall_velocities(diameters: &[f64]) -> LabeledProfile {
    LabeledProfile {
        attrs: FALL_SPEED,
        diameter: diameters.to_vec(),
        values: diameters
            .iter()
            .map(|&d| atlas_ulbrich_velocity(d).unwrap_or(0.0))
            .collect(),
    }
}
