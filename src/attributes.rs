/// Variable metadata registry for the disdrometer DSD service.
///
/// Maps each variable short name to its long name, units and storage type.
/// Every labeled array the service emits takes its attributes from here, so
/// this is the single source of truth for names and units.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Attribute metadata
// ---------------------------------------------------------------------------

/// Storage type of a variable in exported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Str,
    Float,
}

/// Descriptive metadata attached to a labeled variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariableAttrs {
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
    pub dtype: StorageType,
}

const fn float(
    short_name: &'static str,
    long_name: &'static str,
    units: &'static str,
) -> VariableAttrs {
    VariableAttrs {
        short_name,
        long_name,
        units,
        dtype: StorageType::Float,
    }
}

/// Attributes of the instrument telegram fields, as exported by the data
/// loader.
pub static INSTRUMENT_ATTRIBUTES: &[VariableAttrs] = &[
    VariableAttrs {
        short_name: "Client",
        long_name: "Quality indicator",
        units: "",
        dtype: StorageType::Str,
    },
    VariableAttrs {
        short_name: "Synop_Code",
        long_name: "SYNOP code",
        units: "",
        dtype: StorageType::Str,
    },
    float("r_int", "Rain intensity", "mm/h"),
    float("rl_int", "Liquid rain intensity", "mm/h"),
    float("rs_int", "Solid rain intensity", "mm/h"),
    float("r_acc", "Rain amount accumulated", "mm"),
    float("MOR", "Visibility in precipitation", "m"),
    float("ref", "Radar Reflectivity", "dBZ"),
    float("n_t", "Total drop measured", "count"),
    float("raw", "raw data", "count"),
    float("vd", "Fall speed (Atlas&Ulbrich)", "m/s"),
];

/// Drop-size spectrum N(D).
pub const ND: VariableAttrs = float("nd", "Field N(d)", "mm⁻¹ m⁻³");

/// Total spectrum density per step, Σ N(D) over diameter.
pub const ND_TOTAL: VariableAttrs = float("nd_total", "Total spectrum density", "mm⁻¹ m⁻³");

/// Count cells per step whose normalization was undefined and that were
/// left out of N(D).
pub const ND_UNDEFINED_CELLS: VariableAttrs =
    float("nd_undefined_cells", "Count cells excluded from N(d)", "count");

/// Terminal fall speed per diameter class.
pub const FALL_SPEED: VariableAttrs = float("vd", "Fall speed (Atlas&Ulbrich)", "m/s");

// Integrated bulk variables. r_int, n_t and ref share short names with the
// instrument fields but describe the spectrum-derived quantities.
pub const RAIN_RATE: VariableAttrs = float("r_int", "Rain intensity", "mm/h");
pub const LIQUID_WATER_CONTENT: VariableAttrs = float("lwc", "Liquid water content", "g m⁻³");
pub const TOTAL_CONCENTRATION: VariableAttrs = float("n_t", "Total drop concentration", "m⁻³");
pub const REFLECTIVITY: VariableAttrs = float("ref", "Radar reflectivity factor", "mm⁶/m³");
pub const MEAN_DIAMETER: VariableAttrs = float("d_m", "Mean diameter", "mm");
pub const NORMALIZED_INTERCEPT: VariableAttrs =
    float("n_w", "Normalized intercept parameter", "m⁻³ mm⁻¹");

/// Monthly precipitation depth.
pub const MONTHLY_PRECIP: VariableAttrs = float("r_month", "Monthly precipitation", "mm");

/// Attributes of variables computed by this service.
pub static DERIVED_ATTRIBUTES: &[VariableAttrs] = &[
    ND,
    ND_TOTAL,
    ND_UNDEFINED_CELLS,
    RAIN_RATE,
    LIQUID_WATER_CONTENT,
    TOTAL_CONCENTRATION,
    REFLECTIVITY,
    MEAN_DIAMETER,
    NORMALIZED_INTERCEPT,
    MONTHLY_PRECIP,
];

/// Looks up attributes by short name. Derived variables take precedence over
/// instrument fields sharing the same short name. Returns `None` if unknown.
pub fn find_attributes(short_name: &str) -> Option<&'static VariableAttrs> {
    DERIVED_ATTRIBUTES
        .iter()
        .chain(INSTRUMENT_ATTRIBUTES.iter())
        .find(|a| a.short_name == short_name)
}

/// Looks up an instrument telegram field by short name.
pub fn find_instrument_attributes(short_name: &str) -> Option<&'static VariableAttrs> {
    INSTRUMENT_ATTRIBUTES.iter().find(|a| a.short_name == short_name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
