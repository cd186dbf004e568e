/// dsd_service — drop-size-distribution parameters from disdrometer counts.
///
/// Raw (diameter × velocity) counts are normalized into the spectrum N(D)
/// (`spectrum`), integrated into bulk rain variables (`bulk`), and the
/// resulting time series feed event segmentation and monthly climatology
/// (`analysis`). Outputs are labeled with the metadata in `attributes`.
pub mod analysis;
pub mod attributes;
pub mod bulk;
pub mod classes;
pub mod config;
pub mod fall_speed;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod series;
pub mod spectrum;
