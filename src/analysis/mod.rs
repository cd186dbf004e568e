/// Time-series analysis of DSD output.
///
/// Submodules:
/// - `events` — segments a total-density series into precipitation events.
/// - `climatology` — monthly totals and the annual precipitation cycle.

pub mod climatology;
pub mod events;
