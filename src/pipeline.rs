/// End-to-end processing of one station's raw records.
///
/// Runs the spectrum estimator, bulk integrator and event segmenter with a
/// single configuration and bundles the labeled results into a report that
/// serializes as self-describing JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::events::{EventTable, events_from_series};
use crate::bulk::BulkIntegrator;
use crate::classes::ClassificationTables;
use crate::config::DsdConfig;
use crate::fall_speed::fall_velocities;
use crate::logging::{self, Stage};
use crate::model::{DsdError, LabeledProfile, LabeledSeries, LabeledSpectra, RawRecord};
use crate::series::SpectrumSeries;
use crate::spectrum::SpectrumEstimator;

/// Labeled output for one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DsdReport {
    pub station: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub fall_speed: LabeledProfile,
    pub nd: LabeledSpectra,
    pub nd_total: LabeledSeries,
    /// Count cells left out of N(D) per step, see `Spectrum::undefined_cells`.
    pub nd_undefined_cells: LabeledSeries,
    pub bulk: Vec<LabeledSeries>,
    pub events: EventTable,
}

/// Processes `records` (ordered by time) with the instrument tables.
pub fn process_records(
    station: Option<&str>,
    records: Vec<RawRecord>,
    config: &DsdConfig,
) -> Result<DsdReport, DsdError> {
    let tables = ClassificationTables::instrument();
    let estimator = SpectrumEstimator::new(tables, config.spectrum.delta_t_secs)?;
    let integrator = BulkIntegrator::new(&tables);

    let mut series = SpectrumSeries::from_records(records, &estimator)?;
    if let Some(station) = station {
        series = series.with_station(station);
    }

    let bulk = series.bulk_parameters(&integrator)?;
    let nd_total = series.total_density();
    let events = events_from_series(&nd_total, &config.events)?;

    logging::info(
        Stage::System,
        station,
        &format!("{} steps processed, {} events", series.len(), events.len()),
    );

    Ok(DsdReport {
        station: station.map(String::from),
        generated_at: Utc::now(),
        fall_speed: fall_velocities(tables.diameter()),
        nd: series.labeled(),
        nd_total,
        nd_undefined_cells: series.undefined_cells(),
        bulk: bulk.labeled(),
        events,
    })
}
