/// Time series of spectra and bulk variables.
///
/// Ties the per-interval spectrum estimator and bulk integrator to a time
/// axis and produces the labeled (time, diameter) outputs consumed by
/// analysis tooling. Every step is computed independently; the time axis is
/// only required to be strictly ascending so the series can feed the event
/// segmenter directly.

use chrono::{DateTime, Utc};

use crate::attributes::{ND, ND_TOTAL, ND_UNDEFINED_CELLS};
use crate::bulk::{BulkIntegrator, BulkParameters};
use crate::logging::{self, Stage};
use crate::model::{DsdError, LabeledSeries, LabeledSpectra, RawCounts, RawRecord, check_time_axis};
use crate::spectrum::{Spectrum, SpectrumEstimator};

// ---------------------------------------------------------------------------
// Spectrum series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SpectrumSeries {
    station: Option<String>,
    diameter: Vec<f64>,
    time: Vec<DateTime<Utc>>,
    spectra: Vec<Spectrum>,
}

impl SpectrumSeries {
    /// Estimates N(D) for every interval in `counts`.
    pub fn from_counts(
        time: Vec<DateTime<Utc>>,
        counts: &[RawCounts],
        estimator: &SpectrumEstimator<'_>,
    ) -> Result<Self, DsdError> {
        check_time_axis(&time, counts.len())?;
        let spectra = counts
            .iter()
            .map(|raw| estimator.estimate(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let series = Self {
            station: None,
            diameter: estimator.tables().diameter().to_vec(),
            time,
            spectra,
        };
        series.report_undefined_cells();
        Ok(series)
    }

    /// Validates loader records against the estimator's tables, then
    /// estimates N(D) for each.
    pub fn from_records(
        records: Vec<RawRecord>,
        estimator: &SpectrumEstimator<'_>,
    ) -> Result<Self, DsdError> {
        let tables = estimator.tables();
        let mut time = Vec::with_capacity(records.len());
        let mut counts = Vec::with_capacity(records.len());
        for record in records {
            counts.push(RawCounts::new(
                record.raw,
                tables.n_diameter(),
                tables.n_velocity(),
            )?);
            time.push(record.time);
        }
        Self::from_counts(time, &counts, estimator)
    }

    /// Tags the series with a station identifier used in log messages.
    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = Some(station.into());
        self
    }

    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn diameter(&self) -> &[f64] {
        &self.diameter
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// Σ N(D) per step, the input of the event segmenter.
    pub fn total_density(&self) -> LabeledSeries {
        LabeledSeries {
            attrs: ND_TOTAL,
            time: self.time.clone(),
            values: self.spectra.iter().map(|s| Some(s.total_density())).collect(),
        }
    }

    /// Excluded count cells per step. Zero where N(D) is fully defined, so
    /// a dry step and a step with unusable counts stay distinguishable.
    pub fn undefined_cells(&self) -> LabeledSeries {
        LabeledSeries {
            attrs: ND_UNDEFINED_CELLS,
            time: self.time.clone(),
            values: self
                .spectra
                .iter()
                .map(|s| Some(s.undefined_cells() as f64))
                .collect(),
        }
    }

    /// N(D) as a labeled (time × diameter) array.
    pub fn labeled(&self) -> LabeledSpectra {
        LabeledSpectra {
            attrs: ND,
            time: self.time.clone(),
            diameter: self.diameter.clone(),
            values: self.spectra.iter().map(|s| s.values().to_vec()).collect(),
        }
    }

    /// Integrates every step into bulk variables.
    pub fn bulk_parameters(&self, integrator: &BulkIntegrator) -> Result<BulkSeries, DsdError> {
        let steps = self
            .spectra
            .iter()
            .map(|s| integrator.integrate(s.values()))
            .collect::<Result<Vec<_>, _>>()?;

        let undefined = steps.iter().filter(|b| b.mean_diameter.is_none()).count();
        logging::log_stage_summary(Stage::Integrator, self.station(), steps.len(), undefined);

        Ok(BulkSeries {
            time: self.time.clone(),
            steps,
        })
    }

    fn report_undefined_cells(&self) {
        let dropped: usize = self.spectra.iter().map(Spectrum::undefined_cells).sum();
        if dropped > 0 {
            logging::warn(
                Stage::Spectrum,
                self.station(),
                &format!(
                    "{} count cells had an undefined normalization and were excluded",
                    dropped
                ),
            );
        } else {
            logging::debug(
                Stage::Spectrum,
                self.station(),
                &format!("Estimated N(D) for {} steps", self.spectra.len()),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BulkSeries {
    time: Vec<DateTime<Utc>>,
    steps: Vec<BulkParameters>,
}

impl BulkSeries {
    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn steps(&self) -> &[BulkParameters] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn rain_rate(&self) -> Vec<Option<f64>> {
        self.steps.iter().map(|b| Some(b.rain_rate)).collect()
    }

    /// One labeled series per bulk variable, in the order of
    /// `BulkParameters::labeled`.
    pub fn labeled(&self) -> Vec<LabeledSeries> {
        let rows: Vec<_> = self.steps.iter().map(BulkParameters::labeled).collect();
        (0..6)
            .map(|k| LabeledSeries {
                attrs: BulkParameters::ATTRIBUTES[k],
                time: self.time.clone(),
                values: rows.iter().map(|row| row[k].1).collect(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ClassificationTables;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn minutes(n: usize) -> Vec<DateTime<Utc>> {
        (0..n).map(|i| start() + Duration::minutes(i as i64)).collect()
    }

    fn rainy_counts() -> RawCounts {
        let mut counts = vec![vec![0; 20]; 22];
        counts[5][8] = 40;
        counts[9][14] = 12;
        RawCounts::new(counts, 22, 20).unwrap()
    }

    fn estimator() -> SpectrumEstimator<'static> {
        SpectrumEstimator::new(ClassificationTables::instrument(), 60.0).unwrap()
    }

    #[test]
    fn test_series_keeps_one_spectrum_per_step() {
        let counts = vec![RawCounts::zeros(22, 20), rainy_counts(), RawCounts::zeros(22, 20)];
        let series = SpectrumSeries::from_counts(minutes(3), &counts, &estimator()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.diameter().len(), 22);

        let density = series.total_density();
        assert_eq!(density.attrs.short_name, "nd_total");
        assert_eq!(density.values[0], Some(0.0));
        assert!(density.values[1].unwrap() > 0.0);
    }

    #[test]
    fn test_undefined_cells_are_reported_per_step() {
        let counts = vec![RawCounts::zeros(22, 20), rainy_counts()];
        let dry = SpectrumSeries::from_counts(minutes(2), &counts, &estimator()).unwrap();
        assert_eq!(dry.undefined_cells().values, vec![Some(0.0), Some(0.0)]);

        // A subnormal interval underflows every denominator to zero.
        let underflow =
            SpectrumEstimator::new(ClassificationTables::instrument(), f64::from_bits(1)).unwrap();
        let series = SpectrumSeries::from_counts(minutes(2), &counts, &underflow).unwrap();
        let undefined = series.undefined_cells();
        assert_eq!(undefined.attrs.short_name, "nd_undefined_cells");
        assert_eq!(undefined.values, vec![Some(0.0), Some(2.0)]);
        assert_eq!(series.total_density().values[1], Some(0.0));
    }

    #[test]
    fn test_series_rejects_unordered_time() {
        let mut time = minutes(2);
        time.reverse();
        let counts = vec![rainy_counts(), rainy_counts()];
        let err = SpectrumSeries::from_counts(time, &counts, &estimator()).unwrap_err();
        assert_eq!(err, DsdError::UnorderedTimeIndex { index: 1 });
    }

    #[test]
    fn test_from_records_validates_shape() {
        let records = vec![RawRecord {
            time: start(),
            raw: vec![vec![0; 32]; 32],
        }];
        let err = SpectrumSeries::from_records(records, &estimator()).unwrap_err();
        assert!(matches!(err, DsdError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_labeled_spectra_shape() {
        let counts = vec![rainy_counts(); 4];
        let series = SpectrumSeries::from_counts(minutes(4), &counts, &estimator())
            .unwrap()
            .with_station("PAR01");
        assert_eq!(series.station(), Some("PAR01"));
        let labeled = series.labeled();
        assert_eq!(labeled.time.len(), 4);
        assert!(labeled.values.iter().all(|row| row.len() == 22));
        assert_eq!(labeled.attrs.short_name, "nd");
    }

    #[test]
    fn test_bulk_series_labels_and_missing_values() {
        let counts = vec![RawCounts::zeros(22, 20), rainy_counts()];
        let series = SpectrumSeries::from_counts(minutes(2), &counts, &estimator()).unwrap();
        let integrator = BulkIntegrator::new(&ClassificationTables::instrument());
        let bulk = series.bulk_parameters(&integrator).unwrap();
        assert_eq!(bulk.len(), 2);

        let labeled = bulk.labeled();
        assert_eq!(labeled.len(), 6);
        let d_m = labeled.iter().find(|s| s.attrs.short_name == "d_m").unwrap();
        assert_eq!(d_m.values[0], None, "dry step has undefined D_m");
        assert!(d_m.values[1].is_some());

        let r = labeled.iter().find(|s| s.attrs.short_name == "r_int").unwrap();
        assert_eq!(r.values[0], Some(0.0), "dry step has zero rain, not missing");
        assert_eq!(r.values, bulk.rain_rate());
    }

    #[test]
    fn test_labeled_series_serializes_missing_as_null() {
        let counts = vec![RawCounts::zeros(22, 20)];
        let series = SpectrumSeries::from_counts(minutes(1), &counts, &estimator()).unwrap();
        let integrator = BulkIntegrator::new(&ClassificationTables::instrument());
        let labeled = series.bulk_parameters(&integrator).unwrap().labeled();
        let json = serde_json::to_value(&labeled[4]).unwrap();
        assert_eq!(json["attrs"]["short_name"], "d_m");
        assert!(json["values"][0].is_null());
    }
}
