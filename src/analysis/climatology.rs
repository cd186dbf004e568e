/// Monthly precipitation totals and the annual cycle.
///
/// Monthly totals keep "no valid sample in the month" (`None`) apart from
/// "no rain in the month" (`Some(0.0)`). The annual cycle averages each
/// calendar month over the years in which it has a total.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::attributes::MONTHLY_PRECIP;
use crate::logging::{self, Stage};
use crate::model::{DsdError, LabeledSeries, check_time_axis};

/// Precipitation depth for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub year: i32,
    /// 1 = January.
    pub month: u32,
    /// mm; `None` if the month had no valid sample.
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualCycle {
    /// Every month from the first to the last sample, in order.
    pub monthly: Vec<MonthlyTotal>,
    /// Mean monthly depth per calendar month, index 0 = January.
    pub mean_by_month: [Option<f64>; 12],
}

impl AnnualCycle {
    /// Monthly totals as a labeled series stamped at the start of each month.
    pub fn monthly_series(&self) -> LabeledSeries {
        let (time, values): (Vec<_>, Vec<_>) = self
            .monthly
            .iter()
            .filter_map(|m| {
                Utc.with_ymd_and_hms(m.year, m.month, 1, 0, 0, 0)
                    .single()
                    .map(|t| (t, m.total))
            })
            .unzip();
        LabeledSeries {
            attrs: MONTHLY_PRECIP,
            time,
            values,
        }
    }
}

/// Annual cycle from a rain-rate series (mm/h) sampled every
/// `sample_minutes`. Each step contributes `R · sample_minutes / 60` mm.
pub fn annual_precipitation_cycle(
    time: &[DateTime<Utc>],
    rain_rate: &[Option<f64>],
    sample_minutes: f64,
) -> Result<AnnualCycle, DsdError> {
    if !(sample_minutes.is_finite() && sample_minutes > 0.0) {
        return Err(DsdError::InvalidParameter(format!(
            "sample interval must be positive, got {} min",
            sample_minutes
        )));
    }
    let depths: Vec<Option<f64>> = rain_rate
        .iter()
        .map(|r| r.map(|r| r * sample_minutes / 60.0))
        .collect();
    annual_precipitation_rain_gauge(time, &depths)
}

/// Annual cycle from gauge depths already in mm per step.
pub fn annual_precipitation_rain_gauge(
    time: &[DateTime<Utc>],
    depth_mm: &[Option<f64>],
) -> Result<AnnualCycle, DsdError> {
    check_time_axis(time, depth_mm.len())?;

    let mut totals: BTreeMap<(i32, u32), Option<f64>> = BTreeMap::new();
    if let (Some(first), Some(last)) = (time.first(), time.last()) {
        let mut key = (first.year(), first.month());
        let end = (last.year(), last.month());
        while key <= end {
            totals.insert(key, None);
            key = next_month(key);
        }
    }
    for (t, depth) in time.iter().zip(depth_mm) {
        if let Some(d) = depth.filter(|d| d.is_finite()) {
            let slot = totals.entry((t.year(), t.month())).or_insert(None);
            *slot = Some(slot.unwrap_or(0.0) + d);
        }
    }

    let mut sums = [0.0_f64; 12];
    let mut counts = [0usize; 12];
    for (&(_, month), total) in &totals {
        if let Some(total) = total {
            sums[month as usize - 1] += *total;
            counts[month as usize - 1] += 1;
        }
    }
    let mean_by_month: [Option<f64>; 12] =
        std::array::from_fn(|i| (counts[i] > 0).then(|| sums[i] / counts[i] as f64));

    let monthly: Vec<MonthlyTotal> = totals
        .into_iter()
        .map(|((year, month), total)| MonthlyTotal { year, month, total })
        .collect();

    let empty = monthly.iter().filter(|m| m.total.is_none()).count();
    logging::log_stage_summary(Stage::Climatology, None, monthly.len(), empty);

    Ok(AnnualCycle {
        monthly,
        mean_by_month,
    })
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn rain_rate_is_converted_to_depth_per_sample() {
        // One hour of 1-minute samples at 6 mm/h = 6 mm.
        let start = at(2023, 3, 10, 0);
        let time: Vec<_> = (0..60).map(|i| start + Duration::minutes(i)).collect();
        let rate = vec![Some(6.0); 60];
        let cycle = annual_precipitation_cycle(&time, &rate, 1.0).unwrap();
        assert_eq!(cycle.monthly.len(), 1);
        assert_relative_eq!(cycle.monthly[0].total.unwrap(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(cycle.mean_by_month[2].unwrap(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn months_without_samples_are_missing_not_zero() {
        let time = vec![at(2023, 1, 5, 0), at(2023, 3, 5, 0)];
        let depth = vec![Some(2.0), Some(0.0)];
        let cycle = annual_precipitation_rain_gauge(&time, &depth).unwrap();
        let totals: Vec<_> = cycle.monthly.iter().map(|m| (m.month, m.total)).collect();
        assert_eq!(totals, vec![(1, Some(2.0)), (2, None), (3, Some(0.0))]);
        assert_eq!(cycle.mean_by_month[1], None);
        assert_eq!(cycle.mean_by_month[2], Some(0.0), "dry month is zero, not missing");
    }

    #[test]
    fn all_missing_month_stays_missing() {
        let time = vec![at(2023, 6, 1, 0), at(2023, 6, 2, 0)];
        let cycle = annual_precipitation_rain_gauge(&time, &[None, None]).unwrap();
        assert_eq!(cycle.monthly[0].total, None);
        assert!(cycle.mean_by_month.iter().all(Option::is_none));
    }

    #[test]
    fn calendar_month_mean_spans_years() {
        let time = vec![at(2022, 7, 1, 0), at(2023, 7, 1, 0)];
        let depth = vec![Some(10.0), Some(30.0)];
        let cycle = annual_precipitation_rain_gauge(&time, &depth).unwrap();
        assert_eq!(cycle.monthly.len(), 13, "July 2022 through July 2023");
        assert_relative_eq!(cycle.mean_by_month[6].unwrap(), 20.0);
        assert_eq!(cycle.monthly.last().map(|m| (m.year, m.month)), Some((2023, 7)));
    }

    #[test]
    fn year_boundary_is_handled() {
        let time = vec![at(2022, 12, 31, 23), at(2023, 1, 1, 0)];
        let cycle = annual_precipitation_rain_gauge(&time, &[Some(1.0), Some(2.0)]).unwrap();
        let keys: Vec<_> = cycle.monthly.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(keys, vec![(2022, 12), (2023, 1)]);
    }

    #[test]
    fn empty_series_gives_empty_cycle() {
        let cycle = annual_precipitation_rain_gauge(&[], &[]).unwrap();
        assert!(cycle.monthly.is_empty());
        assert!(cycle.monthly_series().is_empty());
    }

    #[test]
    fn invalid_sample_interval_is_rejected() {
        assert!(annual_precipitation_cycle(&[], &[], 0.0).is_err());
    }

    #[test]
    fn monthly_series_is_labeled() {
        let time = vec![at(2023, 4, 15, 0)];
        let cycle = annual_precipitation_rain_gauge(&time, &[Some(3.5)]).unwrap();
        let series = cycle.monthly_series();
        assert_eq!(series.attrs.short_name, "r_month");
        assert_eq!(series.time, vec![at(2023, 4, 1, 0)]);
        assert_eq!(series.values, vec![Some(3.5)]);
    }
}
