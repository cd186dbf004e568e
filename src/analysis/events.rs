/// Precipitation event segmentation.
///
/// Scans a total-density series (Σ N(D) per step) for runs of steps above a
/// density threshold. Runs separated by a gap shorter than the break
/// tolerance are merged; a run becomes an event only if it has strictly more
/// than `min_event_length` steps.
///
/// Grouping is a single pass: each surviving step's group id is the number of
/// breaks seen so far.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::{self, Stage};
use crate::model::{DsdError, LabeledSeries, check_time_axis};

/// Segmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// An event needs strictly more than this many steps.
    pub min_event_length: usize,
    /// A gap of at least this many minutes between surviving steps starts a
    /// new group.
    pub max_break_minutes: i64,
    /// Steps with total density at or below this value are discarded.
    pub min_total_count: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            min_event_length: 10,
            max_break_minutes: 10,
            min_total_count: 5.0,
        }
    }
}

impl EventConfig {
    /// The break tolerance as a duration. Fails when it is not positive or
    /// does not fit in a `Duration`.
    pub fn max_break(&self) -> Result<Duration, DsdError> {
        Some(self.max_break_minutes)
            .filter(|&minutes| minutes > 0)
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                DsdError::InvalidParameter(format!(
                    "break tolerance must be a positive number of minutes within range, got {}",
                    self.max_break_minutes
                ))
            })
    }
}

/// Event boundaries as two parallel, time-ordered sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventTable {
    pub start: Vec<DateTime<Utc>>,
    pub end: Vec<DateTime<Utc>>,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
    }

    /// (start, end) pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>)> + '_ {
        self.start.iter().copied().zip(self.end.iter().copied())
    }

    fn push(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.start.push(start);
        self.end.push(end);
    }
}

/// Finds events in a total-density series.
///
/// `time` must be strictly ascending and as long as `density`. Missing
/// entries are skipped like sub-threshold ones. An empty or all-missing
/// series yields an empty table.
pub fn get_events(
    time: &[DateTime<Utc>],
    density: &[Option<f64>],
    config: &EventConfig,
) -> Result<EventTable, DsdError> {
    check_time_axis(time, density.len())?;
    let max_break = config.max_break()?;
    let mut events = EventTable::default();
    // (first, last, steps) of the group being scanned.
    let mut group: Option<(DateTime<Utc>, DateTime<Utc>, usize)> = None;

    let surviving = time
        .iter()
        .zip(density)
        .filter(|(_, d)| d.is_some_and(|v| v > config.min_total_count))
        .map(|(t, _)| *t);

    for t in surviving {
        group = match group {
            Some((first, last, steps)) if t - last < max_break => Some((first, t, steps + 1)),
            Some((first, last, steps)) => {
                if steps > config.min_event_length {
                    events.push(first, last);
                }
                Some((t, t, 1))
            }
            None => Some((t, t, 1)),
        };
    }
    if let Some((first, last, steps)) = group {
        if steps > config.min_event_length {
            events.push(first, last);
        }
    }

    logging::debug(
        Stage::Events,
        None,
        &format!("Found {} events in {} steps", events.len(), time.len()),
    );
    Ok(events)
}

/// Finds events in a labeled total-density series.
pub fn events_from_series(
    density: &LabeledSeries,
    config: &EventConfig,
) -> Result<EventTable, DsdError> {
    get_events(&density.time, &density.values, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(minute: i64) -> DateTime<Utc> {
        start() + Duration::minutes(minute)
    }

    /// Builds a series from (minute offset, density) pairs.
    fn series(points: &[(i64, Option<f64>)]) -> (Vec<DateTime<Utc>>, Vec<Option<f64>>) {
        points.iter().map(|&(m, d)| (at(m), d)).unzip()
    }

    fn run(first_minute: i64, len: usize, value: f64) -> Vec<(i64, Option<f64>)> {
        (0..len as i64).map(|i| (first_minute + i, Some(value))).collect()
    }

    #[test]
    fn eleven_step_run_then_gap_then_weak_tail() {
        let mut points = run(0, 11, 10.0);
        // 20-minute gap after the last sample at minute 10.
        points.extend(run(30, 2, 1.0));
        let (time, density) = series(&points);

        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.start[0], at(0));
        assert_eq!(events.end[0], at(10));
    }

    #[test]
    fn run_of_exactly_min_length_is_not_an_event() {
        let (time, density) = series(&run(0, 10, 50.0));
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert!(events.is_empty(), "10 steps is not strictly more than 10");
    }

    #[test]
    fn run_of_min_length_plus_one_is_an_event() {
        let (time, density) = series(&run(0, 11, 50.0));
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn gaps_shorter_than_tolerance_are_merged() {
        // Two 6-step runs separated by a 9-minute gap form one 12-step event.
        let mut points = run(0, 6, 20.0);
        points.extend(run(14, 6, 20.0));
        let (time, density) = series(&points);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events.iter().collect::<Vec<_>>(), vec![(at(0), at(19))]);
    }

    #[test]
    fn gap_equal_to_tolerance_breaks_the_run() {
        // Last sample at minute 5, next at minute 15: gap is exactly 10 min.
        let mut points = run(0, 6, 20.0);
        points.extend(run(15, 6, 20.0));
        let (time, density) = series(&points);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert!(events.is_empty(), "two 6-step groups, neither long enough");
    }

    #[test]
    fn sub_threshold_steps_split_events_through_the_gap_rule() {
        // 12 strong steps, 15 weak ones, 12 strong: the weak stretch is
        // dropped, leaving a 16-minute gap between surviving steps.
        let mut points = run(0, 12, 8.0);
        points.extend(run(12, 15, 5.0));
        points.extend(run(27, 12, 8.0));
        let (time, density) = series(&points);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(
            events.iter().collect::<Vec<_>>(),
            vec![(at(0), at(11)), (at(27), at(38))]
        );
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let (time, density) = series(&run(0, 20, 5.0));
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert!(events.is_empty(), "density equal to min_total_count is discarded");
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut points = run(0, 11, 10.0);
        points.insert(5, (100, None));
        points.sort_by_key(|p| p.0);
        let (time, density) = series(&points);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.end[0], at(10));
    }

    #[test]
    fn empty_and_all_missing_series_give_empty_tables() {
        let events = get_events(&[], &[], &EventConfig::default()).unwrap();
        assert!(events.is_empty());

        let (time, density) = series(&[(0, None), (1, None), (2, None)]);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events, EventTable::default());
    }

    #[test]
    fn break_tolerance_is_configurable() {
        let mut points = run(0, 6, 20.0);
        points.extend(run(9, 6, 20.0)); // 4-minute gap
        let (time, density) = series(&points);

        let tight = EventConfig {
            max_break_minutes: 3,
            ..EventConfig::default()
        };
        assert!(get_events(&time, &density, &tight).unwrap().is_empty());

        let loose = EventConfig {
            max_break_minutes: 5,
            ..EventConfig::default()
        };
        assert_eq!(get_events(&time, &density, &loose).unwrap().len(), 1);
    }

    #[test]
    fn unordered_time_is_rejected() {
        let (time, density) = series(&[(0, Some(10.0)), (2, Some(10.0)), (1, Some(10.0))]);
        let err = get_events(&time, &density, &EventConfig::default()).unwrap_err();
        assert_eq!(err, DsdError::UnorderedTimeIndex { index: 2 });
    }

    #[test]
    fn non_positive_break_is_rejected() {
        let config = EventConfig {
            max_break_minutes: 0,
            ..EventConfig::default()
        };
        assert!(get_events(&[], &[], &config).is_err());
    }

    #[test]
    fn out_of_range_break_is_rejected() {
        for minutes in [i64::MAX, i64::MAX / 2, i64::MIN] {
            let config = EventConfig {
                max_break_minutes: minutes,
                ..EventConfig::default()
            };
            let err = get_events(&[], &[], &config).unwrap_err();
            assert!(matches!(err, DsdError::InvalidParameter(_)), "got {:?}", err);
        }
    }

    #[test]
    fn large_break_within_range_is_accepted() {
        let config = EventConfig {
            max_break_minutes: 1_000_000,
            ..EventConfig::default()
        };
        assert_eq!(config.max_break(), Ok(Duration::minutes(1_000_000)));
        assert!(get_events(&[], &[], &config).unwrap().is_empty());
    }

    #[test]
    fn starts_and_ends_are_parallel_and_ordered() {
        let mut points = run(0, 12, 10.0);
        points.extend(run(60, 15, 10.0));
        points.extend(run(200, 11, 10.0));
        let (time, density) = series(&points);
        let events = get_events(&time, &density, &EventConfig::default()).unwrap();
        assert_eq!(events.start.len(), events.end.len());
        assert_eq!(events.len(), 3);
        assert!(events.start.windows(2).all(|w| w[0] < w[1]));
        assert!(events.iter().all(|(s, e)| s <= e));
    }
}
