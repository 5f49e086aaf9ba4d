//! # Rate of Rise
//!
//! Converts a temperature series into a smoothed rate of change in degrees
//! per minute.
//!
//! ## Pipeline
//!
//! 1. **Differentiate**: `Δvalue / Δminutes` for each consecutive pair,
//!    stamped at the later point.
//! 2. **Resample**: walk a fixed grid (`resample_step_ms`) from the first to
//!    the last rate point; each grid value is the mean of the rate points
//!    within half a step of it, or `0.0` when none are.
//! 3. **Reject outliers**: drop points outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`,
//!    quartiles taken with a floor-indexed nearest-rank estimator.
//! 4. **Smooth**: trailing weighted moving average, weights `1..=window`
//!    increasing toward the newest point. Leading points use the shorter
//!    window available.
//!
//! The output length stays at or below the input length as long as the
//! input is sampled at least once per resample step (the live log is polled
//! every one or two seconds against a ten second step). Sparser input gets
//! zero-filled grid points and so more output points than frames.
//!
//! ## Usage
//!
//! ```
//! use roast_logger::signal::DerivedPoint;
//! use roast_logger::signal::rate_of_rise::RateOfRiseProcessor;
//!
//! // +1 degree every 2 seconds
//! let series: Vec<_> = (0..30)
//!     .map(|i| DerivedPoint::new(i * 2_000, 150.0 + i as f64))
//!     .collect();
//!
//! let ror = RateOfRiseProcessor::default().compute(&series);
//! assert!(ror.iter().all(|p| (p.value - 30.0).abs() < 1e-9));
//! ```

use super::DerivedPoint;

/// Default resample grid step (10 seconds)
pub const DEFAULT_RESAMPLE_STEP_MS: i64 = 10_000;

/// Default smoothing window in points
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Tukey fence multiplier for outlier rejection
pub const IQR_FENCE: f64 = 1.5;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Pure rate-of-rise pipeline parameterised by its two tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateOfRiseProcessor {
    resample_step_ms: i64,
    smoothing_window: usize,
}

impl Default for RateOfRiseProcessor {
    fn default() -> Self {
        Self {
            resample_step_ms: DEFAULT_RESAMPLE_STEP_MS,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl RateOfRiseProcessor {
    /// Creates a processor. Zero values are raised to one.
    #[must_use]
    pub fn new(resample_step_ms: i64, smoothing_window: usize) -> Self {
        Self {
            resample_step_ms: resample_step_ms.max(1),
            smoothing_window: smoothing_window.max(1),
        }
    }

    /// Returns the resample grid step in milliseconds.
    #[must_use]
    pub fn resample_step_ms(&self) -> i64 {
        self.resample_step_ms
    }

    /// Returns the smoothing window size in points.
    #[must_use]
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Run the full pipeline over a time-ordered series.
    ///
    /// Fewer than two input points yield an empty series.
    pub fn compute(&self, series: &[DerivedPoint]) -> Vec<DerivedPoint> {
        let rates = differentiate(series);
        if rates.is_empty() {
            return Vec::new();
        }

        let resampled = resample(&rates, self.resample_step_ms);
        let kept = reject_outliers(&resampled);
        smooth(&kept, self.smoothing_window)
    }
}

/// Stage 1: rate per minute between consecutive points.
///
/// Pairs that do not advance in time are skipped.
pub fn differentiate(series: &[DerivedPoint]) -> Vec<DerivedPoint> {
    series
        .windows(2)
        .filter_map(|pair| {
            let elapsed = pair[1].offset_millis - pair[0].offset_millis;
            if elapsed <= 0 {
                return None;
            }
            let minutes = elapsed as f64 / MILLIS_PER_MINUTE;
            Some(DerivedPoint::new(
                pair[1].offset_millis,
                (pair[1].value - pair[0].value) / minutes,
            ))
        })
        .collect()
}

/// Stage 2: mean of the points within half a step of each grid point.
pub fn resample(rates: &[DerivedPoint], step_ms: i64) -> Vec<DerivedPoint> {
    let (Some(first), Some(last)) = (rates.first(), rates.last()) else {
        return Vec::new();
    };
    let step_ms = step_ms.max(1);

    let mut resampled = Vec::new();
    let mut window_start = 0;
    let mut grid = first.offset_millis;

    while grid <= last.offset_millis {
        // |t - grid| <= step / 2, compared doubled in i128 to stay exact
        while window_start < rates.len()
            && doubled_gap(rates[window_start].offset_millis, grid) > i128::from(step_ms)
        {
            window_start += 1;
        }

        let (sum, count) = rates[window_start..]
            .iter()
            .take_while(|p| doubled_gap(grid, p.offset_millis) <= i128::from(step_ms))
            .fold((0.0, 0usize), |(sum, count), p| (sum + p.value, count + 1));

        let value = if count == 0 { 0.0 } else { sum / count as f64 };
        resampled.push(DerivedPoint::new(grid, value));

        match grid.checked_add(step_ms) {
            Some(next) => grid = next,
            None => break,
        }
    }

    resampled
}

/// `2 * (later - earlier)` without overflow
fn doubled_gap(earlier: i64, later: i64) -> i128 {
    (i128::from(later) - i128::from(earlier)) * 2
}

/// Floor-indexed nearest-rank percentile of an ascending slice.
///
/// `p` is a fraction in `[0, 1]`. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    sorted.get(rank).copied()
}

/// Stage 3: drop points outside the interquartile fences.
pub fn reject_outliers(points: &[DerivedPoint]) -> Vec<DerivedPoint> {
    let mut values: Vec<f64> = points.iter().map(|p| p.value).collect();
    values.sort_by(f64::total_cmp);

    let (Some(q1), Some(q3)) = (percentile(&values, 0.25), percentile(&values, 0.75)) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    points
        .iter()
        .filter(|p| p.value >= lower && p.value <= upper)
        .copied()
        .collect()
}

/// Stage 4: trailing triangular-weighted moving average.
pub fn smooth(points: &[DerivedPoint], window: usize) -> Vec<DerivedPoint> {
    let window = window.max(1);

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = (i + 1).saturating_sub(window);
            let (weighted, total) = points[start..=i]
                .iter()
                .zip(1u32..)
                .fold((0.0, 0.0), |(weighted, total), (p, weight)| {
                    let weight = f64::from(weight);
                    (weighted + p.value * weight, total + weight)
                });
            DerivedPoint::new(point.offset_millis, weighted / total)
        })
        .collect()
}

/// Identity of an append-only series: length plus both end points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeriesKey {
    len: usize,
    first: (i64, u64),
    last: (i64, u64),
}

impl SeriesKey {
    fn of(series: &[DerivedPoint]) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;
        Some(Self {
            len: series.len(),
            first: (first.offset_millis, first.value.to_bits()),
            last: (last.offset_millis, last.value.to_bits()),
        })
    }
}

/// Memoises the pipeline output for the last series seen.
///
/// The live log only grows at its tail, so a series is identified by its
/// length and end points. A shifted anchor changes every offset and
/// therefore the key.
#[derive(Debug, Clone)]
pub struct RateOfRiseCache {
    processor: RateOfRiseProcessor,
    key: Option<SeriesKey>,
    output: Vec<DerivedPoint>,
    computations: u64,
}

impl RateOfRiseCache {
    /// Creates an empty cache around a processor.
    #[must_use]
    pub fn new(processor: RateOfRiseProcessor) -> Self {
        Self {
            processor,
            key: None,
            output: Vec::new(),
            computations: 0,
        }
    }

    /// Returns the pipeline output for `series`, recomputing only on change.
    pub fn compute(&mut self, series: &[DerivedPoint]) -> &[DerivedPoint] {
        let key = SeriesKey::of(series);
        if key.is_none() || key != self.key {
            self.output = self.processor.compute(series);
            self.key = key;
            self.computations += 1;
        }
        &self.output
    }

    /// Number of times the pipeline actually ran.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Forget the memoised output.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.output.clear();
    }
}
