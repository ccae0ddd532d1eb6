//! Incremental per-series statistics.
//!
//! Two views are maintained side by side: a lifetime aggregate over every
//! point appended since the last reset, and a windowed aggregate over the
//! retained points whose time lies in `[current_time - window, current_time]`.
//! Both are updated point by point; the windowed view evicts with a two-pointer scheme
//! and keeps its extrema in monotonic deques, so nothing rescans history.

use std::collections::VecDeque;

use crate::geom::Datum;

/// A minimum or maximum together with the datum that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    /// Time of the extreme sample (NaN before any data).
    pub time: f64,
    /// Extreme value, or an infinite sentinel before any data.
    pub value: f64,
}

impl Extremum {
    /// Sentinel for a minimum that has seen no data.
    pub const NO_MIN: Self = Self {
        time: f64::NAN,
        value: f64::INFINITY,
    };

    /// Sentinel for a maximum that has seen no data.
    pub const NO_MAX: Self = Self {
        time: f64::NAN,
        value: f64::NEG_INFINITY,
    };

    fn from_datum(datum: Datum) -> Self {
        Self {
            time: datum.time,
            value: datum.value,
        }
    }

    /// Whether a real sample backs this extremum.
    pub fn is_defined(&self) -> bool {
        self.value.is_finite()
    }

    /// The extreme value, or `baseline` while no data has arrived.
    pub fn value_or(&self, baseline: f64) -> f64 {
        if self.is_defined() {
            self.value
        } else {
            baseline
        }
    }

    /// The backing sample, if any.
    pub fn datum(&self) -> Option<Datum> {
        self.is_defined().then(|| Datum::new(self.time, self.value))
    }
}

/// Count, sums, mean and extrema of a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Number of samples.
    pub count: usize,
    /// Sum of values.
    pub sum: f64,
    /// Sum of squared values.
    pub sum_squares: f64,
    /// `sum / count`, NaN when empty.
    pub mean: f64,
    /// Smallest value (first occurrence wins ties).
    pub min: Extremum,
    /// Largest value (first occurrence wins ties).
    pub max: Extremum,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aggregate {
    /// An aggregate over no samples.
    pub const fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_squares: 0.0,
            mean: f64::NAN,
            min: Extremum::NO_MIN,
            max: Extremum::NO_MAX,
        }
    }

    /// Recompute an aggregate from scratch.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Datum>,
    {
        let mut aggregate = Self::empty();
        for datum in points {
            aggregate.push(*datum);
        }
        aggregate
    }

    /// Fold one sample into the aggregate.
    pub fn push(&mut self, datum: Datum) {
        self.count += 1;
        self.sum += datum.value;
        self.sum_squares += datum.value * datum.value;
        self.mean = self.sum / self.count as f64;
        if datum.value < self.min.value {
            self.min = Extremum::from_datum(datum);
        }
        if datum.value > self.max.value {
            self.max = Extremum::from_datum(datum);
        }
    }

    /// Population variance, NaN when empty.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        (self.sum_squares / self.count as f64 - self.mean * self.mean).max(0.0)
    }

    /// Population standard deviation, NaN when empty.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Mean, or `baseline` while no data has arrived.
    pub fn mean_or(&self, baseline: f64) -> f64 {
        if self.count == 0 { baseline } else { self.mean }
    }
}

/// Lifetime and windowed statistics for one series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeriesStatistics {
    /// Statistics over every point since the last reset.
    pub lifetime: Aggregate,
    /// Statistics over the trailing window.
    pub windowed: Aggregate,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    seq: u64,
    datum: Datum,
}

/// Neumaier-compensated running sum.
///
/// Subtracting a large evicted value must not swallow the small values that
/// remain in the window.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Evictions after which the window sums are recomputed from its entries,
/// at least; the actual threshold also scales with the window size so the
/// rebuild stays amortized O(1).
const MIN_REBUILD_EVICTIONS: usize = 64;

/// Sliding-window aggregate with amortized O(1) eviction.
#[derive(Debug, Clone)]
struct SlidingWindow {
    length: f64,
    next_seq: u64,
    entries: VecDeque<Entry>,
    minima: VecDeque<Entry>,
    maxima: VecDeque<Entry>,
    sum: CompensatedSum,
    sum_squares: CompensatedSum,
    evictions_since_rebuild: usize,
    aggregate: Aggregate,
}

impl SlidingWindow {
    fn new(length: f64) -> Self {
        Self {
            length,
            next_seq: 0,
            entries: VecDeque::new(),
            minima: VecDeque::new(),
            maxima: VecDeque::new(),
            sum: CompensatedSum::default(),
            sum_squares: CompensatedSum::default(),
            evictions_since_rebuild: 0,
            aggregate: Aggregate::empty(),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.minima.clear();
        self.maxima.clear();
        self.sum = CompensatedSum::default();
        self.sum_squares = CompensatedSum::default();
        self.evictions_since_rebuild = 0;
        self.aggregate = Aggregate::empty();
    }

    fn push(&mut self, datum: Datum) {
        let entry = Entry {
            seq: self.next_seq,
            datum,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.push_back(entry);
        while self
            .minima
            .back()
            .is_some_and(|back| back.datum.value > datum.value)
        {
            self.minima.pop_back();
        }
        self.minima.push_back(entry);
        while self
            .maxima
            .back()
            .is_some_and(|back| back.datum.value < datum.value)
        {
            self.maxima.pop_back();
        }
        self.maxima.push_back(entry);

        self.aggregate.count += 1;
        self.sum.add(datum.value);
        self.sum_squares.add(datum.value * datum.value);
        self.refresh();
    }

    /// Drop entries that fell out of `[current_time - length, current_time]`.
    fn evict(&mut self, current_time: f64) {
        if !self.length.is_finite() || !current_time.is_finite() {
            return;
        }
        let cutoff = current_time - self.length;
        self.pop_front_while(|datum| datum.time < cutoff);
    }

    /// Drop entries the series buffer evicts for the same age limit.
    fn evict_older_than(&mut self, cutoff_age: f64, current_time: f64) {
        if !cutoff_age.is_finite() || !current_time.is_finite() {
            return;
        }
        self.pop_front_while(|datum| current_time - datum.time > cutoff_age);
    }

    fn pop_front_while(&mut self, stale: impl Fn(&Datum) -> bool) {
        let mut evicted = false;
        while let Some(head) = self.entries.front().copied() {
            if !stale(&head.datum) {
                break;
            }
            self.entries.pop_front();
            if self.minima.front().is_some_and(|min| min.seq == head.seq) {
                self.minima.pop_front();
            }
            if self.maxima.front().is_some_and(|max| max.seq == head.seq) {
                self.maxima.pop_front();
            }
            self.aggregate.count -= 1;
            self.sum.add(-head.datum.value);
            self.sum_squares.add(-(head.datum.value * head.datum.value));
            self.evictions_since_rebuild += 1;
            evicted = true;
        }
        if !evicted {
            return;
        }
        if self.aggregate.count == 0 {
            self.sum = CompensatedSum::default();
            self.sum_squares = CompensatedSum::default();
            self.evictions_since_rebuild = 0;
        } else if self.evictions_since_rebuild >= self.entries.len().max(MIN_REBUILD_EVICTIONS) {
            self.rebuild_sums();
        }
        self.refresh();
    }

    fn rebuild_sums(&mut self) {
        let mut sum = CompensatedSum::default();
        let mut sum_squares = CompensatedSum::default();
        for entry in &self.entries {
            sum.add(entry.datum.value);
            sum_squares.add(entry.datum.value * entry.datum.value);
        }
        self.sum = sum;
        self.sum_squares = sum_squares;
        self.evictions_since_rebuild = 0;
    }

    fn refresh(&mut self) {
        let aggregate = &mut self.aggregate;
        aggregate.sum = self.sum.value();
        aggregate.sum_squares = self.sum_squares.value();
        aggregate.mean = if aggregate.count == 0 {
            f64::NAN
        } else {
            aggregate.sum / aggregate.count as f64
        };
        aggregate.min = self
            .minima
            .front()
            .map_or(Extremum::NO_MIN, |entry| Extremum::from_datum(entry.datum));
        aggregate.max = self
            .maxima
            .front()
            .map_or(Extremum::NO_MAX, |entry| Extremum::from_datum(entry.datum));
    }
}

/// Incremental statistics for one series.
///
/// The lifetime view covers every point folded in since the last reset. The
/// windowed view covers only points that are both inside the trailing window
/// and still retained by the series buffer; with an infinite window it
/// matches the retained buffer exactly.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    lifetime: Aggregate,
    window: SlidingWindow,
}

impl StatisticsEngine {
    /// Create an engine with the given trailing window length.
    pub fn new(window: f64) -> Self {
        Self {
            lifetime: Aggregate::empty(),
            window: SlidingWindow::new(window),
        }
    }

    /// Fold new points in and evict window entries older than the window.
    ///
    /// Points with a non-finite time or value are ignored.
    pub fn update(&mut self, points: &[Datum], current_time: f64) {
        for datum in points.iter().filter(|datum| datum.is_finite()) {
            self.lifetime.push(*datum);
            self.window.push(*datum);
        }
        self.window.evict(current_time);
    }

    /// Advance the window to a new current time without adding points.
    pub fn advance(&mut self, current_time: f64) {
        self.window.evict(current_time);
    }

    /// Mirror a buffer eviction: drop windowed entries with
    /// `current_time - time > cutoff_age`.
    pub fn evict_older_than(&mut self, cutoff_age: f64, current_time: f64) {
        self.window.evict_older_than(cutoff_age, current_time);
    }

    /// Forget all statistics.
    pub fn reset(&mut self) {
        self.lifetime = Aggregate::empty();
        self.window.clear();
    }

    /// Change the window length and rebuild the windowed view.
    ///
    /// The rebuild scans `retained` (the series buffer) once, so points that
    /// were already evicted from the buffer cannot re-enter the window.
    pub fn set_window<'a, I>(&mut self, length: f64, retained: I, current_time: f64)
    where
        I: IntoIterator<Item = &'a Datum>,
    {
        self.window = SlidingWindow::new(length);
        for datum in retained.into_iter().filter(|datum| datum.is_finite()) {
            self.window.push(*datum);
        }
        self.window.evict(current_time);
    }

    /// Current window length.
    pub fn window_length(&self) -> f64 {
        self.window.length
    }

    /// Statistics since the last reset.
    pub fn lifetime(&self) -> &Aggregate {
        &self.lifetime
    }

    /// Statistics over the trailing window.
    pub fn windowed(&self) -> &Aggregate {
        &self.window.aggregate
    }

    /// Copy both views.
    pub fn snapshot(&self) -> SeriesStatistics {
        SeriesStatistics {
            lifetime: self.lifetime,
            windowed: self.window.aggregate,
        }
    }
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn empty_aggregate_uses_sentinels() {
        let engine = StatisticsEngine::default();
        let lifetime = engine.lifetime();
        assert_eq!(lifetime.count, 0);
        assert!(lifetime.mean.is_nan());
        assert_eq!(lifetime.min.value, f64::INFINITY);
        assert_eq!(lifetime.max.value, f64::NEG_INFINITY);
        assert_eq!(lifetime.min.value_or(0.0), 0.0);
        assert_eq!(lifetime.max.datum(), None);
    }

    #[test]
    fn lifetime_mean_and_extrema() {
        let mut engine = StatisticsEngine::default();
        engine.update(&[Datum::new(0.0, 1.0)], 0.0);
        engine.update(&[Datum::new(25.0, 2.0)], 25.0);
        let lifetime = engine.lifetime();
        assert_eq!(lifetime.count, 2);
        assert_eq!(lifetime.mean, 1.5);
        assert_eq!(lifetime.min.datum(), Some(Datum::new(0.0, 1.0)));
        assert_eq!(lifetime.max.datum(), Some(Datum::new(25.0, 2.0)));
        assert_eq!(engine.windowed(), lifetime);
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let mut engine = StatisticsEngine::new(100.0);
        engine.update(&[Datum::new(0.0, 3.0), Datum::new(1.0, 3.0)], 1.0);
        assert_eq!(engine.lifetime().max.time, 0.0);
        assert_eq!(engine.windowed().max.time, 0.0);
        assert_eq!(engine.windowed().min.time, 0.0);
    }

    #[test]
    fn windowed_view_evicts_old_points() {
        let mut engine = StatisticsEngine::new(10.0);
        engine.update(
            &[
                Datum::new(0.0, 100.0),
                Datum::new(5.0, -4.0),
                Datum::new(12.0, 2.0),
                Datum::new(15.0, 6.0),
            ],
            15.0,
        );
        let windowed = engine.windowed();
        assert_eq!(windowed.count, 3);
        assert!(close(windowed.mean, 4.0 / 3.0));
        assert_eq!(windowed.min.datum(), Some(Datum::new(5.0, -4.0)));
        assert_eq!(windowed.max.datum(), Some(Datum::new(15.0, 6.0)));
        assert_eq!(engine.lifetime().max.value, 100.0);

        engine.advance(30.0);
        let windowed = engine.windowed();
        assert_eq!(windowed.count, 0);
        assert!(windowed.mean.is_nan());
        assert!(!windowed.min.is_defined());
        assert_eq!(windowed.sum, 0.0);
    }

    #[test]
    fn set_window_rebuilds_from_retained_points() {
        let retained = [
            Datum::new(0.0, 1.0),
            Datum::new(10.0, 2.0),
            Datum::new(20.0, 3.0),
        ];
        let mut engine = StatisticsEngine::default();
        engine.update(&retained, 20.0);
        engine.set_window(10.0, retained.iter(), 20.0);
        assert_eq!(engine.windowed().count, 2);
        assert!(close(engine.windowed().mean, 2.5));
        engine.set_window(f64::INFINITY, retained.iter(), 20.0);
        assert_eq!(engine.windowed().count, 3);
    }

    #[test]
    fn variance_matches_definition() {
        let points = [Datum::new(0.0, 2.0), Datum::new(1.0, 4.0), Datum::new(2.0, 6.0)];
        let aggregate = Aggregate::from_points(points.iter());
        assert!(close(aggregate.variance(), 8.0 / 3.0));
        assert!(Aggregate::empty().std_dev().is_nan());
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut engine = StatisticsEngine::new(10.0);
        engine.update(&[Datum::new(0.0, f64::NAN)], 0.0);
        engine.update(&[Datum::new(5.0, f64::INFINITY)], 5.0);
        engine.update(&[Datum::new(20.0, 1.0), Datum::new(21.0, 3.0)], 21.0);
        let windowed = engine.windowed();
        assert_eq!(windowed.count, 2);
        assert_eq!(windowed.sum, 4.0);
        assert_eq!(windowed.mean, 2.0);
        assert_eq!(engine.lifetime().count, 2);
        assert_eq!(engine.lifetime().mean, 2.0);
    }

    #[test]
    fn evicting_a_huge_value_keeps_small_ones() {
        let mut engine = StatisticsEngine::new(10.0);
        engine.update(&[Datum::new(0.0, 1e17)], 0.0);
        engine.update(&[Datum::new(20.0, 1.0), Datum::new(21.0, 1.0)], 21.0);
        let windowed = engine.windowed();
        assert_eq!(windowed.count, 2);
        assert_eq!(windowed.sum, 2.0);
        assert_eq!(windowed.mean, 1.0);
    }

    #[test]
    fn long_runs_stay_exact_after_rebuilds() {
        let mut engine = StatisticsEngine::new(4.0);
        for step in 0..1_000 {
            let time = f64::from(step);
            let value = if step % 2 == 0 { 1e12 } else { 0.1 };
            engine.update(&[Datum::new(time, value)], time);
        }
        let expected = Aggregate::from_points(
            [
                Datum::new(995.0, 0.1),
                Datum::new(996.0, 1e12),
                Datum::new(997.0, 0.1),
                Datum::new(998.0, 1e12),
                Datum::new(999.0, 0.1),
            ]
            .iter(),
        );
        assert_eq!(engine.windowed().count, 5);
        assert!(close(engine.windowed().sum, expected.sum));
    }

    #[test]
    fn buffer_eviction_shrinks_the_windowed_view() {
        let mut engine = StatisticsEngine::default();
        engine.update(&[Datum::new(100.0, 100.0), Datum::new(140.0, 50.0)], 140.0);
        engine.update(&[Datum::new(180.0, 1.0), Datum::new(195.0, 3.0)], 195.0);
        engine.evict_older_than(50.0, 195.0);
        let windowed = engine.windowed();
        assert_eq!(windowed.count, 2);
        assert_eq!(windowed.mean, 2.0);
        assert_eq!(windowed.max.datum(), Some(Datum::new(195.0, 3.0)));
        assert_eq!(windowed.min.datum(), Some(Datum::new(180.0, 1.0)));
        assert_eq!(engine.lifetime().count, 4);
        assert_eq!(engine.lifetime().max.value, 100.0);

        engine.evict_older_than(f64::INFINITY, 1_000.0);
        assert_eq!(engine.windowed().count, 2);
    }

    #[test]
    fn reset_clears_both_views() {
        let mut engine = StatisticsEngine::new(5.0);
        engine.update(&[Datum::new(1.0, 1.0)], 1.0);
        engine.reset();
        assert_eq!(engine.lifetime().count, 0);
        assert_eq!(engine.windowed().count, 0);
    }
}
