//! Time-ordered series storage with age-based eviction.

use std::collections::VecDeque;

use crate::datasource::select::select_in_range;
use crate::error::AppendError;
use crate::geom::Datum;
use crate::view::Range;

/// Append-at-tail, evict-at-head storage for one series.
///
/// Points are kept in non-decreasing time order. Appends that would break the
/// order are dropped point by point; eviction pops from the head, so both
/// operations are amortized O(1) per point over the life of a stream.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    points: VecDeque<Datum>,
    generation: u64,
}

impl SeriesBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from caller-owned points.
    ///
    /// The points are copied and stably sorted by time, so later mutation of
    /// the caller's data cannot reach the buffer.
    pub fn from_points(points: &[Datum]) -> Self {
        let mut buffer = Self::new();
        buffer.reset(points);
        buffer
    }

    /// Replace the contents with a copy of `points`.
    ///
    /// Points with a non-finite time or value are skipped.
    pub fn reset(&mut self, points: &[Datum]) {
        let mut sorted: Vec<Datum> = points
            .iter()
            .copied()
            .filter(Datum::is_finite)
            .collect();
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.points.clear();
        self.points.extend(sorted);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Append points in order.
    ///
    /// Points earlier than the current tail, and points with a non-finite
    /// time or value, are dropped; the remaining points are still appended and
    /// the error reports how many were lost.
    pub fn append(&mut self, points: &[Datum]) -> Result<usize, AppendError> {
        self.points.reserve(points.len());
        let mut tail = self.points.back().map(|datum| datum.time);
        let mut appended = 0;
        let mut out_of_order = 0;
        let mut non_finite = 0;
        for datum in points {
            if !datum.is_finite() {
                non_finite += 1;
                continue;
            }
            if tail.is_some_and(|last| datum.time < last) {
                out_of_order += 1;
                continue;
            }
            self.points.push_back(*datum);
            tail = Some(datum.time);
            appended += 1;
        }
        if appended > 0 {
            self.generation = self.generation.wrapping_add(1);
        }
        if out_of_order + non_finite > 0 {
            Err(AppendError::Rejected {
                out_of_order,
                non_finite,
                appended,
            })
        } else {
            Ok(appended)
        }
    }

    /// Drop points from the head while `reference_time - head.time > cutoff_age`.
    ///
    /// An infinite (or NaN) cutoff disables eviction. Returns the number of
    /// points removed.
    pub fn evict_older_than(&mut self, cutoff_age: f64, reference_time: f64) -> usize {
        if !cutoff_age.is_finite() || !reference_time.is_finite() {
            return 0;
        }
        let mut evicted = 0;
        while let Some(head) = self.points.front() {
            if reference_time - head.time > cutoff_age {
                self.points.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        if evicted > 0 {
            self.generation = self.generation.wrapping_add(1);
        }
        evicted
    }

    /// Points that must be drawn for the given visible range.
    pub fn select_range(&self, range: Range) -> Vec<Datum> {
        select_in_range(&self.points, range)
    }

    /// The retained point closest in time to `time`.
    pub fn nearest_by_time(&self, time: f64) -> Option<Datum> {
        if self.points.is_empty() || !time.is_finite() {
            return None;
        }
        let upper = self.points.partition_point(|datum| datum.time < time);
        if upper == 0 {
            return self.points.front().copied();
        }
        if upper >= self.points.len() {
            return self.points.back().copied();
        }
        let left = self.points[upper - 1];
        let right = self.points[upper];
        if (time - left.time).abs() <= (right.time - time).abs() {
            Some(left)
        } else {
            Some(right)
        }
    }

    /// Access the underlying points.
    pub fn points(&self) -> &VecDeque<Datum> {
        &self.points
    }

    /// Iterate over retained points in time order.
    pub fn iter(&self) -> impl Iterator<Item = &Datum> {
        self.points.iter()
    }

    /// Copy the retained points into a vector.
    pub fn to_vec(&self) -> Vec<Datum> {
        self.points.iter().copied().collect()
    }

    /// Oldest retained point.
    pub fn first(&self) -> Option<Datum> {
        self.points.front().copied()
    }

    /// Newest retained point.
    pub fn last(&self) -> Option<Datum> {
        self.points.back().copied()
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if there are no retained points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mutation counter (increments on append, eviction and reset).
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(buffer: &SeriesBuffer) -> Vec<f64> {
        buffer.iter().map(|datum| datum.time).collect()
    }

    #[test]
    fn append_keeps_order() {
        let mut buffer = SeriesBuffer::new();
        let added = buffer
            .append(&[Datum::new(0.0, 1.0), Datum::new(25.0, 2.0)])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(buffer.to_vec(), vec![Datum::new(0.0, 1.0), Datum::new(25.0, 2.0)]);
    }

    #[test]
    fn append_accepts_equal_timestamps() {
        let mut buffer = SeriesBuffer::new();
        buffer.append(&[Datum::new(5.0, 1.0)]).unwrap();
        buffer.append(&[Datum::new(5.0, 2.0)]).unwrap();
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn append_drops_points_behind_tail() {
        let mut buffer = SeriesBuffer::new();
        buffer.append(&[Datum::new(10.0, 1.0)]).unwrap();
        let result = buffer.append(&[
            Datum::new(5.0, 2.0),
            Datum::new(12.0, 3.0),
            Datum::new(11.0, 4.0),
            Datum::new(f64::NAN, 5.0),
        ]);
        assert_eq!(
            result,
            Err(AppendError::Rejected {
                out_of_order: 2,
                non_finite: 1,
                appended: 1
            })
        );
        assert_eq!(times(&buffer), vec![10.0, 12.0]);
    }

    #[test]
    fn append_drops_non_finite_values() {
        let mut buffer = SeriesBuffer::new();
        let result = buffer.append(&[
            Datum::new(0.0, f64::NAN),
            Datum::new(1.0, 1.0),
            Datum::new(2.0, f64::INFINITY),
            Datum::new(f64::INFINITY, 2.0),
            Datum::new(3.0, 3.0),
        ]);
        let error = result.unwrap_err();
        assert_eq!(error.dropped(), 3);
        assert_eq!(error.appended(), 2);
        assert_eq!(times(&buffer), vec![1.0, 3.0]);
        assert!(buffer.append(&[Datum::new(4.0, 4.0)]).is_ok());
    }

    #[test]
    fn reset_skips_non_finite_points() {
        let buffer = SeriesBuffer::from_points(&[
            Datum::new(2.0, f64::NEG_INFINITY),
            Datum::new(1.0, 1.0),
            Datum::new(f64::NAN, 1.0),
        ]);
        assert_eq!(buffer.to_vec(), vec![Datum::new(1.0, 1.0)]);
    }

    #[test]
    fn eviction_scenario_retains_recent_points() {
        let mut buffer = SeriesBuffer::from_points(&[
            Datum::new(100.0, 0.0),
            Datum::new(140.0, 0.0),
            Datum::new(180.0, 0.0),
            Datum::new(195.0, 0.0),
        ]);
        let evicted = buffer.evict_older_than(50.0, 200.0);
        assert_eq!(evicted, 2);
        assert_eq!(times(&buffer), vec![180.0, 195.0]);
    }

    #[test]
    fn eviction_boundary_is_inclusive() {
        let mut buffer = SeriesBuffer::from_points(&[Datum::new(150.0, 0.0)]);
        assert_eq!(buffer.evict_older_than(50.0, 200.0), 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn infinite_cutoff_disables_eviction() {
        let mut buffer = SeriesBuffer::from_points(&[Datum::new(0.0, 0.0)]);
        assert_eq!(buffer.evict_older_than(f64::INFINITY, 1e12), 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn from_points_copies_and_sorts() {
        let mut source = vec![Datum::new(3.0, 0.0), Datum::new(1.0, 0.0)];
        let buffer = SeriesBuffer::from_points(&source);
        source[0].value = 99.0;
        assert_eq!(times(&buffer), vec![1.0, 3.0]);
        assert!(buffer.iter().all(|datum| datum.value == 0.0));
    }

    #[test]
    fn nearest_by_time_picks_closest_neighbor() {
        let buffer = SeriesBuffer::from_points(&[
            Datum::new(0.0, 0.0),
            Datum::new(10.0, 1.0),
            Datum::new(30.0, 2.0),
        ]);
        assert_eq!(buffer.nearest_by_time(12.0), Some(Datum::new(10.0, 1.0)));
        assert_eq!(buffer.nearest_by_time(25.0), Some(Datum::new(30.0, 2.0)));
        assert_eq!(buffer.nearest_by_time(-5.0), Some(Datum::new(0.0, 0.0)));
        assert_eq!(buffer.nearest_by_time(99.0), Some(Datum::new(30.0, 2.0)));
        assert_eq!(SeriesBuffer::new().nearest_by_time(1.0), None);
    }

    #[test]
    fn generation_tracks_mutations() {
        let mut buffer = SeriesBuffer::new();
        let start = buffer.generation();
        buffer.append(&[Datum::new(1.0, 1.0)]).unwrap();
        assert_eq!(buffer.generation(), start + 1);
        buffer.evict_older_than(0.0, 10.0);
        assert_eq!(buffer.generation(), start + 2);
        buffer.evict_older_than(0.0, 10.0);
        assert_eq!(buffer.generation(), start + 2);
    }
}
