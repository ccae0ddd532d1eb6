//! Visible-range selection.

use std::collections::VecDeque;

use crate::geom::Datum;
use crate::view::Range;

/// Select the points needed to draw a time-ordered series inside `range`.
///
/// The result is the contiguous run of points whose time lies in
/// `[range.min, range.max]`, extended by the nearest point before the start
/// and the nearest point after the end. Those two neighbours let a line leave
/// the viewport edge instead of stopping short of it. Neighbour lookups clamp
/// to the first and last element, so the call never fails; an empty series
/// yields an empty selection.
pub fn select_in_range(points: &VecDeque<Datum>, range: Range) -> Vec<Datum> {
    if points.is_empty() {
        return Vec::new();
    }
    let lower = points.partition_point(|datum| datum.time < range.min);
    let upper = points.partition_point(|datum| datum.time <= range.max);
    let start = lower.saturating_sub(1);
    let end = upper.saturating_add(1).min(points.len());
    points.range(start..end).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(times: &[f64]) -> VecDeque<Datum> {
        times.iter().map(|&time| Datum::new(time, time * 2.0)).collect()
    }

    fn times(selection: &[Datum]) -> Vec<f64> {
        selection.iter().map(|datum| datum.time).collect()
    }

    #[test]
    fn includes_boundary_neighbors() {
        let points = series(&[5.0, 12.0, 40.0, 60.0]);
        let selected = select_in_range(&points, Range::new(10.0, 50.0));
        assert_eq!(times(&selected), vec![5.0, 12.0, 40.0, 60.0]);
    }

    #[test]
    fn only_one_neighbor_on_each_side() {
        let points = series(&[0.0, 5.0, 12.0, 40.0, 60.0, 70.0]);
        let selected = select_in_range(&points, Range::new(10.0, 50.0));
        assert_eq!(times(&selected), vec![5.0, 12.0, 40.0, 60.0]);
    }

    #[test]
    fn range_covering_everything_clamps() {
        let points = series(&[1.0, 2.0, 3.0]);
        let selected = select_in_range(&points, Range::new(0.0, 10.0));
        assert_eq!(times(&selected), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn points_on_the_bounds_are_inside() {
        let points = series(&[0.0, 10.0, 50.0, 60.0]);
        let selected = select_in_range(&points, Range::new(10.0, 50.0));
        assert_eq!(times(&selected), vec![0.0, 10.0, 50.0, 60.0]);
    }

    #[test]
    fn segment_spanning_the_whole_view_is_kept() {
        let points = series(&[0.0, 100.0]);
        let selected = select_in_range(&points, Range::new(40.0, 60.0));
        assert_eq!(times(&selected), vec![0.0, 100.0]);
    }

    #[test]
    fn empty_series_yields_empty_selection() {
        let points = VecDeque::new();
        assert!(select_in_range(&points, Range::new(0.0, 1.0)).is_empty());
    }

    #[test]
    fn range_past_the_data_keeps_only_the_nearest_point() {
        let points = series(&[1.0, 2.0, 3.0]);
        assert_eq!(times(&select_in_range(&points, Range::new(10.0, 20.0))), vec![3.0]);
        assert_eq!(times(&select_in_range(&points, Range::new(-20.0, -10.0))), vec![1.0]);
    }
}
