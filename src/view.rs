//! View models and data ranges.

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check whether a value lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Expand the range to include a value.
    pub fn expand_to_include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Translate both bounds by the same offset.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Scale the range around an anchor value.
    ///
    /// A factor below one shrinks the span (zoom in), above one grows it.
    pub fn scaled_about(&self, anchor: f64, factor: f64) -> Self {
        Self::new(
            anchor + (self.min - anchor) * factor,
            anchor + (self.max - anchor) * factor,
        )
    }

    /// Ensure the range has at least the given span.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let span = self.span();
        if span >= min_span {
            return *self;
        }
        let center = (self.min + self.max) * 0.5;
        let half = min_span * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Add padding around the range.
    pub fn padded(&self, frac: f64, min_padding: f64) -> Self {
        let span = self.span().abs();
        let padding = (span * frac).max(min_padding);
        Self {
            min: self.min - padding,
            max: self.max + padding,
        }
    }
}

/// Whether the time axis tracks the newest data or stays where the user put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowMode {
    /// Scroll to show the latest time window on every tick (default).
    #[default]
    Auto,
    /// Keep the range set by the last gesture.
    Manual,
}

/// Visible interval on a continuous axis plus its unzoomed reference.
///
/// Zoom and pan mutate `current`; auto-follow rewrites `original` and snaps
/// `current` to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    current: Range,
    original: Range,
}

impl AxisRange {
    /// Create an axis range whose current and original intervals coincide.
    pub fn new(start: f64, end: f64) -> Self {
        let range = Range::new(start, end);
        Self {
            current: range,
            original: range,
        }
    }

    /// Start of the visible interval.
    pub fn start(&self) -> f64 {
        self.current.min
    }

    /// End of the visible interval.
    pub fn end(&self) -> f64 {
        self.current.max
    }

    /// The visible interval.
    pub fn current(&self) -> Range {
        self.current
    }

    /// The unzoomed interval.
    pub fn original(&self) -> Range {
        self.original
    }

    /// Replace the visible interval, leaving the reference untouched.
    pub fn set_current(&mut self, range: Range) {
        self.current = range;
    }

    /// Replace both intervals.
    pub fn set_original(&mut self, range: Range) {
        self.original = range;
        self.current = range;
    }

    /// Restore the visible interval to the unzoomed reference.
    pub fn reset(&mut self) {
        self.current = self.original;
    }

    /// Ratio of the original span to the visible span (1.0 when unzoomed).
    pub fn zoom_level(&self) -> f64 {
        let span = self.current.span();
        if span <= 0.0 {
            return 1.0;
        }
        self.original.span() / span
    }

    /// The `(start, end)` pair reported to axis-bound listeners.
    pub fn bounds(&self) -> (f64, f64) {
        (self.current.min, self.current.max)
    }
}

/// Visible data ranges on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X axis range.
    pub x: Range,
    /// Y axis range.
    pub y: Range,
}

impl Viewport {
    /// Create a viewport from X and Y ranges.
    pub fn new(x: Range, y: Range) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_min_span_expands() {
        let range = Range::new(2.0, 2.0);
        let expanded = range.with_min_span(1.0);
        assert!(expanded.span() >= 1.0);
        assert!((expanded.min + expanded.max) * 0.5 - 2.0 < 1e-9);
    }

    #[test]
    fn scaled_about_keeps_anchor_fixed() {
        let range = Range::new(0.0, 100.0);
        let zoomed = range.scaled_about(25.0, 0.5);
        assert_eq!(zoomed, Range::new(12.5, 62.5));
    }

    #[test]
    fn axis_range_reset_restores_original() {
        let mut axis = AxisRange::new(0.0, 10.0);
        axis.set_current(Range::new(2.0, 4.0));
        assert!((axis.zoom_level() - 5.0).abs() < 1e-12);
        axis.reset();
        assert_eq!(axis.bounds(), (0.0, 10.0));
    }
}
