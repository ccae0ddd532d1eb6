//! Geometric primitives and data points used by the streaming pipeline.
//!
//! [`Datum`] is the unit of streamed data. [`Point`] is a generic data-space
//! coordinate used when a plot maps something other than `(time, value)`
//! onto its axes (for example iterate plots). Screen-space types describe
//! pixel geometry handed to scene targets.

/// An immutable `(time, value)` sample.
///
/// Time is a logical timestamp in milliseconds relative to the stream epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    /// Timestamp in milliseconds.
    pub time: f64,
    /// Sampled value.
    pub value: f64,
}

impl Datum {
    /// Create a new datum.
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }

    /// Whether both time and value are finite.
    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.value.is_finite()
    }

    /// View the datum as a data-space point with time on X.
    pub fn to_point(self) -> Point {
        Point::new(self.time, self.value)
    }
}

impl From<(f64, f64)> for Datum {
    fn from((time, value): (f64, f64)) -> Self {
        Self::new(time, value)
    }
}

/// A datum attached to a category, used by categorical plots.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalDatum {
    /// Timestamp in milliseconds.
    pub time: f64,
    /// Category label.
    pub category: String,
    /// Sampled value.
    pub value: f64,
}

/// A point in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X value in data coordinates.
    pub x: f64,
    /// Y value in data coordinates.
    pub y: f64,
}

impl Point {
    /// Create a new data point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// X value in screen pixels.
    pub x: f32,
    /// Y value in screen pixels.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A rectangle in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a new screen rectangle from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Rectangle width in pixels.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Rectangle height in pixels.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Check whether the rectangle has positive area.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Check whether the point lies inside the rectangle (edges included).
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Space reserved around the plot area for axes and labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    /// Top margin in pixels.
    pub top: f32,
    /// Right margin in pixels.
    pub right: f32,
    /// Bottom margin in pixels.
    pub bottom: f32,
    /// Left margin in pixels.
    pub left: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 50.0,
        }
    }
}

/// Overall chart size plus margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// Total width in pixels.
    pub width: f32,
    /// Total height in pixels.
    pub height: f32,
    /// Margins around the plot area.
    pub margin: Margin,
}

impl Dimensions {
    /// Create dimensions with default margins.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            margin: Margin::default(),
        }
    }

    /// Replace the margins.
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// The plot area, excluding margins.
    pub fn plot_rect(&self) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(self.margin.left, self.margin.top),
            ScreenPoint::new(
                self.width - self.margin.right,
                self.height - self.margin.bottom,
            ),
        )
    }

    /// Whether an X pixel lies inside the plot's horizontal bounds.
    ///
    /// The left edge is inclusive, the right margin boundary is not.
    pub fn contains_plot_x(&self, x: f32) -> bool {
        x >= self.margin.left && x < self.width - self.margin.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_rect_excludes_margins() {
        let dims = Dimensions::new(200.0, 100.0).with_margin(Margin {
            top: 5.0,
            right: 10.0,
            bottom: 15.0,
            left: 20.0,
        });
        let rect = dims.plot_rect();
        assert_eq!(rect.min, ScreenPoint::new(20.0, 5.0));
        assert_eq!(rect.max, ScreenPoint::new(190.0, 85.0));
    }

    #[test]
    fn right_margin_boundary_is_outside_plot() {
        let dims = Dimensions::new(200.0, 100.0);
        assert!(dims.contains_plot_x(dims.margin.left));
        assert!(!dims.contains_plot_x(200.0 - dims.margin.right));
        assert!(!dims.contains_plot_x(10.0));
    }
}
