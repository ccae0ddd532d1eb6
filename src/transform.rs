//! Coordinate transforms between data and screen space.

use crate::axis::AxisScale;
use crate::geom::{Point, ScreenPoint, ScreenRect};
use crate::view::{Range, Viewport};

const MIN_SPAN: f64 = 1e-12;

/// Transform from data coordinates into screen coordinates.
///
/// Y grows upwards in data space and downwards on screen.
#[derive(Debug, Clone)]
pub(crate) struct Transform {
    screen: ScreenRect,
    x_scale: AxisScale,
    y_scale: AxisScale,
    x_axis: Range,
    y_axis: Range,
}

impl Transform {
    /// Create a transform for the given viewport and screen rectangle.
    pub(crate) fn new(
        viewport: Viewport,
        screen: ScreenRect,
        x_scale: AxisScale,
        y_scale: AxisScale,
    ) -> Option<Self> {
        if !screen.is_valid() || !viewport.x.is_finite() || !viewport.y.is_finite() {
            return None;
        }
        let x_axis = map_range(viewport.x.with_min_span(MIN_SPAN), x_scale)?;
        let y_axis = map_range(viewport.y.with_min_span(MIN_SPAN), y_scale)?;
        Some(Self {
            screen,
            x_scale,
            y_scale,
            x_axis,
            y_axis,
        })
    }

    /// Map a data point into screen space.
    pub(crate) fn data_to_screen(&self, point: Point) -> Option<ScreenPoint> {
        let sx = self.x_to_screen(point.x)?;
        let y = self.y_scale.map_value(point.y)?;
        let y_norm = (y - self.y_axis.min) / self.y_axis.span();
        let sy = self.screen.max.y as f64 - y_norm * self.screen.height() as f64;
        Some(ScreenPoint::new(sx, sy as f32))
    }

    /// Map a data X value to a screen X pixel.
    pub(crate) fn x_to_screen(&self, x: f64) -> Option<f32> {
        let x = self.x_scale.map_value(x)?;
        let x_norm = (x - self.x_axis.min) / self.x_axis.span();
        Some((self.screen.min.x as f64 + x_norm * self.screen.width() as f64) as f32)
    }

    /// Map a screen X pixel to a data X value.
    pub(crate) fn screen_to_x(&self, x: f32) -> Option<f64> {
        let x_norm = (x as f64 - self.screen.min.x as f64) / self.screen.width() as f64;
        self.x_scale
            .invert_value(self.x_axis.min + x_norm * self.x_axis.span())
    }
}

fn map_range(range: Range, scale: AxisScale) -> Option<Range> {
    let min = scale.map_value(range.min)?;
    let max = scale.map_value(range.max)?;
    Some(Range::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> ScreenRect {
        ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(100.0, 100.0))
    }

    #[test]
    fn linear_roundtrip() {
        let viewport = Viewport::new(Range::new(0.0, 10.0), Range::new(0.0, 10.0));
        let transform = Transform::new(viewport, screen(), AxisScale::Linear, AxisScale::Linear)
            .expect("valid transform");
        let point = Point::new(5.0, 7.5);
        let screen_point = transform.data_to_screen(point).unwrap();
        assert_eq!(screen_point, ScreenPoint::new(50.0, 25.0));
        let x = transform.screen_to_x(screen_point.x).unwrap();
        assert!((x - point.x).abs() < 1e-9);
    }

    #[test]
    fn log_rejects_non_positive_range() {
        let viewport = Viewport::new(Range::new(-1.0, 10.0), Range::new(1.0, 10.0));
        let transform = Transform::new(viewport, screen(), AxisScale::Log10, AxisScale::Linear);
        assert!(transform.is_none());
    }

    #[test]
    fn infinite_range_is_rejected() {
        let viewport = Viewport::new(
            Range::new(0.0, 10.0),
            Range::new(f64::INFINITY, f64::NEG_INFINITY),
        );
        assert!(Transform::new(viewport, screen(), AxisScale::Time, AxisScale::Linear).is_none());
    }

    #[test]
    fn zero_span_viewport_is_widened() {
        let viewport = Viewport::new(Range::new(5.0, 5.0), Range::new(0.0, 10.0));
        let transform = Transform::new(viewport, screen(), AxisScale::Linear, AxisScale::Linear)
            .expect("widened transform");
        let screen_point = transform.data_to_screen(Point::new(5.0, 5.0)).unwrap();
        assert!(screen_point.x.is_finite());
        assert!((screen_point.x - 50.0).abs() < 1.0);
    }
}
