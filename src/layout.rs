//! Plot-area context shared by the render driver and the interaction
//! coordinator.

use indexmap::IndexMap;
use regex::Regex;

use crate::axis::{AxisId, AxisScale, Axes};
use crate::geom::{Dimensions, ScreenRect};
use crate::series::{AxisBinding, Series};
use crate::transform::Transform;
use crate::view::{Range, Viewport};

const UNIT: Range = Range { min: 0.0, max: 1.0 };

/// Read-only view of the chart state needed to map series onto the screen.
#[derive(Clone, Copy)]
pub(crate) struct PlotContext<'a> {
    pub(crate) dimensions: Dimensions,
    pub(crate) axes: &'a Axes,
    pub(crate) series: &'a IndexMap<String, Series>,
    pub(crate) filter: &'a Regex,
    pub(crate) time_axis: &'a AxisId,
}

impl<'a> PlotContext<'a> {
    pub(crate) fn plot_rect(&self) -> ScreenRect {
        self.dimensions.plot_rect()
    }

    /// Visible series whose name passes the filter.
    ///
    /// The filter restricts drawing only; filtered series keep buffering.
    pub(crate) fn drawn(&self) -> impl Iterator<Item = &'a Series> + 'a {
        let filter = self.filter;
        self.series
            .values()
            .filter(move |series| series.is_visible() && filter.is_match(series.name()))
    }

    /// Visible range of the chart's time axis.
    pub(crate) fn time_range(&self) -> Option<Range> {
        self.axes.visible_range(self.time_axis)
    }

    /// Transform for a series bound to two continuous axes.
    pub(crate) fn transform(&self, binding: &AxisBinding) -> Option<Transform> {
        let x = self.axes.continuous(&binding.x)?;
        let y = self.axes.continuous(&binding.y)?;
        Transform::new(
            Viewport::new(x.range().current(), y.range().current()),
            self.plot_rect(),
            x.scale(),
            y.scale(),
        )
    }

    /// Transform that maps only X, with a unit Y range.
    pub(crate) fn x_transform(&self, x_axis: &AxisId) -> Option<Transform> {
        let x = self.axes.continuous(x_axis)?;
        Transform::new(
            Viewport::new(x.range().current(), UNIT),
            self.plot_rect(),
            x.scale(),
            AxisScale::Linear,
        )
    }

    /// Transform that maps only Y, with a unit X range.
    pub(crate) fn y_transform(&self, y_axis: &AxisId) -> Option<Transform> {
        let y = self.axes.continuous(y_axis)?;
        Transform::new(
            Viewport::new(UNIT, y.range().current()),
            self.plot_rect(),
            AxisScale::Linear,
            y.scale(),
        )
    }

    /// Screen `(start, end)` of a series' band on a categorical axis.
    ///
    /// `vertical` selects the Y extent of the plot area instead of X.
    pub(crate) fn band(&self, axis: &AxisId, category: &str, vertical: bool) -> Option<(f32, f32)> {
        let (start, width) = self.axes.categorical(axis)?.band(category)?;
        let rect = self.plot_rect();
        let (origin, extent) = if vertical {
            (rect.min.y, rect.height())
        } else {
            (rect.min.x, rect.width())
        };
        let from = origin + (start * extent as f64) as f32;
        let to = origin + ((start + width) * extent as f64) as f32;
        Some((from, to))
    }
}
