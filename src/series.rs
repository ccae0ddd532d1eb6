//! Series configuration and storage.

use crate::axis::{AxisId, AxisKindTag};
use crate::datasource::{Aggregate, SeriesBuffer, SeriesStatistics, StatisticsEngine};
use crate::error::AppendError;
use crate::geom::Datum;
use crate::render::{Color, LineStyle, MarkerStyle, RectStyle};

/// Which statistic a bar represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarStatistic {
    /// The newest retained value.
    Latest,
    /// Lifetime mean.
    Mean,
    /// Mean over the trailing statistics window.
    #[default]
    WindowedMean,
    /// Lifetime maximum.
    Max,
}

/// Series rendering kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotKind {
    /// Polyline through the visible points.
    Line(LineStyle),
    /// Markers at the visible points.
    Scatter(MarkerStyle),
    /// Vertical spikes in the series' row of a categorical Y axis.
    Raster(LineStyle),
    /// One bar per series on a categorical X axis.
    Bar {
        /// Bar styling.
        style: RectStyle,
        /// Statistic mapped to the bar height.
        statistic: BarStatistic,
    },
    /// Poincaré plot of consecutive values `(v[n], v[n + 1])`.
    Iterate(MarkerStyle),
}

/// Discriminant of a [`PlotKind`], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKindTag {
    /// Line plot.
    Line,
    /// Scatter plot.
    Scatter,
    /// Raster (spike) plot.
    Raster,
    /// Bar plot.
    Bar,
    /// Iterate (Poincaré) plot.
    Iterate,
}

impl PlotKind {
    /// Line plot with default styling.
    pub fn line() -> Self {
        Self::Line(LineStyle::default())
    }

    /// Scatter plot with default styling.
    pub fn scatter() -> Self {
        Self::Scatter(MarkerStyle::default())
    }

    /// Raster plot with default styling.
    pub fn raster() -> Self {
        Self::Raster(LineStyle::default())
    }

    /// Bar plot showing the windowed mean.
    pub fn bar() -> Self {
        Self::Bar {
            style: RectStyle::default(),
            statistic: BarStatistic::default(),
        }
    }

    /// Iterate plot with default styling.
    pub fn iterate() -> Self {
        Self::Iterate(MarkerStyle::default())
    }

    /// Discriminant of the kind.
    pub fn tag(&self) -> PlotKindTag {
        match self {
            Self::Line(_) => PlotKindTag::Line,
            Self::Scatter(_) => PlotKindTag::Scatter,
            Self::Raster(_) => PlotKindTag::Raster,
            Self::Bar { .. } => PlotKindTag::Bar,
            Self::Iterate(_) => PlotKindTag::Iterate,
        }
    }

    /// Axis kinds required on `(x, y)`.
    pub fn axis_requirements(&self) -> (AxisKindTag, AxisKindTag) {
        match self {
            Self::Line(_) | Self::Scatter(_) | Self::Iterate(_) => {
                (AxisKindTag::Continuous, AxisKindTag::Continuous)
            }
            Self::Raster(_) => (AxisKindTag::Continuous, AxisKindTag::Categorical),
            Self::Bar { .. } => (AxisKindTag::Categorical, AxisKindTag::Continuous),
        }
    }

    /// Replace the primary color of the style.
    pub fn with_color(mut self, color: Color) -> Self {
        match &mut self {
            Self::Line(style) | Self::Raster(style) => style.color = color,
            Self::Scatter(style) | Self::Iterate(style) => style.color = color,
            Self::Bar { style, .. } => {
                style.fill = color;
                style.stroke = color;
            }
        }
        self
    }
}

/// Axis assignment of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBinding {
    /// Horizontal axis.
    pub x: AxisId,
    /// Vertical axis.
    pub y: AxisId,
}

impl Default for AxisBinding {
    fn default() -> Self {
        Self {
            x: AxisId::new("x"),
            y: AxisId::new("y"),
        }
    }
}

/// Caller-supplied series used at mount time or on reset.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSeries {
    /// Series name (unique per chart).
    pub name: String,
    /// Initial points; copied into the chart.
    pub data: Vec<Datum>,
    /// Rendering kind, or the chart default when `None`.
    pub kind: Option<PlotKind>,
    /// Axis assignment, or the chart default when `None`.
    pub axes: Option<AxisBinding>,
}

impl InitialSeries {
    /// Create an initial series with the chart's default kind and axes.
    pub fn new(name: impl Into<String>, data: Vec<Datum>) -> Self {
        Self {
            name: name.into(),
            data,
            kind: None,
            axes: None,
        }
    }

    /// Set the rendering kind.
    pub fn with_kind(mut self, kind: PlotKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the axis assignment.
    pub fn with_axes(mut self, axes: AxisBinding) -> Self {
        self.axes = Some(axes);
        self
    }
}

/// A named series with its buffer, statistics and styling.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    kind: PlotKind,
    axes: AxisBinding,
    buffer: SeriesBuffer,
    stats: StatisticsEngine,
    visible: bool,
}

impl Series {
    /// Create an empty series.
    pub fn new(name: impl Into<String>, kind: PlotKind, axes: AxisBinding, window: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            axes,
            buffer: SeriesBuffer::new(),
            stats: StatisticsEngine::new(window),
            visible: true,
        }
    }

    /// Replace the data with a copy of `points` and recompute statistics.
    pub fn reset(&mut self, points: &[Datum], current_time: f64) {
        self.buffer.reset(points);
        self.stats.reset();
        let retained = self.buffer.to_vec();
        self.stats.update(&retained, current_time);
    }

    /// Append points and fold them into the statistics.
    ///
    /// Out-of-order and non-finite points are dropped before they reach the
    /// statistics.
    pub(crate) fn append(&mut self, points: &[Datum], current_time: f64) -> Result<usize, AppendError> {
        let before = self.buffer.len();
        let result = self.buffer.append(points);
        let appended = self.buffer.len() - before;
        if appended == points.len() {
            self.stats.update(points, current_time);
        } else {
            let accepted: Vec<Datum> = self
                .buffer
                .points()
                .range(before..)
                .copied()
                .collect();
            self.stats.update(&accepted, current_time);
        }
        result
    }

    /// Evict points older than `cutoff_age` and advance the window.
    ///
    /// The windowed statistics drop the same points as the buffer.
    pub(crate) fn evict(&mut self, cutoff_age: f64, current_time: f64) -> usize {
        let evicted = self.buffer.evict_older_than(cutoff_age, current_time);
        self.stats.evict_older_than(cutoff_age, current_time);
        self.stats.advance(current_time);
        evicted
    }

    /// Access the series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access the series kind.
    pub fn kind(&self) -> &PlotKind {
        &self.kind
    }

    /// Access the axis assignment.
    pub fn axes(&self) -> &AxisBinding {
        &self.axes
    }

    /// Access the buffered data.
    pub fn buffer(&self) -> &SeriesBuffer {
        &self.buffer
    }

    /// Access the statistics engine.
    pub fn stats(&self) -> &StatisticsEngine {
        &self.stats
    }

    /// Copy of the current statistics.
    pub fn statistics(&self) -> SeriesStatistics {
        self.stats.snapshot()
    }

    /// Change the statistics window and rebuild the windowed view.
    pub(crate) fn set_stats_window(&mut self, window: f64, current_time: f64) {
        self.stats
            .set_window(window, self.buffer.iter(), current_time);
    }

    /// Value used for a bar, mapped to `0.0` before any data.
    pub fn bar_value(&self, statistic: BarStatistic) -> f64 {
        let lifetime: &Aggregate = self.stats.lifetime();
        match statistic {
            BarStatistic::Latest => self.buffer.last().map_or(0.0, |datum| datum.value),
            BarStatistic::Mean => lifetime.mean_or(0.0),
            BarStatistic::WindowedMean => self.stats.windowed().mean_or(0.0),
            BarStatistic::Max => lifetime.max.value_or(0.0),
        }
    }

    /// Check if the series is visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Toggle series visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
