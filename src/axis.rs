//! Axis configuration, scaling, and formatting.
//!
//! Axes are a two-variant capability: continuous numeric axes carry a mutable
//! [`AxisRange`], categorical axes carry an ordered list of labels. Plots ask
//! the [`Axes`] registry for the variant they need and get a typed error when
//! the registered axis has the other shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ChartError;
use crate::series::PlotKindTag;
use crate::view::{AxisRange, Range};

/// Identifier of an axis within one chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisId(String);

impl AxisId {
    /// Create an axis identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AxisId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Axis scale type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisScale {
    /// Linear scaling.
    #[default]
    Linear,
    /// Base-10 logarithmic scaling.
    Log10,
    /// Time axis (mapped as linear values internally).
    Time,
}

impl AxisScale {
    /// Map a value into axis space.
    pub fn map_value(self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self {
            Self::Linear | Self::Time => Some(value),
            Self::Log10 => {
                if value <= 0.0 {
                    None
                } else {
                    Some(value.log10())
                }
            }
        }
    }

    /// Invert a value from axis space back into data space.
    pub fn invert_value(self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self {
            Self::Linear | Self::Time => Some(value),
            Self::Log10 => Some(10_f64.powf(value)),
        }
    }
}

/// Formatter for tick, tooltip and tracker labels.
#[derive(Clone, Default)]
pub enum AxisFormatter {
    /// Default numeric formatter.
    #[default]
    Default,
    /// Custom formatter callback.
    Custom(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl AxisFormatter {
    /// Format a value for display.
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::Default => format!("{value:.3}"),
            Self::Custom(formatter) => formatter(value),
        }
    }
}

impl fmt::Debug for AxisFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "AxisFormatter::Default"),
            Self::Custom(_) => write!(f, "AxisFormatter::Custom(..)"),
        }
    }
}

/// Discriminant of an [`Axis`], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKindTag {
    /// Continuous numeric axis.
    Continuous,
    /// Categorical axis.
    Categorical,
}

/// A continuous numeric axis with a zoomable range.
#[derive(Debug, Clone)]
pub struct ContinuousAxis {
    scale: AxisScale,
    range: AxisRange,
    auto_scale: bool,
    formatter: AxisFormatter,
}

impl ContinuousAxis {
    /// Create a continuous axis over the given range.
    pub fn new(scale: AxisScale, start: f64, end: f64) -> Self {
        Self {
            scale,
            range: AxisRange::new(start, end),
            auto_scale: false,
            formatter: AxisFormatter::default(),
        }
    }

    /// Create a time axis starting at zero.
    pub fn time(span: f64) -> Self {
        Self::new(AxisScale::Time, 0.0, span)
    }

    /// Rescale the range from the data on every render.
    pub fn with_auto_scale(mut self, auto_scale: bool) -> Self {
        self.auto_scale = auto_scale;
        self
    }

    /// Set the label formatter.
    pub fn with_formatter(mut self, formatter: AxisFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Access the axis scale.
    pub fn scale(&self) -> AxisScale {
        self.scale
    }

    /// Access the axis range.
    pub fn range(&self) -> &AxisRange {
        &self.range
    }

    /// Access the axis range mutably.
    pub fn range_mut(&mut self) -> &mut AxisRange {
        &mut self.range
    }

    /// Whether the range is derived from data.
    pub fn auto_scale(&self) -> bool {
        self.auto_scale
    }

    /// Access the formatter.
    pub fn formatter(&self) -> &AxisFormatter {
        &self.formatter
    }
}

/// A categorical axis that divides its extent into equal bands.
#[derive(Debug, Clone, Default)]
pub struct CategoricalAxis {
    categories: Vec<String>,
    declared: usize,
}

impl CategoricalAxis {
    /// Create a categorical axis with the given labels.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        Self {
            declared: categories.len(),
            categories,
        }
    }

    /// Access the category labels in order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Add a category if it is not present yet.
    pub fn ensure_category(&mut self, category: &str) {
        if !self.categories.iter().any(|existing| existing == category) {
            self.categories.push(category.to_string());
        }
    }

    /// Forget categories added by series, keeping the declared labels.
    pub fn clear_registered(&mut self) {
        self.categories.truncate(self.declared);
    }

    /// Fractional `(start, width)` of a category's band in `0.0..=1.0`.
    pub fn band(&self, category: &str) -> Option<(f64, f64)> {
        let index = self
            .categories
            .iter()
            .position(|existing| existing == category)?;
        let width = 1.0 / self.categories.len() as f64;
        Some((index as f64 * width, width))
    }
}

/// An axis registered on a chart.
#[derive(Debug, Clone)]
pub enum Axis {
    /// Continuous numeric axis.
    Continuous(ContinuousAxis),
    /// Categorical axis.
    Categorical(CategoricalAxis),
}

impl Axis {
    /// Discriminant of the axis.
    pub fn kind(&self) -> AxisKindTag {
        match self {
            Self::Continuous(_) => AxisKindTag::Continuous,
            Self::Categorical(_) => AxisKindTag::Categorical,
        }
    }
}

/// Axis registry keyed by [`AxisId`].
#[derive(Debug, Clone, Default)]
pub struct Axes {
    axes: BTreeMap<AxisId, Axis>,
}

impl Axes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an axis.
    pub fn insert(&mut self, id: AxisId, axis: Axis) {
        self.axes.insert(id, axis);
    }

    /// Look up an axis.
    pub fn get(&self, id: &AxisId) -> Option<&Axis> {
        self.axes.get(id)
    }

    /// Iterate over all axes.
    pub fn iter(&self) -> impl Iterator<Item = (&AxisId, &Axis)> {
        self.axes.iter()
    }

    /// Check that an axis exists and has the required kind.
    pub fn require(
        &self,
        id: &AxisId,
        expected: AxisKindTag,
        plot: PlotKindTag,
    ) -> Result<(), ChartError> {
        let axis = self
            .axes
            .get(id)
            .ok_or_else(|| ChartError::UnknownAxis(id.clone()))?;
        let found = axis.kind();
        if found != expected {
            return Err(ChartError::AxisMismatch {
                plot,
                axis: id.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Access a continuous axis, or `None` if missing or categorical.
    pub fn continuous(&self, id: &AxisId) -> Option<&ContinuousAxis> {
        match self.axes.get(id)? {
            Axis::Continuous(axis) => Some(axis),
            Axis::Categorical(_) => None,
        }
    }

    /// Access a continuous axis mutably.
    pub fn continuous_mut(&mut self, id: &AxisId) -> Option<&mut ContinuousAxis> {
        match self.axes.get_mut(id)? {
            Axis::Continuous(axis) => Some(axis),
            Axis::Categorical(_) => None,
        }
    }

    /// Access a categorical axis, or `None` if missing or continuous.
    pub fn categorical(&self, id: &AxisId) -> Option<&CategoricalAxis> {
        match self.axes.get(id)? {
            Axis::Categorical(axis) => Some(axis),
            Axis::Continuous(_) => None,
        }
    }

    /// Access a categorical axis mutably.
    pub fn categorical_mut(&mut self, id: &AxisId) -> Option<&mut CategoricalAxis> {
        match self.axes.get_mut(id)? {
            Axis::Categorical(axis) => Some(axis),
            Axis::Continuous(_) => None,
        }
    }

    /// Current `(start, end)` of every continuous axis.
    pub fn bounds(&self) -> BTreeMap<AxisId, (f64, f64)> {
        self.axes
            .iter()
            .filter_map(|(id, axis)| match axis {
                Axis::Continuous(axis) => Some((id.clone(), axis.range().bounds())),
                Axis::Categorical(_) => None,
            })
            .collect()
    }

    /// Current visible range of a continuous axis.
    pub fn visible_range(&self, id: &AxisId) -> Option<Range> {
        self.continuous(id).map(|axis| axis.range().current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_scale_rejects_non_positive() {
        let scale = AxisScale::Log10;
        assert!(scale.map_value(0.0).is_none());
        assert!(scale.map_value(-1.0).is_none());
        assert!(scale.map_value(1.0).is_some());
    }

    #[test]
    fn require_reports_kind_mismatch() {
        let mut axes = Axes::new();
        axes.insert(
            AxisId::new("x"),
            Axis::Continuous(ContinuousAxis::time(1000.0)),
        );
        let err = axes
            .require(&AxisId::new("x"), AxisKindTag::Categorical, PlotKindTag::Bar)
            .unwrap_err();
        match err {
            ChartError::AxisMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, AxisKindTag::Categorical);
                assert_eq!(found, AxisKindTag::Continuous);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn require_reports_unknown_axis() {
        let axes = Axes::new();
        let err = axes
            .require(&AxisId::new("y"), AxisKindTag::Continuous, PlotKindTag::Line)
            .unwrap_err();
        assert!(matches!(err, ChartError::UnknownAxis(_)));
    }

    #[test]
    fn categorical_bands_split_evenly() {
        let mut axis = CategoricalAxis::new(["a", "b"]);
        axis.ensure_category("c");
        axis.ensure_category("a");
        assert_eq!(axis.categories().len(), 3);
        let (start, width) = axis.band("b").unwrap();
        assert!((start - 1.0 / 3.0).abs() < 1e-12);
        assert!((width - 1.0 / 3.0).abs() < 1e-12);
        assert!(axis.band("missing").is_none());
    }
}
