//! gpui_streamplot is a streaming chart engine built for GPUI.
//! Pushed batches are windowed into ticks, buffered with age-based eviction,
//! summarized incrementally and rendered as keyed scene mutations.

#![forbid(unsafe_code)]

pub mod axis;
pub mod chart;
pub mod config;
pub mod datasource;
pub mod error;
pub mod geom;
pub mod interaction;
mod layout;
pub mod render;
pub mod series;
pub mod stream;
pub mod style;
mod transform;
pub mod view;

#[cfg(feature = "gpui")]
pub mod gpui_backend;

pub use axis::{
    Axes, Axis, AxisFormatter, AxisId, AxisKindTag, AxisScale, CategoricalAxis, ContinuousAxis,
};
pub use chart::{Chart, ChartBuilder, ChartCallbacks, ChartHandle, ChartSession, TickSummary};
pub use config::ChartConfig;
pub use datasource::{
    Aggregate, Extremum, SeriesBuffer, SeriesStatistics, StatisticsEngine, select_in_range,
};
pub use error::{AppendError, ChartError};
pub use geom::{CategoricalDatum, Datum, Dimensions, Margin, Point, ScreenPoint, ScreenRect};
pub use interaction::{
    InteractionState, LensContent, MagnifierSettings, OverlayFlags, OverlayMode, TooltipContent,
    TrackerContent,
};
pub use render::{
    Color, LineStyle, MarkerShape, MarkerStyle, MutationCount, RectStyle, RenderDriver,
    RetainedScene, SceneKey, SceneNode, SceneTarget, TextStyle,
};
pub use series::{AxisBinding, BarStatistic, InitialSeries, PlotKind, Series};
pub use stream::{ChartDataBatch, SubscriptionHandle, TickAccumulator, batch_channel};
pub use style::Theme;
pub use view::{AxisRange, FollowMode, Range};

#[cfg(feature = "gpui")]
pub use gpui_backend::GpuiChartView;
