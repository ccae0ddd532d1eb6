//! GPUI integration for gpui_streamplot.
//!
//! [`GpuiChartView`] mounts a [`RetainedScene`](crate::render::RetainedScene)
//! on a chart, paints it every frame and forwards pointer, drag and scroll
//! events to the chart's gesture handlers.

mod paint;
mod view;

pub use view::GpuiChartView;
