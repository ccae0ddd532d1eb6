//! Chart session: the long-lived controller owning all per-chart state.
//!
//! A [`ChartSession`] owns the series buffers and statistics, the axes, the
//! overlay state and the render driver. Stream ticks and gesture handlers
//! are methods on the session, and [`ChartHandle`] serialises them behind a
//! single lock so each one runs to completion before the next starts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::Stream;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use regex::Regex;

use crate::axis::{Axes, Axis, AxisId, AxisKindTag, AxisScale, ContinuousAxis};
use crate::config::ChartConfig;
use crate::datasource::SeriesStatistics;
use crate::error::{AppendError, ChartError};
use crate::geom::{CategoricalDatum, Datum, Dimensions, ScreenPoint};
use crate::interaction::{
    InteractionState, LensContent, OverlayContent, OverlayFlags, OverlayMode, TooltipContent,
    TrackerContent, pan_range, zoom_factor, zoom_range,
};
use crate::layout::PlotContext;
use crate::render::{MutationCount, RenderDriver, RetainedScene, SceneTarget, build_scene};
use crate::series::{AxisBinding, InitialSeries, PlotKind, Series};
use crate::stream::{ChartDataBatch, SubscriptionHandle};
use crate::style::Theme;
use crate::view::{AxisRange, FollowMode, Range};

const AUTOSCALE_PADDING: f64 = 0.05;
const AUTOSCALE_MIN_SPAN: f64 = 1.0;

/// Callback receiving the new points of one series per tick.
pub type DataCallback = Arc<dyn Fn(&str, &[Datum]) + Send + Sync>;
/// Callback receiving the current time after each tick.
pub type TimeCallback = Arc<dyn Fn(f64) + Send + Sync>;
/// Callback receiving `(start, end)` of every continuous axis.
pub type BoundsCallback = Arc<dyn Fn(&BTreeMap<AxisId, (f64, f64)>) + Send + Sync>;

/// Caller-supplied observers.
///
/// Callbacks run while the session lock is held and must not lock the
/// chart themselves.
#[derive(Clone, Default)]
pub struct ChartCallbacks {
    on_update_data: Option<DataCallback>,
    on_update_time: Option<TimeCallback>,
    on_update_axes_bounds: Option<BoundsCallback>,
}

impl ChartCallbacks {
    /// Observe new points per series.
    pub fn on_update_data(mut self, f: impl Fn(&str, &[Datum]) + Send + Sync + 'static) -> Self {
        self.on_update_data = Some(Arc::new(f));
        self
    }

    /// Observe the current time after each tick.
    pub fn on_update_time(mut self, f: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_update_time = Some(Arc::new(f));
        self
    }

    /// Observe axis range changes.
    pub fn on_update_axes_bounds(
        mut self,
        f: impl Fn(&BTreeMap<AxisId, (f64, f64)>) + Send + Sync + 'static,
    ) -> Self {
        self.on_update_axes_bounds = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ChartCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartCallbacks")
            .field("on_update_data", &self.on_update_data.is_some())
            .field("on_update_time", &self.on_update_time.is_some())
            .field("on_update_axes_bounds", &self.on_update_axes_bounds.is_some())
            .finish()
    }
}

/// Outcome of one applied tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSummary {
    /// Series present in the tick.
    pub series: usize,
    /// Points appended across all series.
    pub appended: usize,
    /// Points dropped as out of order or non-finite.
    pub dropped: usize,
    /// Points evicted by age across all series.
    pub evicted: usize,
    /// Current time after the tick.
    pub current_time: f64,
    /// Scene mutations, or `None` when no target is mounted.
    pub mutations: Option<MutationCount>,
}

type BoxedTarget = Box<dyn SceneTarget + Send + Sync>;

/// Per-chart controller shared by the stream, gestures and rendering.
pub struct ChartSession {
    config: ChartConfig,
    filter: Regex,
    theme: Theme,
    axes: Axes,
    time_axis: AxisId,
    default_kind: PlotKind,
    default_binding: AxisBinding,
    series: IndexMap<String, Series>,
    current_time: f64,
    follow: FollowMode,
    interaction: InteractionState,
    dimensions: Dimensions,
    driver: RenderDriver,
    target: Option<BoxedTarget>,
    callbacks: ChartCallbacks,
    last_bounds: BTreeMap<AxisId, (f64, f64)>,
    dropped_points: u64,
}

impl fmt::Debug for ChartSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartSession")
            .field("series", &self.series.keys().collect::<Vec<_>>())
            .field("current_time", &self.current_time)
            .field("follow", &self.follow)
            .field("mounted", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

impl ChartSession {
    /// Start building a session.
    pub fn builder() -> ChartBuilder {
        ChartBuilder::default()
    }

    /// Apply one merged tick.
    ///
    /// For each series in the tick: create it if unknown, report the new
    /// points, append them and fold them into the statistics. Then every
    /// series is trimmed by age, auto-follow moves the time axis, and the
    /// scene is reconciled.
    pub fn process_tick(&mut self, batch: ChartDataBatch) -> TickSummary {
        let ChartDataBatch { series, max_time } = batch;
        let tick_time = series
            .iter()
            .flat_map(|(_, points)| points.iter())
            .map(|datum| datum.time)
            .filter(|time| time.is_finite())
            .fold(max_time, f64::max);
        if tick_time.is_finite() && tick_time > self.current_time {
            self.current_time = tick_time;
        }
        let current_time = self.current_time;

        let mut summary = TickSummary {
            series: series.len(),
            ..TickSummary::default()
        };
        let on_update_data = self.callbacks.on_update_data.clone();

        for (name, mut points) in series {
            if name.is_empty() {
                tracing::warn!(points = points.len(), "dropping points for unnamed series");
                summary.dropped += points.len();
                continue;
            }
            points.sort_by(|a, b| a.time.total_cmp(&b.time));

            let series = self.series_entry(&name);
            if let Some(callback) = &on_update_data {
                callback(&name, &points);
            }
            match series.append(&points, current_time) {
                Ok(appended) => summary.appended += appended,
                Err(AppendError::Rejected {
                    out_of_order,
                    non_finite,
                    appended,
                }) => {
                    tracing::warn!(
                        series = %name,
                        out_of_order,
                        non_finite,
                        appended,
                        "dropped malformed points"
                    );
                    summary.appended += appended;
                    summary.dropped += out_of_order + non_finite;
                }
            }
        }

        let drop_after = self.config.drop_data_after();
        for series in self.series.values_mut() {
            summary.evicted += series.evict(drop_after, current_time);
        }
        self.dropped_points += summary.dropped as u64;

        if self.follow == FollowMode::Auto && !self.interaction.is_dragging() {
            self.apply_follow();
        }
        self.autoscale_axes();
        summary.mutations = self.update_plot();
        summary.current_time = current_time;

        if let Some(callback) = &self.callbacks.on_update_time {
            callback(current_time);
        }
        self.emit_bounds(false);

        tracing::debug!(
            series = summary.series,
            appended = summary.appended,
            dropped = summary.dropped,
            evicted = summary.evicted,
            current_time,
            "tick applied"
        );
        summary
    }

    /// Replace all series with copies of `initial`.
    pub fn reset(&mut self, initial: Vec<InitialSeries>) -> Result<(), ChartError> {
        for series in &initial {
            let kind = series.kind.as_ref().unwrap_or(&self.default_kind);
            let binding = series.axes.as_ref().unwrap_or(&self.default_binding);
            validate_binding(&self.axes, kind, binding)?;
        }
        self.series.clear();
        self.current_time = 0.0;
        let ids: Vec<AxisId> = self.axes.iter().map(|(id, _)| id.clone()).collect();
        for id in ids {
            if let Some(axis) = self.axes.categorical_mut(&id) {
                axis.clear_registered();
            }
        }
        self.load_initial(initial);
        if self.follow == FollowMode::Auto {
            self.apply_follow();
        }
        self.autoscale_axes();
        self.update_plot();
        self.emit_bounds(false);
        Ok(())
    }

    /// Reconcile the mounted scene with the current state.
    ///
    /// Returns `None` without doing anything while no target is mounted.
    pub fn update_plot(&mut self) -> Option<MutationCount> {
        self.target.as_ref()?;
        let desired = {
            let ctx = self.plot_context();
            let overlay = self.interaction.overlay_content(&ctx);
            build_scene(&ctx, &self.theme, overlay.as_ref())
        };
        let target = self.target.as_deref_mut()?;
        Some(self.driver.reconcile(desired, target))
    }

    /// Mount a scene target and render the current state into it.
    pub fn mount_scene(&mut self, target: impl SceneTarget + Send + Sync + 'static) {
        self.target = Some(Box::new(target));
        self.driver.forget();
        self.update_plot();
    }

    /// Mount a fresh [`RetainedScene`] shared with the caller.
    pub fn mount_retained(&mut self) -> Arc<Mutex<RetainedScene>> {
        let scene = Arc::new(Mutex::new(RetainedScene::new()));
        self.mount_scene(scene.clone());
        scene
    }

    /// Detach the scene target. Later render calls are no-ops.
    pub fn unmount_scene(&mut self) {
        self.target = None;
        self.driver.forget();
    }

    /// Whether a scene target is mounted.
    pub fn is_mounted(&self) -> bool {
        self.target.is_some()
    }

    /// Resize the chart.
    pub fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
        self.update_plot();
    }

    /// Current chart size.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Restrict which series are drawn. Buffering is unaffected.
    pub fn set_filter(&mut self, pattern: &str) -> Result<(), ChartError> {
        self.filter = Regex::new(pattern)?;
        self.config.filter = pattern.to_string();
        self.update_plot();
        Ok(())
    }

    /// Change the auto-follow span.
    pub fn set_time_window(&mut self, time_window_ms: u64) -> Result<(), ChartError> {
        if time_window_ms == 0 {
            return Err(ChartError::InvalidSetting {
                field: "time_window_ms",
                reason: "must be positive",
            });
        }
        self.config.time_window_ms = time_window_ms;
        if self.follow == FollowMode::Auto {
            self.apply_follow();
            self.emit_bounds(false);
        }
        self.update_plot();
        Ok(())
    }

    /// Change the eviction age; `None` keeps everything.
    pub fn set_drop_data_after(&mut self, drop_data_after_ms: Option<u64>) {
        self.config.drop_data_after_ms = drop_data_after_ms;
    }

    /// Change the statistics window; `None` means lifetime.
    pub fn set_stats_window(&mut self, stats_window_ms: Option<u64>) {
        self.config.stats_window_ms = stats_window_ms;
        let window = self.config.stats_window();
        let current_time = self.current_time;
        for series in self.series.values_mut() {
            series.set_stats_window(window, current_time);
        }
        self.update_plot();
    }

    /// Apply declarative overlay flags.
    pub fn set_overlays(&mut self, flags: OverlayFlags) {
        self.config.overlays = flags;
        self.interaction.set_overlays(flags);
        self.update_plot();
    }

    /// Show the tooltip and hide the other overlays.
    pub fn show_tooltip(&mut self) {
        self.show_overlay(OverlayMode::Tooltip);
    }

    /// Show the crosshair tracker and hide the other overlays.
    pub fn show_tracker(&mut self) {
        self.show_overlay(OverlayMode::Tracker);
    }

    /// Show the magnifier lens and hide the other overlays.
    pub fn show_magnifier(&mut self) {
        self.show_overlay(OverlayMode::Magnifier);
    }

    /// Hide every overlay.
    pub fn hide_overlays(&mut self) {
        self.show_overlay(OverlayMode::None);
    }

    fn show_overlay(&mut self, mode: OverlayMode) {
        self.interaction.show(mode);
        self.update_plot();
    }

    /// Zoom the time axis around the pointer.
    ///
    /// Returns `false` and leaves the range untouched when the pointer is
    /// outside the plot's horizontal bounds.
    pub fn on_zoom(&mut self, pointer_x: f32, scroll_delta: f64) -> bool {
        if !self.dimensions.contains_plot_x(pointer_x) {
            return false;
        }
        let plot = self.dimensions.plot_rect();
        let factor = zoom_factor(scroll_delta, self.config.zoom_sensitivity);
        let Some(axis) = self.axes.continuous_mut(&self.time_axis) else {
            return false;
        };
        let Some(next) = zoom_range(axis.range().current(), axis.scale(), plot, pointer_x, factor)
        else {
            return false;
        };
        axis.range_mut().set_current(next);
        self.after_gesture();
        true
    }

    /// Translate the time axis by a horizontal drag of `delta_x` pixels.
    pub fn on_pan(&mut self, delta_x: f32) -> bool {
        let width = self.dimensions.plot_rect().width();
        let Some(axis) = self.axes.continuous_mut(&self.time_axis) else {
            return false;
        };
        let Some(next) = pan_range(axis.range().current(), axis.scale(), width, delta_x) else {
            return false;
        };
        axis.range_mut().set_current(next);
        self.after_gesture();
        true
    }

    /// Begin a drag; hides the tooltip until the drag ends.
    pub fn on_drag_start(&mut self) {
        self.interaction.begin_drag();
        self.update_plot();
    }

    /// Continue a drag.
    pub fn on_drag(&mut self, delta_x: f32) -> bool {
        self.on_pan(delta_x)
    }

    /// End a drag; restores the configured tooltip visibility.
    pub fn on_drag_end(&mut self) {
        self.interaction.end_drag();
        self.update_plot();
    }

    /// Track the pointer for overlays.
    pub fn on_pointer_move(&mut self, pointer: ScreenPoint) {
        self.interaction.set_pointer(Some(pointer));
        self.update_plot();
    }

    /// The pointer left the chart.
    pub fn on_pointer_leave(&mut self) {
        self.interaction.set_pointer(None);
        self.update_plot();
    }

    fn after_gesture(&mut self) {
        self.follow = FollowMode::Manual;
        self.emit_bounds(true);
        self.update_plot();
    }

    /// Re-enable auto-follow and jump to the newest data.
    pub fn resume_follow(&mut self) {
        self.follow = FollowMode::Auto;
        self.apply_follow();
        self.emit_bounds(true);
        self.update_plot();
    }

    /// Restore every axis to its unzoomed range and resume auto-follow.
    pub fn reset_zoom(&mut self) {
        let ids: Vec<AxisId> = self.axes.iter().map(|(id, _)| id.clone()).collect();
        for id in ids {
            if let Some(axis) = self.axes.continuous_mut(&id) {
                axis.range_mut().reset();
            }
        }
        self.resume_follow();
    }

    /// Tooltip content at the pointer, when the tooltip is showing.
    pub fn tooltip(&self) -> Option<TooltipContent> {
        match self.overlay_content()? {
            OverlayContent::Tooltip(content) => Some(content),
            _ => None,
        }
    }

    /// Crosshair content at the pointer, when the tracker is showing.
    pub fn tracker(&self) -> Option<TrackerContent> {
        match self.overlay_content()? {
            OverlayContent::Tracker(content) => Some(content),
            _ => None,
        }
    }

    /// Magnifier content at the pointer, when the lens is showing.
    pub fn magnifier(&self) -> Option<LensContent> {
        match self.overlay_content()? {
            OverlayContent::Magnifier(content) => Some(content),
            _ => None,
        }
    }

    fn overlay_content(&self) -> Option<OverlayContent> {
        self.interaction.overlay_content(&self.plot_context())
    }

    /// Names of all buffered series in creation order.
    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Look up a series.
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// Show or hide a series.
    pub fn set_series_visible(&mut self, name: &str, visible: bool) -> bool {
        let Some(series) = self.series.get_mut(name) else {
            return false;
        };
        series.set_visible(visible);
        self.update_plot();
        true
    }

    /// Statistics of a series.
    pub fn statistics(&self, name: &str) -> Option<SeriesStatistics> {
        self.series.get(name).map(Series::statistics)
    }

    /// Copy of a series' retained points.
    pub fn snapshot(&self, name: &str) -> Option<Vec<Datum>> {
        self.series.get(name).map(|series| series.buffer().to_vec())
    }

    /// Current bar values, one per bar series.
    pub fn categorical_snapshot(&self) -> Vec<CategoricalDatum> {
        self.series
            .values()
            .filter_map(|series| match series.kind() {
                PlotKind::Bar { statistic, .. } => Some(CategoricalDatum {
                    time: series
                        .buffer()
                        .last()
                        .map_or(self.current_time, |datum| datum.time),
                    category: series.name().to_string(),
                    value: series.bar_value(*statistic),
                }),
                _ => None,
            })
            .collect()
    }

    /// Largest time seen so far.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether the time axis follows new data.
    pub fn follow_mode(&self) -> FollowMode {
        self.follow
    }

    /// Range of a continuous axis.
    pub fn axis_range(&self, id: &AxisId) -> Option<AxisRange> {
        self.axes.continuous(id).map(|axis| *axis.range())
    }

    /// Range of the time axis.
    pub fn time_range(&self) -> Option<AxisRange> {
        self.axis_range(&self.time_axis)
    }

    /// Registered axes.
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Overlay and gesture state.
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Active configuration.
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Points dropped as malformed since creation.
    pub fn dropped_points(&self) -> u64 {
        self.dropped_points
    }

    fn plot_context(&self) -> PlotContext<'_> {
        PlotContext {
            dimensions: self.dimensions,
            axes: &self.axes,
            series: &self.series,
            filter: &self.filter,
            time_axis: &self.time_axis,
        }
    }

    fn series_entry(&mut self, name: &str) -> &mut Series {
        let index = self.series.len();
        let kind = &self.default_kind;
        let binding = &self.default_binding;
        let theme = &self.theme;
        let axes = &mut self.axes;
        let window = self.config.stats_window();
        self.series.entry(name.to_string()).or_insert_with(|| {
            let kind = kind.clone().with_color(theme.series_color(index));
            register_category(axes, &kind, binding, name);
            tracing::debug!(series = name, "series created from stream");
            Series::new(name, kind, binding.clone(), window)
        })
    }

    fn load_initial(&mut self, initial: Vec<InitialSeries>) {
        let window = self.config.stats_window();
        let latest = initial
            .iter()
            .flat_map(|series| series.data.iter())
            .map(|datum| datum.time)
            .filter(|time| time.is_finite())
            .fold(self.current_time, f64::max);
        self.current_time = latest;

        for (index, spec) in initial.into_iter().enumerate() {
            let kind = spec
                .kind
                .unwrap_or_else(|| self.default_kind.clone().with_color(self.theme.series_color(index)));
            let binding = spec.axes.unwrap_or_else(|| self.default_binding.clone());
            register_category(&mut self.axes, &kind, &binding, &spec.name);
            let mut series = Series::new(spec.name.clone(), kind, binding, window);
            series.reset(&spec.data, latest);
            self.series.insert(spec.name, series);
        }
    }

    fn apply_follow(&mut self) {
        let time = self.current_time;
        let window = self.config.time_window();
        let Some(axis) = self.axes.continuous_mut(&self.time_axis) else {
            return;
        };
        let range = Range::new((time - window).max(0.0), time.max(window));
        axis.range_mut().set_original(range);
    }

    /// Fit auto-scaled axes to the data visible on their partner axes.
    fn autoscale_axes(&mut self) {
        let mut fitted: BTreeMap<AxisId, Range> = BTreeMap::new();
        {
            let mut include = |id: &AxisId, value: f64| {
                if !value.is_finite() {
                    return;
                }
                fitted
                    .entry(id.clone())
                    .and_modify(|range| range.expand_to_include(value))
                    .or_insert_with(|| Range::new(value, value));
            };
            let time_range = self.axes.visible_range(&self.time_axis);
            for series in self.series.values().filter(|series| series.is_visible()) {
                let binding = series.axes();
                match series.kind() {
                    PlotKind::Line(_) | PlotKind::Scatter(_) => {
                        let Some(range) = self.axes.visible_range(&binding.x) else {
                            continue;
                        };
                        for datum in series.buffer().select_range(range) {
                            include(&binding.y, datum.value);
                        }
                    }
                    PlotKind::Bar { statistic, .. } => {
                        include(&binding.y, 0.0);
                        include(&binding.y, series.bar_value(*statistic));
                    }
                    PlotKind::Iterate(_) => {
                        for datum in series.buffer().iter() {
                            if time_range.is_none_or(|range| range.contains(datum.time)) {
                                include(&binding.x, datum.value);
                                include(&binding.y, datum.value);
                            }
                        }
                    }
                    PlotKind::Raster(_) => {}
                }
            }
        }

        for (id, range) in fitted {
            if id == self.time_axis {
                continue;
            }
            let Some(axis) = self.axes.continuous_mut(&id) else {
                continue;
            };
            if !axis.auto_scale() {
                continue;
            }
            let range = range
                .with_min_span(AUTOSCALE_MIN_SPAN)
                .padded(AUTOSCALE_PADDING, 0.0);
            let range = match axis.scale() {
                AxisScale::Log10 if range.min <= 0.0 => continue,
                _ => range,
            };
            axis.range_mut().set_original(range);
        }
    }

    fn emit_bounds(&mut self, force: bool) {
        let bounds = self.axes.bounds();
        if !force && bounds == self.last_bounds {
            return;
        }
        if let Some(callback) = &self.callbacks.on_update_axes_bounds {
            callback(&bounds);
        }
        self.last_bounds = bounds;
    }
}

fn register_category(axes: &mut Axes, kind: &PlotKind, binding: &AxisBinding, name: &str) {
    let axis = match kind {
        PlotKind::Raster(_) => &binding.y,
        PlotKind::Bar { .. } => &binding.x,
        _ => return,
    };
    if let Some(axis) = axes.categorical_mut(axis) {
        axis.ensure_category(name);
    }
}

fn validate_binding(axes: &Axes, kind: &PlotKind, binding: &AxisBinding) -> Result<(), ChartError> {
    let (x_kind, y_kind) = kind.axis_requirements();
    axes.require(&binding.x, x_kind, kind.tag())?;
    axes.require(&binding.y, y_kind, kind.tag())?;
    Ok(())
}

/// Builder for configuring a chart before construction.
#[derive(Debug)]
pub struct ChartBuilder {
    config: ChartConfig,
    theme: Theme,
    axes: Axes,
    time_axis: AxisId,
    default_kind: PlotKind,
    default_binding: AxisBinding,
    initial: Vec<InitialSeries>,
    callbacks: ChartCallbacks,
    dimensions: Dimensions,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self {
            config: ChartConfig::default(),
            theme: Theme::default(),
            axes: Axes::new(),
            time_axis: AxisId::new("x"),
            default_kind: PlotKind::line(),
            default_binding: AxisBinding::default(),
            initial: Vec::new(),
            callbacks: ChartCallbacks::default(),
            dimensions: Dimensions::new(800.0, 400.0),
        }
    }
}

impl ChartBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: ChartConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the theme used by the chart.
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Register an axis.
    pub fn axis(mut self, id: impl Into<AxisId>, axis: Axis) -> Self {
        self.axes.insert(id.into(), axis);
        self
    }

    /// Select the continuous axis driven by auto-follow, pan and zoom.
    pub fn time_axis(mut self, id: impl Into<AxisId>) -> Self {
        self.time_axis = id.into();
        self
    }

    /// Kind used for series created by the stream.
    pub fn default_kind(mut self, kind: PlotKind) -> Self {
        self.default_kind = kind;
        self
    }

    /// Axes used for series created by the stream.
    pub fn default_axes(mut self, binding: AxisBinding) -> Self {
        self.default_binding = binding;
        self
    }

    /// Add an initial series; its data is copied.
    pub fn series(mut self, series: InitialSeries) -> Self {
        self.initial.push(series);
        self
    }

    /// Set the observers.
    pub fn callbacks(mut self, callbacks: ChartCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Set the chart size.
    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Validate the configuration and build the session.
    pub fn build(self) -> Result<ChartSession, ChartError> {
        let Self {
            config,
            theme,
            mut axes,
            time_axis,
            default_kind,
            default_binding,
            initial,
            callbacks,
            dimensions,
        } = self;

        config.validate()?;
        let filter = config.compiled_filter()?;

        if axes.get(&time_axis).is_none() {
            axes.insert(
                time_axis.clone(),
                Axis::Continuous(ContinuousAxis::time(config.time_window())),
            );
        }
        if axes.get(&default_binding.y).is_none() && default_binding.y != time_axis {
            axes.insert(
                default_binding.y.clone(),
                Axis::Continuous(
                    ContinuousAxis::new(AxisScale::Linear, 0.0, 1.0).with_auto_scale(true),
                ),
            );
        }
        axes.require(&time_axis, AxisKindTag::Continuous, default_kind.tag())?;
        validate_binding(&axes, &default_kind, &default_binding)?;
        for series in &initial {
            let kind = series.kind.as_ref().unwrap_or(&default_kind);
            let binding = series.axes.as_ref().unwrap_or(&default_binding);
            validate_binding(&axes, kind, binding)?;
        }

        let follow = if config.follow {
            FollowMode::Auto
        } else {
            FollowMode::Manual
        };
        let interaction = InteractionState::new(
            config.overlays,
            config.tooltip_threshold_px,
            config.magnifier,
        );

        let mut session = ChartSession {
            config,
            filter,
            theme,
            axes,
            time_axis,
            default_kind,
            default_binding,
            series: IndexMap::new(),
            current_time: 0.0,
            follow,
            interaction,
            dimensions,
            driver: RenderDriver::new(),
            target: None,
            callbacks,
            last_bounds: BTreeMap::new(),
            dropped_points: 0,
        };
        session.load_initial(initial);
        if session.follow == FollowMode::Auto {
            session.apply_follow();
        }
        session.autoscale_axes();
        session.last_bounds = session.axes.bounds();
        tracing::debug!(
            series = session.series.len(),
            time_axis = %session.time_axis,
            "chart session built"
        );
        Ok(session)
    }
}

/// Shared, lock-protected access to a [`ChartSession`].
///
/// Every tick and gesture takes the write lock for its whole duration, so
/// they never interleave.
#[derive(Debug, Clone)]
pub struct ChartHandle {
    inner: Arc<RwLock<ChartSession>>,
}

impl ChartHandle {
    /// Wrap a session.
    pub fn new(session: ChartSession) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ChartSession> {
        self.inner.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, ChartSession> {
        self.inner.write()
    }
}

/// A chart plus its stream subscription.
///
/// At most one subscription is active at a time. Dropping the chart
/// unsubscribes.
#[derive(Debug)]
pub struct Chart {
    handle: ChartHandle,
    subscription: Option<SubscriptionHandle>,
}

impl Chart {
    /// Wrap a built session.
    pub fn new(session: ChartSession) -> Self {
        Self {
            handle: ChartHandle::new(session),
            subscription: None,
        }
    }

    /// Shared handle for gestures and queries.
    pub fn handle(&self) -> ChartHandle {
        self.handle.clone()
    }

    /// Attach to a source on the current tokio runtime.
    ///
    /// Returns `false` without subscribing when `should_subscribe` is off,
    /// when a subscription is already active, or when called outside a
    /// runtime.
    pub fn subscribe<S>(&mut self, source: S) -> bool
    where
        S: Stream<Item = ChartDataBatch> + Send + 'static,
    {
        let (should_subscribe, windowing_time) = {
            let session = self.handle.read();
            (
                session.config().should_subscribe,
                session.config().windowing_time(),
            )
        };
        if !should_subscribe {
            tracing::debug!("subscription disabled by configuration");
            return false;
        }
        if self.is_subscribed() {
            tracing::debug!("already subscribed");
            return false;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("subscribe called outside a tokio runtime");
            return false;
        }
        self.subscription = Some(SubscriptionHandle::spawn(
            self.handle.clone(),
            source,
            windowing_time,
        ));
        true
    }

    /// Stop the active subscription. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    /// Whether a subscription is accepting events.
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// Wait until the active subscription exits, e.g. after its source ended.
    pub async fn wait_for_source(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.finished().await;
        }
    }
}

impl Drop for Chart {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
