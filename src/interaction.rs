//! Interaction helpers for overlays, panning and zooming.
//!
//! Overlay state is a single [`OverlayMode`], so tooltip, crosshair tracker
//! and magnifier lens are mutually exclusive by construction. Pan and zoom
//! are independent of the overlay, except that a drag in progress hides the
//! tooltip until the drag ends.

use serde::Deserialize;

use crate::axis::AxisScale;
use crate::datasource::SeriesStatistics;
use crate::geom::{Datum, ScreenPoint, ScreenRect};
use crate::layout::PlotContext;
use crate::series::PlotKind;
use crate::view::Range;

const MIN_ZOOM_SPAN: f64 = 1e-9;

/// Which interactive overlay is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    /// No overlay.
    #[default]
    None,
    /// Nearest-point tooltip.
    Tooltip,
    /// Crosshair tracker with per-series readout.
    Tracker,
    /// Radial magnifier lens.
    Magnifier,
}

/// Declarative overlay switches, as found in configuration.
///
/// Several flags may be set at once; [`OverlayFlags::resolve`] picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct OverlayFlags {
    /// Show the tooltip.
    pub tooltip: bool,
    /// Show the crosshair tracker.
    pub tracker: bool,
    /// Show the magnifier lens.
    pub magnifier: bool,
}

impl OverlayFlags {
    /// Resolve to a single mode with priority magnifier, tracker, tooltip.
    pub fn resolve(self) -> OverlayMode {
        if self.magnifier {
            OverlayMode::Magnifier
        } else if self.tracker {
            OverlayMode::Tracker
        } else if self.tooltip {
            OverlayMode::Tooltip
        } else {
            OverlayMode::None
        }
    }
}

/// Magnifier lens geometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MagnifierSettings {
    /// Lens radius in pixels.
    pub radius_px: f32,
    /// Magnification power inside the lens.
    pub magnification: f32,
}

impl Default for MagnifierSettings {
    fn default() -> Self {
        Self {
            radius_px: 60.0,
            magnification: 5.0,
        }
    }
}

/// Overlay and gesture state of one chart.
#[derive(Debug, Clone)]
pub struct InteractionState {
    mode: OverlayMode,
    dragging: bool,
    pointer: Option<ScreenPoint>,
    tooltip_threshold_px: f32,
    magnifier: MagnifierSettings,
}

impl InteractionState {
    /// Create interaction state from declarative flags.
    pub fn new(flags: OverlayFlags, tooltip_threshold_px: f32, magnifier: MagnifierSettings) -> Self {
        Self {
            mode: flags.resolve(),
            dragging: false,
            pointer: None,
            tooltip_threshold_px,
            magnifier,
        }
    }

    /// Apply declarative flags.
    pub fn set_overlays(&mut self, flags: OverlayFlags) {
        self.mode = flags.resolve();
    }

    /// Make `mode` the only visible overlay.
    pub fn show(&mut self, mode: OverlayMode) {
        self.mode = mode;
    }

    /// Active overlay mode.
    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    /// Whether the tooltip should currently be drawn.
    pub fn tooltip_visible(&self) -> bool {
        self.mode == OverlayMode::Tooltip && !self.dragging
    }

    /// Whether a drag gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub(crate) fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Last pointer position inside the chart.
    pub fn pointer(&self) -> Option<ScreenPoint> {
        self.pointer
    }

    pub(crate) fn set_pointer(&mut self, pointer: Option<ScreenPoint>) {
        self.pointer = pointer;
    }

    /// Magnifier lens geometry.
    pub fn magnifier(&self) -> MagnifierSettings {
        self.magnifier
    }

    /// Content of the active overlay at the current pointer.
    pub(crate) fn overlay_content(&self, ctx: &PlotContext<'_>) -> Option<OverlayContent> {
        let pointer = self.pointer?;
        match self.mode {
            OverlayMode::None => None,
            OverlayMode::Tooltip if !self.tooltip_visible() => None,
            OverlayMode::Tooltip => {
                tooltip_content(ctx, pointer, self.tooltip_threshold_px).map(OverlayContent::Tooltip)
            }
            OverlayMode::Tracker => tracker_content(ctx, pointer).map(OverlayContent::Tracker),
            OverlayMode::Magnifier => {
                lens_content(ctx, pointer, self.magnifier).map(OverlayContent::Magnifier)
            }
        }
    }
}

/// Tooltip readout for the datum nearest the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    /// Series the datum belongs to.
    pub series: String,
    /// Nearest datum.
    pub datum: Datum,
    /// Screen position of the datum.
    pub screen: ScreenPoint,
    /// Statistics of the series at query time.
    pub statistics: SeriesStatistics,
}

/// Crosshair readout for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerEntry {
    /// Series name.
    pub series: String,
    /// Retained datum closest in time to the crosshair.
    pub datum: Option<Datum>,
}

/// Crosshair readout.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerContent {
    /// Crosshair X pixel.
    pub x: f32,
    /// Time under the crosshair.
    pub time: f64,
    /// One entry per drawn time-based series.
    pub entries: Vec<TrackerEntry>,
}

/// A point shown inside the magnifier lens.
#[derive(Debug, Clone, PartialEq)]
pub struct LensPoint {
    /// Series name.
    pub series: String,
    /// Source datum.
    pub datum: Datum,
    /// Magnified screen position.
    pub screen: ScreenPoint,
}

/// Magnifier lens content.
#[derive(Debug, Clone, PartialEq)]
pub struct LensContent {
    /// Lens center.
    pub center: ScreenPoint,
    /// Lens radius in pixels.
    pub radius: f32,
    /// Magnification power.
    pub magnification: f32,
    /// Time interval covered by the lens.
    pub time_range: Range,
    /// Magnified points.
    pub points: Vec<LensPoint>,
}

/// Content of whichever overlay is active.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    /// Tooltip readout.
    Tooltip(TooltipContent),
    /// Crosshair readout.
    Tracker(TrackerContent),
    /// Magnifier lens.
    Magnifier(LensContent),
}

/// Zoom factor for a scroll delta; positive deltas zoom out.
pub(crate) fn zoom_factor(scroll_delta: f64, sensitivity: f64) -> f64 {
    2f64.powf(scroll_delta * sensitivity)
}

/// Scale `range` around the data value under `pointer_x`.
pub(crate) fn zoom_range(
    range: Range,
    scale: AxisScale,
    plot: ScreenRect,
    pointer_x: f32,
    factor: f64,
) -> Option<Range> {
    if !factor.is_finite() || factor <= 0.0 || plot.width() <= 0.0 {
        return None;
    }
    let min = scale.map_value(range.min)?;
    let max = scale.map_value(range.max)?;
    let fraction = ((pointer_x - plot.min.x) / plot.width()) as f64;
    let anchor = min + fraction * (max - min);
    let zoomed = Range::new(min, max).scaled_about(anchor, factor);
    if zoomed.span() < MIN_ZOOM_SPAN {
        return None;
    }
    Some(Range::new(
        scale.invert_value(zoomed.min)?,
        scale.invert_value(zoomed.max)?,
    ))
}

/// Translate `range` so content follows a horizontal drag of `delta_x` pixels.
pub(crate) fn pan_range(range: Range, scale: AxisScale, plot_width: f32, delta_x: f32) -> Option<Range> {
    if plot_width <= 0.0 {
        return None;
    }
    let min = scale.map_value(range.min)?;
    let max = scale.map_value(range.max)?;
    let offset = -(delta_x as f64) / plot_width as f64 * (max - min);
    Some(Range::new(
        scale.invert_value(min + offset)?,
        scale.invert_value(max + offset)?,
    ))
}

fn tooltip_content(
    ctx: &PlotContext<'_>,
    pointer: ScreenPoint,
    threshold: f32,
) -> Option<TooltipContent> {
    let rect = ctx.plot_rect();
    if !rect.contains(pointer) {
        return None;
    }
    let threshold_sq = threshold * threshold;
    let mut best: Option<(f32, &crate::series::Series, Datum, ScreenPoint)> = None;

    for series in ctx.drawn() {
        match series.kind() {
            PlotKind::Line(_) | PlotKind::Scatter(_) => {
                let Some(transform) = ctx.transform(series.axes()) else {
                    continue;
                };
                let Some(search) = pixel_window(&transform, pointer.x, threshold) else {
                    continue;
                };
                for datum in series.buffer().select_range(search) {
                    let Some(screen) = transform.data_to_screen(datum.to_point()) else {
                        continue;
                    };
                    if !rect.contains(screen) {
                        continue;
                    }
                    let dist = screen.distance_sq(pointer);
                    if dist <= threshold_sq && best.is_none_or(|best| dist < best.0) {
                        best = Some((dist, series, datum, screen));
                    }
                }
            }
            PlotKind::Raster(_) => {
                let Some((top, bottom)) = ctx.band(&series.axes().y, series.name(), true) else {
                    continue;
                };
                if pointer.y < top || pointer.y > bottom {
                    continue;
                }
                let Some(transform) = ctx.x_transform(&series.axes().x) else {
                    continue;
                };
                let Some(search) = pixel_window(&transform, pointer.x, threshold) else {
                    continue;
                };
                for datum in series.buffer().select_range(search) {
                    let Some(x) = transform.x_to_screen(datum.time) else {
                        continue;
                    };
                    let dx = x - pointer.x;
                    let dist = dx * dx;
                    if dist <= threshold_sq && best.is_none_or(|best| dist < best.0) {
                        best = Some((dist, series, datum, ScreenPoint::new(x, pointer.y)));
                    }
                }
            }
            PlotKind::Bar { .. } => {
                let Some((left, right)) = ctx.band(&series.axes().x, series.name(), false) else {
                    continue;
                };
                if pointer.x < left || pointer.x > right {
                    continue;
                }
                if let Some(datum) = series.buffer().last() {
                    best = Some((0.0, series, datum, pointer));
                }
            }
            PlotKind::Iterate(_) => {}
        }
    }

    best.map(|(_, series, datum, screen)| TooltipContent {
        series: series.name().to_string(),
        datum,
        screen,
        statistics: series.statistics(),
    })
}

fn tracker_content(ctx: &PlotContext<'_>, pointer: ScreenPoint) -> Option<TrackerContent> {
    if !ctx.plot_rect().contains(pointer) {
        return None;
    }
    let transform = ctx.x_transform(ctx.time_axis)?;
    let time = transform.screen_to_x(pointer.x)?;
    let entries = ctx
        .drawn()
        .filter(|series| is_time_based(series.kind()))
        .map(|series| TrackerEntry {
            series: series.name().to_string(),
            datum: series.buffer().nearest_by_time(time),
        })
        .collect();
    Some(TrackerContent {
        x: pointer.x,
        time,
        entries,
    })
}

fn lens_content(
    ctx: &PlotContext<'_>,
    pointer: ScreenPoint,
    settings: MagnifierSettings,
) -> Option<LensContent> {
    if !ctx.plot_rect().contains(pointer) {
        return None;
    }
    let radius = settings.radius_px.max(1.0);
    let magnification = settings.magnification.max(1.0);
    let time_transform = ctx.x_transform(ctx.time_axis)?;
    let time_range = pixel_window(&time_transform, pointer.x, radius / magnification)?;

    let mut points = Vec::new();
    for series in ctx.drawn() {
        if !matches!(series.kind(), PlotKind::Line(_) | PlotKind::Scatter(_)) {
            continue;
        }
        let Some(transform) = ctx.transform(series.axes()) else {
            continue;
        };
        let Some(search) = pixel_window(&transform, pointer.x, radius) else {
            continue;
        };
        for datum in series.buffer().select_range(search) {
            let Some(screen) = transform.data_to_screen(datum.to_point()) else {
                continue;
            };
            let distance = screen.distance_sq(pointer).sqrt();
            if distance * magnification > radius {
                continue;
            }
            points.push(LensPoint {
                series: series.name().to_string(),
                datum,
                screen: ScreenPoint::new(
                    pointer.x + (screen.x - pointer.x) * magnification,
                    pointer.y + (screen.y - pointer.y) * magnification,
                ),
            });
        }
    }

    Some(LensContent {
        center: pointer,
        radius,
        magnification,
        time_range,
        points,
    })
}

fn is_time_based(kind: &PlotKind) -> bool {
    matches!(
        kind,
        PlotKind::Line(_) | PlotKind::Scatter(_) | PlotKind::Raster(_)
    )
}

/// Data-space X interval covering `center_x ± half_width` pixels.
fn pixel_window(
    transform: &crate::transform::Transform,
    center_x: f32,
    half_width: f32,
) -> Option<Range> {
    let from = transform.screen_to_x(center_x - half_width)?;
    let to = transform.screen_to_x(center_x + half_width)?;
    Some(Range::new(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot() -> ScreenRect {
        ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(100.0, 50.0))
    }

    #[test]
    fn flags_resolve_to_a_single_overlay() {
        for bits in 0..8u8 {
            let flags = OverlayFlags {
                tooltip: bits & 1 != 0,
                tracker: bits & 2 != 0,
                magnifier: bits & 4 != 0,
            };
            let mode = flags.resolve();
            let expected = if flags.magnifier {
                OverlayMode::Magnifier
            } else if flags.tracker {
                OverlayMode::Tracker
            } else if flags.tooltip {
                OverlayMode::Tooltip
            } else {
                OverlayMode::None
            };
            assert_eq!(mode, expected);
        }
    }

    #[test]
    fn drag_suppresses_tooltip_until_end() {
        let mut state = InteractionState::new(
            OverlayFlags {
                tooltip: true,
                ..OverlayFlags::default()
            },
            10.0,
            MagnifierSettings::default(),
        );
        assert!(state.tooltip_visible());
        state.begin_drag();
        assert!(!state.tooltip_visible());
        assert_eq!(state.mode(), OverlayMode::Tooltip);
        state.end_drag();
        assert!(state.tooltip_visible());
    }

    #[test]
    fn show_replaces_the_active_overlay() {
        let mut state =
            InteractionState::new(OverlayFlags::default(), 10.0, MagnifierSettings::default());
        state.show(OverlayMode::Tracker);
        assert_eq!(state.mode(), OverlayMode::Tracker);
        state.show(OverlayMode::Magnifier);
        assert_eq!(state.mode(), OverlayMode::Magnifier);
        assert!(!state.tooltip_visible());
    }

    #[test]
    fn zoom_keeps_pointer_anchor() {
        let range = Range::new(0.0, 100.0);
        let zoomed = zoom_range(range, AxisScale::Time, plot(), 25.0, 0.5).unwrap();
        assert_eq!(zoomed, Range::new(12.5, 62.5));
    }

    #[test]
    fn zoom_factor_is_symmetric() {
        let zoom_in = zoom_factor(-100.0, 0.002);
        let zoom_out = zoom_factor(100.0, 0.002);
        assert!(zoom_in < 1.0);
        assert!((zoom_in * zoom_out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pan_moves_range_against_drag() {
        let range = Range::new(0.0, 100.0);
        let panned = pan_range(range, AxisScale::Time, 100.0, 10.0).unwrap();
        assert_eq!(panned, Range::new(-10.0, 90.0));
    }
}
