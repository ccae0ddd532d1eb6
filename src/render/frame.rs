use std::collections::BTreeMap;

use crate::axis::{AxisFormatter, AxisId};
use crate::geom::{Point, ScreenPoint, ScreenRect};
use crate::interaction::{LensContent, OverlayContent, TooltipContent, TrackerContent};
use crate::layout::PlotContext;
use crate::series::{PlotKind, Series};
use crate::style::Theme;

use super::scene::{OverlayPart, SceneKey, SceneNode, SeriesPart};
use super::{
    Color, LineSegment, LineStyle, MarkerStyle, RectStyle, TextStyle, build_line_segments,
    build_scatter_points,
};

const BAND_PADDING: f32 = 0.1;
const LABEL_OFFSET: f32 = 12.0;
const TEXT_PADDING: f32 = 4.0;
const GLYPH_WIDTH: f32 = 0.6;
const LINE_HEIGHT: f32 = 1.2;

/// Desired scene for the current chart state.
pub(crate) fn build_scene(
    ctx: &PlotContext<'_>,
    theme: &Theme,
    overlay: Option<&OverlayContent>,
) -> BTreeMap<SceneKey, SceneNode> {
    let mut scene = BTreeMap::new();
    let plot_rect = ctx.plot_rect();
    if !plot_rect.is_valid() {
        return scene;
    }

    scene.insert(
        SceneKey::PlotArea,
        SceneNode::Rect {
            rect: plot_rect,
            style: theme.plot_area,
        },
    );

    for series in ctx.drawn() {
        if let Some((part, node)) = build_series(ctx, series, plot_rect) {
            scene.insert(SceneKey::series(series.name(), part), node);
        }
    }

    match overlay {
        Some(OverlayContent::Tooltip(content)) => {
            build_tooltip(&mut scene, ctx, theme, content, plot_rect)
        }
        Some(OverlayContent::Tracker(content)) => {
            build_tracker(&mut scene, ctx, theme, content, plot_rect)
        }
        Some(OverlayContent::Magnifier(content)) => build_lens(&mut scene, ctx, theme, content),
        None => {}
    }

    scene
}

fn build_series(
    ctx: &PlotContext<'_>,
    series: &Series,
    plot_rect: ScreenRect,
) -> Option<(SeriesPart, SceneNode)> {
    let binding = series.axes();
    match series.kind() {
        PlotKind::Line(style) => {
            let transform = ctx.transform(binding)?;
            let points = visible_points(ctx, series, &binding.x)?;
            let mut segments = Vec::new();
            build_line_segments(&points, &transform, plot_rect, &mut segments);
            Some((
                SeriesPart::Line,
                SceneNode::Path {
                    segments,
                    style: *style,
                },
            ))
        }
        PlotKind::Scatter(style) => {
            let transform = ctx.transform(binding)?;
            let points = visible_points(ctx, series, &binding.x)?;
            let mut screen = Vec::new();
            build_scatter_points(&points, &transform, plot_rect, &mut screen);
            Some((
                SeriesPart::Markers,
                SceneNode::Markers {
                    points: screen,
                    style: *style,
                },
            ))
        }
        PlotKind::Raster(style) => {
            let transform = ctx.x_transform(&binding.x)?;
            let (top, bottom) = ctx.band(&binding.y, series.name(), true)?;
            let pad = (bottom - top) * BAND_PADDING;
            let range = ctx.axes.visible_range(&binding.x)?;
            let segments = series
                .buffer()
                .select_range(range)
                .into_iter()
                .filter_map(|datum| transform.x_to_screen(datum.time))
                .filter(|x| *x >= plot_rect.min.x && *x <= plot_rect.max.x)
                .map(|x| {
                    LineSegment::new(ScreenPoint::new(x, top + pad), ScreenPoint::new(x, bottom - pad))
                })
                .collect();
            Some((
                SeriesPart::Spikes,
                SceneNode::Path {
                    segments,
                    style: *style,
                },
            ))
        }
        PlotKind::Bar { style, statistic } => {
            let transform = ctx.y_transform(&binding.y)?;
            let (left, right) = ctx.band(&binding.x, series.name(), false)?;
            let pad = (right - left) * BAND_PADDING;
            let value = series.bar_value(*statistic);
            let top = transform.data_to_screen(Point::new(0.0, value))?.y;
            let base = transform.data_to_screen(Point::new(0.0, 0.0))?.y;
            let clamp = |y: f32| y.clamp(plot_rect.min.y, plot_rect.max.y);
            let (top, base) = (clamp(top), clamp(base));
            Some((
                SeriesPart::Bar,
                SceneNode::Rect {
                    rect: ScreenRect::new(
                        ScreenPoint::new(left + pad, top.min(base)),
                        ScreenPoint::new(right - pad, top.max(base)),
                    ),
                    style: *style,
                },
            ))
        }
        PlotKind::Iterate(style) => {
            let transform = ctx.transform(binding)?;
            let values: Vec<f64> = match ctx.time_range() {
                Some(range) => series
                    .buffer()
                    .iter()
                    .filter(|datum| range.contains(datum.time))
                    .map(|datum| datum.value)
                    .collect(),
                None => series.buffer().iter().map(|datum| datum.value).collect(),
            };
            let pairs: Vec<Point> = values
                .windows(2)
                .map(|pair| Point::new(pair[0], pair[1]))
                .collect();
            let mut screen = Vec::new();
            build_scatter_points(&pairs, &transform, plot_rect, &mut screen);
            Some((
                SeriesPart::Markers,
                SceneNode::Markers {
                    points: screen,
                    style: *style,
                },
            ))
        }
    }
}

fn visible_points(ctx: &PlotContext<'_>, series: &Series, x_axis: &AxisId) -> Option<Vec<Point>> {
    let range = ctx.axes.visible_range(x_axis)?;
    Some(
        series
            .buffer()
            .select_range(range)
            .into_iter()
            .map(|datum| datum.to_point())
            .collect(),
    )
}

fn build_tooltip(
    scene: &mut BTreeMap<SceneKey, SceneNode>,
    ctx: &PlotContext<'_>,
    theme: &Theme,
    content: &TooltipContent,
    plot_rect: ScreenRect,
) {
    let Some(series) = ctx.series.get(&content.series) else {
        return;
    };
    let x_fmt = formatter(ctx, &series.axes().x);
    let y_fmt = formatter(ctx, &series.axes().y);
    let stats = &content.statistics;
    let lines = vec![
        content.series.clone(),
        format!("t: {}", x_fmt.format(content.datum.time)),
        format!("value: {}", y_fmt.format(content.datum.value)),
        format!("mean: {}", y_fmt.format(stats.windowed.mean_or(0.0))),
        format!("min: {}", y_fmt.format(stats.windowed.min.value_or(0.0))),
        format!("max: {}", y_fmt.format(stats.windowed.max.value_or(0.0))),
    ];
    let size = text_block_size(&lines, theme.text);
    let anchor = content.screen;
    let mut origin = ScreenPoint::new(anchor.x + LABEL_OFFSET, anchor.y + LABEL_OFFSET);
    if origin.x + size.0 > plot_rect.max.x {
        origin.x = anchor.x - size.0 - LABEL_OFFSET;
    }
    if origin.y + size.1 > plot_rect.max.y {
        origin.y = anchor.y - size.1 - LABEL_OFFSET;
    }
    let origin = clamp_point(origin, plot_rect, size);

    scene.insert(
        SceneKey::Overlay(OverlayPart::TooltipBox),
        SceneNode::Rect {
            rect: ScreenRect::new(origin, ScreenPoint::new(origin.x + size.0, origin.y + size.1)),
            style: theme.tooltip_box,
        },
    );
    scene.insert(
        SceneKey::Overlay(OverlayPart::TooltipText),
        SceneNode::Text {
            position: ScreenPoint::new(origin.x + TEXT_PADDING, origin.y + TEXT_PADDING * 0.5),
            lines,
            style: theme.text,
        },
    );
}

fn build_tracker(
    scene: &mut BTreeMap<SceneKey, SceneNode>,
    ctx: &PlotContext<'_>,
    theme: &Theme,
    content: &TrackerContent,
    plot_rect: ScreenRect,
) {
    scene.insert(
        SceneKey::Overlay(OverlayPart::TrackerLine),
        SceneNode::Path {
            segments: vec![LineSegment::new(
                ScreenPoint::new(content.x, plot_rect.min.y),
                ScreenPoint::new(content.x, plot_rect.max.y),
            )],
            style: theme.tracker_line,
        },
    );

    let line_height = theme.text.size * LINE_HEIGHT;
    for (index, entry) in content.entries.iter().enumerate() {
        let Some(series) = ctx.series.get(&entry.series) else {
            continue;
        };
        let value = match entry.datum {
            Some(datum) => formatter(ctx, &series.axes().y).format(datum.value),
            None => "-".to_string(),
        };
        let line = format!("{}: {value}", entry.series);
        let size = text_block_size(std::slice::from_ref(&line), theme.text);
        let mut x = content.x + TEXT_PADDING;
        if x + size.0 > plot_rect.max.x {
            x = content.x - size.0 - TEXT_PADDING;
        }
        let y = plot_rect.min.y + TEXT_PADDING + index as f32 * line_height;
        scene.insert(
            SceneKey::Overlay(OverlayPart::TrackerLabel(entry.series.clone())),
            SceneNode::Text {
                position: ScreenPoint::new(x, y),
                lines: vec![line],
                style: TextStyle {
                    color: kind_color(series.kind()),
                    size: theme.text.size,
                },
            },
        );
    }
}

fn build_lens(
    scene: &mut BTreeMap<SceneKey, SceneNode>,
    ctx: &PlotContext<'_>,
    theme: &Theme,
    content: &LensContent,
) {
    scene.insert(
        SceneKey::Overlay(OverlayPart::LensFrame),
        SceneNode::Circle {
            center: content.center,
            radius: content.radius,
            style: theme.lens,
        },
    );

    let mut grouped: BTreeMap<&str, Vec<ScreenPoint>> = BTreeMap::new();
    for point in &content.points {
        grouped
            .entry(point.series.as_str())
            .or_default()
            .push(point.screen);
    }
    for (name, points) in grouped {
        let Some(series) = ctx.series.get(name) else {
            continue;
        };
        let style = match series.kind() {
            PlotKind::Scatter(style) => *style,
            other => MarkerStyle {
                color: kind_color(other),
                ..MarkerStyle::default()
            },
        };
        scene.insert(
            SceneKey::Overlay(OverlayPart::LensPoints(name.to_string())),
            SceneNode::Markers { points, style },
        );
    }
}

fn formatter(ctx: &PlotContext<'_>, axis: &AxisId) -> AxisFormatter {
    ctx.axes
        .continuous(axis)
        .map(|axis| axis.formatter().clone())
        .unwrap_or_default()
}

fn kind_color(kind: &PlotKind) -> Color {
    match kind {
        PlotKind::Line(LineStyle { color, .. }) | PlotKind::Raster(LineStyle { color, .. }) => {
            *color
        }
        PlotKind::Scatter(style) | PlotKind::Iterate(style) => style.color,
        PlotKind::Bar {
            style: RectStyle { fill, .. },
            ..
        } => *fill,
    }
}

/// Approximate size of a block of text; paint backends measure precisely.
fn text_block_size(lines: &[String], style: TextStyle) -> (f32, f32) {
    let longest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let width = longest as f32 * style.size * GLYPH_WIDTH + TEXT_PADDING * 2.0;
    let height = lines.len() as f32 * style.size * LINE_HEIGHT + TEXT_PADDING;
    (width, height)
}

fn clamp_point(origin: ScreenPoint, rect: ScreenRect, size: (f32, f32)) -> ScreenPoint {
    let max_x = (rect.max.x - size.0).max(rect.min.x);
    let max_y = (rect.max.y - size.1).max(rect.min.y);
    ScreenPoint::new(
        origin.x.clamp(rect.min.x, max_x),
        origin.y.clamp(rect.min.y, max_y),
    )
}
