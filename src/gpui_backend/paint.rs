use gpui::{
    App, BorderStyle, Bounds, ContentMask, Corners, Edges, PathBuilder, Pixels, TextRun, Window,
    font, point, px, quad,
};

use crate::geom::{ScreenPoint, ScreenRect};
use crate::render::{
    Color, LineSegment, LineStyle, MarkerShape, MarkerStyle, RectStyle, RetainedScene, SceneKey,
    SceneNode, TextStyle,
};

const LINE_HEIGHT: f32 = 1.2;

/// Paint every node of `scene`, translated by `origin`.
///
/// Series nodes are masked to the plot area; overlays are not.
pub(crate) fn paint_scene(
    scene: &RetainedScene,
    origin: ScreenPoint,
    window: &mut Window,
    cx: &mut App,
) {
    let plot_mask = match scene.get(&SceneKey::PlotArea) {
        Some(SceneNode::Rect { rect, .. }) => Some(ContentMask {
            bounds: to_bounds(*rect, origin),
        }),
        _ => None,
    };

    for (key, node) in scene.nodes() {
        let mask = match key {
            SceneKey::Series { .. } => plot_mask.clone(),
            _ => None,
        };
        with_mask(window, mask, |window| {
            paint_node(window, cx, node, origin);
        });
    }
}

fn paint_node(window: &mut Window, cx: &mut App, node: &SceneNode, origin: ScreenPoint) {
    match node {
        SceneNode::Path { segments, style } => paint_lines(window, segments, *style, origin),
        SceneNode::Markers { points, style } => paint_points(window, points, *style, origin),
        SceneNode::Rect { rect, style } => paint_rect(window, *rect, *style, origin),
        SceneNode::Circle {
            center,
            radius,
            style,
        } => paint_circle(window, *center, *radius, *style, origin),
        SceneNode::Text {
            position,
            lines,
            style,
        } => {
            let line_height = style.size * LINE_HEIGHT;
            for (index, line) in lines.iter().enumerate() {
                let position =
                    ScreenPoint::new(position.x, position.y + index as f32 * line_height);
                paint_text(window, cx, offset(position, origin), line, style);
            }
        }
    }
}

fn paint_lines(window: &mut Window, segments: &[LineSegment], style: LineStyle, origin: ScreenPoint) {
    if segments.is_empty() {
        return;
    }
    let width = style.width.max(0.5);
    let mut builder = PathBuilder::stroke(px(width));
    for segment in segments {
        let start = offset(segment.start, origin);
        let end = offset(segment.end, origin);
        builder.move_to(point(px(start.x), px(start.y)));
        builder.line_to(point(px(end.x), px(end.y)));
    }
    if let Ok(path) = builder.build() {
        window.paint_path(path, to_rgba(style.color));
    }
}

fn paint_points(window: &mut Window, points: &[ScreenPoint], style: MarkerStyle, origin: ScreenPoint) {
    if points.is_empty() {
        return;
    }

    let size = style.size.max(2.0);
    let half = size * 0.5;
    match style.shape {
        MarkerShape::Circle | MarkerShape::Square => {
            let corner = if style.shape == MarkerShape::Circle {
                half
            } else {
                0.0
            };
            for pt in points {
                let pt = offset(*pt, origin);
                let bounds = Bounds::from_corners(
                    point(px(pt.x - half), px(pt.y - half)),
                    point(px(pt.x + half), px(pt.y + half)),
                );
                window.paint_quad(quad(
                    bounds,
                    Corners::all(px(corner)),
                    to_rgba(style.color),
                    Edges::all(px(0.0)),
                    to_rgba(style.color),
                    BorderStyle::default(),
                ));
            }
        }
        MarkerShape::Cross => {
            let mut builder = PathBuilder::stroke(px(1.0));
            for pt in points {
                let pt = offset(*pt, origin);
                builder.move_to(point(px(pt.x - half), px(pt.y)));
                builder.line_to(point(px(pt.x + half), px(pt.y)));
                builder.move_to(point(px(pt.x), px(pt.y - half)));
                builder.line_to(point(px(pt.x), px(pt.y + half)));
            }
            if let Ok(path) = builder.build() {
                window.paint_path(path, to_rgba(style.color));
            }
        }
    }
}

fn paint_rect(window: &mut Window, rect: ScreenRect, style: RectStyle, origin: ScreenPoint) {
    window.paint_quad(quad(
        to_bounds(rect, origin),
        Corners::all(px(0.0)),
        to_rgba(style.fill),
        Edges::all(px(style.stroke_width)),
        to_rgba(style.stroke),
        BorderStyle::default(),
    ));
}

fn paint_circle(
    window: &mut Window,
    center: ScreenPoint,
    radius: f32,
    style: RectStyle,
    origin: ScreenPoint,
) {
    let rect = ScreenRect::new(
        ScreenPoint::new(center.x - radius, center.y - radius),
        ScreenPoint::new(center.x + radius, center.y + radius),
    );
    window.paint_quad(quad(
        to_bounds(rect, origin),
        Corners::all(px(radius)),
        to_rgba(style.fill),
        Edges::all(px(style.stroke_width)),
        to_rgba(style.stroke),
        BorderStyle::default(),
    ));
}

fn paint_text(
    window: &mut Window,
    cx: &mut App,
    position: ScreenPoint,
    text: &str,
    style: &TextStyle,
) {
    if text.is_empty() {
        return;
    }
    let run = TextRun {
        len: text.len(),
        font: font(".SystemUIFont"),
        color: to_hsla(style.color),
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    let shaped = window
        .text_system()
        .shape_line(text.to_string().into(), px(style.size), &[run], None);
    let line_height = shaped.ascent + shaped.descent;
    let _ = shaped.paint(point(px(position.x), px(position.y)), line_height, window, cx);
}

fn offset(point: ScreenPoint, origin: ScreenPoint) -> ScreenPoint {
    ScreenPoint::new(point.x + origin.x, point.y + origin.y)
}

fn to_rgba(color: Color) -> gpui::Rgba {
    gpui::Rgba {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}

fn to_hsla(color: Color) -> gpui::Hsla {
    gpui::Hsla::from(to_rgba(color))
}

fn to_bounds(rect: ScreenRect, origin: ScreenPoint) -> Bounds<Pixels> {
    let min = offset(rect.min, origin);
    let max = offset(rect.max, origin);
    Bounds::from_corners(point(px(min.x), px(min.y)), point(px(max.x), px(max.y)))
}

fn with_mask(window: &mut Window, mask: Option<ContentMask<Pixels>>, f: impl FnOnce(&mut Window)) {
    match mask {
        Some(mask) => window.with_content_mask(Some(mask), f),
        None => f(window),
    }
}
