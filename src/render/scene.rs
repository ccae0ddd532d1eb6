//! Keyed scene graph model.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::geom::{ScreenPoint, ScreenRect};

use super::{LineSegment, LineStyle, MarkerStyle, RectStyle, TextStyle};

/// Part of a series' visual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesPart {
    /// Polyline.
    Line,
    /// Point markers (scatter and iterate plots).
    Markers,
    /// Raster spikes.
    Spikes,
    /// Bar rectangle.
    Bar,
}

/// Part of an interactive overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayPart {
    /// Tooltip background.
    TooltipBox,
    /// Tooltip text.
    TooltipText,
    /// Crosshair line.
    TrackerLine,
    /// Crosshair readout for one series.
    TrackerLabel(String),
    /// Magnifier lens outline.
    LensFrame,
    /// Magnified points of one series.
    LensPoints(String),
}

/// Stable identity of a scene node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneKey {
    /// Plot area outline.
    PlotArea,
    /// A part of a named series.
    Series {
        /// Series name.
        name: String,
        /// Which part of the series.
        part: SeriesPart,
    },
    /// An overlay element.
    Overlay(OverlayPart),
}

impl SceneKey {
    /// Key for a part of a series.
    pub fn series(name: &str, part: SeriesPart) -> Self {
        Self::Series {
            name: name.to_string(),
            part,
        }
    }
}

/// Drawable content of a scene node, already clipped to the plot area.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    /// Stroked line segments.
    Path {
        /// Segments to stroke.
        segments: Vec<LineSegment>,
        /// Stroke styling.
        style: LineStyle,
    },
    /// Point markers.
    Markers {
        /// Marker centers.
        points: Vec<ScreenPoint>,
        /// Marker styling.
        style: MarkerStyle,
    },
    /// A rectangle.
    Rect {
        /// Rectangle bounds.
        rect: ScreenRect,
        /// Rectangle styling.
        style: RectStyle,
    },
    /// A circle.
    Circle {
        /// Circle center.
        center: ScreenPoint,
        /// Radius in pixels.
        radius: f32,
        /// Fill and stroke styling.
        style: RectStyle,
    },
    /// A block of text, one entry per line.
    Text {
        /// Top-left of the first line.
        position: ScreenPoint,
        /// Lines of text.
        lines: Vec<String>,
        /// Text styling.
        style: TextStyle,
    },
}

/// Retained drawing surface mutated by the render driver.
///
/// Implementations own their nodes exclusively; the driver only ever adds,
/// replaces or removes whole nodes by key.
pub trait SceneTarget {
    /// Add a node that is not in the scene yet.
    fn enter(&mut self, key: SceneKey, node: SceneNode);
    /// Replace the content of an existing node.
    fn update(&mut self, key: &SceneKey, node: SceneNode);
    /// Remove a node.
    fn exit(&mut self, key: &SceneKey);
}

/// A target shared with a paint backend; each call takes the lock.
impl<T: SceneTarget> SceneTarget for Arc<Mutex<T>> {
    fn enter(&mut self, key: SceneKey, node: SceneNode) {
        self.lock().enter(key, node);
    }

    fn update(&mut self, key: &SceneKey, node: SceneNode) {
        self.lock().update(key, node);
    }

    fn exit(&mut self, key: &SceneKey) {
        self.lock().exit(key);
    }
}

/// Counts of mutations applied to a [`RetainedScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    /// Nodes added.
    pub entered: usize,
    /// Nodes replaced.
    pub updated: usize,
    /// Nodes removed.
    pub exited: usize,
}

/// In-memory scene target used by paint backends and tests.
#[derive(Debug, Clone, Default)]
pub struct RetainedScene {
    nodes: BTreeMap<SceneKey, SceneNode>,
    stats: SceneStats,
}

impl RetainedScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node.
    pub fn get(&self, key: &SceneKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Iterate nodes in key order (plot area, series, overlays).
    pub fn nodes(&self) -> impl Iterator<Item = (&SceneKey, &SceneNode)> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mutation counters since creation.
    pub fn stats(&self) -> SceneStats {
        self.stats
    }
}

impl SceneTarget for RetainedScene {
    fn enter(&mut self, key: SceneKey, node: SceneNode) {
        self.stats.entered += 1;
        self.nodes.insert(key, node);
    }

    fn update(&mut self, key: &SceneKey, node: SceneNode) {
        self.stats.updated += 1;
        if let Some(existing) = self.nodes.get_mut(key) {
            *existing = node;
        }
    }

    fn exit(&mut self, key: &SceneKey) {
        self.stats.exited += 1;
        self.nodes.remove(key);
    }
}
