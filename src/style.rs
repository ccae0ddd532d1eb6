//! Visual theme for series and overlays.

use crate::render::{Color, LineStyle, RectStyle, TextStyle};

/// Visual theme for a chart.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Colors assigned to series in creation order.
    pub palette: Vec<Color>,
    /// Plot area outline.
    pub plot_area: RectStyle,
    /// Tooltip background.
    pub tooltip_box: RectStyle,
    /// Tooltip and tracker text.
    pub text: TextStyle,
    /// Crosshair line.
    pub tracker_line: LineStyle,
    /// Magnifier lens outline.
    pub lens: RectStyle,
}

impl Theme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette color for the series created at `index`.
    pub fn series_color(&self, index: usize) -> Color {
        if self.palette.is_empty() {
            return Color::BLACK;
        }
        self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            palette: vec![
                Color::new(0.12, 0.47, 0.71, 1.0),
                Color::new(1.0, 0.5, 0.05, 1.0),
                Color::new(0.17, 0.63, 0.17, 1.0),
                Color::new(0.84, 0.15, 0.16, 1.0),
                Color::new(0.58, 0.4, 0.74, 1.0),
                Color::new(0.55, 0.34, 0.29, 1.0),
            ],
            plot_area: RectStyle {
                fill: Color::TRANSPARENT,
                stroke: Color::new(0.6, 0.6, 0.6, 1.0),
                stroke_width: 1.0,
            },
            tooltip_box: RectStyle {
                fill: Color::WHITE.with_alpha(0.9),
                stroke: Color::new(0.4, 0.4, 0.4, 1.0),
                stroke_width: 1.0,
            },
            text: TextStyle::default(),
            tracker_line: LineStyle {
                color: Color::new(0.4, 0.4, 0.4, 0.8),
                width: 1.0,
            },
            lens: RectStyle {
                fill: Color::WHITE.with_alpha(0.85),
                stroke: Color::new(0.3, 0.3, 0.3, 1.0),
                stroke_width: 1.5,
            },
        }
    }
}
