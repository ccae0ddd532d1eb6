use std::sync::Arc;

use gpui::prelude::*;
use gpui::{
    MouseButton, MouseDownEvent, MouseMoveEvent, MouseUpEvent, Pixels, Point, ScrollWheelEvent,
    Window, canvas, div, px,
};
use parking_lot::Mutex;

use crate::chart::ChartHandle;
use crate::geom::{Dimensions, ScreenPoint};
use crate::render::RetainedScene;

use super::paint::paint_scene;

const SCROLL_LINE_HEIGHT: f32 = 16.0;

/// A GPUI view that paints a chart's retained scene.
///
/// Stream ticks update the scene from their own task; the host should call
/// `cx.notify()` on the view from a timer to pick those changes up.
#[derive(Clone)]
pub struct GpuiChartView {
    chart: ChartHandle,
    scene: Arc<Mutex<RetainedScene>>,
    origin: Arc<Mutex<ScreenPoint>>,
    drag_last: Option<ScreenPoint>,
}

impl GpuiChartView {
    /// Mount a retained scene on `chart` and wrap it in a view.
    pub fn new(chart: ChartHandle) -> Self {
        let scene = chart.write().mount_retained();
        Self {
            chart,
            scene,
            origin: Arc::new(Mutex::new(ScreenPoint::new(0.0, 0.0))),
            drag_last: None,
        }
    }

    /// Handle to the chart behind the view.
    pub fn chart(&self) -> ChartHandle {
        self.chart.clone()
    }

    fn local(&self, position: Point<Pixels>) -> ScreenPoint {
        let origin = *self.origin.lock();
        ScreenPoint::new(
            f32::from(position.x) - origin.x,
            f32::from(position.y) - origin.y,
        )
    }

    fn on_mouse_down(&mut self, ev: &MouseDownEvent, cx: &mut Context<Self>) {
        let pos = self.local(ev.position);
        self.drag_last = Some(pos);
        self.chart.write().on_drag_start();
        cx.notify();
    }

    fn on_mouse_move(&mut self, ev: &MouseMoveEvent, cx: &mut Context<Self>) {
        let pos = self.local(ev.position);
        let mut chart = self.chart.write();
        if let Some(last) = self.drag_last {
            if ev.pressed_button == Some(MouseButton::Left) {
                chart.on_drag(pos.x - last.x);
                self.drag_last = Some(pos);
            } else {
                self.drag_last = None;
                chart.on_drag_end();
            }
        }
        chart.on_pointer_move(pos);
        cx.notify();
    }

    fn on_mouse_up(&mut self, _ev: &MouseUpEvent, cx: &mut Context<Self>) {
        if self.drag_last.take().is_some() {
            self.chart.write().on_drag_end();
        }
        cx.notify();
    }

    fn on_scroll(&mut self, ev: &ScrollWheelEvent, cx: &mut Context<Self>) {
        let pos = self.local(ev.position);
        let delta = ev.delta.pixel_delta(px(SCROLL_LINE_HEIGHT));
        let scroll = -f32::from(delta.y);
        if scroll.abs() < 0.01 {
            return;
        }
        if self.chart.write().on_zoom(pos.x, scroll as f64) {
            cx.notify();
        }
    }
}

impl Render for GpuiChartView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let chart = self.chart.clone();
        let scene = Arc::clone(&self.scene);
        let origin = Arc::clone(&self.origin);

        div()
            .size_full()
            .child(
                canvas(
                    move |bounds, _, _| {
                        let top_left = ScreenPoint::new(
                            f32::from(bounds.origin.x),
                            f32::from(bounds.origin.y),
                        );
                        *origin.lock() = top_left;
                        let mut chart = chart.write();
                        let current = chart.dimensions();
                        let width = f32::from(bounds.size.width);
                        let height = f32::from(bounds.size.height);
                        if current.width != width || current.height != height {
                            chart.set_dimensions(
                                Dimensions::new(width, height).with_margin(current.margin),
                            );
                        }
                        top_left
                    },
                    move |_, top_left, window, cx| {
                        paint_scene(&scene.lock(), top_left, window, cx);
                    },
                )
                .size_full(),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_down(ev, cx);
                }),
            )
            .on_mouse_move(cx.listener(|this, ev, _, cx| {
                this.on_mouse_move(ev, cx);
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_up(ev, cx);
                }),
            )
            .on_scroll_wheel(cx.listener(|this, ev, _, cx| {
                this.on_scroll(ev, cx);
            }))
    }
}
