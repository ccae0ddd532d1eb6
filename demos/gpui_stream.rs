#[cfg(feature = "gpui")]
use std::time::Duration;

#[cfg(feature = "gpui")]
use gpui::{
    AppContext, Application, AsyncWindowContext, Bounds, Timer, WindowBounds, WindowOptions, px,
    size,
};

#[cfg(feature = "gpui")]
use gpui_streamplot::{
    Chart, ChartConfig, ChartDataBatch, ChartSession, Datum, GpuiChartView, OverlayFlags,
    batch_channel,
};

#[cfg(feature = "gpui")]
fn main() {
    // GPUI owns the main thread; the subscription and the producer run on a
    // tokio runtime in the background.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("tokio runtime");
    let _enter = runtime.enter();

    let session = ChartSession::builder()
        .config(ChartConfig {
            drop_data_after_ms: Some(20_000),
            stats_window_ms: Some(2_000),
            overlays: OverlayFlags {
                tracker: true,
                ..OverlayFlags::default()
            },
            ..ChartConfig::default()
        })
        .build()
        .expect("valid chart configuration");

    let mut chart = Chart::new(session);
    let (tx, source) = batch_channel(64);
    chart.subscribe(source);

    runtime.spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(20));
        let mut time = 0.0_f64;
        loop {
            interval.tick().await;
            let mut sensor = Vec::with_capacity(10);
            for _ in 0..10 {
                time += 2.0;
                sensor.push(Datum::new(time, (time * 0.002).sin()));
            }
            let batch = ChartDataBatch::single("sensor", sensor)
                .with_series("events", vec![Datum::new(time, (time * 0.001).cos())]);
            if tx.send(batch).await.is_err() {
                break;
            }
        }
    });

    let handle = chart.handle();
    Application::new().run(move |cx| {
        let options = WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                None,
                size(px(900.0), px(600.0)),
                cx,
            ))),
            ..Default::default()
        };

        cx.open_window(options, |window, cx| {
            let view_handle = cx.new(|_| GpuiChartView::new(handle));

            // Ticks land on the tokio side; the window only repaints.
            let view_for_task = view_handle.clone();
            window
                .spawn(cx, move |cx: &mut AsyncWindowContext| {
                    let mut cx = cx.clone();
                    async move {
                        loop {
                            Timer::after(Duration::from_millis(100)).await;
                            let repainted = cx.update(|_, cx| {
                                view_for_task.update(cx, |_view, view_cx| view_cx.notify());
                            });
                            if repainted.is_err() {
                                break;
                            }
                        }
                    }
                })
                .detach();

            view_handle
        })
        .unwrap();
    });

    drop(chart);
}

#[cfg(not(feature = "gpui"))]
fn main() {
    eprintln!("Enable the gpui feature to run this example.");
}
