use std::time::{Duration, Instant};

use gpui_streamplot::{
    Chart, ChartCallbacks, ChartConfig, ChartDataBatch, ChartSession, Datum, batch_channel,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let duration_secs: f64 = std::env::var("DURATION_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(5.0);

    let config = ChartConfig {
        drop_data_after_ms: Some(5_000),
        stats_window_ms: Some(1_000),
        ..ChartConfig::default()
    };
    let session = ChartSession::builder()
        .config(config)
        .callbacks(ChartCallbacks::default().on_update_time(|time| {
            tracing::debug!(time, "tick");
        }))
        .build()
        .expect("valid chart configuration");

    let mut chart = Chart::new(session);
    let scene = chart.handle().write().mount_retained();
    let (tx, source) = batch_channel(64);
    chart.subscribe(source);

    let producer = tokio::spawn(async move {
        let start = Instant::now();
        let mut count = 0_u64;
        while start.elapsed().as_secs_f64() < duration_secs {
            let time = start.elapsed().as_secs_f64() * 1000.0;
            let batch = ChartDataBatch::new()
                .with_series("sensor", vec![Datum::new(time, (time * 0.005).sin())])
                .with_series("noise", vec![Datum::new(time, (count % 7) as f64 * 0.1)]);
            if tx.send(batch).await.is_err() {
                break;
            }
            count += 1;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        count
    });

    let mut report = tokio::time::interval(Duration::from_secs(1));
    report.tick().await;
    while !producer.is_finished() {
        report.tick().await;
        let session = chart.handle();
        let session = session.read();
        if let Some(stats) = session.statistics("sensor") {
            println!(
                "t={:>8.0}ms  retained={:>5}  windowed mean={:+.3}  min={:+.3}  max={:+.3}  nodes={}",
                session.current_time(),
                session.series("sensor").map_or(0, |series| series.buffer().len()),
                stats.windowed.mean,
                stats.windowed.min.value,
                stats.windowed.max.value,
                scene.lock().len(),
            );
        }
    }

    let sent = producer.await.unwrap_or(0);
    chart.wait_for_source().await;
    println!("realtime stream complete: {sent} batches");
}
