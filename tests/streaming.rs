use std::time::Duration;

use gpui_streamplot::{
    Aggregate, Chart, ChartConfig, ChartDataBatch, ChartSession, Datum, OverlayFlags, OverlayMode,
    ScreenPoint, batch_channel,
};
use proptest::prelude::*;

fn session(config: ChartConfig) -> ChartSession {
    ChartSession::builder().config(config).build().unwrap()
}

fn point(name: &str, time: f64, value: f64) -> ChartDataBatch {
    ChartDataBatch::single(name, vec![Datum::new(time, value)])
}

#[tokio::test(start_paused = true)]
async fn events_within_a_window_land_in_one_tick() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let handle = chart.handle();
    let (tx, source) = batch_channel(16);
    assert!(chart.subscribe(source));

    tx.send(point("s1", 0.0, 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    tx.send(point("s1", 25.0, 2.0)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert!(handle.read().snapshot("s1").is_none());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let chart_state = handle.read();
    assert_eq!(
        chart_state.snapshot("s1").unwrap(),
        vec![Datum::new(0.0, 1.0), Datum::new(25.0, 2.0)]
    );
    assert_eq!(chart_state.statistics("s1").unwrap().lifetime.mean, 1.5);
    assert_eq!(chart_state.current_time(), 25.0);
}

#[tokio::test(start_paused = true)]
async fn each_quiet_period_opens_a_new_window() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let handle = chart.handle();
    let (tx, source) = batch_channel(16);
    chart.subscribe(source);

    tx.send(point("s1", 0.0, 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.read().snapshot("s1").unwrap().len(), 1);

    tx.send(point("s1", 150.0, 3.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.read().snapshot("s1").unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.read().snapshot("s1").unwrap().len(), 2);
    assert_eq!(handle.read().current_time(), 150.0);
}

#[tokio::test(start_paused = true)]
async fn unsubscribe_discards_pending_events() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let handle = chart.handle();
    let (tx, source) = batch_channel(16);
    chart.subscribe(source);

    tx.send(point("s1", 0.0, 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    chart.unsubscribe();
    chart.unsubscribe();
    assert!(!chart.is_subscribed());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handle.read().snapshot("s1").is_none());
    assert_eq!(handle.read().current_time(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn ended_source_flushes_pending_tick() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let source = async_stream::stream! {
        yield point("a", 10.0, 1.0);
        yield point("b", 20.0, 2.0).with_series("a", vec![Datum::new(30.0, 3.0)]);
    };
    assert!(chart.subscribe(source));
    chart.wait_for_source().await;

    let handle = chart.handle();
    let state = handle.read();
    assert_eq!(state.series_names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(state.snapshot("a").unwrap().len(), 2);
    assert_eq!(state.current_time(), 30.0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_chart_ends_its_subscription() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let handle = chart.handle();
    let (tx, source) = batch_channel(16);
    assert!(chart.subscribe(source));

    tx.send(point("s1", 0.0, 1.0)).await.unwrap();
    drop(chart);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(tx.send(point("s1", 10.0, 2.0)).await.is_err());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handle.read().snapshot("s1").is_none());
    assert_eq!(handle.read().current_time(), 0.0);
}

#[tokio::test]
async fn second_subscription_is_a_no_op() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let (_tx1, first) = batch_channel(4);
    let (_tx2, second) = batch_channel(4);
    assert!(chart.subscribe(first));
    assert!(!chart.subscribe(second));
    assert!(chart.is_subscribed());
}

#[tokio::test]
async fn disabled_subscription_never_starts() {
    let mut chart = Chart::new(session(ChartConfig {
        should_subscribe: false,
        ..ChartConfig::default()
    }));
    let (_tx, source) = batch_channel(4);
    assert!(!chart.subscribe(source));
    assert!(!chart.is_subscribed());
}

#[test]
fn subscribe_outside_runtime_is_refused() {
    let mut chart = Chart::new(session(ChartConfig::default()));
    let (_tx, source) = batch_channel(4);
    assert!(!chart.subscribe(source));
}

#[test]
fn old_points_are_evicted_against_newest_time() {
    let mut chart = session(ChartConfig {
        drop_data_after_ms: Some(50),
        ..ChartConfig::default()
    });
    chart.process_tick(ChartDataBatch::single(
        "s1",
        vec![Datum::new(100.0, 1.0), Datum::new(140.0, 2.0)],
    ));
    let summary = chart.process_tick(ChartDataBatch::single(
        "s1",
        vec![Datum::new(180.0, 3.0), Datum::new(195.0, 4.0)],
    ));
    assert_eq!(summary.evicted, 2);
    assert_eq!(
        chart.snapshot("s1").unwrap(),
        vec![Datum::new(180.0, 3.0), Datum::new(195.0, 4.0)]
    );
}

#[test]
fn eviction_is_reflected_in_windowed_statistics() {
    let mut chart = session(ChartConfig {
        drop_data_after_ms: Some(50),
        ..ChartConfig::default()
    });
    chart.process_tick(ChartDataBatch::single(
        "s1",
        vec![Datum::new(100.0, 100.0), Datum::new(140.0, 50.0)],
    ));
    chart.process_tick(ChartDataBatch::single(
        "s1",
        vec![Datum::new(180.0, 1.0), Datum::new(195.0, 3.0)],
    ));
    let stats = chart.statistics("s1").unwrap();
    assert_eq!(stats.windowed.count, 2);
    assert_eq!(stats.windowed.mean, 2.0);
    assert_eq!(stats.windowed.max.value, 3.0);
    assert_eq!(stats.lifetime.count, 4);
    assert_eq!(stats.lifetime.max.value, 100.0);
}

#[test]
fn non_finite_values_do_not_poison_statistics() {
    let mut chart = session(ChartConfig {
        stats_window_ms: Some(10),
        ..ChartConfig::default()
    });
    let summary = chart.process_tick(point("s1", 0.0, f64::NAN));
    assert_eq!(summary.dropped, 1);
    chart.process_tick(ChartDataBatch::single(
        "s1",
        vec![Datum::new(20.0, 1.0), Datum::new(21.0, 3.0)],
    ));
    let stats = chart.statistics("s1").unwrap();
    assert_eq!(stats.windowed.count, 2);
    assert_eq!(stats.windowed.mean, 2.0);
    assert_eq!(stats.lifetime.mean, 2.0);
    assert_eq!(chart.dropped_points(), 1);
    assert_eq!(chart.snapshot("s1").unwrap().len(), 2);
}

#[test]
fn quiet_series_are_evicted_by_other_series_ticks() {
    let mut chart = session(ChartConfig {
        drop_data_after_ms: Some(50),
        ..ChartConfig::default()
    });
    chart.process_tick(point("quiet", 0.0, 1.0));
    chart.process_tick(point("busy", 100.0, 1.0));
    assert!(chart.snapshot("quiet").unwrap().is_empty());
    assert_eq!(chart.snapshot("busy").unwrap().len(), 1);
}

#[test]
fn overlays_are_mutually_exclusive_for_every_flag_combination() {
    let mut chart = session(ChartConfig::default());
    chart.mount_retained();
    chart.process_tick(ChartDataBatch::single(
        "s1",
        (0..=10).map(|i| Datum::new(i as f64 * 100.0, i as f64)).collect(),
    ));
    let plot = chart.dimensions().plot_rect();
    let center = ScreenPoint::new(
        (plot.min.x + plot.max.x) * 0.5,
        (plot.min.y + plot.max.y) * 0.5,
    );
    chart.on_pointer_move(center);

    for bits in 0..8_u8 {
        let flags = OverlayFlags {
            tooltip: bits & 1 != 0,
            tracker: bits & 2 != 0,
            magnifier: bits & 4 != 0,
        };
        chart.set_overlays(flags);
        let visible = [
            chart.tooltip().is_some(),
            chart.tracker().is_some(),
            chart.magnifier().is_some(),
        ];
        assert!(visible.iter().filter(|shown| **shown).count() <= 1);
        assert_eq!(chart.interaction().mode(), flags.resolve());
        if flags.resolve() == OverlayMode::Tracker {
            assert!(visible[1]);
        }
    }
}

fn monotonic_points() -> impl Strategy<Value = Vec<Datum>> {
    prop::collection::vec((0_u8..40, -50_i16..50), 1..60).prop_map(|steps| {
        let mut time = 0.0;
        steps
            .into_iter()
            .map(|(step, value)| {
                time += f64::from(step);
                Datum::new(time, f64::from(value))
            })
            .collect()
    })
}

fn split_into_ticks(points: &[Datum], breaks: &[bool]) -> Vec<Vec<Datum>> {
    let mut ticks = vec![Vec::new()];
    for (index, datum) in points.iter().enumerate() {
        if let Some(tick) = ticks.last_mut() {
            tick.push(*datum);
        }
        if breaks.get(index).copied().unwrap_or(false) {
            ticks.push(Vec::new());
        }
    }
    ticks.retain(|tick| !tick.is_empty());
    ticks
}

proptest! {
    #[test]
    fn tick_grouping_does_not_change_the_result(
        points in monotonic_points(),
        breaks in prop::collection::vec(any::<bool>(), 60),
        drop_after in prop::option::of(10_u64..200),
    ) {
        let config = ChartConfig {
            drop_data_after_ms: drop_after,
            stats_window_ms: Some(100),
            ..ChartConfig::default()
        };
        let mut grouped = session(config.clone());
        for tick in split_into_ticks(&points, &breaks) {
            grouped.process_tick(ChartDataBatch::single("s", tick));
        }
        let mut single = session(config);
        single.process_tick(ChartDataBatch::single("s", points.clone()));

        prop_assert_eq!(grouped.snapshot("s"), single.snapshot("s"));
        prop_assert_eq!(grouped.current_time(), single.current_time());
        let grouped_stats = grouped.statistics("s").unwrap();
        let single_stats = single.statistics("s").unwrap();
        prop_assert_eq!(grouped_stats.lifetime, single_stats.lifetime);
        prop_assert_eq!(grouped_stats.windowed.count, single_stats.windowed.count);
        prop_assert_eq!(grouped_stats.windowed.sum, single_stats.windowed.sum);
    }

    #[test]
    fn retained_points_are_exactly_those_within_the_age_limit(
        points in monotonic_points(),
        breaks in prop::collection::vec(any::<bool>(), 60),
        drop_after in 0_u64..150,
    ) {
        let mut chart = session(ChartConfig {
            drop_data_after_ms: Some(drop_after),
            ..ChartConfig::default()
        });
        let mut seen: Vec<Datum> = Vec::new();
        for tick in split_into_ticks(&points, &breaks) {
            seen.extend(tick.iter().copied());
            chart.process_tick(ChartDataBatch::single("s", tick));
            let now = chart.current_time();
            let expected: Vec<Datum> = seen
                .iter()
                .copied()
                .filter(|datum| now - datum.time <= drop_after as f64)
                .collect();
            prop_assert_eq!(chart.snapshot("s").unwrap(), expected);
        }
    }

    #[test]
    fn windowed_statistics_match_a_recomputation(
        points in monotonic_points(),
        breaks in prop::collection::vec(any::<bool>(), 60),
        window in 1_u64..120,
    ) {
        let mut chart = session(ChartConfig {
            stats_window_ms: Some(window),
            ..ChartConfig::default()
        });
        let mut seen: Vec<Datum> = Vec::new();
        for tick in split_into_ticks(&points, &breaks) {
            seen.extend(tick.iter().copied());
            chart.process_tick(ChartDataBatch::single("s", tick));
            let now = chart.current_time();
            let expected = Aggregate::from_points(
                seen.iter().filter(|datum| datum.time >= now - window as f64),
            );
            let actual = chart.statistics("s").unwrap().windowed;
            prop_assert_eq!(actual.count, expected.count);
            prop_assert_eq!(actual.sum, expected.sum);
            prop_assert_eq!(actual.min.value, expected.min.value);
            prop_assert_eq!(actual.max.value, expected.max.value);
            prop_assert_eq!(
                chart.statistics("s").unwrap().lifetime,
                Aggregate::from_points(seen.iter())
            );
        }
    }

    #[test]
    fn windowed_statistics_follow_buffer_eviction(
        points in monotonic_points(),
        breaks in prop::collection::vec(any::<bool>(), 60),
        drop_after in 0_u64..150,
        window in prop::option::of(1_u64..120),
    ) {
        let mut chart = session(ChartConfig {
            drop_data_after_ms: Some(drop_after),
            stats_window_ms: window,
            ..ChartConfig::default()
        });
        for tick in split_into_ticks(&points, &breaks) {
            chart.process_tick(ChartDataBatch::single("s", tick));
            let now = chart.current_time();
            let length = window.map_or(f64::INFINITY, |window| window as f64);
            let retained = chart.snapshot("s").unwrap();
            let expected = Aggregate::from_points(
                retained.iter().filter(|datum| datum.time >= now - length),
            );
            let actual = chart.statistics("s").unwrap().windowed;
            prop_assert_eq!(actual.count, expected.count);
            prop_assert_eq!(actual.sum, expected.sum);
            prop_assert_eq!(actual.min.value, expected.min.value);
            prop_assert_eq!(actual.max.value, expected.max.value);
        }
    }
}
