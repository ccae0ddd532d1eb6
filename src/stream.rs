//! Stream accumulator: batching of pushed updates into render ticks.
//!
//! A subscription task drains an asynchronous source of [`ChartDataBatch`]es.
//! The first event after an idle period opens a window of `windowing_time`;
//! every event arriving before the window closes is merged into the same
//! tick, and the tick is applied to the chart in one locked step. Ticks are
//! applied strictly in arrival order.

use std::time::Duration;

use futures::{Stream, StreamExt};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::chart::ChartHandle;
use crate::geom::Datum;

/// Newly arrived points keyed by series name.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataBatch {
    /// New points per series, in arrival order.
    pub series: Vec<(String, Vec<Datum>)>,
    /// Largest time observed in the batch across all series.
    pub max_time: f64,
}

impl Default for ChartDataBatch {
    fn default() -> Self {
        Self {
            series: Vec::new(),
            max_time: f64::NEG_INFINITY,
        }
    }
}

impl ChartDataBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch with points for a single series.
    pub fn single(name: impl Into<String>, points: Vec<Datum>) -> Self {
        Self::new().with_series(name, points)
    }

    /// Add points for a series.
    pub fn with_series(mut self, name: impl Into<String>, points: Vec<Datum>) -> Self {
        self.push(name, points);
        self
    }

    /// Add points for a series, updating the batch max time.
    pub fn push(&mut self, name: impl Into<String>, points: Vec<Datum>) {
        for datum in &points {
            if datum.time.is_finite() && datum.time > self.max_time {
                self.max_time = datum.time;
            }
        }
        self.series.push((name.into(), points));
    }

    /// Total number of points in the batch.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|(_, points)| points.len()).sum()
    }

    /// Check if the batch carries no points.
    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

/// Merges the events of one batching window into a single tick.
#[derive(Debug)]
pub struct TickAccumulator {
    series: IndexMap<String, Vec<Datum>>,
    max_time: f64,
    events: usize,
}

impl Default for TickAccumulator {
    fn default() -> Self {
        Self {
            series: IndexMap::new(),
            max_time: f64::NEG_INFINITY,
            events: 0,
        }
    }
}

impl TickAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one event.
    pub fn push(&mut self, batch: ChartDataBatch) {
        self.events += 1;
        if batch.max_time > self.max_time {
            self.max_time = batch.max_time;
        }
        for (name, points) in batch.series {
            self.series.entry(name).or_default().extend(points);
        }
    }

    /// Number of events merged since the last take.
    pub fn events(&self) -> usize {
        self.events
    }

    /// Check if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Take the merged tick, leaving the accumulator empty.
    pub fn take(&mut self) -> Option<ChartDataBatch> {
        if self.is_empty() {
            return None;
        }
        let series = std::mem::take(&mut self.series).into_iter().collect();
        let max_time = std::mem::replace(&mut self.max_time, f64::NEG_INFINITY);
        self.events = 0;
        Some(ChartDataBatch { series, max_time })
    }

    /// Drop pending events, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.events;
        self.series.clear();
        self.max_time = f64::NEG_INFINITY;
        self.events = 0;
        discarded
    }
}

/// Handle to a running subscription task.
///
/// Dropping the handle does not stop the task; call
/// [`SubscriptionHandle::unsubscribe`].
#[derive(Debug)]
pub struct SubscriptionHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Spawn a subscription task on the current tokio runtime.
    pub(crate) fn spawn<S>(chart: ChartHandle, source: S, windowing_time: Duration) -> Self
    where
        S: Stream<Item = ChartDataBatch> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = tokio::spawn(run_subscription(
            chart,
            source,
            windowing_time,
            token.clone(),
        ));
        Self { token, task }
    }

    /// Stop future ticks. Safe to call more than once.
    ///
    /// Events still waiting for their window to close are discarded; a tick
    /// already being applied completes.
    pub fn unsubscribe(&self) {
        if !self.token.is_cancelled() {
            self.token.cancel();
            tracing::debug!("chart unsubscribed");
        }
    }

    /// Whether the task is still accepting events.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Whether the task has exited, either by cancellation or end of source.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit.
    pub async fn finished(self) {
        if let Err(error) = self.task.await {
            tracing::error!(error = %error, "subscription task failed");
        }
    }
}

/// Channel-backed source for pushing batches from producer code.
pub fn batch_channel(
    capacity: usize,
) -> (mpsc::Sender<ChartDataBatch>, ReceiverStream<ChartDataBatch>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, ReceiverStream::new(rx))
}

async fn run_subscription<S>(
    chart: ChartHandle,
    source: S,
    windowing_time: Duration,
    token: CancellationToken,
) where
    S: Stream<Item = ChartDataBatch>,
{
    let mut source = std::pin::pin!(source);
    let mut pending = TickAccumulator::new();
    let mut deadline: Option<Instant> = None;

    tracing::debug!(
        windowing_ms = windowing_time.as_millis() as u64,
        "chart subscription started"
    );

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                let discarded = pending.clear();
                tracing::debug!(discarded, "chart subscription cancelled");
                break;
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                flush(&chart, &mut pending);
            }
            next = source.next() => match next {
                Some(batch) => {
                    if deadline.is_none() {
                        deadline = Some(Instant::now() + windowing_time);
                    }
                    pending.push(batch);
                }
                None => {
                    flush(&chart, &mut pending);
                    tracing::debug!("chart source ended");
                    break;
                }
            },
        }
    }
}

fn flush(chart: &ChartHandle, pending: &mut TickAccumulator) {
    let events = pending.events();
    let Some(batch) = pending.take() else {
        return;
    };
    let summary = chart.write().process_tick(batch);
    tracing::trace!(
        events,
        appended = summary.appended,
        current_time = summary.current_time,
        "tick flushed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_tracks_max_time_across_series() {
        let batch = ChartDataBatch::new()
            .with_series("a", vec![Datum::new(10.0, 1.0), Datum::new(30.0, 1.0)])
            .with_series("b", vec![Datum::new(20.0, 1.0)]);
        assert_eq!(batch.max_time, 30.0);
        assert_eq!(batch.point_count(), 3);
    }

    #[test]
    fn accumulator_merges_events_per_series() {
        let mut acc = TickAccumulator::new();
        acc.push(ChartDataBatch::single("a", vec![Datum::new(0.0, 1.0)]));
        acc.push(
            ChartDataBatch::single("b", vec![Datum::new(5.0, 2.0)])
                .with_series("a", vec![Datum::new(25.0, 3.0)]),
        );
        assert_eq!(acc.events(), 2);

        let tick = acc.take().unwrap();
        assert_eq!(tick.max_time, 25.0);
        assert_eq!(tick.series.len(), 2);
        assert_eq!(tick.series[0].0, "a");
        assert_eq!(
            tick.series[0].1,
            vec![Datum::new(0.0, 1.0), Datum::new(25.0, 3.0)]
        );
        assert!(acc.is_empty());
        assert!(acc.take().is_none());
    }

    #[test]
    fn clear_discards_pending_events() {
        let mut acc = TickAccumulator::new();
        acc.push(ChartDataBatch::single("a", vec![Datum::new(0.0, 1.0)]));
        assert_eq!(acc.clear(), 1);
        assert!(acc.take().is_none());
    }

    #[test]
    fn empty_event_still_counts_as_tick() {
        let mut acc = TickAccumulator::new();
        acc.push(ChartDataBatch::new());
        let tick = acc.take().unwrap();
        assert!(tick.is_empty());
        assert_eq!(tick.max_time, f64::NEG_INFINITY);
    }
}
