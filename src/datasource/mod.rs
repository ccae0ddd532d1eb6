//! Series storage, statistics and visible-range selection.
//!
//! The data layer is optimized for append-at-tail, evict-at-head workloads.
//! It underpins the stream accumulator and is read by the render driver.

mod buffer;
mod select;
mod stats;

pub use buffer::SeriesBuffer;
pub use select::select_in_range;
pub use stats::{Aggregate, Extremum, SeriesStatistics, StatisticsEngine};
