//! Error types.
//!
//! Configuration mistakes fail fast through [`ChartError`]. Stream-time
//! problems are recovered locally and only surface as [`AppendError`] to
//! callers that append to a buffer directly.

use thiserror::Error;

use crate::axis::{AxisId, AxisKindTag};
use crate::series::PlotKindTag;

/// Errors raised while configuring a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A plot kind was bound to an axis of the wrong kind.
    #[error("{plot:?} plot requires a {expected:?} axis for {axis}, found {found:?}")]
    AxisMismatch {
        /// Plot kind being configured.
        plot: PlotKindTag,
        /// Axis the plot was bound to.
        axis: AxisId,
        /// Axis kind the plot needs.
        expected: AxisKindTag,
        /// Axis kind that was supplied.
        found: AxisKindTag,
    },
    /// A plot referenced an axis that was never registered.
    #[error("axis {0} is not registered on this chart")]
    UnknownAxis(AxisId),
    /// The series filter is not a valid regular expression.
    #[error("invalid series filter: {0}")]
    InvalidFilter(#[from] regex::Error),
    /// A configuration value is out of its allowed range.
    #[error("invalid setting {field}: {reason}")]
    InvalidSetting {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Configuration could not be loaded or deserialized.
    #[error("failed to load chart configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// Errors that can occur when appending data to a series buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppendError {
    /// Some points were malformed and were dropped; the rest were appended.
    #[error(
        "dropped {out_of_order} point(s) earlier than the buffer tail and {non_finite} non-finite point(s)"
    )]
    Rejected {
        /// Points earlier than the buffer tail.
        out_of_order: usize,
        /// Points with a NaN or infinite time or value.
        non_finite: usize,
        /// Points appended.
        appended: usize,
    },
}

impl AppendError {
    /// Total number of points dropped.
    pub fn dropped(&self) -> usize {
        match self {
            Self::Rejected {
                out_of_order,
                non_finite,
                ..
            } => out_of_order + non_finite,
        }
    }

    /// Number of points appended despite the error.
    pub fn appended(&self) -> usize {
        match self {
            Self::Rejected { appended, .. } => *appended,
        }
    }
}
