//! Error types for Snowflake ID generation.
//!
//! ## Error Cases
//! - `InvalidConfiguration`: a layout, worker id or pool definition that must
//!   not be used to start a service.
//! - `ClockRegression`: the wall clock reported a time earlier than the last
//!   one a worker issued an ID for.
//! - `TimestampOutOfRange`: the clock reading cannot be encoded with the
//!   configured epoch and timestamp width.

use crate::id::SnowflakeId;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `snowpool` can emit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A layout, worker id, or pool definition is invalid.
    ///
    /// Raised only while constructing layouts, workers, and pools. A service
    /// must not start with an invalid worker identity since it could collide
    /// with another deployment's range.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The clock moved backwards relative to the last issued ID.
    ///
    /// The worker is left untouched and resumes normally once the clock
    /// catches up with `last`.
    #[error("invalid system clock: now {now}ms is before last issued {last}ms")]
    ClockRegression { last: u64, now: u64 },

    /// The clock reading falls before the epoch or past the largest timestamp
    /// the layout can encode.
    #[error("timestamp {millis}ms cannot be encoded by the configured layout")]
    TimestampOutOfRange { millis: u64 },
}

impl Error {
    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// A batch that stopped before reaching the requested count.
///
/// `ids` holds every identifier produced before `source` occurred. Each of
/// them is valid and they are strictly increasing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("batch stopped after {} of {requested} ids: {source}", .ids.len())]
pub struct BatchError {
    /// Identifiers produced before the failure.
    pub ids: Vec<SnowflakeId>,
    /// Number of identifiers the caller asked for.
    pub requested: usize,
    /// The failure that stopped the batch.
    #[source]
    pub source: Error,
}
