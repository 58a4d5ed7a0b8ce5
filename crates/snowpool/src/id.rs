use crate::layout::Layout;
use core::fmt;

/// A 63-bit, time-sortable Snowflake identifier.
///
/// The numeric value orders identifiers by timestamp first, then worker id,
/// then sequence. The field boundaries depend on the [`Layout`] that encoded
/// it; use [`Layout::decode`] to split it back into [`Components`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    /// Converts this identifier into its raw integer representation.
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Wraps a raw integer. The sign bit is cleared.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw & (u64::MAX >> 1))
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.0
    }
}

/// The three fields packed into a [`SnowflakeId`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Components {
    /// Milliseconds since the layout's epoch.
    pub timestamp: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl Components {
    /// Wall-clock milliseconds since the UNIX epoch for this timestamp.
    pub const fn unix_millis(&self, layout: &Layout) -> u64 {
        self.timestamp + layout.epoch_millis()
    }
}

impl Layout {
    /// Packs a timestamp (relative to the epoch), worker id and sequence into
    /// an identifier.
    ///
    /// Each input is masked to its field width. Callers are expected to have
    /// validated the values; this never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use snowpool::{Components, Layout};
    ///
    /// let layout = Layout::default();
    /// let id = layout.encode(1, 2, 3);
    /// assert_eq!(id.to_raw(), (1 << 22) | (2 << 12) | 3);
    /// assert_eq!(
    ///     layout.decode(id),
    ///     Components { timestamp: 1, worker_id: 2, sequence: 3 }
    /// );
    /// ```
    pub const fn encode(&self, timestamp: u64, worker_id: u64, sequence: u64) -> SnowflakeId {
        let t = (timestamp & self.max_timestamp()) << self.timestamp_shift() as u32;
        let w = (worker_id & self.max_worker_id()) << self.worker_shift() as u32;
        let s = sequence & self.max_sequence();
        SnowflakeId(t | w | s)
    }

    /// Splits an identifier back into its fields.
    pub const fn decode(&self, id: SnowflakeId) -> Components {
        let raw = id.to_raw();
        Components {
            timestamp: (raw >> self.timestamp_shift() as u32) & self.max_timestamp(),
            worker_id: (raw >> self.worker_shift() as u32) & self.max_worker_id(),
            sequence: raw & self.max_sequence(),
        }
    }
}
