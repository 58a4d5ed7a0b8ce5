use crate::error::{Error, Result};
use core::time::Duration;

/// Default epoch: Monday, October 20, 2014 15:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_413_817_200_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Number of bits usable by an identifier. The sign bit of a 64-bit integer
/// is never set.
pub const ID_BITS: u8 = 63;

/// Default width of the worker id field.
pub const DEFAULT_WORKER_BITS: u8 = 10;

/// Default width of the sequence field.
pub const DEFAULT_SEQUENCE_BITS: u8 = 12;

/// The bit split and epoch shared by the codec and every worker.
///
/// From most to least significant bit an identifier is laid out as:
///
/// ```text
///  Bit Index:  62           22 21         12 11             0
///              +--------------+-------------+---------------+
///  Field:      | timestamp(41)| worker (10) | sequence (12) |
///              +--------------+-------------+---------------+
/// ```
///
/// The widths above are the defaults. The timestamp takes whatever the worker
/// and sequence fields leave of the 63 usable bits.
///
/// A layout must never change once identifiers have been issued with it, or
/// ordering across restarts breaks.
///
/// # Example
///
/// ```
/// use snowpool::{DEFAULT_EPOCH, Layout};
///
/// let layout = Layout::new(DEFAULT_EPOCH, 10, 12).unwrap();
/// assert_eq!(layout.timestamp_bits(), 41);
/// assert_eq!(layout.max_worker_id(), 1023);
/// assert_eq!(layout.max_sequence(), 4095);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    epoch_millis: u64,
    worker_bits: u8,
    sequence_bits: u8,
}

impl Default for Layout {
    /// 41 timestamp bits, 10 worker bits, 12 sequence bits, [`DEFAULT_EPOCH`].
    fn default() -> Self {
        Self {
            epoch_millis: DEFAULT_EPOCH.as_millis() as u64,
            worker_bits: DEFAULT_WORKER_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
        }
    }
}

impl Layout {
    /// Creates a layout from an epoch and the widths of the worker and
    /// sequence fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the sequence field is empty,
    /// if the two fields leave no room for the timestamp, or if the epoch does
    /// not fit in 64 bits of milliseconds.
    pub fn new(epoch: Duration, worker_bits: u8, sequence_bits: u8) -> Result<Self> {
        if sequence_bits == 0 {
            return Err(Error::invalid_configuration(
                "sequence field must be at least 1 bit wide",
            ));
        }
        let reserved = u16::from(worker_bits) + u16::from(sequence_bits);
        if reserved >= u16::from(ID_BITS) {
            return Err(Error::invalid_configuration(format!(
                "worker ({worker_bits}) and sequence ({sequence_bits}) bits leave no room for a timestamp in {ID_BITS} bits"
            )));
        }
        let epoch_millis = u64::try_from(epoch.as_millis())
            .map_err(|_| Error::invalid_configuration("epoch does not fit in u64 milliseconds"))?;

        Ok(Self {
            epoch_millis,
            worker_bits,
            sequence_bits,
        })
    }

    /// The epoch in milliseconds since the UNIX epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }

    pub const fn worker_bits(&self) -> u8 {
        self.worker_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn timestamp_bits(&self) -> u8 {
        ID_BITS - self.worker_bits - self.sequence_bits
    }

    pub const fn worker_shift(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn timestamp_shift(&self) -> u8 {
        self.sequence_bits + self.worker_bits
    }

    pub const fn max_worker_id(&self) -> u64 {
        mask(self.worker_bits)
    }

    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits())
    }

    /// Checks that `worker_id` fits in the worker field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if it does not.
    pub fn validate_worker_id(&self, worker_id: u64) -> Result<()> {
        if worker_id > self.max_worker_id() {
            return Err(Error::invalid_configuration(format!(
                "worker id {worker_id} exceeds maximum {}",
                self.max_worker_id()
            )));
        }
        Ok(())
    }
}

const fn mask(bits: u8) -> u64 {
    if bits == 0 { 0 } else { u64::MAX >> (64 - bits as u32) }
}
