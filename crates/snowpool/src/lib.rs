#![doc = include_str!("../README.md")]

mod allocator;
mod error;
mod id;
mod layout;
#[cfg(test)]
mod mock_clock;
mod pool;
mod time;
mod worker;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::layout::*;
pub use crate::pool::*;
pub use crate::time::*;
pub use crate::worker::*;
