//! Zero-copy page frames over a partitioned columnar table, for streaming raw
//! column bytes to a replication follower.

pub mod column;
pub mod conf;
pub mod core;
pub mod cursor;
pub mod storage;

#[cfg(feature = "testutil")]
pub mod testutil;

pub use crate::core::FrameError;
pub use cursor::{ColumnSpan, CursorState, PageFrame, PageFrameCursor, RowPosition};
pub use storage::{LocalTable, TableReader};
