mod cursor;
mod frame;
mod locator;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cursor::{CursorState, PageFrameCursor};
pub use frame::{ColumnSpan, PageFrame};
pub use locator::RowPosition;
