//! Core DBF reader module.

pub mod codec;
pub mod format;
pub mod iter;
pub mod loaded;
pub mod memo;
pub mod paths;
pub mod table;
pub mod types;
pub mod utils;

pub use iter::{RecordClass, RecordIter, RecordStream, Records};
pub use loaded::LoadedTable;
pub use table::{Table, TableOptions};
pub use types::error::{DbfError, Result};
