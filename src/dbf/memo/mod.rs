//! Memo file access.
//!
//! Memo fields store a pointer; the payload lives in a companion file next
//! to the table. Two container formats are supported:
//!
//! - [`fpt`]: Visual FoxPro / FoxBase memo files (`.fpt`)
//! - [`dbt`]: dBase III and IV memo files (`.dbt`)

use std::fmt::Debug;
use std::path::Path;

use crate::dbf::types::error::Result;
use crate::dbf::types::models::Memo;

pub mod dbt;
pub mod fpt;

/// Extensions tried, in order, when looking for a table's memo file.
pub const MEMO_EXTENSIONS: &[&str] = &["fpt", "dbt"];

/// Resolves memo pointers to payloads.
pub trait MemoResolver: Debug + Send + Sync {
    /// Reads the memo that `pointer` names.
    fn resolve(&self, pointer: u64) -> Result<Memo>;
}

/// Opens the memo file at `path`, choosing the format from its extension.
pub fn open(path: &Path) -> Result<Box<dyn MemoResolver>> {
    let is_dbt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dbt"));
    if is_dbt {
        Ok(Box::new(dbt::DbtFile::open(path)?))
    } else {
        Ok(Box::new(fpt::FptFile::open(path)?))
    }
}
