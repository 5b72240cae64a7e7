//! A list-like view over an eagerly loaded table.

use std::fmt;
use std::ops::Deref;
use std::path::Path;

use super::table::{Table, TableOptions};
use super::types::error::Result;
use super::types::record::{DefaultBuilder, RecordBuilder};

/// A table whose active records are always in memory.
///
/// Dereferences to the slice of active records, so indexing, `len()` and
/// slice iteration work directly. Table metadata is reached through
/// [`LoadedTable::table`]. The view is read-only: the owned table cannot be
/// unloaded or mutated through it.
///
/// ```no_run
/// # use dbf_reader::LoadedTable;
/// let people = LoadedTable::open("people.dbf").unwrap();
/// println!("{} records, first: {:?}", people.len(), people.first());
/// ```
pub struct LoadedTable<B: RecordBuilder = DefaultBuilder> {
    table: Table<B>,
}

impl LoadedTable<DefaultBuilder> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, TableOptions::default(), DefaultBuilder)
    }
}

impl<B: RecordBuilder> LoadedTable<B> {
    /// Opens and loads a table; `options.load` is ignored.
    pub fn open_with(path: impl AsRef<Path>, options: TableOptions, builder: B) -> Result<Self> {
        Self::from_table(Table::open_with(path, options.load(true), builder)?)
    }

    /// Loads `table` if needed and wraps it.
    pub fn from_table(mut table: Table<B>) -> Result<Self> {
        table.load()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &Table<B> {
        &self.table
    }

    pub fn records(&self) -> &[B::Output] {
        self.table.loaded_records(super::iter::RecordClass::Active).unwrap_or(&[])
    }

    pub fn deleted(&self) -> &[B::Output] {
        self.table.loaded_records(super::iter::RecordClass::Deleted).unwrap_or(&[])
    }

    pub fn into_table(self) -> Table<B> {
        self.table
    }
}

impl<B: RecordBuilder> Deref for LoadedTable<B> {
    type Target = [B::Output];

    fn deref(&self) -> &Self::Target {
        self.records()
    }
}

impl<B: RecordBuilder> fmt::Debug for LoadedTable<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LoadedTable")
            .field("table", &self.table)
            .field("records", &self.records().len())
            .finish()
    }
}
