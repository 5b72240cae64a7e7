//! # dbf-reader
//!
//! A read-only reader for xBase (DBF) tables.
//! Supports dBase III/IV and Visual FoxPro tables, deleted-record filtering,
//! lazy or eager record access and memo fields stored in `.fpt`/`.dbt` files.
pub mod dbf;

// Re-export the main types for convenience
pub use dbf::{
    DbfError, LoadedTable, RecordClass, RecordIter, RecordStream, Records, Result, Table,
    TableOptions,
    codec::codepages::Codepage,
    codec::fields::{FieldDecoder, FieldParser},
    memo::MemoResolver,
    paths::{CaseInsensitive, Exact, PathResolver},
    types::{
        models::{FieldDescriptor, Memo, MemoKind, TableHeader},
        record::{DefaultBuilder, MapBuilder, PairsBuilder, Record, RecordBuilder},
        value::Value,
    },
};
