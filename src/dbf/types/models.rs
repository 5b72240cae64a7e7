//! Core data structures for DBF format components.
//!
//! This module defines the structural metadata decoded from a table file:
//! - The fixed 32-byte table header
//! - One descriptor per column
//! - Memo payloads returned by a memo file

/// Type code of fields whose value lives in the companion memo file.
pub const MEMO_TYPE: char = 'M';

/// Structural metadata from the first 32 bytes of a DBF file.
///
/// The year is stored as two digits; see [`crate::dbf::utils::expand_year`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub version: u8,
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub num_records: u32,
    pub header_len: u16,
    pub record_len: u16,
    pub reserved1: u16,
    pub incomplete_transaction: u8,
    pub encryption_flag: u8,
    pub free_record_thread: u32,
    pub reserved2: u32,
    pub reserved3: u32,
    pub mdx_flag: u8,
    pub language_driver: u8,
    pub reserved4: u16,
}

/// Schema entry describing one column of the table.
///
/// The order of descriptors defines the byte layout of every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_code: char,
    pub address: u32,
    pub length: u8,
    pub decimal_count: u8,
    pub reserved1: u16,
    pub workarea_id: u8,
    pub reserved2: u8,
    pub reserved3: u8,
    pub set_fields_flag: u8,
    pub reserved4: [u8; 7],
    pub index_field_flag: u8,
}

impl FieldDescriptor {
    /// Whether the field holds a pointer into the memo file.
    pub fn is_memo(&self) -> bool {
        self.type_code == MEMO_TYPE
    }
}

/// How a memo payload should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    /// Text, decoded with the table's encoding.
    Text,
    /// Opaque bytes (pictures, OLE objects).
    Binary,
}

/// A payload read from the memo file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub kind: MemoKind,
    pub data: Vec<u8>,
}
