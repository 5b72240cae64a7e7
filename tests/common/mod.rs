//! Byte-level builders for DBF, FPT and DBT fixtures.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const ACTIVE: u8 = b' ';
pub const DELETED: u8 = b'*';

pub struct FieldSpec {
    pub name: String,
    pub type_code: u8,
    pub length: u8,
    pub decimals: u8,
}

/// Assembles a DBF file in memory.
pub struct DbfBuilder {
    pub version: u8,
    pub date: (u8, u8, u8),
    pub language_driver: u8,
    pub fields: Vec<FieldSpec>,
    pub records: Vec<(u8, Vec<u8>)>,
    pub terminator: bool,
    pub field_terminator: bool,
    pub record_len_override: Option<u16>,
    pub header_padding: usize,
    pub trailing: Vec<u8>,
}

impl DbfBuilder {
    pub fn new() -> Self {
        Self {
            version: 0x03,
            date: (99, 12, 31),
            language_driver: 0x03,
            fields: Vec::new(),
            records: Vec::new(),
            terminator: true,
            field_terminator: true,
            record_len_override: None,
            header_padding: 0,
            trailing: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, type_code: char, length: u8, decimals: u8) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            type_code: type_code as u8,
            length,
            decimals,
        });
        self
    }

    pub fn date(mut self, year: u8, month: u8, day: u8) -> Self {
        self.date = (year, month, day);
        self
    }

    pub fn language_driver(mut self, code: u8) -> Self {
        self.language_driver = code;
        self
    }

    /// Adds a record; each value is left-aligned and space-padded to its field width.
    pub fn record(self, values: &[&[u8]]) -> Self {
        self.marked(ACTIVE, values)
    }

    pub fn deleted(self, values: &[&[u8]]) -> Self {
        self.marked(DELETED, values)
    }

    pub fn marked(mut self, marker: u8, values: &[&[u8]]) -> Self {
        assert_eq!(values.len(), self.fields.len(), "one value per field");
        let mut payload = Vec::new();
        for (value, field) in values.iter().zip(&self.fields) {
            let mut slot = value.to_vec();
            assert!(slot.len() <= field.length as usize, "value wider than field");
            slot.resize(field.length as usize, b' ');
            payload.extend_from_slice(&slot);
        }
        self.records.push((marker, payload));
        self
    }

    /// Adds a record whose payload is used verbatim.
    pub fn raw_record(mut self, marker: u8, payload: Vec<u8>) -> Self {
        self.records.push((marker, payload));
        self
    }

    pub fn without_terminator(mut self) -> Self {
        self.terminator = false;
        self
    }

    pub fn without_field_terminator(mut self) -> Self {
        self.field_terminator = false;
        self
    }

    pub fn record_len(mut self, record_len: u16) -> Self {
        self.record_len_override = Some(record_len);
        self
    }

    /// Zero bytes between the descriptor terminator and the first record,
    /// counted in `header_len` (Visual FoxPro stores a 263-byte backlink there).
    pub fn header_padding(mut self, len: usize) -> Self {
        self.header_padding = len;
        self
    }

    /// Bytes appended after the end-of-data marker.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing = bytes.to_vec();
        self
    }

    pub fn payload_len(&self) -> usize {
        self.fields.iter().map(|f| f.length as usize).sum()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let header_len =
            32 + 32 * self.fields.len() + usize::from(self.field_terminator) + self.header_padding;
        let record_len = self
            .record_len_override
            .unwrap_or((1 + self.payload_len()) as u16);

        let mut out = Vec::new();
        out.push(self.version);
        out.extend_from_slice(&[self.date.0, self.date.1, self.date.2]);
        out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        out.extend_from_slice(&(header_len as u16).to_le_bytes());
        out.extend_from_slice(&record_len.to_le_bytes());
        out.extend_from_slice(&[0u8; 17]);
        out.push(self.language_driver);
        out.extend_from_slice(&[0u8; 2]);
        assert_eq!(out.len(), 32);

        let mut address = 1u32;
        for field in &self.fields {
            let mut name = [0u8; 11];
            name[..field.name.len()].copy_from_slice(field.name.as_bytes());
            out.extend_from_slice(&name);
            out.push(field.type_code);
            out.extend_from_slice(&address.to_le_bytes());
            out.push(field.length);
            out.push(field.decimals);
            out.extend_from_slice(&[0u8; 14]);
            address += field.length as u32;
        }
        if self.field_terminator {
            out.push(0x0D);
        }
        out.resize(header_len, 0);

        for (marker, payload) in &self.records {
            out.push(*marker);
            out.extend_from_slice(payload);
        }
        if self.terminator {
            out.push(0x1A);
        }
        out.extend_from_slice(&self.trailing);
        out
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, self.bytes()).expect("write dbf fixture");
        path
    }
}

/// Assembles an FPT memo file; `memo` returns the block pointer of each payload.
pub struct FptBuilder {
    block_size: u16,
    bytes: Vec<u8>,
}

impl FptBuilder {
    pub fn new(block_size: u16) -> Self {
        let mut bytes = vec![0u8; 512];
        bytes[6..8].copy_from_slice(&block_size.to_be_bytes());
        Self { block_size, bytes }
    }

    pub fn memo(&mut self, memo_type: u32, data: &[u8]) -> u32 {
        let block_size = self.block_size as usize;
        let pointer = (self.bytes.len() / block_size) as u32;
        self.bytes.extend_from_slice(&memo_type.to_be_bytes());
        self.bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(data);
        let padded = self.bytes.len().div_ceil(block_size) * block_size;
        self.bytes.resize(padded, 0);
        let next_free = (self.bytes.len() / block_size) as u32;
        self.bytes[0..4].copy_from_slice(&next_free.to_be_bytes());
        pointer
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, &self.bytes).expect("write fpt fixture");
        path
    }
}

/// Assembles a DBT memo file with 512-byte blocks.
pub struct DbtBuilder {
    bytes: Vec<u8>,
}

impl DbtBuilder {
    pub fn new() -> Self {
        Self { bytes: vec![0u8; 512] }
    }

    /// dBase III memo, terminated by 0x1A 0x1A.
    pub fn dbase3(&mut self, text: &[u8]) -> u32 {
        let pointer = (self.bytes.len() / 512) as u32;
        self.bytes.extend_from_slice(text);
        self.bytes.extend_from_slice(&[0x1A, 0x1A]);
        self.pad();
        pointer
    }

    /// dBase IV memo with its 8-byte block header.
    pub fn dbase4(&mut self, text: &[u8]) -> u32 {
        let pointer = (self.bytes.len() / 512) as u32;
        self.bytes.extend_from_slice(&[0xFF, 0xFF, 0x08, 0x00]);
        self.bytes.extend_from_slice(&((text.len() + 8) as u32).to_le_bytes());
        self.bytes.extend_from_slice(text);
        self.pad();
        pointer
    }

    fn pad(&mut self) {
        let padded = self.bytes.len().div_ceil(512) * 512;
        self.bytes.resize(padded, 0);
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, &self.bytes).expect("write dbt fixture");
        path
    }
}

/// Right-aligns a memo pointer in a 10-byte character slot.
pub fn memo_slot(pointer: u32) -> Vec<u8> {
    format!("{:>10}", pointer).into_bytes()
}

/// The fixture used by most table tests: three people, one deleted.
pub fn people() -> DbfBuilder {
    DbfBuilder::new()
        .field("NAME", 'C', 10, 0)
        .field("AGE", 'N', 3, 0)
        .field("BORN", 'D', 8, 0)
        .field("ACTIVE", 'L', 1, 0)
        .record(&[b"Alice", b" 34", b"19900115", b"T"])
        .deleted(&[b"Bob", b" 51", b"19730402", b"F"])
        .record(&[b"Carol", b"  7", b"20170930", b"?"])
        .record(&[b"Dave", b"   ", b"        ", b"Y"])
}
