//! File format parsing layer for DBF tables.
//!
//! This module bridges raw file I/O and the high-level
//! [`Table`](crate::dbf::table::Table).
//!
//! # Module Organization
//!
//! - [`layout`]: Static byte layouts of the 32-byte header structures
//! - [`header`]: Parses the table header and field descriptors
//! - [`schema`]: Validates field descriptors before any record is read
//! - [`record`]: Decodes or skips a single record
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  Table Header   │ ← header::read_table_header()
//! ├─────────────────┤
//! │  Field          │ ← header::read_field_descriptors()
//! │  Descriptors    │   schema::validate()
//! │  ... 0x0D       │
//! ├─────────────────┤
//! │  Records        │ ← record::RecordDecoder
//! │  (marker byte + │
//! │   field slots)  │
//! │  ... 0x1A       │
//! └─────────────────┘
//! ```

pub mod header;
pub mod layout;
pub mod record;
pub mod schema;
