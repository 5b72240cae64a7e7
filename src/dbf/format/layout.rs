//! Static byte layouts of the fixed-size DBF structures.
//!
//! Every slot is described once, by offset and width, so the wire format is
//! centralized here and decoded by one generic reader. All integers are
//! little-endian.
//!
//! ```text
//! Table header (32 bytes)            Field descriptor (32 bytes)
//! ┌──────┬────────────────────┐      ┌──────┬────────────────────┐
//! │ 0    │ version            │      │ 0    │ name (11)          │
//! │ 1..4 │ year, month, day   │      │ 11   │ type               │
//! │ 4    │ record count  u32  │      │ 12   │ address       u32  │
//! │ 8    │ header length u16  │      │ 16   │ length             │
//! │ 10   │ record length u16  │      │ 17   │ decimal count      │
//! │ ...  │ flags / reserved   │      │ ...  │ flags / reserved   │
//! │ 29   │ language driver    │      │ 31   │ index field flag   │
//! └──────┴────────────────────┘      └──────┴────────────────────┘
//! ```

use std::io::Read;
use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::dbf::types::error::Result;

/// A named byte range inside a fixed-size structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
}

impl Slot {
    pub const fn new(name: &'static str, offset: usize, width: usize) -> Self {
        Self { name, offset, width }
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }

    pub fn u8(&self, buf: &[u8]) -> u8 {
        buf[self.offset]
    }

    pub fn u16(&self, buf: &[u8]) -> u16 {
        LittleEndian::read_u16(&buf[self.range()])
    }

    pub fn u32(&self, buf: &[u8]) -> u32 {
        LittleEndian::read_u32(&buf[self.range()])
    }

    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.range()]
    }
}

/// An ordered, gap-free sequence of slots.
#[derive(Debug)]
pub struct Layout {
    pub name: &'static str,
    pub size: usize,
    pub slots: &'static [Slot],
}

impl Layout {
    /// Reads exactly `self.size` bytes.
    ///
    /// `first` is a byte the caller already consumed while peeking for a
    /// terminator; it becomes byte 0 of the structure.
    pub fn read<R: Read>(&self, reader: &mut R, first: Option<u8>) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.size];
        match first {
            Some(byte) => {
                buf[0] = byte;
                reader.read_exact(&mut buf[1..])?;
            }
            None => reader.read_exact(&mut buf)?,
        }
        Ok(buf)
    }
}

pub mod header {
    use super::{Layout, Slot};

    pub const VERSION: Slot = Slot::new("dbversion", 0, 1);
    pub const YEAR: Slot = Slot::new("year", 1, 1);
    pub const MONTH: Slot = Slot::new("month", 2, 1);
    pub const DAY: Slot = Slot::new("day", 3, 1);
    pub const NUM_RECORDS: Slot = Slot::new("numrecords", 4, 4);
    pub const HEADER_LEN: Slot = Slot::new("headerlen", 8, 2);
    pub const RECORD_LEN: Slot = Slot::new("recordlen", 10, 2);
    pub const RESERVED1: Slot = Slot::new("reserved1", 12, 2);
    pub const INCOMPLETE_TRANSACTION: Slot = Slot::new("incomplete_transaction", 14, 1);
    pub const ENCRYPTION_FLAG: Slot = Slot::new("encryption_flag", 15, 1);
    pub const FREE_RECORD_THREAD: Slot = Slot::new("free_record_thread", 16, 4);
    pub const RESERVED2: Slot = Slot::new("reserved2", 20, 4);
    pub const RESERVED3: Slot = Slot::new("reserved3", 24, 4);
    pub const MDX_FLAG: Slot = Slot::new("mdx_flag", 28, 1);
    pub const LANGUAGE_DRIVER: Slot = Slot::new("language_driver", 29, 1);
    pub const RESERVED4: Slot = Slot::new("reserved4", 30, 2);

    pub const LAYOUT: Layout = Layout {
        name: "DBFHeader",
        size: 32,
        slots: &[
            VERSION,
            YEAR,
            MONTH,
            DAY,
            NUM_RECORDS,
            HEADER_LEN,
            RECORD_LEN,
            RESERVED1,
            INCOMPLETE_TRANSACTION,
            ENCRYPTION_FLAG,
            FREE_RECORD_THREAD,
            RESERVED2,
            RESERVED3,
            MDX_FLAG,
            LANGUAGE_DRIVER,
            RESERVED4,
        ],
    };
}

pub mod field {
    use super::{Layout, Slot};

    pub const NAME: Slot = Slot::new("name", 0, 11);
    pub const TYPE: Slot = Slot::new("type", 11, 1);
    pub const ADDRESS: Slot = Slot::new("address", 12, 4);
    pub const LENGTH: Slot = Slot::new("length", 16, 1);
    pub const DECIMAL_COUNT: Slot = Slot::new("decimal_count", 17, 1);
    pub const RESERVED1: Slot = Slot::new("reserved1", 18, 2);
    pub const WORKAREA_ID: Slot = Slot::new("workarea_id", 20, 1);
    pub const RESERVED2: Slot = Slot::new("reserved2", 21, 1);
    pub const RESERVED3: Slot = Slot::new("reserved3", 22, 1);
    pub const SET_FIELDS_FLAG: Slot = Slot::new("set_fields_flag", 23, 1);
    pub const RESERVED4: Slot = Slot::new("reserved4", 24, 7);
    pub const INDEX_FIELD_FLAG: Slot = Slot::new("index_field_flag", 31, 1);

    pub const LAYOUT: Layout = Layout {
        name: "DBFField",
        size: 32,
        slots: &[
            NAME,
            TYPE,
            ADDRESS,
            LENGTH,
            DECIMAL_COUNT,
            RESERVED1,
            WORKAREA_ID,
            RESERVED2,
            RESERVED3,
            SET_FIELDS_FLAG,
            RESERVED4,
            INDEX_FIELD_FLAG,
        ],
    };
}
