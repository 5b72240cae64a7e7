//! Record streams over a table's record area.
//!
//! Records are scanned one marker byte at a time:
//!
//! | marker | meaning                 |
//! |--------|-------------------------|
//! | `0x20` | active record           |
//! | `0x2A` | deleted record          |
//! | `0x1A` | end of data             |
//! | other  | corrupt file, abort     |
//!
//! Records of the requested [`RecordClass`] are decoded; all others are
//! skipped by seeking past their payload, so counting records or reading only
//! active rows never decodes the excluded ones.
//!
//! Every stream opens its own file handle, positioned at the end of the
//! header, and releases it when the stream finishes or is dropped.
//!
//! # Example
//! ```no_run
//! # use dbf_reader::Table;
//! # let table = Table::open("people.dbf").unwrap();
//! for record in table.deleted().stream() {
//!     let record = record.unwrap();
//!     println!("{:?}", record.get("NAME"));
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, ErrorKind, Seek, SeekFrom};
use std::path::Path;
use std::slice;

use byteorder::ReadBytesExt;
use log::{debug, trace};

use super::format::record::{self, ACTIVE_MARKER, DELETED_MARKER, END_OF_FILE};
use super::table::Table;
use super::types::error::{DbfError, Result};
use super::types::record::RecordBuilder;

/// Which records a stream yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    Active,
    Deleted,
}

/// Reads marker bytes and skips payloads over one file handle.
struct Scanner {
    reader: BufReader<File>,
    offset: u64,
    payload_len: usize,
    file_len: u64,
}

impl Scanner {
    fn open(path: &Path, header_len: u16, payload_len: usize) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(header_len as u64))?;
        trace!("Record scan of {} starts at offset {}", path.display(), header_len);
        Ok(Self {
            reader: BufReader::new(file),
            offset: header_len as u64,
            payload_len,
            file_len,
        })
    }

    /// Classifies the next record, `None` once the record area has ended.
    fn next_marker(&mut self) -> Result<Option<RecordClass>> {
        let marker = match self.reader.read_u8() {
            Ok(byte) => byte,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let offset = self.offset;
        self.offset += 1 + self.payload_len as u64;
        match marker {
            ACTIVE_MARKER => Ok(Some(RecordClass::Active)),
            DELETED_MARKER => Ok(Some(RecordClass::Deleted)),
            END_OF_FILE => Ok(None),
            byte => Err(DbfError::InvalidRecordSeparator { byte, offset }),
        }
    }

    /// Skips the payload of the record whose marker was just read.
    fn skip(&mut self) -> Result<()> {
        let payload_start = self.offset - self.payload_len as u64;
        let remaining = self.file_len.saturating_sub(payload_start);
        record::skip_record(&mut self.reader, self.payload_len, remaining)
    }
}

/// Counts the records of one class without decoding any of them.
pub fn count_records<B: RecordBuilder>(table: &Table<B>, class: RecordClass) -> Result<usize> {
    let mut scanner = Scanner::open(table.path(), table.header().header_len, table.payload_len())?;
    let mut count = 0;
    while let Some(found) = scanner.next_marker()? {
        if found == class {
            count += 1;
        }
        scanner.skip()?;
    }
    debug!("Counted {} {:?} records in {}", count, class, table.name());
    Ok(count)
}

/// A lazy, single-pass stream of decoded records read from disk.
///
/// The file is opened on the first call to `next`. After an error the
/// stream is finished and yields nothing more.
pub struct RecordStream<'a, B: RecordBuilder> {
    table: &'a Table<B>,
    class: RecordClass,
    scanner: Option<Scanner>,
    done: bool,
}

impl<'a, B: RecordBuilder> RecordStream<'a, B> {
    pub(crate) fn new(table: &'a Table<B>, class: RecordClass) -> Self {
        Self {
            table,
            class,
            scanner: None,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<B::Output>> {
        if self.scanner.is_none() {
            self.scanner = Some(Scanner::open(
                self.table.path(),
                self.table.header().header_len,
                self.table.payload_len(),
            )?);
        }
        let Some(scanner) = self.scanner.as_mut() else {
            return Ok(None);
        };

        while let Some(found) = scanner.next_marker()? {
            if found == self.class {
                let fields = self.table.record_decoder().read_record(&mut scanner.reader)?;
                return Ok(Some(self.table.builder().build(fields)));
            }
            scanner.skip()?;
        }
        Ok(None)
    }

    fn finish(&mut self) {
        self.done = true;
        self.scanner = None;
    }
}

impl<B: RecordBuilder> Iterator for RecordStream<'_, B> {
    type Item = Result<B::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

/// Iterator over the records of a [`Records`] view.
///
/// Loaded tables yield clones of the in-memory records; unloaded tables
/// stream from disk.
pub enum RecordIter<'a, B: RecordBuilder> {
    Loaded(slice::Iter<'a, B::Output>),
    Streamed(RecordStream<'a, B>),
}

impl<B: RecordBuilder> Iterator for RecordIter<'_, B>
where
    B::Output: Clone,
{
    type Item = Result<B::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordIter::Loaded(records) => records.next().cloned().map(Ok),
            RecordIter::Streamed(stream) => stream.next(),
        }
    }
}

/// The active or deleted records of a table.
///
/// A view over either the loaded sequence or a fresh disk scan; it holds no
/// file handle itself.
pub struct Records<'a, B: RecordBuilder> {
    table: &'a Table<B>,
    class: RecordClass,
}

impl<B: RecordBuilder> Clone for Records<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: RecordBuilder> Copy for Records<'_, B> {}

impl<'a, B: RecordBuilder> Records<'a, B> {
    pub(crate) fn new(table: &'a Table<B>, class: RecordClass) -> Self {
        Self { table, class }
    }

    pub fn class(&self) -> RecordClass {
        self.class
    }

    /// Always reads from disk, whether or not the table is loaded.
    pub fn stream(&self) -> RecordStream<'a, B> {
        RecordStream::new(self.table, self.class)
    }

    pub fn iter(&self) -> RecordIter<'a, B>
    where
        B::Output: Clone,
    {
        match self.as_slice() {
            Some(records) => RecordIter::Loaded(records.iter()),
            None => RecordIter::Streamed(self.stream()),
        }
    }

    /// Number of records; unloaded tables run a skip-only scan.
    pub fn len(&self) -> Result<usize> {
        match self.as_slice() {
            Some(records) => Ok(records.len()),
            None => self.table.count(self.class),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Loaded records only.
    pub fn get(&self, index: usize) -> Option<&'a B::Output> {
        self.as_slice()?.get(index)
    }

    /// The in-memory records, `None` when the table is not loaded.
    pub fn as_slice(&self) -> Option<&'a [B::Output]> {
        self.table.loaded_records(self.class)
    }
}

impl<'a, B: RecordBuilder> IntoIterator for Records<'a, B>
where
    B::Output: Clone,
{
    type Item = Result<B::Output>;
    type IntoIter = RecordIter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
