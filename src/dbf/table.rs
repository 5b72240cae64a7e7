use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::codec::codepages::Codepage;
use super::codec::fields::{DecoderFactory, FieldDecoder, FieldParser};
use super::format::header;
use super::format::record::RecordDecoder;
use super::format::schema;
use super::iter::{self, RecordClass, RecordIter, Records};
use super::memo::{self, MemoResolver, MEMO_EXTENSIONS};
use super::paths::{CaseInsensitive, Exact, PathResolver};
use super::types::error::{DbfError, Result};
use super::types::models::{FieldDescriptor, TableHeader};
use super::types::record::{DefaultBuilder, RecordBuilder};
use super::utils;

/// Options controlling how a table is opened and decoded.
///
/// ```no_run
/// # use dbf_reader::{Table, TableOptions, DefaultBuilder};
/// let options = TableOptions::default().lower_names(true).load(true);
/// let table = Table::open_with("people.dbf", options, DefaultBuilder).unwrap();
/// ```
#[derive(Clone)]
pub struct TableOptions {
    pub encoding: Option<Codepage>,
    pub ignore_case: bool,
    pub lower_names: bool,
    pub load: bool,
    pub raw: bool,
    pub field_decoder: DecoderFactory,
    pub path_resolver: Option<Arc<dyn PathResolver>>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            ignore_case: true,
            lower_names: false,
            load: false,
            raw: false,
            field_decoder: FieldParser::boxed,
            path_resolver: None,
        }
    }
}

impl TableOptions {
    /// Decode text with `encoding` instead of the one named by the language driver.
    pub fn encoding(mut self, encoding: impl Into<Codepage>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Match the table and memo file names ignoring case (default `true`).
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Lower-case field names as they are read.
    pub fn lower_names(mut self, lower_names: bool) -> Self {
        self.lower_names = lower_names;
        self
    }

    /// Load all records into memory when the table is opened.
    pub fn load(mut self, load: bool) -> Self {
        self.load = load;
        self
    }

    /// Return every field as its unmodified bytes; memo files are not opened.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Decode fields with a custom decoder.
    pub fn field_decoder(mut self, factory: DecoderFactory) -> Self {
        self.field_decoder = factory;
        self
    }

    /// Resolve file names with a custom resolver, overriding `ignore_case`.
    pub fn path_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.path_resolver = Some(resolver);
        self
    }

    fn resolver(&self) -> Arc<dyn PathResolver> {
        match &self.path_resolver {
            Some(resolver) => Arc::clone(resolver),
            None if self.ignore_case => Arc::new(CaseInsensitive),
            None => Arc::new(Exact),
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("encoding", &self.encoding.map(|e| e.name()))
            .field("ignore_case", &self.ignore_case)
            .field("lower_names", &self.lower_names)
            .field("load", &self.load)
            .field("raw", &self.raw)
            .field("path_resolver", &self.path_resolver)
            .finish()
    }
}

/// Materialized records of a loaded table.
struct LoadedRecords<R> {
    active: Vec<R>,
    deleted: Vec<R>,
}

/// A read-only DBF table.
///
/// The header and schema are read once, when the table is opened. Records
/// are either streamed from disk on every access (unloaded, the default) or
/// held in memory after [`Table::load`]. Each stream opens its own file
/// handle, so any number of iterations can run over one table at a time.
pub struct Table<B: RecordBuilder = DefaultBuilder> {
    name: String,
    path: PathBuf,
    header: TableHeader,
    fields: Vec<FieldDescriptor>,
    encoding: Codepage,
    date: Option<NaiveDate>,
    memo_path: Option<PathBuf>,
    memo: Option<Box<dyn MemoResolver>>,
    decoder: Box<dyn FieldDecoder>,
    raw: bool,
    builder: B,
    loaded: Option<LoadedRecords<B::Output>>,
}

impl Table<DefaultBuilder> {
    /// Opens a table with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, TableOptions::default(), DefaultBuilder)
    }
}

impl<B: RecordBuilder> Table<B> {
    /// Opens a table, building each record with `builder`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The table file, or a memo file its schema requires, cannot be found
    /// - The schema is empty or a field violates its type's constraints
    /// - The header's record length disagrees with the field lengths
    /// - The memo file cannot be parsed
    pub fn open_with(path: impl AsRef<Path>, options: TableOptions, builder: B) -> Result<Self> {
        let requested = path.as_ref();
        let resolver = options.resolver();

        let path = resolver
            .resolve(requested, None)
            .ok_or_else(|| DbfError::MissingFile(requested.to_path_buf()))?;
        info!("Opening DBF table: {}", path.display());

        let name = requested
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut reader = BufReader::new(File::open(&path)?);
        let parsed = header::parse(&mut reader, &path, options.encoding, options.lower_names)?;
        drop(reader);

        let memo_path = if parsed.fields.iter().any(FieldDescriptor::is_memo) {
            let found = MEMO_EXTENSIONS
                .iter()
                .find_map(|ext| resolver.resolve(&path, Some(ext)))
                .ok_or_else(|| DbfError::MissingMemoFile(path.clone()))?;
            debug!("Memo file: {}", found.display());
            Some(found)
        } else {
            None
        };

        let decoder = (options.field_decoder)(parsed.encoding);
        schema::validate(&parsed.fields, decoder.as_ref(), parsed.header.record_len)?;

        let date = utils::header_date(parsed.header.year, parsed.header.month, parsed.header.day);
        if date.is_none() {
            warn!(
                "Header of {} has an invalid last-modified date: year {} month {} day {}",
                path.display(),
                parsed.header.year,
                parsed.header.month,
                parsed.header.day
            );
        }

        let memo = match &memo_path {
            Some(memo_path) if !options.raw => Some(memo::open(memo_path)?),
            _ => None,
        };

        let mut table = Self {
            name,
            path,
            header: parsed.header,
            fields: parsed.fields,
            encoding: parsed.encoding,
            date,
            memo_path,
            memo,
            decoder,
            raw: options.raw,
            builder,
            loaded: None,
        };

        if options.load {
            table.load()?;
        }
        Ok(table)
    }

    /// Reads every active and deleted record into memory.
    ///
    /// Afterwards records are served without further file I/O. Calling this
    /// on a loaded table does nothing.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded.is_some() {
            debug!("Table {} is already loaded", self.name);
            return Ok(());
        }
        let active = self
            .records()
            .stream()
            .collect::<Result<Vec<_>>>()?;
        let deleted = self
            .deleted()
            .stream()
            .collect::<Result<Vec<_>>>()?;
        info!(
            "Loaded table {}: {} records, {} deleted",
            self.name,
            active.len(),
            deleted.len()
        );
        self.loaded = Some(LoadedRecords { active, deleted });
        Ok(())
    }

    /// Drops loaded records; records are streamed from disk again.
    pub fn unload(&mut self) {
        self.loaded = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Active records.
    pub fn records(&self) -> Records<'_, B> {
        Records::new(self, RecordClass::Active)
    }

    /// Records marked as deleted.
    pub fn deleted(&self) -> Records<'_, B> {
        Records::new(self, RecordClass::Deleted)
    }

    /// Iterates over the active records.
    pub fn iter(&self) -> RecordIter<'_, B>
    where
        B::Output: Clone,
    {
        self.records().iter()
    }

    /// Number of active records.
    ///
    /// Unloaded tables count by scanning marker bytes without decoding records.
    pub fn len(&self) -> Result<usize> {
        self.records().len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Lower-cased file stem of the requested path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved path of the table file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn encoding(&self) -> Codepage {
        self.encoding
    }

    /// Last-modified date from the header, `None` if it is not a valid date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn memo_path(&self) -> Option<&Path> {
        self.memo_path.as_deref()
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub(crate) fn builder(&self) -> &B {
        &self.builder
    }

    pub(crate) fn payload_len(&self) -> usize {
        schema::payload_len(&self.fields)
    }

    pub(crate) fn record_decoder(&self) -> RecordDecoder<'_> {
        RecordDecoder {
            fields: &self.fields,
            decoder: self.decoder.as_ref(),
            memo: self.memo.as_deref(),
            encoding: self.encoding,
            raw: self.raw,
        }
    }

    pub(crate) fn loaded_records(&self, class: RecordClass) -> Option<&[B::Output]> {
        self.loaded.as_ref().map(|loaded| match class {
            RecordClass::Active => loaded.active.as_slice(),
            RecordClass::Deleted => loaded.deleted.as_slice(),
        })
    }

    pub(crate) fn count(&self, class: RecordClass) -> Result<usize> {
        iter::count_records(self, class)
    }
}

impl<'a, B: RecordBuilder> IntoIterator for &'a Table<B>
where
    B::Output: Clone,
{
    type Item = Result<B::Output>;
    type IntoIter = RecordIter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<B: RecordBuilder> fmt::Debug for Table<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Table")
            .field("path", &self.path)
            .field("fields", &self.fields.len())
            .field("encoding", &self.encoding.name())
            .field("memo_path", &self.memo_path)
            .field("raw", &self.raw)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
