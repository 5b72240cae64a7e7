//! DBF table header and field descriptor parsing.
//!
//! # Header Structure
//! ```text
//! [32 bytes]      Table header
//! [32 bytes] * N  Field descriptors
//! [1 byte]        0x0D terminator (or end of file)
//! [...]           Optional padding up to `header_len`
//! ```

use std::io::{ErrorKind, Read};
use std::path::Path;

use byteorder::ReadBytesExt;
use log::{debug, info, trace};

use super::layout;
use crate::dbf::codec::codepages::{self, Codepage};
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::{FieldDescriptor, TableHeader};
use crate::dbf::utils;

/// Ends the field descriptor section.
pub const FIELD_TERMINATOR: u8 = 0x0D;

/// Everything decoded from the header section of a table file.
#[derive(Debug)]
pub struct ParsedHeader {
    pub header: TableHeader,
    pub fields: Vec<FieldDescriptor>,
    pub encoding: Codepage,
}

/// Parses the table header and all field descriptors.
///
/// # Parameters
/// * `reader` - Reader positioned at offset 0 of the table file
/// * `path` - Table path, used in error messages
/// * `encoding` - Explicit encoding; when `None` it is resolved from the language driver
/// * `lower_names` - Lower-case field names as they are read
pub fn parse<R: Read>(
    reader: &mut R,
    path: &Path,
    encoding: Option<Codepage>,
    lower_names: bool,
) -> Result<ParsedHeader> {
    info!("Parsing DBF header of {}", path.display());

    let header = read_table_header(reader)?;
    debug!(
        "DBF version {:#04x}: {} records, header {} bytes, record {} bytes",
        header.version, header.num_records, header.header_len, header.record_len
    );

    let encoding = match encoding {
        Some(explicit) => {
            debug!("Using caller-supplied encoding {}", explicit.name());
            explicit
        }
        None => codepages::resolve_encoding(header.language_driver),
    };

    let fields = read_field_descriptors(reader, encoding, lower_names)?;
    if fields.is_empty() {
        return Err(DbfError::EmptySchema(path.to_path_buf()));
    }
    debug!("Read {} field descriptors", fields.len());

    Ok(ParsedHeader {
        header,
        fields,
        encoding,
    })
}

/// Decodes the fixed 32-byte table header.
pub fn read_table_header<R: Read>(reader: &mut R) -> Result<TableHeader> {
    use layout::header::*;

    let buf = LAYOUT.read(reader, None)?;
    Ok(TableHeader {
        version: VERSION.u8(&buf),
        year: YEAR.u8(&buf),
        month: MONTH.u8(&buf),
        day: DAY.u8(&buf),
        num_records: NUM_RECORDS.u32(&buf),
        header_len: HEADER_LEN.u16(&buf),
        record_len: RECORD_LEN.u16(&buf),
        reserved1: RESERVED1.u16(&buf),
        incomplete_transaction: INCOMPLETE_TRANSACTION.u8(&buf),
        encryption_flag: ENCRYPTION_FLAG.u8(&buf),
        free_record_thread: FREE_RECORD_THREAD.u32(&buf),
        reserved2: RESERVED2.u32(&buf),
        reserved3: RESERVED3.u32(&buf),
        mdx_flag: MDX_FLAG.u8(&buf),
        language_driver: LANGUAGE_DRIVER.u8(&buf),
        reserved4: RESERVED4.u16(&buf),
    })
}

/// Reads descriptors until the `0x0D` terminator or end of stream.
///
/// The byte read to look for the terminator is the first byte of the next
/// descriptor when it is not the terminator.
pub fn read_field_descriptors<R: Read>(
    reader: &mut R,
    encoding: Codepage,
    lower_names: bool,
) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();
    loop {
        let first = match reader.read_u8() {
            Ok(FIELD_TERMINATOR) => break,
            Ok(byte) => byte,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        let buf = layout::field::LAYOUT.read(reader, Some(first))?;
        let field = decode_field_descriptor(&buf, encoding, lower_names);
        trace!(
            "Field {:?}: type {:?}, length {}, decimals {}",
            field.name, field.type_code, field.length, field.decimal_count
        );
        fields.push(field);
    }
    Ok(fields)
}

fn decode_field_descriptor(
    buf: &[u8],
    encoding: Codepage,
    lower_names: bool,
) -> FieldDescriptor {
    use layout::field::*;

    let mut name = utils::parse_string(NAME.bytes(buf), encoding);
    if lower_names {
        name = name.to_lowercase();
    }
    let type_code = utils::parse_string(TYPE.bytes(buf), encoding)
        .chars()
        .next()
        .unwrap_or('\0');

    let mut reserved4 = [0u8; 7];
    reserved4.copy_from_slice(RESERVED4.bytes(buf));

    FieldDescriptor {
        name,
        type_code,
        address: ADDRESS.u32(buf),
        length: LENGTH.u8(buf),
        decimal_count: DECIMAL_COUNT.u8(buf),
        reserved1: RESERVED1.u16(buf),
        workarea_id: WORKAREA_ID.u8(buf),
        reserved2: RESERVED2.u8(buf),
        reserved3: RESERVED3.u8(buf),
        set_fields_flag: SET_FIELDS_FLAG.u8(buf),
        reserved4,
        index_field_flag: INDEX_FIELD_FLAG.u8(buf),
    }
}
