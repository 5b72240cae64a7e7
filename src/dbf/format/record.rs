//! Decoding and skipping of individual records.
//!
//! A record is a marker byte followed by the field slots in descriptor
//! order. The marker is consumed by the scanner in [`crate::dbf::iter`];
//! this module handles the payload that follows it.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};

use log::trace;

use crate::dbf::codec::codepages::Codepage;
use crate::dbf::codec::fields::FieldDecoder;
use crate::dbf::memo::MemoResolver;
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::{FieldDescriptor, MemoKind};
use crate::dbf::types::value::Value;
use crate::dbf::utils;

/// Marker byte of an active record.
pub const ACTIVE_MARKER: u8 = b' ';
/// Marker byte of a deleted record.
pub const DELETED_MARKER: u8 = b'*';
/// Ends the record area.
pub const END_OF_FILE: u8 = 0x1A;

/// Everything needed to turn record bytes into `(name, value)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'a> {
    pub fields: &'a [FieldDescriptor],
    pub decoder: &'a dyn FieldDecoder,
    pub memo: Option<&'a dyn MemoResolver>,
    pub encoding: Codepage,
    pub raw: bool,
}

impl RecordDecoder<'_> {
    /// Reads one record payload, positioned just after its marker byte.
    pub fn read_record<R: Read>(&self, reader: &mut R) -> Result<Vec<(String, Value)>> {
        let mut items = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let mut data = vec![0u8; field.length as usize];
            reader.read_exact(&mut data)?;
            let value = if self.raw {
                Value::Bytes(data)
            } else {
                let value = self.decoder.decode(field, &data)?;
                if field.is_memo() {
                    self.resolve_memo(field, value)?
                } else {
                    value
                }
            };
            items.push((field.name.clone(), value));
        }
        Ok(items)
    }

    /// Replaces a decoded memo pointer with the memo it names.
    fn resolve_memo(&self, field: &FieldDescriptor, pointer: Value) -> Result<Value> {
        let invalid = |reason: String| DbfError::InvalidFieldValue {
            field: field.name.clone(),
            type_code: field.type_code,
            reason,
        };

        let pointer = match pointer {
            Value::Null => return Ok(Value::Text(String::new())),
            Value::Text(text) if text.is_empty() => return Ok(Value::Text(text)),
            Value::Bytes(bytes) if bytes.is_empty() => return Ok(Value::Text(String::new())),
            Value::Integer(pointer) => u64::try_from(pointer)
                .map_err(|_| invalid(format!("negative memo pointer {}", pointer)))?,
            other => return Err(invalid(format!("memo pointer decoded as {:?}", other))),
        };

        let memo_file = self
            .memo
            .ok_or_else(|| invalid("no memo file is open".to_string()))?;

        let memo = memo_file.resolve(pointer)?;
        trace!("Field {} memo {}: {:?}", field.name, pointer, memo.kind);
        Ok(match memo.kind {
            MemoKind::Text => Value::Text(utils::parse_string(&memo.data, self.encoding)),
            MemoKind::Binary => Value::Bytes(memo.data),
        })
    }
}

/// Advances past one record payload without reading it.
///
/// `remaining` is the number of bytes left in the file after the marker. A
/// payload that would run past the end of the file fails the same way
/// reading it would.
pub fn skip_record(
    reader: &mut BufReader<File>,
    payload_len: usize,
    remaining: u64,
) -> Result<()> {
    if (payload_len as u64) > remaining {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("record needs {} bytes but only {} remain", payload_len, remaining),
        )
        .into());
    }
    reader.seek_relative(payload_len as i64)?;
    Ok(())
}
