//! Structural checks on field descriptors, run once when a table is opened.

use log::debug;

use crate::dbf::codec::fields::FieldDecoder;
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::FieldDescriptor;

/// Types whose byte width is fixed by the format.
const FIXED_LENGTHS: &[(char, u8)] = &[('0', 1), ('I', 4), ('L', 1)];

/// Validates every descriptor against its type and the header's record length.
///
/// Checks run in field order; the first violation is returned. The record
/// length check runs last, after every field is known to be well-formed.
pub fn validate(
    fields: &[FieldDescriptor],
    decoder: &dyn FieldDecoder,
    record_len: u16,
) -> Result<()> {
    for field in fields {
        check_field(field, decoder)?;
    }

    let computed = 1 + payload_len(fields);
    if computed != record_len as usize {
        return Err(DbfError::RecordLengthMismatch {
            declared: record_len,
            computed,
        });
    }

    debug!("Schema valid: {} fields, {} bytes per record", fields.len(), computed);
    Ok(())
}

/// Checks one descriptor's fixed length and type support.
pub fn check_field(field: &FieldDescriptor, decoder: &dyn FieldDecoder) -> Result<()> {
    if let Some(&(_, expected)) = FIXED_LENGTHS.iter().find(|(code, _)| *code == field.type_code)
        && field.length != expected
    {
        return Err(DbfError::InvalidFieldLength {
            field: field.name.clone(),
            type_code: field.type_code,
            expected,
            found: field.length,
        });
    }

    if !decoder.supports(field.type_code) {
        return Err(DbfError::UnsupportedFieldType {
            field: field.name.clone(),
            type_code: field.type_code,
        });
    }
    Ok(())
}

/// Bytes of field data in one record, excluding the marker byte.
pub fn payload_len(fields: &[FieldDescriptor]) -> usize {
    fields.iter().map(|field| field.length as usize).sum()
}
