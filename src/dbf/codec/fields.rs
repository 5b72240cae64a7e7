//! Per-type field decoding.
//!
//! [`FieldDecoder`] is the seam between the record scanner and the value
//! semantics of each xBase type code. [`FieldParser`] is the default
//! implementation; tables can be opened with any other decoder through
//! [`TableOptions::field_decoder`](crate::dbf::table::TableOptions::field_decoder).

use std::fmt::Debug;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::trace;

use crate::dbf::codec::codepages::Codepage;
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::FieldDescriptor;
use crate::dbf::types::value::Value;
use crate::dbf::utils;

/// Decodes the raw bytes of one field slot into a [`Value`].
pub trait FieldDecoder: Debug + Send + Sync {
    /// Whether `type_code` can be decoded. Tables with unsupported fields fail to open.
    fn supports(&self, type_code: char) -> bool;

    /// Decodes one field. `data` is exactly `field.length` bytes long.
    ///
    /// For memo fields the result is the memo pointer as [`Value::Integer`],
    /// or [`Value::Null`] for an empty memo.
    fn decode(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value>;
}

/// Builds a decoder once the table encoding is known.
pub type DecoderFactory = fn(Codepage) -> Box<dyn FieldDecoder>;

/// Julian day number of 0000-12-31, so that day 1 is 0001-01-01.
const JULIAN_DAY_OFFSET: i64 = 1_721_425;

/// Type codes understood by [`FieldParser`].
pub const SUPPORTED_TYPES: &[char] = &['0', 'C', 'D', 'F', 'N', 'I', '+', 'L', 'M', 'O', 'Y', 'T', '@'];

/// The default decoder for dBase III/IV and Visual FoxPro field types.
#[derive(Debug, Clone, Copy)]
pub struct FieldParser {
    encoding: Codepage,
}

impl FieldParser {
    pub fn new(encoding: Codepage) -> Self {
        Self { encoding }
    }

    /// [`DecoderFactory`] for the default decoder.
    pub fn boxed(encoding: Codepage) -> Box<dyn FieldDecoder> {
        Box::new(Self::new(encoding))
    }

    pub fn encoding(&self) -> Codepage {
        self.encoding
    }

    fn parse_text(&self, data: &[u8]) -> Value {
        Value::Text(utils::decode_text(utils::trim_padding(data), self.encoding))
    }

    fn parse_date(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        let digits = utils::trim_blank(data);
        if digits.iter().all(|&b| b == b'0') {
            return Ok(Value::Null);
        }
        let text = std::str::from_utf8(digits).map_err(|_| invalid(field, "date is not ASCII"))?;
        NaiveDate::parse_from_str(text, "%Y%m%d")
            .map(Value::Date)
            .map_err(|e| invalid(field, format!("invalid date {:?}: {}", text, e)))
    }

    fn parse_numeric(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        let trimmed = utils::trim_blank(data);
        let start = trimmed.iter().position(|&b| b != b'*').unwrap_or(trimmed.len());
        let digits = &trimmed[start..];
        if digits.is_empty() {
            return Ok(Value::Null);
        }
        let text = std::str::from_utf8(digits)
            .map_err(|_| invalid(field, "number is not ASCII"))?
            .replace(',', ".");
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Value::Integer(integer));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|e| invalid(field, format!("invalid number {:?}: {}", text, e)))
    }

    fn parse_logical(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        match data.first() {
            Some(b'T' | b't' | b'Y' | b'y') => Ok(Value::Bool(true)),
            Some(b'F' | b'f' | b'N' | b'n') => Ok(Value::Bool(false)),
            Some(b'?' | b' ' | 0) | None => Ok(Value::Null),
            Some(other) => Err(invalid(
                field,
                format!("illegal logical value {:#04x}", other),
            )),
        }
    }

    fn parse_memo_pointer(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        if data.len() == 4 {
            return Ok(match LittleEndian::read_u32(data) {
                0 => Value::Null,
                pointer => Value::Integer(pointer as i64),
            });
        }
        let digits = utils::trim_blank(data);
        if digits.is_empty() {
            return Ok(Value::Null);
        }
        std::str::from_utf8(digits)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .map(Value::Integer)
            .ok_or_else(|| invalid(field, "memo pointer is not a number"))
    }

    fn parse_datetime(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        let data = fixed(field, data, 8)?;
        let day = LittleEndian::read_u32(&data[0..4]) as i64;
        let millis = LittleEndian::read_u32(&data[4..8]) as i64;
        if day == 0 && millis == 0 {
            return Ok(Value::Null);
        }
        let date = i32::try_from(day - JULIAN_DAY_OFFSET)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or_else(|| invalid(field, format!("julian day {} out of range", day)))?;
        let midnight: NaiveDateTime = date.and_time(chrono::NaiveTime::MIN);
        Ok(Value::DateTime(midnight + Duration::milliseconds(millis)))
    }
}

impl FieldDecoder for FieldParser {
    fn supports(&self, type_code: char) -> bool {
        SUPPORTED_TYPES.contains(&type_code)
    }

    fn decode(&self, field: &FieldDescriptor, data: &[u8]) -> Result<Value> {
        trace!("Decoding field {} ({}) from {} bytes", field.name, field.type_code, data.len());
        match field.type_code {
            '0' => Ok(Value::Bytes(data.to_vec())),
            'C' => Ok(self.parse_text(data)),
            'D' => self.parse_date(field, data),
            'F' | 'N' => self.parse_numeric(field, data),
            'I' | '+' => {
                let data = fixed(field, data, 4)?;
                Ok(Value::Integer(LittleEndian::read_i32(data) as i64))
            }
            'L' => self.parse_logical(field, data),
            'M' => self.parse_memo_pointer(field, data),
            'O' => {
                let data = fixed(field, data, 8)?;
                Ok(Value::Float(LittleEndian::read_f64(data)))
            }
            'Y' => {
                let data = fixed(field, data, 8)?;
                Ok(Value::Float(LittleEndian::read_i64(data) as f64 / 10_000.0))
            }
            'T' | '@' => self.parse_datetime(field, data),
            other => Err(DbfError::UnsupportedFieldType {
                field: field.name.clone(),
                type_code: other,
            }),
        }
    }
}

fn invalid(field: &FieldDescriptor, reason: impl Into<String>) -> DbfError {
    DbfError::InvalidFieldValue {
        field: field.name.clone(),
        type_code: field.type_code,
        reason: reason.into(),
    }
}

fn fixed<'a>(field: &FieldDescriptor, data: &'a [u8], width: usize) -> Result<&'a [u8]> {
    if data.len() != width {
        return Err(invalid(
            field,
            format!("expected {} bytes, found {}", width, data.len()),
        ));
    }
    Ok(data)
}
