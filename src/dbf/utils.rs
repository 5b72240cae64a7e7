//! Small text and date helpers shared by the header and record decoders.

use chrono::NaiveDate;

use crate::dbf::codec::codepages::Codepage;

/// Decodes a NUL-terminated slot: everything after the first NUL is padding,
/// and trailing whitespace is dropped. Used for field names and text memos.
pub fn parse_string(data: &[u8], encoding: Codepage) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let mut text = encoding.decode(&data[..end]);
    text.truncate(text.trim_end().len());
    text
}

/// Decodes bytes as text without trimming.
pub fn decode_text(data: &[u8], encoding: Codepage) -> String {
    encoding.decode(data)
}

/// Strips the trailing NUL and space padding of a character field.
pub fn trim_padding(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |pos| pos + 1);
    &data[..end]
}

/// Strips leading and trailing NUL and space padding.
pub fn trim_blank(data: &[u8]) -> &[u8] {
    let trailing = trim_padding(data);
    let start = trailing
        .iter()
        .position(|&b| b != 0 && b != b' ')
        .unwrap_or(trailing.len());
    &trailing[start..]
}

/// Converts a two-digit header year into a four-digit year.
///
/// Years below 80 belong to the 2000s.
pub fn expand_year(year: u8) -> i32 {
    if year < 80 {
        2000 + year as i32
    } else {
        1900 + year as i32
    }
}

/// Combines a two-digit year with month and day, `None` when the date does not exist.
pub fn header_date(year: u8, month: u8, day: u8) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(expand_year(year), month as u32, day as u32)
}
