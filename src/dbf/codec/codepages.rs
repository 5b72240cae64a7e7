//! Language-driver code to text encoding lookup.
//!
//! The language driver byte (offset 29 of the table header) names the
//! codepage the table was written with. Windows and East Asian codepages
//! decode through `encoding_rs`; the DOS OEM codepages it does not ship
//! decode through the `oem_cp` tables. Unknown codes resolve to the default.

use std::fmt;

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GBK, IBM866, MACINTOSH, SHIFT_JIS, WINDOWS_1250, WINDOWS_1251,
    WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
    WINDOWS_874, X_MAC_CYRILLIC,
};
use log::{debug, warn};
use oem_cp::code_table::{
    DECODING_TABLE_CP437, DECODING_TABLE_CP850, DECODING_TABLE_CP852, DECODING_TABLE_CP865,
};

/// The character set a table's text is decoded with.
#[derive(Clone, Copy, PartialEq)]
pub enum Codepage {
    /// A WHATWG encoding from `encoding_rs`.
    Standard(&'static Encoding),
    /// A single-byte DOS codepage; bytes below 0x80 are ASCII.
    Oem {
        name: &'static str,
        table: &'static [char; 128],
    },
}

pub const CP437: Codepage = Codepage::Oem {
    name: "cp437",
    table: &DECODING_TABLE_CP437,
};
pub const CP850: Codepage = Codepage::Oem {
    name: "cp850",
    table: &DECODING_TABLE_CP850,
};
pub const CP852: Codepage = Codepage::Oem {
    name: "cp852",
    table: &DECODING_TABLE_CP852,
};
pub const CP865: Codepage = Codepage::Oem {
    name: "cp865",
    table: &DECODING_TABLE_CP865,
};

impl Codepage {
    pub fn name(&self) -> &'static str {
        match self {
            Codepage::Standard(encoding) => encoding.name(),
            Codepage::Oem { name, .. } => *name,
        }
    }

    /// Decodes `data` without BOM sniffing; malformed sequences become U+FFFD.
    pub fn decode(&self, data: &[u8]) -> String {
        match self {
            Codepage::Standard(encoding) => {
                let (text, _) = encoding.decode_without_bom_handling(data);
                text.into_owned()
            }
            Codepage::Oem { table, .. } => oem_cp::decode_string_complete_table(data, *table),
        }
    }
}

impl From<&'static Encoding> for Codepage {
    fn from(encoding: &'static Encoding) -> Self {
        Codepage::Standard(encoding)
    }
}

impl PartialEq<&'static Encoding> for Codepage {
    fn eq(&self, other: &&'static Encoding) -> bool {
        matches!(self, Codepage::Standard(encoding) if encoding == other)
    }
}

impl fmt::Debug for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Codepage({})", self.name())
    }
}

impl fmt::Display for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding used when the language driver is unknown.
pub fn default_encoding() -> Codepage {
    Codepage::Standard(WINDOWS_1252)
}

/// Looks up the codepage for a language-driver code.
pub fn guess_encoding(language_driver: u8) -> Option<Codepage> {
    let encoding = match language_driver {
        // 0x00 is plain ASCII, which windows-1252 covers.
        0x00 | 0x03 | 0x57 | 0x58 | 0x59 => WINDOWS_1252,
        0x01 | 0x09 | 0x0b | 0x0d | 0x0f | 0x11 | 0x15 | 0x18 | 0x19 | 0x1b => return Some(CP437),
        0x02 | 0x0a | 0x0e | 0x10 | 0x12 | 0x14 | 0x16 | 0x1a | 0x1d | 0x25 | 0x37 => {
            return Some(CP850);
        }
        0x1f | 0x22 | 0x23 | 0x40 | 0x64 => return Some(CP852),
        0x08 | 0x17 | 0x66 => return Some(CP865),
        0x04 => MACINTOSH,
        0x13 | 0x7b => SHIFT_JIS,
        0x26 | 0x65 => IBM866,
        0x4d | 0x7a => GBK,
        0x4e | 0x79 => EUC_KR,
        0x4f | 0x78 => BIG5,
        0x50 | 0x7c => WINDOWS_874,
        0x7d => WINDOWS_1255,
        0x7e => WINDOWS_1256,
        0x96 => X_MAC_CYRILLIC,
        0xc8 => WINDOWS_1250,
        0xc9 => WINDOWS_1251,
        0xca => WINDOWS_1254,
        0xcb => WINDOWS_1253,
        0xcc => WINDOWS_1257,
        _ => return None,
    };
    Some(Codepage::Standard(encoding))
}

/// Resolves the table codepage, falling back to [`default_encoding`].
pub fn resolve_encoding(language_driver: u8) -> Codepage {
    match guess_encoding(language_driver) {
        Some(codepage) => {
            debug!(
                "Language driver {:#04x} resolved to {}",
                language_driver,
                codepage.name()
            );
            codepage
        }
        None => {
            warn!(
                "Unknown language driver {:#04x}, falling back to {}",
                language_driver,
                default_encoding().name()
            );
            default_encoding()
        }
    }
}

/// Parses a user-supplied encoding label such as `"cp1251"`, `"cp437"` or `"utf-8"`.
///
/// `cpNNNN` aliases are accepted for the Windows codepages.
pub fn parse_encoding(label: &str) -> Option<Codepage> {
    let lowered = label.trim().to_ascii_lowercase();
    let normalized = match lowered.strip_prefix("cp") {
        Some("437") => return Some(CP437),
        Some("850") => return Some(CP850),
        Some("852") => return Some(CP852),
        Some("865") => return Some(CP865),
        Some(number) if number.starts_with("125") => format!("windows-{}", number),
        Some("874") => "windows-874".to_string(),
        Some("932") => "shift_jis".to_string(),
        Some("936") => "gbk".to_string(),
        Some("949") => "euc-kr".to_string(),
        Some("950") => "big5".to_string(),
        Some("866") => "ibm866".to_string(),
        _ => lowered.clone(),
    };
    Encoding::for_label(normalized.as_bytes()).map(Codepage::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_drivers_map_to_windows_codepages() {
        assert_eq!(guess_encoding(0x03), Some(Codepage::Standard(WINDOWS_1252)));
        assert_eq!(guess_encoding(0xc9), Some(Codepage::Standard(WINDOWS_1251)));
        assert_eq!(guess_encoding(0x7a), Some(Codepage::Standard(GBK)));
    }

    #[test]
    fn dos_drivers_map_to_oem_tables() {
        assert_eq!(guess_encoding(0x01), Some(CP437));
        assert_eq!(guess_encoding(0x02), Some(CP850));
        assert_eq!(guess_encoding(0x64), Some(CP852));
        assert_eq!(CP437.decode(b"caf\x82 \x9c5"), "café £5");
        assert_eq!(CP850.decode(b"\x99sterreich"), "Österreich");
    }

    #[test]
    fn unknown_driver_falls_back() {
        assert_eq!(guess_encoding(0x05), None);
        assert_eq!(resolve_encoding(0x05), default_encoding());
        assert_eq!(resolve_encoding(0xff), WINDOWS_1252);
    }

    #[test]
    fn cp_aliases_are_accepted() {
        assert_eq!(parse_encoding("cp1251"), Some(WINDOWS_1251.into()));
        assert_eq!(parse_encoding("CP936"), Some(GBK.into()));
        assert_eq!(parse_encoding("cp437"), Some(CP437));
        assert_eq!(parse_encoding("utf-8"), Some(encoding_rs::UTF_8.into()));
        assert_eq!(parse_encoding("latin1"), Some(WINDOWS_1252.into()));
        assert_eq!(parse_encoding("no-such-codepage"), None);
    }
}
