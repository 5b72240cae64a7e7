//! dBase III and dBase IV memo files.
//!
//! Both use 512-byte blocks addressed from the start of the file. dBase III
//! memos run until the first `0x1A` byte; dBase IV memos start with the
//! signature `FF FF 08 00` followed by a little-endian length that includes
//! the 8-byte block header. Memo payloads are always text.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use byteorder::{ByteOrder, LittleEndian};
use log::{info, trace};

use super::MemoResolver;
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::{Memo, MemoKind};

const BLOCK_SIZE: u64 = 512;
const DBASE4_SIGNATURE: [u8; 4] = [0xFF, 0xFF, 0x08, 0x00];
const END_OF_MEMO: u8 = 0x1A;

/// An open `.dbt` file.
#[derive(Debug)]
pub struct DbtFile {
    file: Mutex<File>,
    file_len: u64,
}

impl DbtFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening DBT memo file: {}", path.display());
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            file_len,
        })
    }
}

impl MemoResolver for DbtFile {
    fn resolve(&self, pointer: u64) -> Result<Memo> {
        let offset = pointer
            .checked_mul(BLOCK_SIZE)
            .ok_or(DbfError::MemoNotFound(pointer))?;
        if pointer == 0 || offset >= self.file_len {
            return Err(DbfError::MemoNotFound(pointer));
        }

        let mut file = self.file.lock().map_err(|_| DbfError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut data = Vec::new();
        let mut block = vec![0u8; BLOCK_SIZE as usize];
        loop {
            let read = read_block(&mut *file, &mut block)?;
            if read == 0 {
                break;
            }
            let chunk = &block[..read];

            if data.is_empty() && chunk.starts_with(&DBASE4_SIGNATURE) && chunk.len() >= 8 {
                let total = LittleEndian::read_u32(&chunk[4..8]) as usize;
                let length = total.saturating_sub(8);
                let mut payload = chunk[8..].to_vec();
                if payload.len() < length {
                    let mut rest = vec![0u8; length - payload.len()];
                    file.read_exact(&mut rest)?;
                    payload.extend_from_slice(&rest);
                }
                payload.truncate(length);
                trace!("dBase IV memo {}: {} bytes", pointer, payload.len());
                return Ok(Memo { kind: MemoKind::Text, data: payload });
            }

            if let Some(end) = chunk.iter().position(|&b| b == END_OF_MEMO) {
                data.extend_from_slice(&chunk[..end]);
                break;
            }
            data.extend_from_slice(chunk);
        }

        trace!("dBase III memo {}: {} bytes", pointer, data.len());
        Ok(Memo { kind: MemoKind::Text, data })
    }
}

/// Fills `buf` as far as the file allows, returning the number of bytes read.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
