//! Visual FoxPro memo files.
//!
//! # Layout
//! ```text
//! [0..4]   next free block   (u32, big-endian)
//! [6..8]   block size        (u16, big-endian)
//! [..512]  reserved
//!
//! Each memo starts on a block boundary:
//! [0..4]   type    (u32, big-endian; 0 picture, 1 text, 2 object)
//! [4..8]   length  (u32, big-endian)
//! [8..]    payload
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info, trace};

use super::MemoResolver;
use crate::dbf::types::error::{DbfError, Result};
use crate::dbf::types::models::{Memo, MemoKind};

const HEADER_SIZE: u64 = 512;
const BLOCK_HEADER_SIZE: u64 = 8;

/// An open `.fpt` file.
#[derive(Debug)]
pub struct FptFile {
    file: Mutex<File>,
    block_size: u64,
    file_len: u64,
    next_free_block: u32,
}

impl FptFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening FPT memo file: {}", path.display());
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE {
            return Err(DbfError::InvalidMemoFile(format!(
                "{} is shorter than the {}-byte header",
                path.display(),
                HEADER_SIZE
            )));
        }

        let next_free_block = file.read_u32::<BigEndian>()?;
        file.seek(SeekFrom::Start(6))?;
        let block_size = file.read_u16::<BigEndian>()? as u64;
        if block_size == 0 {
            return Err(DbfError::InvalidMemoFile("block size is zero".to_string()));
        }
        debug!("FPT block size {}, next free block {}", block_size, next_free_block);

        Ok(Self {
            file: Mutex::new(file),
            block_size,
            file_len,
            next_free_block,
        })
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn next_free_block(&self) -> u32 {
        self.next_free_block
    }
}

impl MemoResolver for FptFile {
    fn resolve(&self, pointer: u64) -> Result<Memo> {
        let offset = pointer
            .checked_mul(self.block_size)
            .ok_or(DbfError::MemoNotFound(pointer))?;
        if offset < HEADER_SIZE || offset + BLOCK_HEADER_SIZE > self.file_len {
            return Err(DbfError::MemoNotFound(pointer));
        }

        let mut file = self.file.lock().map_err(|_| DbfError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;
        let memo_type = file.read_u32::<BigEndian>()?;
        let length = file.read_u32::<BigEndian>()? as u64;
        let available = self.file_len - offset - BLOCK_HEADER_SIZE;
        if length > available {
            return Err(DbfError::InvalidMemoFile(format!(
                "memo {} declares {} bytes but only {} remain",
                pointer, length, available
            )));
        }

        let mut data = vec![0u8; length as usize];
        file.read_exact(&mut data)?;

        let kind = match memo_type {
            1 => MemoKind::Text,
            0 | 2 => MemoKind::Binary,
            other => {
                debug!("Unknown FPT memo type {} at block {}, reading as binary", other, pointer);
                MemoKind::Binary
            }
        };
        trace!("FPT memo {}: {:?}, {} bytes", pointer, kind, length);
        Ok(Memo { kind, data })
    }
}
