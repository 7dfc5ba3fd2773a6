//! Reader for the street-name table artifact (`.names`).
//!
//! On-disk shape: `[index_count: u32][char_count: u32][u32 x index_count]
//! [u8 x char_count]`. Both payload arrays are copied verbatim.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{check_dest, check_source, open_artifact};
use crate::error::{Result, StoreError};

const ARTIFACT: &str = "names";

const INDEX_PAYLOAD_OFFSET: u64 = 8;

/// Counts read from the name table's fixed header.
#[derive(Debug, Clone, Copy)]
pub struct NameHeader {
    /// Number of entries in the name offset index
    pub index_count: u32,
    /// Number of characters in the name blob
    pub char_count: u32,
}

impl NameHeader {
    fn index_bytes(&self) -> u64 {
        self.index_count as u64 * 4
    }
}

/// Read both name-table counts without touching the payloads.
pub fn read_header(path: &Path) -> Result<NameHeader> {
    let mut file = open_artifact(ARTIFACT, path)?;
    let index_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;
    let char_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;
    Ok(NameHeader {
        index_count,
        char_count,
    })
}

/// Second-pass read of the name offset index into its planned range.
pub fn read_index_payload(path: &Path, header: &NameHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.index_bytes();
    check_dest(ARTIFACT, dest, expected)?;

    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, INDEX_PAYLOAD_OFFSET, expected)?;
    file.seek(SeekFrom::Start(INDEX_PAYLOAD_OFFSET))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to name index payload"))?;
    file.read_exact(dest)
        .map_err(|_| StoreError::truncated_payload(ARTIFACT, expected))
}

/// Second-pass read of the character blob into its planned range.
pub fn read_char_payload(path: &Path, header: &NameHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.char_count as u64;
    check_dest(ARTIFACT, dest, expected)?;

    let offset = INDEX_PAYLOAD_OFFSET + header.index_bytes();
    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, offset, expected)?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to name char payload"))?;
    file.read_exact(dest)
        .map_err(|_| StoreError::truncated_payload(ARTIFACT, expected))
}
