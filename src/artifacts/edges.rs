//! Reader for the per-edge metadata artifact (`.edges`).
//!
//! On-disk shape: `[edge_count: u32][EdgeRecord x edge_count]` where each
//! packed 9-byte record bundles `{via_node: u32, name_id: u32,
//! turn_instruction: u8}`. The fill phase splits the records into three
//! parallel arrays; element `i` of each output array comes from record `i`,
//! so the one-to-one correspondence across the arrays is preserved.

use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{check_dest, check_source, open_artifact};
use crate::error::{Result, StoreError};

const ARTIFACT: &str = "edges";

/// Size of one packed on-disk edge record
pub const EDGE_RECORD_BYTES: u64 = 9;

const PAYLOAD_OFFSET: u64 = 4;

/// Element count read from the edge-metadata header.
#[derive(Debug, Clone, Copy)]
pub struct EdgeHeader {
    /// Number of original edges
    pub edge_count: u32,
}

/// Read the edge count without touching the payload.
pub fn read_header(path: &Path) -> Result<EdgeHeader> {
    let mut file = open_artifact(ARTIFACT, path)?;
    let edge_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;
    Ok(EdgeHeader { edge_count })
}

/// Second-pass read: split every edge record into the three parallel
/// destination sections. A file shorter than
/// `edge_count * EDGE_RECORD_BYTES` fails with `TruncatedPayload` before
/// any destination byte is written.
pub fn read_payload(
    path: &Path,
    header: &EdgeHeader,
    via_dest: &mut [u8],
    name_dest: &mut [u8],
    turn_dest: &mut [u8],
) -> Result<()> {
    let count = header.edge_count as u64;
    check_dest(ARTIFACT, via_dest, count * 4)?;
    check_dest(ARTIFACT, name_dest, count * 4)?;
    check_dest(ARTIFACT, turn_dest, count)?;
    let source_bytes = count * EDGE_RECORD_BYTES;

    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, PAYLOAD_OFFSET, source_bytes)?;
    file.seek(SeekFrom::Start(PAYLOAD_OFFSET))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to edge payload"))?;
    let mut reader = BufReader::new(file);

    let mut via_out: &mut [u8] = via_dest;
    let mut name_out: &mut [u8] = name_dest;

    for i in 0..header.edge_count {
        let via_node = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;
        let name_id = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;
        let turn = reader
            .read_u8()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;

        via_out.write_u32::<LittleEndian>(via_node)?;
        name_out.write_u32::<LittleEndian>(name_id)?;
        turn_dest[i as usize] = turn;
    }
    Ok(())
}
