//! Reader for the node coordinate artifact (`.nodes`).
//!
//! On-disk shape: `[count: u32][NodeRecord x count]` where each record is
//! `{lat: i32, lon: i32, id: u32}` (12 bytes). The fill phase decodes each
//! record into the region's 8-byte fixed-point `Coordinate`, dropping the
//! node id: a transform, not a byte copy, preserving element order.

use std::io::{BufReader, Seek, SeekFrom};
use std::mem::size_of;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{check_dest, check_source, open_artifact};
use crate::error::{Result, StoreError};
use crate::layout::Coordinate;

const ARTIFACT: &str = "nodes";

/// Size of one on-disk node record
pub const NODE_RECORD_BYTES: u64 = 12;

const PAYLOAD_OFFSET: u64 = 4;

/// Element count read from the node artifact header.
#[derive(Debug, Clone, Copy)]
pub struct NodesHeader {
    /// Number of coordinate records
    pub count: u32,
}

/// Read the coordinate count without touching the payload.
pub fn read_header(path: &Path) -> Result<NodesHeader> {
    let mut file = open_artifact(ARTIFACT, path)?;
    let count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;
    Ok(NodesHeader { count })
}

/// Second-pass read: decode every on-disk node record into a fixed-point
/// coordinate at the same index of the destination section.
pub fn read_payload(path: &Path, header: &NodesHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.count as u64 * size_of::<Coordinate>() as u64;
    check_dest(ARTIFACT, dest, expected)?;
    let source_bytes = header.count as u64 * NODE_RECORD_BYTES;

    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, PAYLOAD_OFFSET, source_bytes)?;
    file.seek(SeekFrom::Start(PAYLOAD_OFFSET))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to node payload"))?;
    let mut reader = BufReader::new(file);
    let mut out: &mut [u8] = dest;

    for _ in 0..header.count {
        let lat = reader
            .read_i32::<LittleEndian>()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;
        let lon = reader
            .read_i32::<LittleEndian>()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;
        let _id = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| StoreError::truncated_payload(ARTIFACT, source_bytes))?;

        out.write_i32::<LittleEndian>(lat)?;
        out.write_i32::<LittleEndian>(lon)?;
    }
    debug_assert!(out.is_empty());
    Ok(())
}
