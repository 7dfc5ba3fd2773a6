//! Reader for the contracted search graph artifact (`.hsgr`).
//!
//! On-disk shape: `[identity marker: 16][checksum: u32][node_count: u32]
//! [GraphNode x node_count][edge_count: u32][GraphEdge x edge_count]`.

use std::io::{Read, Seek, SeekFrom};
use std::mem::size_of;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{check_dest, check_source, open_artifact};
use crate::error::{Result, StoreError};
use crate::layout::{GraphEdge, GraphNode};

const ARTIFACT: &str = "graph";

/// Length of the embedded identity marker in bytes
pub const IDENTITY_LEN: usize = 16;

// marker + checksum + node_count
const NODE_PAYLOAD_OFFSET: u64 = (IDENTITY_LEN + 8) as u64;

/// Fingerprint of the preprocessing build embedded in the graph artifact.
///
/// Compared against the running toolchain's own marker to detect stale
/// data; a mismatch is a compatibility hint, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMarker(pub [u8; IDENTITY_LEN]);

impl IdentityMarker {
    /// The marker of the currently running toolchain build.
    pub fn current() -> Self {
        let mut bytes = [0u8; IDENTITY_LEN];
        let version = env!("CARGO_PKG_VERSION").as_bytes();
        let n = version.len().min(IDENTITY_LEN);
        bytes[..n].copy_from_slice(&version[..n]);
        Self(bytes)
    }

    /// Whether this marker matches another build's marker
    pub fn matches(&self, other: &IdentityMarker) -> bool {
        self.0 == other.0
    }
}

impl std::fmt::Display for IdentityMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Counts and identity read from the graph artifact's fixed header.
#[derive(Debug, Clone, Copy)]
pub struct GraphHeader {
    /// Identity marker of the preprocessing build
    pub identity: IdentityMarker,
    /// Checksum recorded during preprocessing, propagated unverified
    pub checksum: u32,
    /// Number of graph nodes
    pub node_count: u32,
    /// Number of graph edges
    pub edge_count: u32,
}

impl GraphHeader {
    fn node_bytes(&self) -> u64 {
        self.node_count as u64 * size_of::<GraphNode>() as u64
    }

    fn edge_bytes(&self) -> u64 {
        self.edge_count as u64 * size_of::<GraphEdge>() as u64
    }
}

/// Read the graph header: identity marker, checksum and both element
/// counts. The node payload is skipped over, not read.
pub fn read_header(path: &Path) -> Result<GraphHeader> {
    let mut file = open_artifact(ARTIFACT, path)?;

    let mut identity = [0u8; IDENTITY_LEN];
    file.read_exact(&mut identity)
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;

    let checksum = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::ChecksumUnavailable {
            path: path.to_path_buf(),
        })?;

    let node_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;

    let node_bytes = node_count as u64 * size_of::<GraphNode>() as u64;
    file.seek(SeekFrom::Current(node_bytes as i64))
        .map_err(|e| StoreError::from_io(e, "Failed to seek over graph node payload"))?;

    let edge_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;

    Ok(GraphHeader {
        identity: IdentityMarker(identity),
        checksum,
        node_count,
        edge_count,
    })
}

/// Second-pass read of the node array, byte-for-byte, into its planned
/// destination range.
pub fn read_node_payload(path: &Path, header: &GraphHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.node_bytes();
    check_dest(ARTIFACT, dest, expected)?;

    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, NODE_PAYLOAD_OFFSET, expected)?;
    file.seek(SeekFrom::Start(NODE_PAYLOAD_OFFSET))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to graph node payload"))?;
    file.read_exact(dest)
        .map_err(|_| StoreError::truncated_payload(ARTIFACT, expected))
}

/// Second-pass read of the edge array, byte-for-byte, into its planned
/// destination range.
pub fn read_edge_payload(path: &Path, header: &GraphHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.edge_bytes();
    check_dest(ARTIFACT, dest, expected)?;

    // edge_count sits between the two payloads
    let offset = NODE_PAYLOAD_OFFSET + header.node_bytes() + 4;
    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, offset, expected)?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to graph edge payload"))?;
    file.read_exact(dest)
        .map_err(|_| StoreError::truncated_payload(ARTIFACT, expected))
}
