//! Reader for the packed spatial search tree artifact (`.ramIndex`).
//!
//! On-disk shape: `[node_count: u32][TreeNode x node_count]`. The node
//! array is copied into the region verbatim.

use std::io::{Read, Seek, SeekFrom};
use std::mem::size_of;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{check_dest, check_source, open_artifact};
use crate::error::{Result, StoreError};
use crate::layout::TreeNode;

const ARTIFACT: &str = "spatial index";

const PAYLOAD_OFFSET: u64 = 4;

/// Element count read from the spatial-index header.
#[derive(Debug, Clone, Copy)]
pub struct TreeHeader {
    /// Number of tree nodes
    pub node_count: u32,
}

/// Read the tree node count without touching the payload.
pub fn read_header(path: &Path) -> Result<TreeHeader> {
    let mut file = open_artifact(ARTIFACT, path)?;
    let node_count = file
        .read_u32::<LittleEndian>()
        .map_err(|_| StoreError::truncated_header(ARTIFACT, path))?;
    Ok(TreeHeader { node_count })
}

/// Second-pass read of the tree node array into its planned range.
pub fn read_payload(path: &Path, header: &TreeHeader, dest: &mut [u8]) -> Result<()> {
    let expected = header.node_count as u64 * size_of::<TreeNode>() as u64;
    check_dest(ARTIFACT, dest, expected)?;

    let mut file = open_artifact(ARTIFACT, path)?;
    check_source(ARTIFACT, &file, PAYLOAD_OFFSET, expected)?;
    file.seek(SeekFrom::Start(PAYLOAD_OFFSET))
        .map_err(|e| StoreError::from_io(e, "Failed to seek to tree payload"))?;
    file.read_exact(dest)
        .map_err(|_| StoreError::truncated_payload(ARTIFACT, expected))
}
