//! Source readers for the preprocessed binary artifacts.
//!
//! Every artifact is read in two separate passes: `read_header` pulls the
//! small fixed header (element counts) so the layout can be planned before
//! any destination exists, and the `read_*_payload` functions perform the
//! bulk reads directly into their planned byte ranges. All numeric fields
//! across all artifacts are fixed-width little-endian; the formats are
//! byte-for-byte contracts with the preprocessing tool, not self-describing.

pub mod edges;
pub mod graph;
pub mod names;
pub mod nodes;
pub mod timestamp;
pub mod tree;

pub use edges::EdgeHeader;
pub use graph::{GraphHeader, IdentityMarker};
pub use names::NameHeader;
pub use nodes::NodesHeader;
pub use tree::TreeHeader;

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Resolved locations of all input artifacts for one publish cycle.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Contracted search graph (`.hsgr`)
    pub graph: PathBuf,
    /// Packed spatial search tree (`.ramIndex`)
    pub tree: PathBuf,
    /// Node coordinates (`.nodes`)
    pub nodes: PathBuf,
    /// Per-edge metadata (`.edges`)
    pub edges: PathBuf,
    /// Street-name table (`.names`)
    pub names: PathBuf,
    /// Preprocessing timestamp, optional (`.timestamp`)
    pub timestamp: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Derive all artifact paths from a common base stem, e.g. `map` for
    /// `map.hsgr`, `map.ramIndex`, and so on.
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            graph: with_suffix(base, ".hsgr"),
            tree: with_suffix(base, ".ramIndex"),
            nodes: with_suffix(base, ".nodes"),
            edges: with_suffix(base, ".edges"),
            names: with_suffix(base, ".names"),
            timestamp: Some(with_suffix(base, ".timestamp")),
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Open an artifact for reading, rejecting missing and zero-length files.
pub(crate) fn open_artifact(artifact: &'static str, path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(StoreError::missing_file(artifact, path));
    }
    let file = File::open(path).map_err(|e| StoreError::from_io(e, "Failed to open artifact"))?;
    let len = file
        .metadata()
        .map_err(|e| StoreError::from_io(e, "Failed to stat artifact"))?
        .len();
    if len == 0 {
        return Err(StoreError::empty_file(
            artifact,
            format!("{} has zero length", path.display()),
        ));
    }
    Ok(file)
}

/// Verify that the artifact file carries its full declared payload. Runs
/// before the first destination byte is written, so a short file fails
/// with `TruncatedPayload` while the destination is still untouched.
pub(crate) fn check_source(
    artifact: &'static str,
    file: &File,
    payload_offset: u64,
    payload_bytes: u64,
) -> Result<()> {
    let len = file
        .metadata()
        .map_err(|e| StoreError::from_io(e, "Failed to stat artifact"))?
        .len();
    if len < payload_offset.saturating_add(payload_bytes) {
        return Err(StoreError::truncated_payload(artifact, payload_bytes));
    }
    Ok(())
}

/// Assert that a payload destination matches the declared section size
/// exactly; the fill phase must write no more and no less.
pub(crate) fn check_dest(artifact: &'static str, dest: &[u8], expected: u64) -> Result<()> {
    if dest.len() as u64 != expected {
        return Err(StoreError::invalid_parameter(
            "destination",
            format!(
                "{} payload destination is {} bytes, section needs {}",
                artifact,
                dest.len(),
                expected
            ),
        ));
    }
    Ok(())
}
