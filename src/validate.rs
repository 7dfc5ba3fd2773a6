//! Cross-file integrity checks gating publication.
//!
//! Runs after the header scan and before any shared allocation. Fatal
//! findings abort the publish cycle with no partial region created;
//! warnings are logged and carried in the report without blocking.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::artifacts::{GraphHeader, IdentityMarker};
use crate::error::{Result, StoreError};

/// Outcome of the pre-allocation integrity checks.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Whether the graph's identity marker matched the running toolchain
    pub identity_ok: bool,
    /// Non-fatal findings, already logged
    pub warnings: Vec<StoreError>,
}

impl ValidationReport {
    fn warn(&mut self, finding: StoreError) {
        warn!("{}", finding);
        self.warnings.push(finding);
    }
}

/// Validate the scanned headers against the running toolchain and the
/// on-disk byte lengths of the core artifacts.
///
/// An identity mismatch downgrades to a warning: the graph payload format
/// did not change across the checked dimension, so stale data is usable.
/// Zero-size core structures are fatal; they can never be queried.
pub fn validate(
    graph: &GraphHeader,
    toolchain: &IdentityMarker,
    node_path: &Path,
    edge_path: &Path,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    report.identity_ok = graph.identity.matches(toolchain);
    if report.identity_ok {
        info!("identity marker checked out ok");
    } else {
        report.warn(StoreError::IdentityMismatch {
            expected: toolchain.to_string(),
            actual: graph.identity.to_string(),
        });
    }

    if graph.node_count == 0 {
        return Err(StoreError::empty_file("graph", "graph has no nodes"));
    }
    if graph.edge_count == 0 {
        return Err(StoreError::empty_file("graph", "graph has no edges"));
    }

    if file_len(node_path)? == 0 {
        return Err(StoreError::empty_file(
            "nodes",
            format!("{} has zero length", node_path.display()),
        ));
    }
    if file_len(edge_path)? == 0 {
        return Err(StoreError::empty_file(
            "edges",
            format!("{} has zero length", edge_path.display()),
        ));
    }

    info!("graph checksum: {}", graph.checksum);
    Ok(report)
}

fn file_len(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| StoreError::from_io(e, "Failed to stat artifact"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::graph::IDENTITY_LEN;
    use std::fs::File;
    use std::io::Write;

    fn header(node_count: u32, edge_count: u32, identity: IdentityMarker) -> GraphHeader {
        GraphHeader {
            identity,
            checksum: 42,
            node_count,
            edge_count,
        }
    }

    fn nonempty_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(&[0u8; 16]).unwrap();
        path
    }

    #[test]
    fn test_identity_mismatch_is_warning_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let nodes = nonempty_file(&dir, "nodes");
        let edges = nonempty_file(&dir, "edges");

        let toolchain = IdentityMarker::current();
        let stale = IdentityMarker([0xEE; IDENTITY_LEN]);
        let report = validate(&header(10, 10, stale), &toolchain, &nodes, &edges).unwrap();

        assert!(!report.identity_ok);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            StoreError::IdentityMismatch { .. }
        ));
    }

    #[test]
    fn test_zero_node_count_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let nodes = nonempty_file(&dir, "nodes");
        let edges = nonempty_file(&dir, "edges");

        let toolchain = IdentityMarker::current();
        let err = validate(&header(0, 10, toolchain), &toolchain, &nodes, &edges).unwrap_err();
        assert!(matches!(err, StoreError::EmptyFile { artifact: "graph", .. }));
        assert!(format!("{}", err).contains("no nodes"));
    }

    #[test]
    fn test_zero_length_node_file_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let nodes = dir.path().join("nodes");
        File::create(&nodes).unwrap();
        let edges = nonempty_file(&dir, "edges");

        let toolchain = IdentityMarker::current();
        let err = validate(&header(10, 10, toolchain), &toolchain, &nodes, &edges).unwrap_err();
        assert!(matches!(err, StoreError::EmptyFile { artifact: "nodes", .. }));
    }
}
