//! # roadstore - Shared-Memory Publisher for Road-Network Data
//!
//! roadstore turns a set of independently produced binary artifacts (a
//! preprocessed road-network graph, a spatial index, a street-name table
//! and per-edge metadata) into a single contiguous shared-memory region
//! that a long-running query process attaches to and reads with zero
//! copying and zero re-parsing.
//!
//! ## Pipeline
//!
//! ```text
//! header scan ──▶ integrity gate ──▶ layout plan ──▶ allocate ──▶ fill ──▶ flip
//!  (counts)       (fatal/warning)    (offsets)       (pending)             (publish)
//! ```
//!
//! The byte layout of the region is planned in a single pass before any
//! byte is written: sections are packed in a fixed declaration order with
//! per-section alignment, so producer and consumers derive identical
//! offsets independently from the element counts alone. Publication is a
//! double-buffer swap on an atomic generation indicator; consumers never
//! observe a partially written region.

pub mod artifacts;
pub mod error;
pub mod layout;
pub mod memory;
pub mod publisher;
pub mod validate;

// Main API re-exports
pub use artifacts::{ArtifactPaths, IdentityMarker};
pub use error::{Result, StoreError};
pub use layout::{Coordinate, GraphEdge, GraphNode, LayoutDescriptor, SectionCounts, SectionId, TreeNode};
pub use memory::{BackingType, RegionConfig, SharedRegion};
pub use publisher::{GenerationSlot, PublishedView, Publisher, SlotState};
pub use validate::ValidationReport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
