//! Section model and layout planning for the shared data region.
//!
//! Every byte offset into the published region is derived here and nowhere
//! else. The planner walks the sections in a fixed declaration order,
//! rounding a running cursor up to each section's alignment; for a given set
//! of element counts the resulting offsets are bit-for-bit reproducible, so
//! the producer and every consumer process compute identical layouts from
//! the counts alone and no offset is ever transmitted explicitly.

use std::mem::{align_of, size_of};
use std::ops::Range;

use crate::error::{Result, StoreError};

/// Magic number identifying a roadstore layout header ("ROADSTOR")
pub const LAYOUT_MAGIC: u64 = 0x524F_4144_5354_4F52;

/// Current layout schema version
pub const LAYOUT_VERSION: u32 = 1;

/// Total size is rounded up to this granularity
pub const REGION_GRANULARITY: u64 = 8;

/// Number of sections in the region
pub const SECTION_COUNT: usize = 10;

/// A node of the contracted search graph as stored in the graph artifact.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphNode {
    /// Index of the node's first outgoing edge in the edge array
    pub first_edge: u32,
    /// Number of outgoing edges
    pub edge_count: u32,
}

/// An edge of the contracted search graph as stored in the graph artifact.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    /// Target node id
    pub target: u32,
    /// Traversal weight
    pub weight: i32,
    /// Direction and shortcut flags
    pub flags: u32,
    /// Middle node for shortcut edges, unused otherwise
    pub shortcut_via: u32,
}

/// One node of the packed spatial search tree, copied verbatim from the
/// spatial-index artifact.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    /// Child node indices (leaf entries for leaf nodes)
    pub children: [u32; 10],
    pub min_lat: i32,
    pub max_lat: i32,
    pub min_lon: i32,
    pub max_lon: i32,
    /// Number of valid entries in `children`
    pub child_count: u32,
    /// Nonzero for leaf nodes
    pub leaf: u32,
}

/// A fixed-point WGS84 coordinate, decoded from the node artifact's wider
/// on-disk records during the fill phase.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    /// Latitude in units of 1e-6 degrees
    pub lat: i32,
    /// Longitude in units of 1e-6 degrees
    pub lon: i32,
}

/// Identity of each section in the shared region, in declaration order.
///
/// The discriminant doubles as the section's index into the count and
/// offset tables; the declaration order is part of the layout contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum SectionId {
    /// Per-name offsets into the character blob
    NameIndex = 0,
    /// Concatenated street-name characters
    NameChars = 1,
    /// Via-node ids, one per original edge
    ViaNodes = 2,
    /// Name ids, one per original edge
    NameIds = 3,
    /// Turn-instruction codes, one per original edge
    TurnInstructions = 4,
    /// Search graph node array
    GraphNodes = 5,
    /// Search graph edge array
    GraphEdges = 6,
    /// Spatial search tree node array
    TreeNodes = 7,
    /// Fixed-point coordinate array
    Coordinates = 8,
    /// Preprocessing timestamp string
    Timestamp = 9,
}

impl SectionId {
    /// All sections in declaration order
    pub const ALL: [SectionId; SECTION_COUNT] = [
        SectionId::NameIndex,
        SectionId::NameChars,
        SectionId::ViaNodes,
        SectionId::NameIds,
        SectionId::TurnInstructions,
        SectionId::GraphNodes,
        SectionId::GraphEdges,
        SectionId::TreeNodes,
        SectionId::Coordinates,
        SectionId::Timestamp,
    ];

    /// Size in bytes of one element of this section
    pub const fn element_size(self) -> usize {
        match self {
            SectionId::NameIndex => size_of::<u32>(),
            SectionId::NameChars => size_of::<u8>(),
            SectionId::ViaNodes => size_of::<u32>(),
            SectionId::NameIds => size_of::<u32>(),
            SectionId::TurnInstructions => size_of::<u8>(),
            SectionId::GraphNodes => size_of::<GraphNode>(),
            SectionId::GraphEdges => size_of::<GraphEdge>(),
            SectionId::TreeNodes => size_of::<TreeNode>(),
            SectionId::Coordinates => size_of::<Coordinate>(),
            SectionId::Timestamp => size_of::<u8>(),
        }
    }

    /// Required alignment of this section's offset
    pub const fn alignment(self) -> usize {
        match self {
            SectionId::NameIndex => align_of::<u32>(),
            SectionId::NameChars => align_of::<u8>(),
            SectionId::ViaNodes => align_of::<u32>(),
            SectionId::NameIds => align_of::<u32>(),
            SectionId::TurnInstructions => align_of::<u8>(),
            SectionId::GraphNodes => align_of::<GraphNode>(),
            SectionId::GraphEdges => align_of::<GraphEdge>(),
            SectionId::TreeNodes => align_of::<TreeNode>(),
            SectionId::Coordinates => align_of::<Coordinate>(),
            SectionId::Timestamp => align_of::<u8>(),
        }
    }

    /// Human-readable section name for log and error messages
    pub const fn label(self) -> &'static str {
        match self {
            SectionId::NameIndex => "name-index",
            SectionId::NameChars => "name-chars",
            SectionId::ViaNodes => "via-nodes",
            SectionId::NameIds => "name-ids",
            SectionId::TurnInstructions => "turn-instructions",
            SectionId::GraphNodes => "graph-nodes",
            SectionId::GraphEdges => "graph-edges",
            SectionId::TreeNodes => "tree-nodes",
            SectionId::Coordinates => "coordinates",
            SectionId::Timestamp => "timestamp",
        }
    }
}

/// Element counts for every section, gathered during the header scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounts([u64; SECTION_COUNT]);

impl SectionCounts {
    /// Create an all-zero count table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element count for a section
    pub fn set(&mut self, id: SectionId, count: u64) {
        self.0[id as usize] = count;
    }

    /// Get the element count for a section
    pub fn get(&self, id: SectionId) -> u64 {
        self.0[id as usize]
    }

    fn as_array(&self) -> &[u64; SECTION_COUNT] {
        &self.0
    }
}

/// The fixed-size layout header stored verbatim in the layout slot.
///
/// This is the entire cross-process contract: consumers re-derive every
/// offset from the counts recorded here.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LayoutHeader {
    /// Magic number for validation
    pub magic: u64,
    /// Layout schema version
    pub version: u32,
    /// Graph checksum recorded during preprocessing, propagated unverified
    pub checksum: u32,
    /// Per-section element counts, indexed by `SectionId`
    pub counts: [u64; SECTION_COUNT],
}

impl LayoutHeader {
    /// Validate the header magic and version
    pub fn validate(&self) -> Result<()> {
        if self.magic != LAYOUT_MAGIC {
            return Err(StoreError::invalid_parameter(
                "magic",
                "layout slot does not carry a roadstore header",
            ));
        }
        if self.version != LAYOUT_VERSION {
            return Err(StoreError::invalid_parameter(
                "version",
                format!("unsupported layout version {}", self.version),
            ));
        }
        Ok(())
    }
}

/// The computed map of all sections and the region's total size.
///
/// Immutable once planned. Offsets are monotonically increasing, each a
/// multiple of its section's alignment, and every section's byte range lies
/// within `[0, total_size())` without overlapping any other.
#[derive(Debug, Clone)]
pub struct LayoutDescriptor {
    header: LayoutHeader,
    offsets: [u64; SECTION_COUNT],
    total_size: u64,
}

impl LayoutDescriptor {
    /// Plan the region layout from gathered element counts.
    ///
    /// Deterministic: fixed counts produce bit-for-bit identical offsets on
    /// every invocation. Fails with `LayoutOverflow` if any product or sum
    /// leaves the addressable range.
    pub fn plan(counts: &SectionCounts, checksum: u32) -> Result<Self> {
        let (offsets, total_size) = pack(counts.as_array())?;
        Ok(Self {
            header: LayoutHeader {
                magic: LAYOUT_MAGIC,
                version: LAYOUT_VERSION,
                checksum,
                counts: *counts.as_array(),
            },
            offsets,
            total_size,
        })
    }

    /// Rebuild the descriptor from a header read out of the layout slot.
    ///
    /// This is the consumer-side entry point: offsets are re-derived from
    /// the counts, never read from the region.
    pub fn from_header(header: LayoutHeader) -> Result<Self> {
        header.validate()?;
        let (offsets, total_size) = pack(&header.counts)?;
        Ok(Self {
            header,
            offsets,
            total_size,
        })
    }

    /// The header to store in the layout slot
    pub fn header(&self) -> &LayoutHeader {
        &self.header
    }

    /// Element count of a section
    pub fn count(&self, id: SectionId) -> u64 {
        self.header.counts[id as usize]
    }

    /// Byte offset of a section within the data region
    pub fn offset(&self, id: SectionId) -> usize {
        self.offsets[id as usize] as usize
    }

    /// Byte length of a section (`count * element_size`)
    pub fn byte_len(&self, id: SectionId) -> usize {
        (self.header.counts[id as usize] as usize) * id.element_size()
    }

    /// Byte range of a section within the data region
    pub fn range(&self, id: SectionId) -> Range<usize> {
        let start = self.offset(id);
        start..start + self.byte_len(id)
    }

    /// Total size of the data region in bytes
    pub fn total_size(&self) -> usize {
        self.total_size as usize
    }

    /// The preprocessing checksum carried through from the graph artifact
    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }
}

/// Round `value` up to a multiple of `align` (a power of two)
fn align_up(value: u64, align: u64) -> Option<u64> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

/// The single offset walk both `plan` and `from_header` go through.
///
/// A zero-count section still receives an offset (equal to the next
/// section's) and contributes nothing to the cursor.
fn pack(counts: &[u64; SECTION_COUNT]) -> Result<([u64; SECTION_COUNT], u64)> {
    let mut offsets = [0u64; SECTION_COUNT];
    let mut cursor = 0u64;

    for id in SectionId::ALL {
        let overflow = || StoreError::layout_overflow(id.label());
        cursor = align_up(cursor, id.alignment() as u64).ok_or_else(overflow)?;
        offsets[id as usize] = cursor;

        let bytes = counts[id as usize]
            .checked_mul(id.element_size() as u64)
            .ok_or_else(overflow)?;
        cursor = cursor.checked_add(bytes).ok_or_else(overflow)?;
    }

    let total = align_up(cursor, REGION_GRANULARITY)
        .filter(|&t| t <= usize::MAX as u64)
        .ok_or_else(|| StoreError::layout_overflow("total"))?;

    Ok((offsets, total))
}
