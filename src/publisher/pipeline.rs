//! The five-phase publish pipeline and the generation slot lifecycle.
//!
//! One publish cycle runs header scan, validation, layout planning,
//! allocation and fill as a single linear pass, then flips the control
//! region's generation indicator. Consumers attaching concurrently always
//! resolve either the previous generation or the new one, never a
//! partially written region.

use std::mem::size_of;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::control::{data_region_name, layout_region_name, ControlRegion};
use crate::artifacts::{self, edges, graph, names, nodes, timestamp, tree, ArtifactPaths};
use crate::artifacts::IdentityMarker;
use crate::error::{Result, StoreError};
use crate::layout::{LayoutDescriptor, LayoutHeader, SectionCounts, SectionId};
use crate::memory::{RegionConfig, SharedRegion};
use crate::validate;

/// Lifecycle state of a generation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No regions allocated under this generation's names
    Empty,
    /// Regions allocated but not fully filled; not yet attachable
    Pending,
    /// Fill complete and generation indicator flipped; safe for
    /// concurrent external attachment
    Published,
    /// Replaced by a newer generation; names unlinked
    Superseded,
}

/// A generation's pair of shared regions and their lifecycle state.
///
/// Dropping a slot that never reached `Published` unlinks its names, so an
/// aborted pipeline leaves no externally visible region behind.
pub struct GenerationSlot {
    generation: u64,
    state: SlotState,
    layout_region: SharedRegion,
    data_region: SharedRegion,
}

impl GenerationSlot {
    fn allocate(dir: &Path, generation: u64, layout: &LayoutDescriptor) -> Result<Self> {
        let layout_region = SharedRegion::new(
            RegionConfig::new(layout_region_name(generation), size_of::<LayoutHeader>())
                .in_dir(dir),
        )?;
        let data_region = match SharedRegion::new(
            RegionConfig::new(data_region_name(generation), layout.total_size()).in_dir(dir),
        ) {
            Ok(region) => region,
            Err(e) => {
                let _ = layout_region.unlink();
                return Err(e);
            }
        };
        Ok(Self {
            generation,
            state: SlotState::Pending,
            layout_region,
            data_region,
        })
    }

    /// This slot's generation number
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current lifecycle state
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Read a section's bytes out of the slot's data region
    pub fn section(&self, layout: &LayoutDescriptor, id: SectionId) -> &[u8] {
        &self.data_region.as_slice()[layout.range(id)]
    }

    /// Mark this generation as replaced and remove its names. Consumers
    /// still holding attachments keep valid mappings.
    pub fn supersede(&mut self) -> Result<()> {
        self.layout_region.unlink()?;
        self.data_region.unlink()?;
        self.state = SlotState::Superseded;
        info!("generation {} superseded and reclaimed", self.generation);
        Ok(())
    }
}

impl Drop for GenerationSlot {
    fn drop(&mut self) {
        if self.state == SlotState::Pending {
            let _ = self.layout_region.unlink();
            let _ = self.data_region.unlink();
            debug!("reclaimed aborted generation {}", self.generation);
        }
    }
}

/// Fill one section's planned byte range through `fill`; the destination
/// slice is exactly `count * element_size` bytes.
pub fn write_section<F>(
    data: &mut [u8],
    layout: &LayoutDescriptor,
    id: SectionId,
    fill: F,
) -> Result<()>
where
    F: FnOnce(&mut [u8]) -> Result<()>,
{
    fill(&mut data[layout.range(id)])
}

/// The loader-side publisher: owns the control region and drives publish
/// cycles against a shared-memory directory.
pub struct Publisher {
    dir: PathBuf,
    control: ControlRegion,
    toolchain: IdentityMarker,
    current: Option<GenerationSlot>,
}

impl Publisher {
    /// Create a publisher over the given shared-memory directory, creating
    /// the control region if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let control = ControlRegion::create_or_attach(&dir)?;
        Ok(Self {
            dir,
            control,
            toolchain: IdentityMarker::current(),
            current: None,
        })
    }

    /// Override the toolchain identity used for the compatibility check.
    pub fn with_toolchain_identity(mut self, marker: IdentityMarker) -> Self {
        self.toolchain = marker;
        self
    }

    /// Run one complete publish cycle and return the published generation
    /// number.
    ///
    /// Any error aborts with no partial region visible: the pending slot's
    /// names are unlinked before the error propagates, and the generation
    /// indicator still points at the previous generation.
    pub fn publish(&mut self, paths: &ArtifactPaths) -> Result<u64> {
        // phase 1: header scan, counts only
        info!("collecting artifact headers");
        let graph_header = graph::read_header(&paths.graph)?;
        let tree_header = tree::read_header(&paths.tree)?;
        let nodes_header = nodes::read_header(&paths.nodes)?;
        let name_header = names::read_header(&paths.names)?;
        let edge_header = edges::read_header(&paths.edges)?;
        let stamp = timestamp::read(paths.timestamp.as_deref());

        // phase 2: integrity gate
        let report = validate::validate(&graph_header, &self.toolchain, &paths.nodes, &paths.edges)?;
        if !report.warnings.is_empty() {
            info!("continuing with {} warning(s)", report.warnings.len());
        }

        // phase 3: layout planning
        let layout = plan_layout(
            &graph_header,
            &tree_header,
            &nodes_header,
            &name_header,
            &edge_header,
            &stamp,
        )?;
        info!(
            "planned layout: {} bytes across {} sections",
            layout.total_size(),
            SectionId::ALL.len()
        );

        // phase 4: allocation under generation-scoped names
        let generation = self.control.current_generation() + 1;
        let mut slot = GenerationSlot::allocate(&self.dir, generation, &layout)?;

        // phase 5: fill
        fill_slot(&mut slot, &layout, paths, &graph_header, &tree_header, &nodes_header, &name_header, &edge_header, &stamp)?;

        // publication barrier: flip only after the fill is complete
        let previous = self.control.current_generation();
        self.control.publish_generation(generation);
        slot.state = SlotState::Published;
        info!("generation {} published", generation);

        if let Some(mut old) = self.current.take() {
            old.supersede()?;
        } else if previous != 0 {
            reclaim_generation(&self.dir, previous);
        }

        self.current = Some(slot);
        Ok(generation)
    }

    /// The slot published by this process's most recent cycle, if any
    pub fn current_slot(&self) -> Option<&GenerationSlot> {
        self.current.as_ref()
    }

    /// The currently published generation according to the control region
    pub fn current_generation(&self) -> u64 {
        self.control.current_generation()
    }
}

fn plan_layout(
    graph_header: &graph::GraphHeader,
    tree_header: &tree::TreeHeader,
    nodes_header: &nodes::NodesHeader,
    name_header: &names::NameHeader,
    edge_header: &edges::EdgeHeader,
    stamp: &str,
) -> Result<LayoutDescriptor> {
    let mut counts = SectionCounts::new();
    counts.set(SectionId::NameIndex, name_header.index_count as u64);
    counts.set(SectionId::NameChars, name_header.char_count as u64);
    counts.set(SectionId::ViaNodes, edge_header.edge_count as u64);
    counts.set(SectionId::NameIds, edge_header.edge_count as u64);
    counts.set(SectionId::TurnInstructions, edge_header.edge_count as u64);
    counts.set(SectionId::GraphNodes, graph_header.node_count as u64);
    counts.set(SectionId::GraphEdges, graph_header.edge_count as u64);
    counts.set(SectionId::TreeNodes, tree_header.node_count as u64);
    counts.set(SectionId::Coordinates, nodes_header.count as u64);
    counts.set(SectionId::Timestamp, stamp.len() as u64);
    LayoutDescriptor::plan(&counts, graph_header.checksum)
}

#[allow(clippy::too_many_arguments)]
fn fill_slot(
    slot: &mut GenerationSlot,
    layout: &LayoutDescriptor,
    paths: &ArtifactPaths,
    graph_header: &graph::GraphHeader,
    tree_header: &tree::TreeHeader,
    nodes_header: &nodes::NodesHeader,
    name_header: &names::NameHeader,
    edge_header: &edges::EdgeHeader,
    stamp: &str,
) -> Result<()> {
    unsafe {
        std::ptr::write(
            slot.layout_region.as_mut_ptr::<LayoutHeader>(),
            *layout.header(),
        );
    }

    let data = slot.data_region.as_mut_slice();

    debug!("loading name index and chars from {}", paths.names.display());
    write_section(data, layout, SectionId::NameIndex, |dest| {
        names::read_index_payload(&paths.names, name_header, dest)
    })?;
    write_section(data, layout, SectionId::NameChars, |dest| {
        names::read_char_payload(&paths.names, name_header, dest)
    })?;

    debug!("splitting edge metadata from {}", paths.edges.display());
    let (via, name_ids, turns) = edge_metadata_sections(data, layout)?;
    edges::read_payload(&paths.edges, edge_header, via, name_ids, turns)?;

    debug!("loading graph from {}", paths.graph.display());
    write_section(data, layout, SectionId::GraphNodes, |dest| {
        graph::read_node_payload(&paths.graph, graph_header, dest)
    })?;
    write_section(data, layout, SectionId::GraphEdges, |dest| {
        graph::read_edge_payload(&paths.graph, graph_header, dest)
    })?;

    debug!("loading spatial index from {}", paths.tree.display());
    write_section(data, layout, SectionId::TreeNodes, |dest| {
        tree::read_payload(&paths.tree, tree_header, dest)
    })?;

    debug!("decoding coordinates from {}", paths.nodes.display());
    write_section(data, layout, SectionId::Coordinates, |dest| {
        nodes::read_payload(&paths.nodes, nodes_header, dest)
    })?;

    write_section(data, layout, SectionId::Timestamp, |dest| {
        artifacts::check_dest("timestamp", dest, stamp.len() as u64)?;
        dest.copy_from_slice(stamp.as_bytes());
        Ok(())
    })?;

    slot.data_region.flush()?;
    slot.layout_region.flush()?;
    Ok(())
}

/// Borrow the three parallel edge-metadata sections disjointly.
fn edge_metadata_sections<'a>(
    data: &'a mut [u8],
    layout: &LayoutDescriptor,
) -> Result<(&'a mut [u8], &'a mut [u8], &'a mut [u8])> {
    let via_r = layout.range(SectionId::ViaNodes);
    let name_r = layout.range(SectionId::NameIds);
    let turn_r = layout.range(SectionId::TurnInstructions);

    // declaration order guarantees via < name-id < turn-instruction ranges
    if via_r.end > name_r.start || name_r.end > turn_r.start {
        return Err(StoreError::invalid_parameter(
            "layout",
            "edge metadata sections are not in declaration order",
        ));
    }

    let (head, tail) = data.split_at_mut(name_r.start);
    let (mid, tail) = tail.split_at_mut(turn_r.start - name_r.start);
    let via = &mut head[via_r];
    let name_ids = &mut mid[..name_r.end - name_r.start];
    let turns = &mut tail[..turn_r.end - turn_r.start];
    Ok((via, name_ids, turns))
}

/// Remove a superseded generation's names, e.g. one left behind by a
/// previous loader process. Missing names are fine.
pub fn reclaim_generation(dir: &Path, generation: u64) {
    for name in [layout_region_name(generation), data_region_name(generation)] {
        match std::fs::remove_file(dir.join(&name)) {
            Ok(()) => info!("reclaimed superseded region {}", name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not reclaim region {}: {}", name, e),
        }
    }
}
