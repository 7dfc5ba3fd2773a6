//! Consumer-side attachment to a published generation.

use std::mem::size_of;
use std::path::Path;

use super::control::{data_region_name, layout_region_name, ControlRegion};
use crate::artifacts::timestamp::TIMESTAMP_FALLBACK;
use crate::error::{Result, StoreError};
use crate::layout::{LayoutDescriptor, LayoutHeader, SectionId};
use crate::memory::SharedRegion;

/// A read-only attachment to a fully published generation.
///
/// Attachment resolves through the control region's generation indicator,
/// so the regions opened here are guaranteed to be completely filled. The
/// view re-derives every section offset from the counts in the layout
/// slot; nothing else is trusted.
#[derive(Debug)]
pub struct PublishedView {
    generation: u64,
    layout: LayoutDescriptor,
    data_region: SharedRegion,
    _layout_region: SharedRegion,
}

impl PublishedView {
    /// Attach to whatever generation is currently published under `dir`.
    pub fn attach(dir: &Path) -> Result<Self> {
        let control = ControlRegion::attach(dir)?;
        let generation = control.current_generation();
        if generation == 0 {
            return Err(StoreError::NotPublished);
        }

        let layout_region = SharedRegion::open(&layout_region_name(generation), dir)?;
        if layout_region.size() < size_of::<LayoutHeader>() {
            return Err(StoreError::invalid_parameter(
                "layout",
                "layout slot is smaller than a layout header",
            ));
        }
        let header = unsafe { std::ptr::read(layout_region.as_ptr::<LayoutHeader>()) };
        let layout = LayoutDescriptor::from_header(header)?;

        let data_region = SharedRegion::open(&data_region_name(generation), dir)?;
        if data_region.size() < layout.total_size() {
            return Err(StoreError::allocation_failed(
                data_region_name(generation),
                format!(
                    "data slot is {} bytes, layout needs {}",
                    data_region.size(),
                    layout.total_size()
                ),
            ));
        }

        Ok(Self {
            generation,
            layout,
            data_region,
            _layout_region: layout_region,
        })
    }

    /// The generation this view is attached to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The re-derived layout descriptor
    pub fn layout(&self) -> &LayoutDescriptor {
        &self.layout
    }

    /// The preprocessing checksum carried through the layout slot
    pub fn checksum(&self) -> u32 {
        self.layout.checksum()
    }

    /// Bounds-checked read of one section's bytes
    pub fn section(&self, id: SectionId) -> &[u8] {
        &self.data_region.as_slice()[self.layout.range(id)]
    }

    /// The stored preprocessing timestamp
    pub fn timestamp(&self) -> &str {
        std::str::from_utf8(self.section(SectionId::Timestamp)).unwrap_or(TIMESTAMP_FALLBACK)
    }
}
