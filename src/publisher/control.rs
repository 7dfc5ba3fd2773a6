//! The small control region carrying the current-generation indicator.
//!
//! Producer and consumers share one tiny region holding an atomic
//! generation counter. Generation 0 means nothing has ever been published;
//! generation `g > 0` means the regions named for `g` are fully filled.
//! The counter is flipped with release ordering only after the fill phase
//! completes, so a consumer that reads `g` with acquire ordering always
//! resolves a fully published generation.

use std::mem::size_of;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, StoreError};
use crate::memory::{RegionConfig, SharedRegion};

/// Magic number identifying the control region ("RSCTRL")
pub const CONTROL_MAGIC: u64 = 0x0000_5253_4354_524C;

/// Control region schema version
pub const CONTROL_VERSION: u32 = 1;

/// Well-known name of the control region
pub const CONTROL_REGION_NAME: &str = "roadstore_control";

/// Name of a generation's layout slot
pub fn layout_region_name(generation: u64) -> String {
    format!("roadstore_layout_g{}", generation)
}

/// Name of a generation's data slot
pub fn data_region_name(generation: u64) -> String {
    format!("roadstore_data_g{}", generation)
}

#[repr(C)]
struct ControlHeader {
    magic: u64,
    version: u32,
    _reserved: u32,
    current_generation: AtomicU64,
}

/// Producer/consumer handle on the shared generation indicator.
#[derive(Debug)]
pub struct ControlRegion {
    region: SharedRegion,
}

impl ControlRegion {
    /// Create the control region if it does not exist yet, otherwise attach
    /// to the existing one and validate it.
    pub fn create_or_attach(dir: &Path) -> Result<Self> {
        if dir.join(CONTROL_REGION_NAME).exists() {
            return Self::attach(dir);
        }

        let config =
            RegionConfig::new(CONTROL_REGION_NAME, size_of::<ControlHeader>()).in_dir(dir);
        let mut region = SharedRegion::new(config)?;
        let header = ControlHeader {
            magic: CONTROL_MAGIC,
            version: CONTROL_VERSION,
            _reserved: 0,
            current_generation: AtomicU64::new(0),
        };
        unsafe {
            std::ptr::write(region.as_mut_ptr::<ControlHeader>(), header);
        }
        region.flush()?;
        Ok(Self { region })
    }

    /// Attach to an existing control region; fails with `NotPublished` if
    /// no loader has ever run against this directory.
    pub fn attach(dir: &Path) -> Result<Self> {
        if !dir.join(CONTROL_REGION_NAME).exists() {
            return Err(StoreError::NotPublished);
        }
        let region = SharedRegion::open(CONTROL_REGION_NAME, dir)?;
        if region.size() < size_of::<ControlHeader>() {
            return Err(StoreError::invalid_parameter(
                "control",
                "control region is too small",
            ));
        }
        let this = Self { region };
        let header = this.header();
        if header.magic != CONTROL_MAGIC {
            return Err(StoreError::invalid_parameter(
                "control",
                "control region carries a foreign magic number",
            ));
        }
        if header.version != CONTROL_VERSION {
            return Err(StoreError::invalid_parameter(
                "control",
                format!("unsupported control version {}", header.version),
            ));
        }
        Ok(this)
    }

    fn header(&self) -> &ControlHeader {
        // The mapping is page-aligned and at least header-sized, checked on
        // creation and attach.
        unsafe { &*self.region.as_ptr::<ControlHeader>() }
    }

    /// The currently published generation, 0 if none
    pub fn current_generation(&self) -> u64 {
        self.header().current_generation.load(Ordering::Acquire)
    }

    /// Flip the indicator to `generation`. Must only be called once the
    /// generation's regions are fully filled.
    pub fn publish_generation(&self, generation: u64) {
        self.header()
            .current_generation
            .store(generation, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_attach() {
        let dir = tempfile::TempDir::new().unwrap();
        let control = ControlRegion::create_or_attach(dir.path()).unwrap();
        assert_eq!(control.current_generation(), 0);
        control.publish_generation(3);

        let other = ControlRegion::attach(dir.path()).unwrap();
        assert_eq!(other.current_generation(), 3);
    }

    #[test]
    fn test_attach_without_loader_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ControlRegion::attach(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::NotPublished));
    }

    #[test]
    fn test_slot_names_are_generation_scoped() {
        assert_ne!(layout_region_name(1), layout_region_name(2));
        assert_ne!(layout_region_name(1), data_region_name(1));
    }
}
