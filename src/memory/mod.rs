//! Named shared-memory regions backing the published data.
//!
//! Regions are plain files under a shared-memory directory (`/dev/shm` by
//! default) mapped with `memmap2`; the file name is the region's
//! process-wide identity. Linux `memfd` backing is available for anonymous,
//! single-process uses such as tests.

mod config;
mod region;

pub use config::{BackingType, RegionConfig, DEFAULT_REGION_DIR};
pub use region::SharedRegion;
