//! Shared region publication: the generation protocol and the publish
//! pipeline.
//!
//! A publish cycle allocates a fresh layout slot and data slot under
//! generation-scoped names, fills them, and only then flips the atomic
//! current-generation indicator in the control region. Consumers resolve
//! regions through that indicator, so a partially written region is never
//! observable and a new cycle supersedes an old one without a window in
//! which no valid generation exists.

pub mod control;
mod pipeline;
mod view;

pub use control::{ControlRegion, CONTROL_REGION_NAME};
pub use pipeline::{reclaim_generation, write_section, GenerationSlot, Publisher, SlotState};
pub use view::PublishedView;
