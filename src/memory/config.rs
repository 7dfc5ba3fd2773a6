//! Configuration types for shared memory regions

use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Default directory for file-backed region names
pub const DEFAULT_REGION_DIR: &str = "/dev/shm";

/// Types of shared memory backing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackingType {
    /// File-backed shared memory under a well-known directory
    #[default]
    FileBacked,
    /// Anonymous memory file descriptor (Linux-specific, not name-resolvable
    /// by other processes)
    #[cfg(target_os = "linux")]
    MemFd,
}

impl BackingType {
    /// Human-readable name for log messages
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::FileBacked => "file-backed",
            #[cfg(target_os = "linux")]
            BackingType::MemFd => "memfd",
        }
    }
}

/// Configuration for creating or attaching a shared memory region
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Process-wide name of the region
    pub name: String,
    /// Exact size of the region in bytes
    pub size: usize,
    /// Backing type
    pub backing_type: BackingType,
    /// Directory holding file-backed region files
    pub dir: PathBuf,
    /// Whether to create the region (false attaches to an existing one)
    pub create: bool,
    /// Unix permissions for the backing file
    pub permissions: u32,
}

impl RegionConfig {
    /// Configuration for a new region of `size` bytes
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            backing_type: BackingType::default(),
            dir: PathBuf::from(DEFAULT_REGION_DIR),
            create: true,
            permissions: 0o644,
        }
    }

    /// Place the backing file under `dir` instead of the default directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Use the given backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    /// Attach to an existing region instead of creating one
    pub fn attach(mut self) -> Self {
        self.create = false;
        self
    }

    /// Path of the backing file for file-backed regions
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Reject configurations that can never produce a usable region
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(StoreError::invalid_parameter(
                "name",
                "region name cannot be empty",
            ));
        }
        if self.size == 0 {
            return Err(StoreError::invalid_parameter(
                "size",
                "region size must be greater than 0",
            ));
        }
        #[cfg(target_os = "linux")]
        if self.backing_type == BackingType::MemFd && !self.create {
            return Err(StoreError::invalid_parameter(
                "backing_type",
                "memfd regions cannot be attached by name",
            ));
        }
        Ok(())
    }
}

/// Shorthand for attaching to an existing file-backed region, taking the
/// size from the backing file itself.
pub(crate) fn attach_config(name: &str, dir: &Path) -> Result<RegionConfig> {
    let path = dir.join(name);
    let len = std::fs::metadata(&path)
        .map_err(|_| StoreError::allocation_failed(name, "region does not exist"))?
        .len();
    Ok(RegionConfig::new(name, len as usize).in_dir(dir).attach())
}
