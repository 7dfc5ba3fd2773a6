//! Shared memory region implementation

use std::fs::{File, OpenOptions};
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::{MmapMut, MmapOptions};

use super::config::{attach_config, BackingType, RegionConfig};
use crate::error::{Result, StoreError};

/// A named shared memory region of an exact size.
///
/// Creating a region allocates and maps it; dropping a region unmaps it but
/// leaves the backing file in place, so file-backed regions stay resolvable
/// by other processes until [`SharedRegion::unlink`] removes the name.
/// Existing mappings in consumer processes survive an unlink.
#[derive(Debug)]
pub struct SharedRegion {
    name: String,
    size: usize,
    mmap: MmapMut,
    path: Option<PathBuf>,
    _file: Option<File>,
    _memfd: Option<OwnedFd>,
}

impl SharedRegion {
    /// Create a region of exactly `config.size` bytes, or attach to an
    /// existing one. Fails with `AllocationFailed` if the platform denies
    /// the request or an existing region has an incompatible size.
    pub fn new(config: RegionConfig) -> Result<Self> {
        config.validate()?;

        let (mmap, path, file, memfd) = match config.backing_type {
            BackingType::FileBacked => {
                let (mmap, path, file) = Self::map_file(&config)?;
                (mmap, Some(path), Some(file), None)
            }
            #[cfg(target_os = "linux")]
            BackingType::MemFd => {
                let (mmap, fd) = Self::map_memfd(&config)?;
                (mmap, None, None, Some(fd))
            }
        };

        debug!(
            "mapped {} region {} ({} bytes)",
            config.backing_type.name(),
            config.name,
            config.size
        );

        Ok(Self {
            name: config.name,
            size: config.size,
            mmap,
            path,
            _file: file,
            _memfd: memfd,
        })
    }

    /// Attach to an existing file-backed region, taking its size from the
    /// backing file.
    pub fn open(name: &str, dir: &Path) -> Result<Self> {
        Self::new(attach_config(name, dir)?)
    }

    fn map_file(config: &RegionConfig) -> Result<(MmapMut, PathBuf, File)> {
        let path = config.file_path();
        let denied = |message: String| StoreError::allocation_failed(&config.name, message);

        let file = if config.create {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .mode(config.permissions)
                .open(&path)
                .map_err(|e| denied(format!("cannot create {}: {}", path.display(), e)))?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| denied(format!("cannot open {}: {}", path.display(), e)))?
        };

        let existing = file
            .metadata()
            .map_err(|e| denied(format!("cannot stat {}: {}", path.display(), e)))?
            .len();
        if config.create {
            if existing != 0 && existing != config.size as u64 {
                return Err(denied(format!(
                    "name already maps {} bytes, requested {}",
                    existing, config.size
                )));
            }
            file.set_len(config.size as u64)
                .map_err(|e| denied(format!("cannot size region: {}", e)))?;
        } else if existing != config.size as u64 {
            return Err(denied(format!(
                "existing region is {} bytes, expected {}",
                existing, config.size
            )));
        }

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&file)
                .map_err(|e| denied(format!("mmap failed: {}", e)))?
        };
        Ok((mmap, path, file))
    }

    #[cfg(target_os = "linux")]
    fn map_memfd(config: &RegionConfig) -> Result<(MmapMut, OwnedFd)> {
        use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
        use nix::unistd::ftruncate;
        use std::ffi::CString;
        use std::os::fd::AsRawFd;

        let denied = |message: String| StoreError::allocation_failed(&config.name, message);

        let name_cstr = CString::new(config.name.clone())
            .map_err(|_| StoreError::invalid_parameter("name", "name contains null bytes"))?;
        let fd = memfd_create(&name_cstr, MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| denied(format!("memfd_create failed: {}", e)))?;
        ftruncate(&fd, config.size as i64)
            .map_err(|e| denied(format!("cannot size memfd: {}", e)))?;

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(fd.as_raw_fd())
                .map_err(|e| denied(format!("mmap failed: {}", e)))?
        };
        Ok((mmap, fd))
    }

    /// Name of the region
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the region in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Read-only view of the mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Mutable view of the mapped bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    /// Typed pointer to the start of the region
    pub fn as_ptr<T>(&self) -> *const T {
        self.mmap.as_ptr() as *const T
    }

    /// Mutable typed pointer to the start of the region
    pub fn as_mut_ptr<T>(&mut self) -> *mut T {
        self.mmap.as_mut_ptr() as *mut T
    }

    /// Flush the mapping to its backing storage
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| StoreError::from_io(e, "Failed to flush region mapping"))
    }

    /// Remove the region's name. Existing mappings (here and in other
    /// processes) stay valid; the name simply stops resolving. Removing an
    /// already-unlinked name is not an error.
    pub fn unlink(&self) -> Result<()> {
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("unlinked region {}", self.name),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::from_io(e, "Failed to unlink region")),
            }
        }
        Ok(())
    }
}

unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}
