//! Shared-memory frames.
//!
//! A frame goes through allocate → map → draw → unmap → hand off. The
//! mapping lives only inside [`MappedFrame`]; [`RenderBuffer`] owns nothing
//! but the file descriptor, which the presentation surface takes over on
//! submission. Every step releases what it acquired on drop, including the
//! error paths.

use std::fs::File;
use std::io;
use std::os::fd::FromRawFd;
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::error::RenderError;
use crate::geometry::SurfaceGeometry;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a submitted frame, echoed back by the
/// surface when it releases the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// A frame that is still mapped into this process for drawing.
#[derive(Debug)]
pub struct MappedFrame {
    file: File,
    map: MmapMut,
    geometry: SurfaceGeometry,
}

impl MappedFrame {
    /// Create and map a zero-filled shared-memory file sized for `geometry`.
    pub fn allocate(geometry: SurfaceGeometry) -> Result<Self, RenderError> {
        if geometry.is_empty() {
            return Err(RenderError::EmptyGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }

        let file = create_memfd().map_err(|source| RenderError::AllocationFailed {
            stage: "memfd_create",
            source,
        })?;
        // std retries ftruncate on EINTR
        file.set_len(geometry.buffer_size as u64)
            .map_err(|source| RenderError::AllocationFailed {
                stage: "ftruncate",
                source,
            })?;

        // SAFETY: the file was created above and is not shared with anyone
        // until the mapping is dropped in `finish`.
        let map = unsafe { MmapOptions::new().len(geometry.buffer_size).map_mut(&file) }
            .map_err(|source| RenderError::AllocationFailed {
                stage: "mmap",
                source,
            })?;

        Ok(Self {
            file,
            map,
            geometry,
        })
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// The mapped frame as row-major pixels.
    pub fn pixels_mut(&mut self) -> Result<&mut [u32], RenderError> {
        bytemuck::try_cast_slice_mut(&mut self.map[..])
            .map_err(|e| RenderError::PixelView(format!("{e:?}")))
    }

    /// Unmap and return the handle that is ready for submission.
    pub fn finish(self) -> RenderBuffer {
        let MappedFrame {
            file,
            map,
            geometry,
        } = self;
        drop(map);
        RenderBuffer {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            geometry,
            file,
        }
    }
}

/// An unmapped, fully drawn frame.
///
/// Dropping it closes the descriptor; the memory is reclaimed once the
/// surface has dropped its reference as well.
#[derive(Debug)]
pub struct RenderBuffer {
    id: BufferId,
    geometry: SurfaceGeometry,
    file: File,
}

impl RenderBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// Copy the frame's pixels out through a temporary read-only mapping.
    pub fn read_pixels(&self) -> io::Result<Vec<u32>> {
        // SAFETY: read-only mapping of a frame nobody writes to after
        // `MappedFrame::finish`.
        let map = unsafe { MmapOptions::new().len(self.geometry.buffer_size).map(&self.file) }?;
        Ok(pixels_from_bytes(&map))
    }
}

fn pixels_from_bytes(map: &Mmap) -> Vec<u32> {
    map.chunks_exact(4)
        .map(|px| u32::from_ne_bytes([px[0], px[1], px[2], px[3]]))
        .collect()
}

fn create_memfd() -> io::Result<File> {
    // SAFETY: the name is a valid NUL-terminated C string.
    let fd = unsafe { libc::memfd_create(c"linebar-frame".as_ptr(), libc::MFD_CLOEXEC) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `fd` was just returned by memfd_create and has no other owner.
    Ok(unsafe { File::from_raw_fd(fd) })
}
