//! Presentation surface abstraction.
//!
//! The bar never talks to a display protocol directly. It drives a
//! [`PresentationSurface`]: it requests a layout once, reacts to the
//! [`SurfaceEvent`]s the surface reports, and hands every finished frame over
//! with attach / damage / commit. [`HeadlessSurface`] is the in-process
//! implementation used by the binary and the tests; it can write each
//! presented frame to a PNG file.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::os::fd::BorrowedFd;
use std::path::{Path, PathBuf};

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use linebar_config::Anchor;
use linebar_render::color::unpremultiply;
use linebar_render::{BufferId, RenderBuffer};
use thiserror::Error;

/// Width used by [`HeadlessSurface`] when the layout leaves it to the surface.
pub const DEFAULT_HEADLESS_WIDTH: u32 = 800;

/// Fatal surface failures; the bar exits when one is returned.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface protocol error: {0}")]
    Protocol(String),

    #[error("failed to read back {id}: {source}")]
    ReadBack {
        id: BufferId,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create snapshot {}: {source}", path.display())]
    SnapshotFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something the surface reports back to the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// New size; acknowledge `serial`, then render and submit a frame
    Configure { serial: u32, width: u32, height: u32 },
    /// The surface no longer reads this buffer
    BufferReleased(BufferId),
    /// The surface is gone; the bar must stop
    Closed,
}

/// Size and placement requested at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    /// 0 lets the surface pick (typically the output width)
    pub width: u32,
    pub height: u32,
    pub anchor: Anchor,
    /// Pixels reserved along the anchored edge
    pub exclusive_zone: i32,
}

/// The display-side collaborator of the render scheduler.
pub trait PresentationSurface {
    /// Descriptor that becomes readable when events arrive, if any.
    fn event_fd(&self) -> Option<BorrowedFd<'_>>;

    /// True when events are queued and [`Self::dispatch`] would return some.
    fn has_pending_events(&self) -> bool;

    /// Send buffered outgoing requests.
    fn flush(&mut self) -> Result<(), SurfaceError>;

    /// Read and return every pending event.
    fn dispatch(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError>;

    /// Ask for the bar's size and placement.
    fn request_layout(&mut self, layout: BarLayout) -> Result<(), SurfaceError>;

    fn set_exclusive_zone(&mut self, zone: i32);

    fn ack_configure(&mut self, serial: u32);

    /// Take ownership of a finished frame for the next commit.
    fn attach(&mut self, buffer: RenderBuffer);

    fn damage_all(&mut self);

    /// Present the attached frame.
    fn commit(&mut self) -> Result<(), SurfaceError>;
}

/// Surface without a display.
///
/// Configures itself from the requested layout, releases the previous frame
/// on every commit and optionally closes after a number of frames.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    events: VecDeque<SurfaceEvent>,
    next_serial: u32,
    last_ack: Option<u32>,
    layout: Option<BarLayout>,
    size: (u32, u32),
    exclusive_zone: i32,
    attached: Option<RenderBuffer>,
    presented: Option<RenderBuffer>,
    damaged: bool,
    commits: u64,
    frames: u64,
    frame_limit: Option<u64>,
    snapshot: Option<PathBuf>,
    closed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every presented frame to `path` as PNG.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Report `Closed` once `frames` frames have been presented.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Simulate an output change.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.configure(width, height);
    }

    /// Simulate the compositor closing the surface.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.push_back(SurfaceEvent::Closed);
        }
    }

    pub fn layout(&self) -> Option<BarLayout> {
        self.layout
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn exclusive_zone(&self) -> i32 {
        self.exclusive_zone
    }

    pub fn last_ack(&self) -> Option<u32> {
        self.last_ack
    }

    /// The frame currently on screen.
    pub fn presented(&self) -> Option<&RenderBuffer> {
        self.presented.as_ref()
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Commits so far, with or without a new frame.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    fn configure(&mut self, width: u32, height: u32) {
        self.next_serial = self.next_serial.wrapping_add(1);
        self.size = (width, height);
        self.events.push_back(SurfaceEvent::Configure {
            serial: self.next_serial,
            width,
            height,
        });
    }

    fn write_snapshot(&self, path: &Path, buffer: &RenderBuffer) -> Result<(), SurfaceError> {
        let geometry = buffer.geometry();
        let pixels = buffer
            .read_pixels()
            .map_err(|source| SurfaceError::ReadBack {
                id: buffer.id(),
                source,
            })?;
        let rgba: Vec<u8> = pixels.iter().flat_map(|&px| unpremultiply(px)).collect();

        // Temp file then rename so a viewer never sees half a PNG
        let temp_path = path.with_extension("png.tmp");
        let file = File::create(&temp_path).map_err(|source| SurfaceError::SnapshotFile {
            path: temp_path.clone(),
            source,
        })?;
        PngEncoder::new(BufWriter::new(file))
            .write_image(
                &rgba,
                geometry.width,
                geometry.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|source| SurfaceError::Snapshot {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::rename(&temp_path, path).map_err(|source| SurfaceError::SnapshotFile {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Wrote snapshot of {} to {:?}", buffer.id(), path);
        Ok(())
    }
}

impl PresentationSurface for HeadlessSurface {
    fn event_fd(&self) -> Option<BorrowedFd<'_>> {
        None
    }

    fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn dispatch(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError> {
        Ok(self.events.drain(..).collect())
    }

    fn request_layout(&mut self, layout: BarLayout) -> Result<(), SurfaceError> {
        if layout.height == 0 {
            return Err(SurfaceError::Protocol(
                "layout requested with zero height".to_string(),
            ));
        }
        log::info!(
            "Headless surface: {}x{} anchored {}",
            layout.width,
            layout.height,
            layout.anchor.display_name()
        );
        self.layout = Some(layout);
        self.exclusive_zone = layout.exclusive_zone;
        let width = if layout.width == 0 {
            DEFAULT_HEADLESS_WIDTH
        } else {
            layout.width
        };
        self.configure(width, layout.height);
        Ok(())
    }

    fn set_exclusive_zone(&mut self, zone: i32) {
        self.exclusive_zone = zone;
    }

    fn ack_configure(&mut self, serial: u32) {
        self.last_ack = Some(serial);
    }

    fn attach(&mut self, buffer: RenderBuffer) {
        // An attached but uncommitted frame is simply replaced
        self.attached = Some(buffer);
    }

    fn damage_all(&mut self) {
        self.damaged = true;
    }

    fn commit(&mut self) -> Result<(), SurfaceError> {
        self.commits += 1;
        let Some(buffer) = self.attached.take() else {
            return Ok(());
        };
        if !self.damaged {
            log::debug!("Commit of {} without damage", buffer.id());
        }
        self.damaged = false;

        if let Some(ref path) = self.snapshot {
            self.write_snapshot(path, &buffer)?;
        }

        if let Some(previous) = self.presented.replace(buffer) {
            self.events
                .push_back(SurfaceEvent::BufferReleased(previous.id()));
        }
        self.frames += 1;

        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            log::info!("Frame limit reached after {} frames", self.frames);
            self.close();
        }
        Ok(())
    }
}
