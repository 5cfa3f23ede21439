//! Render scheduler and event loop.
//!
//! [`BarScheduler`] is the one context object of the bar. It owns the
//! surface, the compositor, the line reader, the last complete line and the
//! current geometry, and it decides when to redraw:
//! - a batch of new lines renders and submits the newest one
//! - a surface reconfiguration re-renders the last line at the new size
//!
//! Everything runs on one thread; the only place the loop sleeps is the
//! `poll` over the surface and source descriptors.

use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use linebar_config::ExclusiveZone;
use linebar_fonts::GlyphSource;
use linebar_render::{RenderBuffer, RenderError, SurfaceGeometry, TextCompositor};

use crate::line_reader::{Line, LineReader};
use crate::source::TextSource;
use crate::surface::{PresentationSurface, SurfaceError, SurfaceEvent};

/// Which descriptors `poll` reported ready.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Readiness {
    surface: bool,
    source: bool,
}

/// Drives rendering from surface events and source lines.
pub struct BarScheduler<S, G> {
    surface: S,
    compositor: TextCompositor<G>,
    reader: LineReader,
    source: Option<TextSource>,
    last_line: Line,
    geometry: SurfaceGeometry,
    exclusive_zone: ExclusiveZone,
    running: bool,
    frames_submitted: u64,
}

impl<S: PresentationSurface, G: GlyphSource> BarScheduler<S, G> {
    pub fn new(surface: S, compositor: TextCompositor<G>, exclusive_zone: ExclusiveZone) -> Self {
        Self {
            surface,
            compositor,
            reader: LineReader::new(),
            source: None,
            last_line: Line::default(),
            geometry: SurfaceGeometry::default(),
            exclusive_zone,
            running: true,
            frames_submitted: 0,
        }
    }

    /// Attach the text source polled by [`Self::run`].
    pub fn with_source(mut self, source: TextSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn compositor(&self) -> &TextCompositor<G> {
        &self.compositor
    }

    pub fn source(&self) -> Option<&TextSource> {
        self.source.as_ref()
    }

    /// The most recent complete line (empty until one arrives).
    pub fn last_line(&self) -> &Line {
        &self.last_line
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn reader(&self) -> &LineReader {
        &self.reader
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames handed to the surface so far.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Run until the surface closes or no event source remains.
    pub fn run(&mut self) -> Result<()> {
        if let Some(source) = self.source.as_mut() {
            source.start().context("starting text source")?;
        }

        while self.running {
            self.surface.flush().context("flushing surface")?;

            let now = Instant::now();
            let source_timeout = self.source.as_ref().and_then(|s| s.timeout(now));
            let surface_pending = self.surface.has_pending_events();
            let timeout = if surface_pending {
                Some(Duration::ZERO)
            } else {
                source_timeout
            };

            let source_live = self.source.as_ref().is_some_and(|s| s.poll_fd().is_some());
            if timeout.is_none() && !source_live && self.surface.event_fd().is_none() {
                log::info!("No event source remains, exiting");
                break;
            }

            let ready = self.wait(timeout).context("waiting for events")?;

            if ready.source {
                let lines = match self.source.as_mut() {
                    Some(source) => source.read_lines(&mut self.reader, Instant::now()),
                    None => Vec::new(),
                };
                self.present_lines(lines)?;
            }
            if let Some(source) = self.source.as_mut() {
                source.tick(Instant::now());
            }

            if ready.surface || self.surface.has_pending_events() {
                let events = self.surface.dispatch().context("dispatching surface events")?;
                for event in events {
                    self.handle_event(event)?;
                }
            }
        }

        log::info!("Event loop finished after {} frames", self.frames_submitted);
        Ok(())
    }

    /// React to one surface event.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Result<(), SurfaceError> {
        match event {
            SurfaceEvent::Configure {
                serial,
                width,
                height,
            } => self.reconfigure(serial, width, height),
            SurfaceEvent::BufferReleased(id) => {
                log::trace!("Surface released {id}");
                Ok(())
            }
            SurfaceEvent::Closed => {
                log::info!("Surface closed");
                self.running = false;
                Ok(())
            }
        }
    }

    /// Adopt a new size, acknowledge it and re-render the last line.
    pub fn reconfigure(
        &mut self,
        serial: u32,
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError> {
        log::info!("Reconfigure: {}x{} (serial {})", width, height, serial);
        self.geometry = SurfaceGeometry::new(width, height);
        self.surface
            .set_exclusive_zone(self.exclusive_zone.resolve(height));
        self.surface.ack_configure(serial);

        match self.render_last_line() {
            Some(buffer) => self.submit(buffer),
            None => Ok(()),
        }
    }

    /// Feed raw bytes as if they were read from the source.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<(), SurfaceError> {
        let lines = self.reader.ingest(chunk);
        self.present_lines(lines)
    }

    /// Render every line of a batch; submit only the newest frame.
    fn present_lines(&mut self, lines: Vec<Line>) -> Result<(), SurfaceError> {
        let mut latest = None;
        for line in lines {
            self.last_line = line;
            // A superseded frame is dropped here, closing its descriptor
            latest = Some(self.render_last_line());
        }
        match latest {
            Some(Some(buffer)) => self.submit(buffer),
            _ => Ok(()),
        }
    }

    fn render_last_line(&mut self) -> Option<RenderBuffer> {
        match self
            .compositor
            .render(self.last_line.as_bytes(), self.geometry)
        {
            Ok(buffer) => Some(buffer),
            Err(RenderError::EmptyGeometry { width, height }) => {
                log::debug!("Not rendering into {width}x{height} surface");
                None
            }
            // The previous frame stays on screen in both cases
            Err(e) if e.is_allocation_failure() => {
                log::error!("Out of frame memory, skipping render: {e}");
                None
            }
            Err(e) => {
                log::error!("Render failed: {e}");
                None
            }
        }
    }

    fn submit(&mut self, buffer: RenderBuffer) -> Result<(), SurfaceError> {
        log::trace!("Submitting {}", buffer.id());
        self.surface.attach(buffer);
        self.surface.damage_all();
        self.surface.commit()?;
        self.frames_submitted += 1;
        Ok(())
    }

    fn wait(&self, timeout: Option<Duration>) -> io::Result<Readiness> {
        let mut fds: Vec<libc::pollfd> = Vec::with_capacity(2);
        let mut register = |fd: i32| {
            fds.push(libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            });
            fds.len() - 1
        };
        let surface_slot = self.surface.event_fd().map(|fd| register(fd.as_raw_fd()));
        let source_slot = self
            .source
            .as_ref()
            .and_then(|s| s.poll_fd())
            .map(|fd| register(fd.as_raw_fd()));

        let timeout_ms = match timeout {
            None => -1,
            Some(d) => d.as_micros().div_ceil(1000).min(i32::MAX as u128) as i32,
        };

        // SAFETY: `fds` is a live, correctly sized array of pollfd.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Readiness::default());
            }
            return Err(err);
        }

        let is_ready = |slot: Option<usize>| {
            slot.and_then(|i| fds.get(i)).is_some_and(|p| {
                p.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
            })
        };
        Ok(Readiness {
            surface: is_ready(surface_slot),
            source: is_ready(source_slot),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{BarLayout, HeadlessSurface};
    use linebar_config::Anchor;
    use linebar_fonts::testing::FixedGlyphSource;
    use linebar_render::BufferId;
    use std::collections::VecDeque;
    use std::os::fd::BorrowedFd;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Zone(i32),
        Ack(u32),
        Attach(BufferId, SurfaceGeometry),
        Damage,
        Commit,
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<Call>,
        events: VecDeque<SurfaceEvent>,
        attached: Vec<Vec<u32>>,
    }

    impl RecordingSurface {
        fn attaches(&self) -> Vec<SurfaceGeometry> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Attach(_, g) => Some(*g),
                    _ => None,
                })
                .collect()
        }
    }

    impl PresentationSurface for RecordingSurface {
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
        fn request_layout(&mut self, _layout: BarLayout) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn set_exclusive_zone(&mut self, zone: i32) {
            self.calls.push(Call::Zone(zone));
        }
        fn ack_configure(&mut self, serial: u32) {
            self.calls.push(Call::Ack(serial));
        }
        fn attach(&mut self, buffer: RenderBuffer) {
            self.attached.push(buffer.read_pixels().unwrap());
            self.calls.push(Call::Attach(buffer.id(), buffer.geometry()));
        }
        fn damage_all(&mut self) {
            self.calls.push(Call::Damage);
        }
        fn commit(&mut self) -> Result<(), SurfaceError> {
            self.calls.push(Call::Commit);
            Ok(())
        }
    }

    fn scheduler(zone: ExclusiveZone) -> TestBar {
        let compositor = TextCompositor::new(FixedGlyphSource::new(6), [0xff, 0xff, 0xff, 0xff]);
        BarScheduler::new(RecordingSurface::default(), compositor, zone)
    }

    fn render_alone(text: &[u8], geometry: SurfaceGeometry) -> Vec<u32> {
        let mut compositor =
            TextCompositor::new(FixedGlyphSource::new(6), [0xff, 0xff, 0xff, 0xff]);
        compositor.render(text, geometry).unwrap().read_pixels().unwrap()
    }

    type TestBar = BarScheduler<RecordingSurface, FixedGlyphSource>;

    fn configure(bar: &mut TestBar, serial: u32, width: u32, height: u32) {
        bar.handle_event(SurfaceEvent::Configure {
            serial,
            width,
            height,
        })
        .unwrap();
    }

    #[test]
    fn test_configure_acks_then_submits() {
        let mut bar = scheduler(ExclusiveZone::BarHeight);
        configure(&mut bar, 3, 100, 20);

        let geometry = SurfaceGeometry::new(100, 20);
        let calls = &bar.surface().calls;
        assert_eq!(calls[0], Call::Zone(20));
        assert_eq!(calls[1], Call::Ack(3));
        assert!(matches!(calls[2], Call::Attach(_, g) if g == geometry));
        assert_eq!(calls[3..], [Call::Damage, Call::Commit]);
        assert_eq!(bar.geometry(), geometry);
    }

    #[test]
    fn test_zone_off_reserves_nothing() {
        let mut bar = scheduler(ExclusiveZone::Off);
        configure(&mut bar, 1, 100, 20);
        assert_eq!(bar.surface().calls[0], Call::Zone(0));
    }

    #[test]
    fn test_batch_submits_only_last_line() {
        let mut bar = scheduler(ExclusiveZone::Off);
        configure(&mut bar, 1, 100, 20);
        bar.surface_mut().calls.clear();
        bar.surface_mut().attached.clear();

        bar.ingest(b"12:00:01\n12:00:02\n12:00:03\n").unwrap();

        assert_eq!(bar.surface().attaches().len(), 1);
        assert_eq!(bar.last_line().as_bytes(), b"12:00:03");
        assert_eq!(
            bar.surface().attached[0],
            render_alone(b"12:00:03", SurfaceGeometry::new(100, 20))
        );
    }

    #[test]
    fn test_partial_line_submits_nothing() {
        let mut bar = scheduler(ExclusiveZone::Off);
        configure(&mut bar, 1, 100, 20);
        let before = bar.frames_submitted();

        bar.ingest(b"12:0").unwrap();
        assert_eq!(bar.frames_submitted(), before);
        bar.ingest(b"0\n").unwrap();
        assert_eq!(bar.frames_submitted(), before + 1);
        assert_eq!(bar.last_line().as_bytes(), b"12:00");
    }

    #[test]
    fn test_reconfigure_rerenders_last_line() {
        let mut bar = scheduler(ExclusiveZone::Off);
        configure(&mut bar, 1, 100, 20);
        bar.ingest(b"hello\n").unwrap();
        bar.surface_mut().calls.clear();
        bar.surface_mut().attached.clear();

        // No new input, only a new size
        configure(&mut bar, 2, 200, 20);

        let wide = SurfaceGeometry::new(200, 20);
        assert_eq!(bar.surface().attaches(), vec![wide]);
        assert_eq!(bar.surface().attached[0], render_alone(b"hello", wide));
        assert_eq!(bar.reader().linerem(), 0);
    }

    #[test]
    fn test_lines_before_configure_are_kept() {
        let mut bar = scheduler(ExclusiveZone::Off);
        bar.ingest(b"early\n").unwrap();
        assert_eq!(bar.frames_submitted(), 0);
        assert_eq!(bar.last_line().as_bytes(), b"early");

        configure(&mut bar, 1, 64, 16);
        assert_eq!(bar.frames_submitted(), 1);
        assert_eq!(
            bar.surface().attached[0],
            render_alone(b"early", SurfaceGeometry::new(64, 16))
        );
    }

    #[test]
    fn test_unrenderable_size_submits_nothing() {
        let mut bar = scheduler(ExclusiveZone::Off);
        configure(&mut bar, 1, 100, 20);
        bar.ingest(b"kept\n").unwrap();
        let before = bar.frames_submitted();

        configure(&mut bar, 2, 0, 20);
        assert_eq!(bar.frames_submitted(), before);
        assert_eq!(bar.surface().calls.last(), Some(&Call::Ack(2)));
        assert!(bar.is_running());
    }

    #[test]
    fn test_closed_stops_the_loop() {
        let mut bar = scheduler(ExclusiveZone::Off);
        bar.surface_mut().events.push_back(SurfaceEvent::Configure {
            serial: 1,
            width: 50,
            height: 10,
        });
        bar.surface_mut().events.push_back(SurfaceEvent::Closed);

        bar.run().unwrap();
        assert!(!bar.is_running());
        assert_eq!(bar.frames_submitted(), 1);
    }

    #[test]
    fn test_run_exits_when_source_finishes() {
        let mut surface = HeadlessSurface::new();
        surface
            .request_layout(BarLayout {
                width: 120,
                height: 20,
                anchor: Anchor::Bottom,
                exclusive_zone: 0,
            })
            .unwrap();
        let compositor = TextCompositor::new(FixedGlyphSource::new(6), [0xff, 0xff, 0xff, 0xff]);
        let source = TextSource::command("printf 'first\\nsecond\\n'", None);
        let mut bar =
            BarScheduler::new(surface, compositor, ExclusiveZone::Off).with_source(source);

        bar.run().unwrap();

        assert!(bar.source().is_some_and(|s| s.is_finished()));
        assert_eq!(bar.last_line().as_bytes(), b"second");
        let presented = bar.surface().presented().unwrap();
        assert_eq!(
            presented.read_pixels().unwrap(),
            render_alone(b"second", SurfaceGeometry::new(120, 20))
        );
    }
}
