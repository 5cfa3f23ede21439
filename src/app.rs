//! Application wiring.
//!
//! [`App`] turns the CLI options and the config file into a running bar:
//! font, compositor, text source, surface and scheduler.

use std::path::Path;

use anyhow::{Context, Result};
use linebar_config::Config;
use linebar_fonts::{FontDescriptor, FontMetrics, GlyphSource, SwashFont};
use linebar_render::TextCompositor;

use crate::cli::RuntimeOptions;
use crate::scheduler::BarScheduler;
use crate::source::{SourceKind, TextSource};
use crate::surface::{BarLayout, HeadlessSurface, PresentationSurface};

/// Bar height for a configured value: 0 means "fit the font".
pub fn bar_height(configured: u32, metrics: FontMetrics) -> u32 {
    if configured == 0 {
        metrics.line_height().max(1)
    } else {
        configured
    }
}

/// Load the config named on the command line, or the default one, and apply
/// the CLI overrides.
pub fn load_config(options: &RuntimeOptions) -> Result<Config> {
    let mut config = match options.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    options.apply_to(&mut config);
    config
        .validate()
        .context("invalid configuration after command-line overrides")?;
    Ok(config)
}

/// The configured bar, ready to run.
pub struct App {
    config: Config,
    options: RuntimeOptions,
}

impl App {
    /// Load configuration and apply its log level.
    pub fn new(options: RuntimeOptions) -> Result<Self> {
        let config = load_config(&options)?;
        crate::debug::apply_config_level(config.log_level.to_level_filter());
        Ok(Self::with_config(config, options))
    }

    /// Use an already loaded configuration.
    pub fn with_config(config: Config, options: RuntimeOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the font, request the layout and run the event loop.
    pub fn run(self) -> Result<()> {
        let descriptor = FontDescriptor::parse(&self.config.font)
            .with_context(|| format!("parsing font descriptor '{}'", self.config.font))?;
        let font = SwashFont::load(&descriptor, self.config.dpi)
            .with_context(|| format!("loading font '{}'", self.config.font))?;
        log::info!(
            "Font: {} at {:.1}px",
            font.family(),
            font.px_size()
        );
        self.run_with_font(font)
    }

    /// Run the bar with any glyph source.
    pub fn run_with_font<G: GlyphSource>(self, font: G) -> Result<()> {
        let height = bar_height(self.config.height, font.metrics());
        let compositor = TextCompositor::new(font, self.config.foreground);
        log::debug!(
            "Bar height {}px, foreground {:#010x} (premultiplied ARGB)",
            height,
            compositor.foreground()
        );

        let mut surface = HeadlessSurface::new();
        if let Some(ref path) = self.options.snapshot {
            surface = surface.with_snapshot(path);
        }
        if let Some(frames) = self.options.frames {
            surface = surface.with_frame_limit(frames);
        }
        surface
            .request_layout(BarLayout {
                width: self.config.width,
                height,
                anchor: self.config.anchor,
                exclusive_zone: self.config.exclusive_zone.resolve(height),
            })
            .context("requesting bar layout")?;

        let source = if self.options.stdin {
            TextSource::stdin()
        } else {
            TextSource::new(SourceKind::from_config(&self.config.source))
        };

        let mut scheduler = BarScheduler::new(surface, compositor, self.config.exclusive_zone)
            .with_source(source);
        scheduler.run()?;

        if let Some(path) = self.options.snapshot.as_deref() {
            report_snapshot(path, scheduler.surface().frames_presented());
        }
        Ok(())
    }
}

fn report_snapshot(path: &Path, frames: u64) {
    if frames == 0 {
        log::warn!("No frame was presented, {:?} not written", path);
    } else {
        log::info!("Last of {} frames written to {:?}", frames, path);
    }
}
