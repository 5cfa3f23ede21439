//! End-to-end runs of the bar against the headless surface.

use linebar::app::App;
use linebar::cli::RuntimeOptions;
use linebar::scheduler::BarScheduler;
use linebar::source::TextSource;
use linebar::surface::{BarLayout, HeadlessSurface, PresentationSurface};
use linebar_config::{Anchor, Config, ExclusiveZone};
use linebar_fonts::testing::FixedGlyphSource;
use linebar_render::TextCompositor;

fn run_once_config(command: &str, width: u32) -> Config {
    let mut config = Config {
        width,
        ..Default::default()
    };
    config.source.command = command.to_string();
    config.source.respawn_interval_ms = None;
    config
}

fn headless(width: u32, height: u32, exclusive_zone: i32) -> HeadlessSurface {
    let mut surface = HeadlessSurface::new();
    surface
        .request_layout(BarLayout {
            width,
            height,
            anchor: Anchor::Top,
            exclusive_zone,
        })
        .unwrap();
    surface
}

fn white_box_font() -> TextCompositor<FixedGlyphSource> {
    TextCompositor::new(FixedGlyphSource::new(6), [0xff, 0xff, 0xff, 0xff])
}

#[test]
fn test_snapshot_of_last_line() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("bar.png");
    let options = RuntimeOptions {
        snapshot: Some(snapshot.clone()),
        ..Default::default()
    };

    App::with_config(run_once_config("printf 'one\\ntwo\\n'", 200), options)
        .run_with_font(FixedGlyphSource::new(6))
        .unwrap();

    let image = image::open(&snapshot).unwrap().to_rgba8();
    // Automatic height: ascent 8 + descent 2
    assert_eq!(image.dimensions(), (200, 10));
    // "two" is 18 px wide, drawn from x = 91; each box has a 1 px bearing
    let lit: Vec<u32> = (0..200)
        .filter(|&x| image.get_pixel(x, 5)[3] != 0)
        .collect();
    assert_eq!(lit.first(), Some(&92));
    assert_eq!(lit.last(), Some(&107));
}

#[test]
fn test_frame_limit_closes_bar() {
    let surface = headless(64, 12, 12).with_frame_limit(2);
    // Keeps producing lines; only the frame limit can end the run
    let source = TextSource::command("while :; do echo tick; sleep 0.01; done", None);
    let mut bar = BarScheduler::new(surface, white_box_font(), ExclusiveZone::BarHeight)
        .with_source(source);

    bar.run().unwrap();

    assert!(!bar.is_running());
    assert_eq!(bar.surface().frames_presented(), 2);
    assert_eq!(bar.surface().exclusive_zone(), 12);
    assert_eq!(bar.surface().last_ack(), Some(1));
}

#[test]
fn test_overlong_line_never_shows() {
    let command = format!("echo {}; echo short", "x".repeat(300));
    let mut bar = BarScheduler::new(headless(100, 10, 0), white_box_font(), ExclusiveZone::Off)
        .with_source(TextSource::command(command, None));

    bar.run().unwrap();

    assert_eq!(bar.last_line().as_bytes(), b"short");
}

#[test]
fn test_malformed_line_still_presents() {
    let mut bar = BarScheduler::new(headless(100, 10, 0), white_box_font(), ExclusiveZone::Off)
        .with_source(TextSource::command("printf 'ok\\377bad\\n'", None));

    bar.run().unwrap();

    assert_eq!(bar.last_line().as_bytes(), b"ok\xffbad");
    let pixels = bar.surface().presented().unwrap().read_pixels().unwrap();
    assert!(pixels.iter().any(|&p| p != 0));
}
