// Library exports for testing and potential library use
//
// The bar is single-threaded: the event loop in `scheduler` owns every piece
// of mutable state and nothing is shared across threads. The one lock in the
// crate guards the log sink in `debug`, which any thread may write to.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod app;
pub mod cli;
pub mod line_reader;
pub mod scheduler;
pub mod source;
pub mod surface;
