//! CMS command-line support
//!
//! Pieces behind the `cms` binary, kept in a library so they can be tested:
//! - [`logging`]: `tracing-subscriber` bootstrap
//! - [`scenario`]: the create-then-reorder walkthrough

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod logging;
pub mod scenario;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
