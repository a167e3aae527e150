//! Custom font storage for the fontweave pipeline.
//!
//! ## Available Pieces
//!
//! - [`CustomFontStore`]: quota-enforced record store shared by all jobs
//! - [`FilesystemFontStorage`]: durable backend writing one file pair per font
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory backend from fontweave-traits:
//! - [`InMemoryFontStorage`]: volatile storage for tests and embedded hosts

mod filesystem;
mod store;

pub use filesystem::FilesystemFontStorage;
pub use store::{CustomFontStore, StoreError, StoreStats};

pub use fontweave_traits::InMemoryFontStorage;
