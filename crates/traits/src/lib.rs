//! Traits for the collaborators that live outside the resolution core.
//!
//! - [`FontCodec`]: turns compressed font containers into outline data
//! - [`RenderEngine`]: turns a document, its configuration and a font
//!   collection into output bytes
//! - [`FontStorage`]: durable key-value persistence for custom fonts
//!
//! The in-memory storage lives here too so that every environment (tests,
//! embedded hosts) has a working backend without touching the filesystem.

pub mod codec;
pub mod render;
pub mod storage;

pub use codec::{CodecError, FontCodec};
pub use render::{PDF_MAGIC, RenderEngine, RenderError};
pub use storage::{FontStorage, InMemoryFontStorage, StorageError};
