//! Foundation types shared by every fontweave crate.
//!
//! Nothing in here performs I/O. The types describe *which* fonts a document
//! needs ([`FontRequirement`]), how they are keyed ([`FontKey`]), where the
//! bytes come from ([`FontOrigin`], [`CustomFontRecord`]) and what the render
//! boundary finally receives ([`FontCollection`], [`ConversionConfig`]).

pub mod collection;
pub mod container;
pub mod conversion;
pub mod font;
pub mod kind;
pub mod record;
pub mod requirement;

pub use collection::{FontCollection, FontEntry};
pub use container::ContainerFormat;
pub use conversion::{ConversionConfig, PageSize};
pub use font::{FontStyle, FontWeight, normalize_family};
pub use kind::ErrorKind;
pub use record::{CustomFontRecord, FontDataError};
pub use requirement::{FontKey, FontOrigin, FontRequirement};

/// Shared font binary (reference-counted bytes).
pub type SharedFontData = std::sync::Arc<Vec<u8>>;
