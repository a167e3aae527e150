//! Resolution of fonts the document needs from a remote font-serving API.
//!
//! A lookup goes stylesheet request → `src: url(...)` extraction → binary
//! fetch → optional container decoding → cache insert. Each network call is
//! time-bounded and the whole sequence runs under a [`RetryPolicy`] that only
//! retries transient failures.
//!
//! [`RetryPolicy`]: fontweave_retry::RetryPolicy

mod codec;
mod config;
mod error;
mod resolver;
pub mod stylesheet;

pub use codec::BuiltinCodec;
pub use config::RemoteConfig;
pub use error::{FontFetchError, ResolverBuildError};
pub use resolver::RemoteFontResolver;
