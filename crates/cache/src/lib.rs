//! Form cache for formwright.
//!
//! Assembled forms are memoized by a signature of the request (name, source
//! and options). A miss or a forced rebuild delegates to a
//! [`FormAssembler`](formwright_core::FormAssembler); failures are returned
//! to the caller and never cached.

pub mod cache;
pub mod key;

pub use cache::{CacheConfig, CacheStats, FormCache};
pub use key::CacheKey;
