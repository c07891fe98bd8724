//! Compressed key/value cache for computed build analyses.
//!
//! Values are serialized to JSON, gzip-compressed, and written with a
//! temp-file + atomic-rename discipline, so readers never observe a
//! partially-written entry. Used to avoid recomputing a build's analysis
//! once it has been derived from the raw artifacts.

pub mod error;
pub mod kvcache;
pub mod prelude;

pub use kvcache::KvCache;
