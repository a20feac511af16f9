// src/cache/mod.rs

//! Content hashing and the content-addressed output cache.
//!
//! - [`digest`] defines [`Digest`], [`FileDigest`] and the task digest used as
//!   the cache key.
//! - [`hasher`] memoizes file digests for one drain and deduplicates
//!   concurrent reads of the same file.
//! - [`store`] copies declared outputs into and out of per-digest cache
//!   directories.

pub mod digest;
pub mod hasher;
pub mod store;

pub use digest::{Digest, FileDigest, path_digest, task_digest};
pub use hasher::ContentHasher;
pub use store::CacheStore;
