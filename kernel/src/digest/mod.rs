//! Digest module: domain-separated SHA-256 content hashing.
//!
//! Depends on nothing else in the kernel. Paths, frontier snapshots and
//! harness reports are all fingerprinted through [`hash::canonical_hash`].

pub mod hash;
pub mod hash_domain;

pub use hash::{canonical_hash, ContentHash};
pub use hash_domain::HashDomain;
