//! Neurite Kernel: the image-side foundation of the neurite tracer.
//!
//! # API Surface
//!
//! - [`volume::VolumetricCostField`] -- per-voxel movement cost and physical
//!   spacing over an immutable [`volume::ImageStack`]
//! - [`volume::CostFn`] -- pluggable cost strategies (reciprocal, inverted,
//!   precomputed measure, or any closure)
//! - [`digest::canonical_hash`] -- domain-separated SHA-256 fingerprints
//!
//! # Module Dependency Direction
//!
//! `error` ← `volume`; `digest` is standalone.
//!
//! Nothing here knows about searches. The search crate consumes the field
//! through its public accessors only.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod digest;
pub mod error;
pub mod volume;

pub use error::FieldError;
