//! Core geometry primitives for the pivot calibration toolbox.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Mat3`, `Iso3`, ...),
//! - serializable flange pose records ([`FlangePose`]) and their conversion
//!   to rigid transforms,
//! - deterministic synthetic pose generators for tests and studies.
//!
//! Poses follow the `base_se3_flange` convention: each [`Iso3`] maps points
//! expressed in the moving (flange) frame into the fixed base frame.

/// Linear algebra type aliases and helpers.
pub mod math;
/// Synthetic pivot data generation.
pub mod synthetic;
/// Serializable input records.
pub mod types;

pub use math::*;
pub use types::*;
