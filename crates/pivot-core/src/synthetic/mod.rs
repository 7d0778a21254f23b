//! Deterministic synthetic data generation helpers.
//!
//! These build pose sequences with a known tip offset and pivot for tests,
//! examples and identification studies. All randomness comes from an
//! explicit seed.
//!
//! # Example
//!
//! ```
//! use pivot_core::synthetic::pivot::{generate_pivot_poses, PivotScene, SyntheticPivotOptions};
//!
//! let scene = PivotScene::default();
//! let poses = generate_pivot_poses(&scene, &SyntheticPivotOptions::noiseless(5, 7));
//! assert_eq!(poses.len(), 5);
//! ```

pub mod pivot;
