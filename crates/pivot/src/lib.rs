//! High-level entry crate for the pivot calibration toolbox.
//!
//! Pivot calibration finds a tool tip fixed in a robot flange (or tracked
//! marker body) by recording flange poses while the tip rests in a single
//! divot. This crate re-exports the building blocks:
//!
//! ```
//! use pivot::core::synthetic::pivot::{generate_pivot_poses, PivotScene, SyntheticPivotOptions};
//! use pivot::linear::estimate_pivot;
//!
//! # fn main() -> anyhow::Result<()> {
//! let scene = PivotScene::default();
//! let poses = generate_pivot_poses(&scene, &SyntheticPivotOptions::noiseless(5, 3));
//!
//! let est = estimate_pivot(&poses)?;
//! println!("tip {:?}, pivot {:?}", est.tip_offset, est.pivot);
//! assert!(est.diagnostics.residual_rms < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: Math types, pose records, synthetic data
//! - **[`linear`]**: Closed-form pivot estimation
//! - **[`pipeline`]**: JSON-facing runs and identification studies
//! - **[`prelude`]**: Convenient re-exports for common use cases

/// Core math types, pose records and synthetic data.
pub mod core {
    pub use pivot_core::*;
}

/// Closed-form (Algebraic Two Step) pivot estimation.
pub mod linear {
    pub use pivot_linear::*;
}

/// Serializable inputs, reports and identification studies.
pub mod pipeline {
    pub use pivot_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use pivot::prelude::*;` to get started quickly.
pub mod prelude {
    pub use crate::core::{FlangePose, Iso3, Real, RotationRepr, Vec3};
    pub use crate::linear::{
        estimate_pivot, DegeneracyPolicy, PivotCalibrator, PivotEstimate, PivotOptions,
    };
    pub use crate::pipeline::{
        run_pivot_calibration, PivotCalibrationConfig, PivotCalibrationInput,
        PivotCalibrationReport,
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn prelude_covers_a_calibration() {
        let ft = Vec3::new(0.0, 0.0, 0.1);
        let bt = Vec3::new(0.3, 0.0, 0.2);
        let poses: Vec<Iso3> = [
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::new(0.3, -0.2, 0.1),
            Vec3::new(0.6, 0.4, -0.3),
        ]
        .iter()
        .map(|axis_angle| {
            let mut pose = Iso3::new(Vec3::zeros(), *axis_angle);
            pose.translation.vector = bt - pose.rotation * ft;
            pose
        })
        .collect();

        let est = PivotCalibrator::new(PivotOptions {
            degeneracy: DegeneracyPolicy::Reject,
            ..Default::default()
        })
        .calibrate(&poses)
        .unwrap();
        assert!((est.tip_offset - ft).norm() < 1e-9);
        assert!((est.pivot - bt).norm() < 1e-9);
    }
}
