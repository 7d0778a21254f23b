//! Synthetic flange poses pivoting around a fixed point.
//!
//! Every generated pose satisfies `R * (tip + e) + t = pivot`, where `e` is a
//! per-sample perturbation of the tip drawn uniformly from `[-noise, noise]^3`.

use crate::{Iso3, Real, Vec3};
use nalgebra::{Rotation3, Translation3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Ground truth for a synthetic pivot experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotScene {
    /// Tool tip in flange coordinates.
    pub tip_offset: Vec3,
    /// Stationary point in base coordinates.
    pub pivot: Vec3,
}

impl Default for PivotScene {
    fn default() -> Self {
        Self {
            tip_offset: Vec3::new(0.1, 0.05, 0.15),
            pivot: Vec3::new(0.5, 0.6, 0.7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPivotOptions {
    /// Number of poses to generate.
    pub num_poses: usize,
    /// Half-width of the uniform tip perturbation (same unit as the scene).
    pub noise: Real,
    /// Random-number generator seed (for reproducibility).
    pub seed: u64,
}

impl SyntheticPivotOptions {
    pub fn noiseless(num_poses: usize, seed: u64) -> Self {
        Self {
            num_poses,
            noise: 0.0,
            seed,
        }
    }
}

/// Generate `base_se3_flange` poses whose tip touches `scene.pivot`.
///
/// Orientations use roll/pitch/yaw angles drawn uniformly from `[0, 1)` rad,
/// which keeps the flange within a limited cone as a robot would.
pub fn generate_pivot_poses(scene: &PivotScene, options: &SyntheticPivotOptions) -> Vec<Iso3> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let noise = options.noise.abs();

    (0..options.num_poses)
        .map(|_| {
            let rot = Rotation3::from_euler_angles(
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
            );
            let perturbation = if noise > 0.0 {
                Vec3::new(
                    rng.random_range(-noise..=noise),
                    rng.random_range(-noise..=noise),
                    rng.random_range(-noise..=noise),
                )
            } else {
                Vec3::zeros()
            };
            let t = scene.pivot - rot * (scene.tip_offset + perturbation);
            Iso3::from_parts(Translation3::from(t), rot.into())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_pose;

    #[test]
    fn noiseless_poses_touch_pivot() {
        let scene = PivotScene::default();
        let poses = generate_pivot_poses(&scene, &SyntheticPivotOptions::noiseless(8, 42));
        assert_eq!(poses.len(), 8);
        for pose in &poses {
            let tip = apply_pose(pose, &scene.tip_offset);
            assert!((tip - scene.pivot).norm() < 1e-12);
        }
    }

    #[test]
    fn same_seed_same_poses() {
        let scene = PivotScene::default();
        let opts = SyntheticPivotOptions {
            num_poses: 4,
            noise: 0.01,
            seed: 3,
        };
        let a = generate_pivot_poses(&scene, &opts);
        let b = generate_pivot_poses(&scene, &opts);
        assert_eq!(a, b);

        let c = generate_pivot_poses(&scene, &SyntheticPivotOptions { seed: 4, ..opts });
        assert_ne!(a, c);
    }

    #[test]
    fn noise_is_bounded() {
        let scene = PivotScene::default();
        let noise = 0.005;
        let poses = generate_pivot_poses(
            &scene,
            &SyntheticPivotOptions {
                num_poses: 20,
                noise,
                seed: 11,
            },
        );
        // |R e| = |e| <= sqrt(3) * noise
        for pose in &poses {
            let err = (apply_pose(pose, &scene.tip_offset) - scene.pivot).norm();
            assert!(err <= 3.0_f64.sqrt() * noise + 1e-12);
        }
    }
}
