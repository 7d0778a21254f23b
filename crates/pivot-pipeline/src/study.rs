//! Identification error vs. number of poses on synthetic data.
//!
//! For every pose count in `min_poses..max_poses`, runs `repetitions`
//! seeded trials with uniform tip noise and aggregates the Euclidean errors
//! of the recovered tip offset and pivot.

use crate::PipelineError;
use log::debug;
use pivot_core::synthetic::pivot::{generate_pivot_poses, PivotScene, SyntheticPivotOptions};
use pivot_core::Real;
use pivot_linear::{PivotCalibrator, PivotOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentificationStudyConfig {
    /// Smallest pose count (inclusive), at least 2.
    pub min_poses: usize,
    /// Largest pose count (exclusive).
    pub max_poses: usize,
    /// Trials per pose count.
    pub repetitions: usize,
    /// Half-width of the uniform tip noise.
    pub noise: Real,
    /// Base seed; trial seeds are derived from it.
    pub seed: u64,
    pub scene: PivotScene,
    pub options: PivotOptions,
}

impl Default for IdentificationStudyConfig {
    fn default() -> Self {
        Self {
            min_poses: 3,
            max_poses: 10,
            repetitions: 100,
            noise: 0.005,
            seed: 0,
            scene: PivotScene::default(),
            options: PivotOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentificationRow {
    pub num_poses: usize,
    pub mean_tip_error: Real,
    pub max_tip_error: Real,
    pub mean_pivot_error: Real,
}

pub fn run_identification_study(
    config: &IdentificationStudyConfig,
) -> Result<Vec<IdentificationRow>, PipelineError> {
    if config.min_poses < 2 {
        return Err(PipelineError::InvalidStudy(format!(
            "min_poses must be at least 2, got {}",
            config.min_poses
        )));
    }
    if config.max_poses <= config.min_poses {
        return Err(PipelineError::InvalidStudy(format!(
            "empty pose range {}..{}",
            config.min_poses, config.max_poses
        )));
    }
    if config.repetitions == 0 {
        return Err(PipelineError::InvalidStudy(
            "repetitions must be positive".to_string(),
        ));
    }

    let calibrator = PivotCalibrator::new(config.options);
    let mut rows = Vec::with_capacity(config.max_poses - config.min_poses);

    for num_poses in config.min_poses..config.max_poses {
        let mut tip_sum = 0.0;
        let mut tip_max: Real = 0.0;
        let mut pivot_sum = 0.0;

        for rep in 0..config.repetitions {
            let seed = trial_seed(config.seed, num_poses, rep);
            let poses = generate_pivot_poses(
                &config.scene,
                &SyntheticPivotOptions {
                    num_poses,
                    noise: config.noise,
                    seed,
                },
            );
            let est = calibrator.calibrate(&poses)?;

            let tip_err = (est.tip_offset - config.scene.tip_offset).norm();
            tip_sum += tip_err;
            tip_max = tip_max.max(tip_err);
            pivot_sum += (est.pivot - config.scene.pivot).norm();
        }

        let reps = config.repetitions as Real;
        let row = IdentificationRow {
            num_poses,
            mean_tip_error: tip_sum / reps,
            max_tip_error: tip_max,
            mean_pivot_error: pivot_sum / reps,
        };
        debug!("identification study: {row:?}");
        rows.push(row);
    }

    Ok(rows)
}

#[inline]
fn trial_seed(base: u64, num_poses: usize, rep: usize) -> u64 {
    base ^ (num_poses as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (rep as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_cover_requested_range() {
        let config = IdentificationStudyConfig {
            min_poses: 3,
            max_poses: 6,
            repetitions: 5,
            ..Default::default()
        };
        let rows = run_identification_study(&config).unwrap();
        let counts: Vec<_> = rows.iter().map(|r| r.num_poses).collect();
        assert_eq!(counts, vec![3, 4, 5]);
        for row in &rows {
            assert!(row.mean_tip_error <= row.max_tip_error);
            assert!(row.mean_tip_error > 0.0);
        }
    }

    #[test]
    fn noiseless_study_has_no_error() {
        let config = IdentificationStudyConfig {
            noise: 0.0,
            repetitions: 3,
            ..Default::default()
        };
        for row in run_identification_study(&config).unwrap() {
            assert!(row.max_tip_error < 1e-9, "{row:?}");
            assert!(row.mean_pivot_error < 1e-9, "{row:?}");
        }
    }

    #[test]
    fn study_is_reproducible() {
        let config = IdentificationStudyConfig {
            repetitions: 4,
            max_poses: 5,
            ..Default::default()
        };
        assert_eq!(
            run_identification_study(&config).unwrap(),
            run_identification_study(&config).unwrap()
        );
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        for config in [
            IdentificationStudyConfig {
                min_poses: 1,
                ..Default::default()
            },
            IdentificationStudyConfig {
                min_poses: 5,
                max_poses: 5,
                ..Default::default()
            },
            IdentificationStudyConfig {
                repetitions: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                run_identification_study(&config),
                Err(PipelineError::InvalidStudy(_))
            ));
        }
    }
}
