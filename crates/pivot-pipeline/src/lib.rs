//! Serializable entry points for pivot calibration.
//!
//! [`run_pivot_calibration`] turns a JSON-friendly [`PivotCalibrationInput`]
//! into a [`PivotCalibrationReport`]. The [`study`] module reproduces the
//! classic "identification error vs. number of poses" experiment on
//! synthetic data.

pub mod study;

pub use study::{run_identification_study, IdentificationRow, IdentificationStudyConfig};

use log::info;
use pivot_core::{FlangePose, Iso3, PoseError, Real};
use pivot_linear::{PivotCalibrator, PivotDiagnostics, PivotError, PivotOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("pose {index}: {source}")]
    Pose {
        index: usize,
        #[source]
        source: PoseError,
    },
    #[error(transparent)]
    Pivot(#[from] PivotError),
    #[error("invalid study configuration: {0}")]
    InvalidStudy(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotCalibrationConfig {
    pub options: PivotOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotCalibrationInput {
    /// `base_se3_flange` samples, in acquisition order.
    pub poses: Vec<FlangePose>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotCalibrationReport {
    /// Tool tip in flange coordinates.
    pub tip_offset: [Real; 3],
    /// Pivot point in base coordinates.
    pub pivot: [Real; 3],
    pub diagnostics: PivotDiagnostics,
}

impl PivotCalibrationInput {
    /// Convert all records to rigid transforms, failing on the first bad one.
    pub fn to_isometries(&self) -> Result<Vec<Iso3>, PipelineError> {
        self.poses
            .iter()
            .enumerate()
            .map(|(index, pose)| {
                pose.to_iso3()
                    .map_err(|source| PipelineError::Pose { index, source })
            })
            .collect()
    }
}

pub fn run_pivot_calibration(
    input: &PivotCalibrationInput,
    config: &PivotCalibrationConfig,
) -> Result<PivotCalibrationReport, PipelineError> {
    let poses = input.to_isometries()?;
    let est = PivotCalibrator::new(config.options).calibrate(&poses)?;

    info!(
        "pivot calibration from {} poses: pivot rms {:.3e}, rank {}",
        est.diagnostics.num_poses, est.diagnostics.pivot_rms, est.diagnostics.rank
    );

    Ok(PivotCalibrationReport {
        tip_offset: est.tip_offset.into(),
        pivot: est.pivot.into(),
        diagnostics: est.diagnostics,
    })
}
