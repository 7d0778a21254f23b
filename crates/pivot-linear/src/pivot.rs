//! Tool-tip pivot calibration using the "Algebraic Two Step" method.
//!
//! A tip point `Ft` fixed in the flange touches the same base point `Bt` in
//! every sample `^B T_F,i = [Ri, ti]`, so for all `i != j`
//!
//! ```text
//! Ri Ft + ti = Bt = Rj Ft + tj   =>   (Ri - Rj) Ft = tj - ti
//! ```
//!
//! Stacking every pair gives an over-determined system `A Ft = b` that is
//! solved with the Moore–Penrose pseudoinverse. `Bt` is then the mean of
//! `Ri Ft + ti` over all samples.
//!
//! Reference: Z. Yaniv, "Which pivot calibration?", Proc. SPIE 9415, 2015.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use pivot_core::{apply_pose, rotation_matrix, translation, Iso3, Mat3, Real, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PivotError {
    #[error("need at least 2 poses, got {got}")]
    InsufficientData { got: usize },
    #[error("linear system has no equations")]
    EmptySystem,
    #[error("degenerate pivot geometry: rank {rank}, condition number {condition_number:?}")]
    DegenerateGeometry {
        rank: usize,
        condition_number: Option<Real>,
    },
    #[error("svd failed during pivot estimation")]
    SvdFailed,
    #[error("pose {index} contains non-finite values")]
    NonFinitePose { index: usize },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// What to do when the stacked system is rank deficient or ill-conditioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneracyPolicy {
    /// Return the minimum-norm estimate silently.
    Ignore,
    /// Return the estimate and log a warning.
    #[default]
    Warn,
    /// Fail with [`PivotError::DegenerateGeometry`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotOptions {
    /// Relative cutoff for small singular values in the pseudoinverse.
    pub rcond: Real,
    /// Largest condition number of `A` accepted as well-posed.
    pub max_condition: Real,
    /// Action taken when the geometry does not constrain all tip coordinates.
    pub degeneracy: DegeneracyPolicy,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            rcond: 1e-15,
            max_condition: 1e8,
            degeneracy: DegeneracyPolicy::Warn,
        }
    }
}

impl PivotOptions {
    fn validate(&self) -> Result<(), PivotError> {
        if !self.rcond.is_finite() || self.rcond < 0.0 {
            return Err(PivotError::InvalidOptions(format!(
                "rcond must be finite and non-negative, got {}",
                self.rcond
            )));
        }
        if self.max_condition.is_nan() || self.max_condition <= 0.0 {
            return Err(PivotError::InvalidOptions(format!(
                "max_condition must be positive, got {}",
                self.max_condition
            )));
        }
        Ok(())
    }
}

/// Unordered pair of distinct pose indices, stored with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosePair {
    pub i: usize,
    pub j: usize,
}

/// Enumerate all `C(n, 2)` pairs in lexicographic order.
pub fn pose_pairs(num_poses: usize) -> Vec<PosePair> {
    let mut pairs = Vec::with_capacity(num_poses * num_poses.saturating_sub(1) / 2);
    for i in 0..num_poses.saturating_sub(1) {
        for j in (i + 1)..num_poses {
            pairs.push(PosePair { i, j });
        }
    }
    pairs
}

/// Stacked linear system `A Ft = b`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSystem {
    /// `3 * pairs x 3`, block `k` is `Ri - Rj`.
    pub a: DMatrix<Real>,
    /// `3 * pairs`, block `k` is `tj - ti`.
    pub b: DVector<Real>,
}

impl PivotSystem {
    /// Number of scalar equations (rows).
    pub fn num_equations(&self) -> usize {
        self.a.nrows()
    }
}

/// Build `A` and `b` from the given pairs.
///
/// Note the index order: rotations enter as `Ri - Rj`, translations as
/// `tj - ti`. Both are stacked in `pairs` order.
pub fn assemble_system(poses: &[Iso3], pairs: &[PosePair]) -> PivotSystem {
    let rotations: Vec<Mat3> = poses.iter().map(rotation_matrix).collect();
    let translations: Vec<Vec3> = poses.iter().map(translation).collect();

    let mut a = DMatrix::<Real>::zeros(3 * pairs.len(), 3);
    let mut b = DVector::<Real>::zeros(3 * pairs.len());

    for (idx, pair) in pairs.iter().enumerate() {
        let row = 3 * idx;
        a.view_mut((row, 0), (3, 3))
            .copy_from(&(rotations[pair.i] - rotations[pair.j]));
        b.rows_mut(row, 3)
            .copy_from(&(translations[pair.j] - translations[pair.i]));
    }

    PivotSystem { a, b }
}

/// Least-squares solution of a [`PivotSystem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipSolution {
    pub tip_offset: Vec3,
    /// Singular values of `A`, descending.
    pub singular_values: [Real; 3],
    /// Singular values above `rcond * sigma_max`.
    pub rank: usize,
}

/// Solve `Ft = pinv(A) b`.
///
/// Singular values at or below `rcond * sigma_max` are treated as zero, so a
/// rank-deficient system yields the minimum-norm solution.
pub fn solve_tip_offset(system: &PivotSystem, rcond: Real) -> Result<TipSolution, PivotError> {
    if system.num_equations() == 0 {
        return Err(PivotError::EmptySystem);
    }

    let svd = system.a.clone().svd(true, true);

    let mut singular_values = [0.0; 3];
    for (dst, s) in singular_values.iter_mut().zip(svd.singular_values.iter()) {
        *dst = *s;
    }
    singular_values.sort_by(|a, b| b.total_cmp(a));

    let cutoff = rcond * singular_values[0];
    let rank = singular_values.iter().filter(|&&s| s > cutoff).count();

    let pinv = svd
        .pseudo_inverse(cutoff)
        .map_err(|_| PivotError::SvdFailed)?;
    let x = pinv * &system.b;

    Ok(TipSolution {
        tip_offset: Vec3::new(x[0], x[1], x[2]),
        singular_values,
        rank,
    })
}

/// Per-sample pivot reconstructions `Ri Ft + ti`, in input order.
pub fn pivot_reconstructions(poses: &[Iso3], tip_offset: &Vec3) -> Vec<Vec3> {
    poses.iter().map(|p| apply_pose(p, tip_offset)).collect()
}

/// Mean of [`pivot_reconstructions`] over every pose.
///
/// Returns zero for an empty slice.
pub fn average_pivot(poses: &[Iso3], tip_offset: &Vec3) -> Vec3 {
    mean_point(&pivot_reconstructions(poses, tip_offset))
}

fn mean_point(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    points.iter().fold(Vec3::zeros(), |acc, p| acc + p) / points.len() as Real
}

fn is_finite_pose(pose: &Iso3) -> bool {
    pose.translation.vector.iter().all(|v| v.is_finite())
        && pose.rotation.coords.iter().all(|v| v.is_finite())
}

/// Quality measures reported alongside an estimate. They never alter it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotDiagnostics {
    pub num_poses: usize,
    pub num_pairs: usize,
    /// Singular values of `A`, descending.
    pub singular_values: [Real; 3],
    pub rank: usize,
    /// `sigma_max / sigma_min`; `None` when `sigma_min` is zero.
    pub condition_number: Option<Real>,
    /// RMS of `A Ft - b` per scalar equation.
    pub residual_rms: Real,
    /// RMS distance of per-sample reconstructions from the pivot.
    pub pivot_rms: Real,
}

impl PivotDiagnostics {
    /// `true` when the geometry does not pin down all three tip coordinates.
    pub fn is_degenerate(&self, max_condition: Real) -> bool {
        match self.condition_number {
            Some(cond) => self.rank < 3 || cond > max_condition,
            None => true,
        }
    }
}

/// Result of a pivot calibration: tip offset, pivot and the quality measures
/// of the stacked system they were solved from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotEstimate {
    /// `Ft`: tool tip in flange coordinates.
    pub tip_offset: Vec3,
    /// `Bt`: pivot point in base coordinates.
    pub pivot: Vec3,
    pub diagnostics: PivotDiagnostics,
}

/// Closed-form pivot calibration.
///
/// # Example
///
/// ```
/// use pivot_core::synthetic::pivot::{generate_pivot_poses, PivotScene, SyntheticPivotOptions};
/// use pivot_linear::{PivotCalibrator, PivotOptions};
///
/// let scene = PivotScene::default();
/// let poses = generate_pivot_poses(&scene, &SyntheticPivotOptions::noiseless(6, 1));
///
/// let est = PivotCalibrator::new(PivotOptions::default())
///     .calibrate(&poses)
///     .unwrap();
/// assert!((est.tip_offset - scene.tip_offset).norm() < 1e-9);
/// assert!((est.pivot - scene.pivot).norm() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotCalibrator {
    pub options: PivotOptions,
}

impl PivotCalibrator {
    pub fn new(options: PivotOptions) -> Self {
        Self { options }
    }

    /// Estimate tip offset and pivot from `base_se3_flange` poses.
    ///
    /// Orientation diversity is the caller's responsibility; poorly spread
    /// samples are only flagged according to [`DegeneracyPolicy`]. Poses with
    /// NaN or infinite components are rejected with
    /// [`PivotError::NonFinitePose`].
    pub fn calibrate(&self, base_se3_flange: &[Iso3]) -> Result<PivotEstimate, PivotError> {
        self.options.validate()?;

        let num_poses = base_se3_flange.len();
        if num_poses < 2 {
            return Err(PivotError::InsufficientData { got: num_poses });
        }
        if let Some(index) = base_se3_flange.iter().position(|p| !is_finite_pose(p)) {
            return Err(PivotError::NonFinitePose { index });
        }

        let pairs = pose_pairs(num_poses);
        let system = assemble_system(base_se3_flange, &pairs);
        debug!(
            "pivot calibration: {} poses, {} pairs, {} equations",
            num_poses,
            pairs.len(),
            system.num_equations()
        );

        let solution = solve_tip_offset(&system, self.options.rcond)?;
        let tip_offset = solution.tip_offset;

        let points = pivot_reconstructions(base_se3_flange, &tip_offset);
        let pivot = mean_point(&points);

        let residual = &system.a * tip_offset - &system.b;
        let residual_rms = (residual.norm_squared() / system.num_equations() as Real).sqrt();
        let pivot_rms = (points
            .iter()
            .map(|p| (p - pivot).norm_squared())
            .sum::<Real>()
            / num_poses as Real)
            .sqrt();

        let [s_max, _, s_min] = solution.singular_values;
        let condition_number = (s_min > 0.0).then(|| s_max / s_min);

        let diagnostics = PivotDiagnostics {
            num_poses,
            num_pairs: pairs.len(),
            singular_values: solution.singular_values,
            rank: solution.rank,
            condition_number,
            residual_rms,
            pivot_rms,
        };
        debug!(
            "pivot calibration: tip {:?}, pivot {:?}, rank {}, residual rms {:.3e}",
            tip_offset.as_slice(),
            pivot.as_slice(),
            diagnostics.rank,
            residual_rms
        );

        if diagnostics.is_degenerate(self.options.max_condition) {
            match self.options.degeneracy {
                DegeneracyPolicy::Ignore => {}
                DegeneracyPolicy::Warn => warn!(
                    "pivot geometry is degenerate (rank {}, condition {:?}); \
                     vary the flange orientation more",
                    diagnostics.rank, diagnostics.condition_number
                ),
                DegeneracyPolicy::Reject => {
                    return Err(PivotError::DegenerateGeometry {
                        rank: diagnostics.rank,
                        condition_number: diagnostics.condition_number,
                    })
                }
            }
        }

        Ok(PivotEstimate {
            tip_offset,
            pivot,
            diagnostics,
        })
    }
}

/// Pivot calibration with default [`PivotOptions`].
pub fn estimate_pivot(base_se3_flange: &[Iso3]) -> Result<PivotEstimate, PivotError> {
    PivotCalibrator::default().calibrate(base_se3_flange)
}
