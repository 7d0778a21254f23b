//! Serializable flange pose records.
//!
//! Robot controllers report flange poses in several rotation conventions.
//! [`FlangePose`] accepts the common ones and converts them into an [`Iso3`]
//! (`base_se3_flange`) for the estimators.

use crate::{project_to_so3, Iso3, Mat3, Real, Vec3};
use nalgebra::{Quaternion, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted Frobenius distance between a supplied rotation matrix and
/// its SO(3) projection.
pub const MAX_ROTATION_DEVIATION: Real = 1e-3;

#[derive(Debug, Error, PartialEq)]
pub enum PoseError {
    #[error("rotation matrix is not orthonormal (deviation {deviation:.3e})")]
    NotARotation { deviation: Real },
    #[error("quaternion has zero norm")]
    ZeroQuaternion,
    #[error("pose contains non-finite values")]
    NonFinite,
}

/// Rotation part of a [`FlangePose`].
///
/// Serialized externally tagged, e.g. `{"rotation_vector": [0.0, 0.0, 1.57]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationRepr {
    /// Row-major 3×3 rotation matrix.
    Matrix([[Real; 3]; 3]),
    /// Quaternion `w + xi + yj + zk`; normalized on conversion.
    Quaternion { w: Real, x: Real, y: Real, z: Real },
    /// Axis scaled by angle in radians.
    RotationVector([Real; 3]),
}

/// A flange pose in base coordinates as read from a controller log.
///
/// # Example
///
/// ```
/// use pivot_core::{FlangePose, RotationRepr};
///
/// let pose = FlangePose {
///     translation: [0.4, 0.1, 0.3],
///     rotation: RotationRepr::RotationVector([0.0, 0.0, 0.0]),
/// };
/// let iso = pose.to_iso3().unwrap();
/// assert_eq!(iso.translation.vector.x, 0.4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlangePose {
    /// Flange origin in base coordinates.
    pub translation: [Real; 3],
    /// Flange orientation in base coordinates.
    pub rotation: RotationRepr,
}

impl FlangePose {
    /// Convert into a rigid transform.
    ///
    /// Matrices are projected onto SO(3); inputs further than
    /// [`MAX_ROTATION_DEVIATION`] from a rotation are rejected.
    pub fn to_iso3(&self) -> Result<Iso3, PoseError> {
        if !self.translation.iter().all(|v| v.is_finite()) || !self.rotation.is_finite() {
            return Err(PoseError::NonFinite);
        }

        let rotation = match self.rotation {
            RotationRepr::Matrix(rows) => {
                let m = Mat3::from_fn(|r, c| rows[r][c]);
                let r = project_to_so3(&m).ok_or(PoseError::NotARotation {
                    deviation: Real::INFINITY,
                })?;
                let deviation = (m - r).norm();
                if deviation > MAX_ROTATION_DEVIATION {
                    return Err(PoseError::NotARotation { deviation });
                }
                UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r))
            }
            RotationRepr::Quaternion { w, x, y, z } => {
                let q = Quaternion::new(w, x, y, z);
                if q.norm() <= Real::EPSILON {
                    return Err(PoseError::ZeroQuaternion);
                }
                UnitQuaternion::from_quaternion(q)
            }
            RotationRepr::RotationVector(v) => UnitQuaternion::from_scaled_axis(Vec3::from(v)),
        };

        let [x, y, z] = self.translation;
        Ok(Iso3::from_parts(Translation3::new(x, y, z), rotation))
    }

    /// Record a rigid transform using the matrix form.
    pub fn from_iso3(pose: &Iso3) -> Self {
        let m = pose.rotation.to_rotation_matrix().into_inner();
        let t = pose.translation.vector;
        Self {
            translation: [t.x, t.y, t.z],
            rotation: RotationRepr::Matrix([
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ]),
        }
    }
}

impl RotationRepr {
    fn is_finite(&self) -> bool {
        match self {
            RotationRepr::Matrix(rows) => rows.iter().flatten().all(|v| v.is_finite()),
            RotationRepr::Quaternion { w, x, y, z } => {
                [w, x, y, z].iter().all(|v| v.is_finite())
            }
            RotationRepr::RotationVector(v) => v.iter().all(|c| c.is_finite()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation_angle_between(a: &Iso3, b: &Iso3) -> Real {
        a.rotation.angle_to(&b.rotation)
    }

    #[test]
    fn rotation_forms_agree() {
        let axis_angle = Vec3::new(0.2, -0.4, 0.3);
        let q = UnitQuaternion::from_scaled_axis(axis_angle);

        let from_vector = FlangePose {
            translation: [0.1, 0.2, 0.3],
            rotation: RotationRepr::RotationVector([axis_angle.x, axis_angle.y, axis_angle.z]),
        }
        .to_iso3()
        .unwrap();

        let from_quat = FlangePose {
            translation: [0.1, 0.2, 0.3],
            rotation: RotationRepr::Quaternion {
                w: 2.0 * q.w,
                x: 2.0 * q.i,
                y: 2.0 * q.j,
                z: 2.0 * q.k,
            },
        }
        .to_iso3()
        .unwrap();

        let from_matrix = FlangePose::from_iso3(&from_vector).to_iso3().unwrap();

        assert!(rotation_angle_between(&from_vector, &from_quat) < 1e-12);
        assert!(rotation_angle_between(&from_vector, &from_matrix) < 1e-12);
        assert!((from_matrix.translation.vector - Vec3::new(0.1, 0.2, 0.3)).norm() < 1e-15);
    }

    #[test]
    fn rejects_non_rotation_matrix() {
        let pose = FlangePose {
            translation: [0.0; 3],
            rotation: RotationRepr::Matrix([[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
        };
        assert!(matches!(
            pose.to_iso3(),
            Err(PoseError::NotARotation { deviation }) if deviation > 0.5
        ));
    }

    #[test]
    fn rejects_zero_quaternion_and_nan() {
        let zero = FlangePose {
            translation: [0.0; 3],
            rotation: RotationRepr::Quaternion {
                w: 0.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        };
        assert_eq!(zero.to_iso3(), Err(PoseError::ZeroQuaternion));

        let nan = FlangePose {
            translation: [Real::NAN, 0.0, 0.0],
            rotation: RotationRepr::RotationVector([0.0; 3]),
        };
        assert_eq!(nan.to_iso3(), Err(PoseError::NonFinite));
    }

    #[test]
    fn json_uses_snake_case_tags() {
        let json = r#"{"translation":[1.0,2.0,3.0],"rotation":{"rotation_vector":[0.0,0.0,0.5]}}"#;
        let pose: FlangePose = serde_json::from_str(json).unwrap();
        assert_eq!(pose.rotation, RotationRepr::RotationVector([0.0, 0.0, 0.5]));
        let iso = pose.to_iso3().unwrap();
        assert!((iso.rotation.angle() - 0.5).abs() < 1e-12);
    }
}
