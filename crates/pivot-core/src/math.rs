//! Type aliases and small rigid-motion helpers.

use nalgebra::{Isometry3, Matrix3, Point3, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Rotation part of a pose as a plain 3×3 matrix.
#[inline]
pub fn rotation_matrix(pose: &Iso3) -> Mat3 {
    *pose.rotation.to_rotation_matrix().matrix()
}

/// Translation part of a pose as a vector.
#[inline]
pub fn translation(pose: &Iso3) -> Vec3 {
    pose.translation.vector
}

/// Apply a pose to a flange-local point: `R * p + t`.
#[inline]
pub fn apply_pose(pose: &Iso3, local: &Vec3) -> Vec3 {
    pose.transform_point(&Pt3::from(*local)).coords
}

/// Project a general 3x3 matrix to the closest rotation matrix (SO(3))
/// using SVD.
///
/// Returns `None` if the decomposition does not produce `U` and `V^T`.
pub fn project_to_so3(m: &Mat3) -> Option<Mat3> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;

    // Ensure det(R) > 0
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r = u_flipped * v_t;
    }
    Some(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Translation3};

    #[test]
    fn apply_pose_rotates_then_translates() {
        let rot = Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let pose = Iso3::from_parts(Translation3::new(1.0, 2.0, 3.0), rot.into());

        let p = apply_pose(&pose, &Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 3.0, 3.0)).norm() < 1e-12);

        let manual = rotation_matrix(&pose) * Vec3::new(1.0, 0.0, 0.0) + translation(&pose);
        assert!((p - manual).norm() < 1e-12);
    }

    #[test]
    fn project_to_so3_fixes_scaled_rotation() {
        let rot = *Rotation3::from_euler_angles(0.3, -0.2, 0.1).matrix();
        let projected = project_to_so3(&(rot * 1.5)).unwrap();
        assert!((projected - rot).norm() < 1e-12);
        assert!((projected.determinant() - 1.0).abs() < 1e-12);
    }
}
