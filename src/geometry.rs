//! # Geometry primitives
//!
//! Small vector helpers and the least-squares intersection of many 3-D lines used
//! by every estimator of the stereoscopic reconstruction.
//!
//! ## Line intersection
//!
//! For `N` lines `p = pᵢ + t·dᵢ` (unit `dᵢ`), the point minimizing the total squared
//! perpendicular distance solves
//!
//! ```text
//! S x = C,   S = Σ (dᵢdᵢᵀ − I),   C = Σ (dᵢdᵢᵀ − I) pᵢ
//! ```
//!
//! `S` is negative semi-definite and loses rank when all directions are parallel,
//! so the solver checks the eigenvalue spread of `S` before solving and reports
//! [`StereoFitError::SingularIntersection`] instead of returning a meaningless point.
use nalgebra::{Matrix3, Vector3};

use crate::constants::Radian;
use crate::stereofit_errors::StereoFitError;

/// Default minimum ratio `min|λ| / max|λ|` accepted by [`intersect_lines_3d`].
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-10;

/// Scale a vector to unit length without changing its direction.
///
/// A zero vector has no direction: it is returned unchanged instead of producing NaNs.
#[inline]
pub fn normalize(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm == 0.0 {
        *v
    } else {
        v / norm
    }
}

/// Angle between two vectors, in `[0, π]`.
///
/// The cosine is clipped to `[-1, 1]` so that rounding on (anti-)parallel vectors
/// never takes `acos` out of its domain.
#[inline]
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Radian {
    let norm = v1.norm() * v2.norm();
    (v1.dot(v2) / norm).clamp(-1.0, 1.0).acos()
}

/// Least-squares intersection point of many lines in 3-D.
///
/// Arguments
/// -----------------
/// * `directions`: direction of each line; normalized internally.
/// * `origins`: one point on each line, same order as `directions`.
/// * `singular_tolerance`: minimum accepted ratio between the smallest and the largest
///   eigenvalue magnitude of `S`.
///
/// Return
/// ----------
/// * The point minimizing the sum of squared perpendicular distances to all lines.
///
/// Errors
/// ----------
/// * [`StereoFitError::LengthMismatch`] if the two slices differ in length.
/// * [`StereoFitError::TooFewInputs`] for fewer than two lines.
/// * [`StereoFitError::SingularIntersection`] if the lines are (nearly) all parallel.
pub fn intersect_lines_3d(
    directions: &[Vector3<f64>],
    origins: &[Vector3<f64>],
    singular_tolerance: f64,
) -> Result<Vector3<f64>, StereoFitError> {
    if directions.len() != origins.len() {
        return Err(StereoFitError::LengthMismatch {
            directions: directions.len(),
            origins: origins.len(),
        });
    }
    if directions.len() < 2 {
        return Err(StereoFitError::TooFewInputs(directions.len()));
    }

    let (s, c) = directions.iter().zip(origins).fold(
        (Matrix3::zeros(), Vector3::zeros()),
        |(s, c), (dir, pos)| {
            let n = normalize(dir);
            let norm_matrix = n * n.transpose() - Matrix3::identity();
            (s + norm_matrix, c + norm_matrix * pos)
        },
    );

    let eigenvalues = s.symmetric_eigenvalues().map(f64::abs);
    let condition = eigenvalues.min() / eigenvalues.max();
    if !(condition.is_finite() && condition > singular_tolerance) {
        return Err(StereoFitError::SingularIntersection { condition });
    }

    s.lu()
        .solve(&c)
        .ok_or(StereoFitError::SingularIntersection { condition })
}
