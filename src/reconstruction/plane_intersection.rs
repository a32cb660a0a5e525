//! # Plane-intersection reconstruction
//!
//! Geometric stereo reconstruction from the great-circle planes of each telescope.
//!
//! ## Estimators
//!
//! * **Direction** – the viewing planes of two telescopes cross along a line through the
//!   origin pointing (approximately) at the shower source. All pairwise crossings, folded
//!   to the upper hemisphere and weighted by the product of the plane weights, are summed
//!   and normalized.
//! * **Core position** – in the ground frame tilted towards the array pointing, each
//!   telescope sees the impact point along its image major axis. The least-squares
//!   crossing of those lines is projected back onto the ground.
//! * **Shower maximum** – the lines from every telescope towards its image centroid
//!   converge near the shower maximum; its distance from the array centre is returned.
//!
//! See also
//! ------------
//! * [`crate::geometry::intersect_lines_3d`] – least-squares line crossing shared by
//!   the core and shower-maximum estimators.
//! * [`crate::reconstruction::viewing_plane`] – construction of the planes and of the
//!   divergent-pointing axis angles.
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::Vector3;

use crate::constants::{HillasMap, Meter, PointingMap, Radian, EPS};
use crate::geometry::{angle_between, intersect_lines_3d, normalize};
use crate::instrument::subarray::SubarrayDescription;
use crate::reconstruction::reconstruction_result::ReconstructionResult;
use crate::reconstruction::viewing_plane::{pointing_mode, ReconstructionScope};
use crate::reconstruction::{ErrorWeighting, ReconParams, ShowerReconstructor};
use crate::ref_system::{AltAz, TiltedGroundFrame};
use crate::stereofit_errors::StereoFitError;

/// Arrival direction from the pairwise crossings of the viewing planes.
///
/// Return
/// ----------
/// * `(direction, uncertainty)`: unit vector in the ground frame, and the weighted mean
///   angle `[rad]` between it and every unweighted pairwise crossing.
///
/// Remarks
/// -------
/// * Nearly coincident planes give a near-zero sum; the direction is then unreliable
///   but still returned, and the uncertainty reflects it.
/// * A sum of exactly zero (e.g. every image with zero intensity) has no direction:
///   both the direction and the uncertainty come out as NaN.
///
/// Errors
/// ----------
/// * [`StereoFitError::TooFewInputs`] for fewer than two planes.
pub fn estimate_direction(
    scope: &ReconstructionScope,
    weighting: ErrorWeighting,
) -> Result<(Vector3<f64>, Radian), StereoFitError> {
    if scope.planes.len() < 2 {
        return Err(StereoFitError::TooFewInputs(scope.planes.len()));
    }

    let crossings: Vec<(Vector3<f64>, f64)> = scope
        .planes
        .values()
        .tuple_combinations()
        .map(|(p1, p2)| {
            let crossing = p1.norm.cross(&p2.norm);
            let crossing = if crossing.z < 0.0 { -crossing } else { crossing };
            (crossing, p1.weight * p2.weight)
        })
        .collect();

    let weighted_sum: Vector3<f64> = crossings
        .iter()
        .map(|(crossing, weight)| crossing * *weight)
        .sum();
    let sum_norm = weighted_sum.norm();
    if sum_norm < EPS {
        warn!(
            "weighted plane crossing sum is {sum_norm:.3e}; viewing planes are nearly coincident"
        );
    }
    if !(sum_norm.is_finite() && sum_norm > 0.0) {
        return Ok((Vector3::repeat(f64::NAN), f64::NAN));
    }
    let direction = normalize(&weighted_sum);

    let (angle_sum, weight_sum) = crossings.iter().fold(
        (0.0, 0.0),
        |(angle_sum, weight_sum), (crossing, pair_weight)| {
            let weight = match weighting {
                ErrorWeighting::ComponentCount => crossing.len() as f64,
                ErrorWeighting::PairWeight => *pair_weight,
            };
            (
                angle_sum + weight * angle_between(&direction, crossing),
                weight_sum + weight,
            )
        },
    );

    let uncertainty = if weight_sum > 0.0 {
        angle_sum / weight_sum
    } else {
        f64::NAN
    };
    Ok((direction, uncertainty))
}

/// Impact point on the ground from the image major axes.
///
/// Each telescope contributes the tilted-frame line through its position with direction
/// `(cos ψ, sin ψ, 0)`, ψ taken from `scope.axis_angles`. The crossing point is brought
/// back to the ground along the array pointing.
///
/// Errors
/// ----------
/// * [`StereoFitError::SingularIntersection`] if the major axes are (nearly) parallel.
/// * [`StereoFitError::InvalidPointing`] if the array pointing is parallel to the ground.
/// * [`StereoFitError::MissingAxisAngle`] if a plane has no axis angle in `scope`.
pub fn estimate_core_position(
    scope: &ReconstructionScope,
    array_pointing: &AltAz,
    singular_tolerance: f64,
) -> Result<(Meter, Meter), StereoFitError> {
    let tilted = TiltedGroundFrame::new(*array_pointing);

    let lines = scope
        .planes
        .iter()
        .map(|(tel_id, plane)| -> Result<_, StereoFitError> {
            let psi = scope
                .axis_angles
                .get(tel_id)
                .ok_or(StereoFitError::MissingAxisAngle(*tel_id))?;
            let (sin_psi, cos_psi) = psi.sin_cos();
            Ok((
                Vector3::new(cos_psi, sin_psi, 0.0),
                tilted.ground_to_tilted(&plane.origin),
            ))
        })
        .collect::<Result<Vec<(Vector3<f64>, Vector3<Meter>)>, _>>()?;
    let (directions, positions): (Vec<Vector3<f64>>, Vec<Vector3<Meter>>) =
        lines.into_iter().unzip();

    let crossing = intersect_lines_3d(&directions, &positions, singular_tolerance)?;
    tilted.project_to_ground(&Vector3::new(crossing.x, crossing.y, 0.0))
}

/// Distance from the array centre to the convergence point of the centroid lines.
///
/// Errors
/// ----------
/// * [`StereoFitError::SingularIntersection`] if the centroid lines are (nearly) parallel.
pub fn estimate_h_max(
    scope: &ReconstructionScope,
    singular_tolerance: f64,
) -> Result<Meter, StereoFitError> {
    let (directions, positions): (Vec<Vector3<f64>>, Vec<Vector3<Meter>>) = scope
        .planes
        .values()
        .map(|plane| (plane.a, plane.origin))
        .unzip();

    let shower_max = intersect_lines_3d(&directions, &positions, singular_tolerance)?;
    Ok(shower_max.norm())
}

/// Stereo reconstruction by intersection of the telescope viewing planes.
#[derive(Debug, Clone, Default)]
pub struct PlaneIntersectionReconstructor {
    pub params: ReconParams,
}

impl PlaneIntersectionReconstructor {
    pub fn new(params: ReconParams) -> Self {
        PlaneIntersectionReconstructor { params }
    }

    fn check_inputs(
        &self,
        hillas: &HillasMap,
        array_pointing: &AltAz,
    ) -> Result<(), StereoFitError> {
        if hillas.len() < self.params.min_telescopes {
            return Err(StereoFitError::TooFewInputs(hillas.len()));
        }
        for (tel_id, moments) in hillas {
            moments.validate_width(*tel_id)?;
        }
        if !(array_pointing.alt.is_finite() && array_pointing.alt > 0.0)
            || !array_pointing.az.is_finite()
        {
            return Err(StereoFitError::InvalidPointing(format!(
                "array pointing alt = {}, az = {} is not above the horizon",
                array_pointing.alt, array_pointing.az
            )));
        }
        Ok(())
    }
}

impl ShowerReconstructor for PlaneIntersectionReconstructor {
    fn name(&self) -> &'static str {
        "PlaneIntersection"
    }

    /// Reconstruct direction, core position and shower maximum of one event.
    ///
    /// Errors
    /// ----------
    /// * [`StereoFitError::TooFewInputs`], [`StereoFitError::InvalidEllipseWidth`],
    ///   [`StereoFitError::InvalidPointing`] from the input checks.
    /// * [`StereoFitError::UnknownTelescope`], [`StereoFitError::MissingTelescopePointing`],
    ///   [`StereoFitError::PointBehindCamera`] while building the viewing planes.
    ///
    /// A singular core or shower-maximum fit does not fail the call: the result is
    /// returned with `is_valid = false` and NaN in the affected field.
    fn predict(
        &self,
        hillas: &HillasMap,
        subarray: &SubarrayDescription,
        array_pointing: &AltAz,
        telescope_pointings: Option<&PointingMap>,
    ) -> Result<ReconstructionResult, StereoFitError> {
        self.check_inputs(hillas, array_pointing)?;

        let mode = pointing_mode(
            hillas,
            array_pointing,
            telescope_pointings,
            self.params.divergence_tolerance,
        )?;
        let scope = ReconstructionScope::build(
            hillas,
            subarray,
            array_pointing,
            telescope_pointings,
            mode,
            self.params.axis_point_offset,
        )?;
        debug!(
            "{}: {} telescopes, {:?} pointing",
            self.name(),
            scope.planes.len(),
            scope.mode
        );

        let (direction, alt_uncert) = estimate_direction(&scope, self.params.error_weighting)?;
        let direction_found = direction.iter().all(|v| v.is_finite());
        let AltAz { alt, az } = if direction_found {
            AltAz::from_cartesian(&direction)
        } else {
            AltAz::new(f64::NAN, f64::NAN)
        };

        let average_intensity =
            hillas.values().map(|h| h.intensity).sum::<f64>() / hillas.len() as f64;

        let mut result = ReconstructionResult {
            alt,
            az,
            core_x: f64::NAN,
            core_y: f64::NAN,
            h_max: f64::NAN,
            tel_ids: hillas.keys().copied().collect(),
            average_intensity,
            is_valid: true,
            alt_uncert,
            invalid_reason: None,
        };

        if !direction_found {
            warn!("{}: weighted plane crossing sum is zero", self.name());
            result.invalidate("direction: all plane crossings have zero weight".into());
        }

        match estimate_core_position(&scope, array_pointing, self.params.singular_tolerance) {
            Ok((core_x, core_y)) => {
                result.core_x = core_x;
                result.core_y = core_y;
            }
            Err(err @ StereoFitError::SingularIntersection { .. }) => {
                warn!("{}: core position not reconstructed: {err}", self.name());
                result.invalidate(format!("core position: {err}"));
            }
            Err(err) => return Err(err),
        }

        match estimate_h_max(&scope, self.params.singular_tolerance) {
            Ok(h_max) => result.h_max = h_max,
            Err(err @ StereoFitError::SingularIntersection { .. }) => {
                warn!("{}: shower maximum not reconstructed: {err}", self.name());
                result.invalidate(format!("h_max: {err}"));
            }
            Err(err) => return Err(err),
        }

        debug!(
            "{}: alt = {:.5} rad, az = {:.5} rad, core = ({:.2}, {:.2}) m, h_max = {:.1} m",
            self.name(),
            result.alt,
            result.az,
            result.core_x,
            result.core_y,
            result.h_max
        );
        Ok(result)
    }
}
