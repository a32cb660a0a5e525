//! # Viewing planes
//!
//! A viewing plane is the plane through a telescope that contains the shower axis as
//! seen by that telescope. It is spanned by two sky directions read off the image: the
//! centroid and a second point a short distance further along the ellipse major axis.
//!
//! This module builds the planes of one event and, for divergent pointing, re-measures
//! every major-axis angle in a camera aimed along the array pointing. All of it is
//! collected in a [`ReconstructionScope`] that lives for exactly one `predict` call.
use std::collections::BTreeMap;

use log::debug;
use nalgebra::Vector3;

use crate::constants::{HillasMap, Meter, PointingMap, Radian, TelId};
use crate::geometry::normalize;
use crate::instrument::subarray::SubarrayDescription;
use crate::ref_system::{AltAz, CameraFrame, NominalFrame};
use crate::stereofit_errors::StereoFitError;

/// Great-circle plane of one telescope.
///
/// Fields
/// -----------------
/// * `origin`: telescope position in the ground frame `[m]`.
/// * `a`: unit vector towards the image centroid.
/// * `b`: unit vector towards the second major-axis point.
/// * `c`: unit vector in the plane, orthogonal to `a` and on the side of `b`.
/// * `norm`: unit normal `a × c`.
/// * `weight`: relative weight of the plane in the direction fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewingPlane {
    pub origin: Vector3<Meter>,
    pub a: Vector3<f64>,
    pub b: Vector3<f64>,
    pub c: Vector3<f64>,
    pub norm: Vector3<f64>,
    pub weight: f64,
}

impl ViewingPlane {
    /// Build the plane spanned by two sky directions.
    ///
    /// If `p1` and `p2` coincide the plane is undefined: `c` and `norm` come out as zero
    /// vectors and the plane drops out of every cross product.
    pub fn new(p1: &AltAz, p2: &AltAz, origin: Vector3<Meter>, weight: f64) -> Self {
        let a = p1.to_cartesian();
        let b = p2.to_cartesian();
        let c = normalize(&a.cross(&b).cross(&a));
        let norm = normalize(&a.cross(&c));

        ViewingPlane {
            origin,
            a,
            b,
            c,
            norm,
            weight,
        }
    }
}

/// How the telescopes of one event are pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointingMode {
    /// Every telescope follows the array pointing.
    Parallel,
    /// At least one telescope points elsewhere.
    Divergent,
}

/// Decide the pointing mode of an event.
///
/// Without per-telescope pointings the array is parallel. Otherwise every contributing
/// telescope must have an entry, and the array is divergent as soon as one of them sits
/// more than `tolerance` away from `array_pointing` in the nominal frame.
///
/// Errors
/// ----------
/// * [`StereoFitError::MissingTelescopePointing`] if a contributing telescope has no entry.
pub fn pointing_mode(
    hillas: &HillasMap,
    array_pointing: &AltAz,
    telescope_pointings: Option<&PointingMap>,
    tolerance: Radian,
) -> Result<PointingMode, StereoFitError> {
    let Some(pointings) = telescope_pointings else {
        return Ok(PointingMode::Parallel);
    };

    let nominal = NominalFrame::new(*array_pointing);
    let mut max_offset: Radian = 0.0;
    for tel_id in hillas.keys() {
        let pointing = pointings
            .get(tel_id)
            .ok_or(StereoFitError::MissingTelescopePointing(*tel_id))?;
        let (fov_lon, fov_lat) = nominal.to_nominal(pointing);
        max_offset = max_offset.max(fov_lon.hypot(fov_lat));
    }

    let mode = if max_offset > tolerance {
        PointingMode::Divergent
    } else {
        PointingMode::Parallel
    };
    debug!("largest telescope pointing offset {max_offset:.3e} rad, mode {mode:?}");
    Ok(mode)
}

/// Major-axis angle re-measured in a camera aimed along the array pointing.
///
/// Both sky points are projected into `array_camera` and the angle of the segment from
/// the centroid to the second point is returned. For a telescope that already follows
/// the array pointing this gives back its own ψ.
///
/// Errors
/// ----------
/// * [`StereoFitError::PointBehindCamera`] if either point is not in front of the array camera.
pub fn corrected_axis_angle(
    array_camera: &CameraFrame,
    cog: &AltAz,
    axis_point: &AltAz,
) -> Result<Radian, StereoFitError> {
    let (cog_x, cog_y) = array_camera.altaz_to_camera(cog)?;
    let (axis_x, axis_y) = array_camera.altaz_to_camera(axis_point)?;
    Ok((axis_y - cog_y).atan2(axis_x - cog_x))
}

/// Everything derived from the inputs of one reconstruction call.
///
/// Fields
/// -----------------
/// * `planes`: one viewing plane per contributing telescope.
/// * `axis_angles`: major-axis angle per telescope, expressed in the array-pointing
///   camera when `mode` is divergent and telescope-native otherwise.
/// * `mode`: pointing mode of the event.
#[derive(Debug, Clone)]
pub struct ReconstructionScope {
    pub planes: BTreeMap<TelId, ViewingPlane>,
    pub axis_angles: BTreeMap<TelId, Radian>,
    pub mode: PointingMode,
}

impl ReconstructionScope {
    /// Build the viewing planes of one event.
    ///
    /// Arguments
    /// -----------------
    /// * `hillas`: validated ellipse parameters per telescope.
    /// * `subarray`: telescope positions and focal lengths.
    /// * `array_pointing`: common pointing of the array.
    /// * `telescope_pointings`: pointing per telescope, `None` for parallel pointing.
    /// * `mode`: result of [`pointing_mode`].
    /// * `axis_point_offset`: camera distance of the second major-axis point `[m]`.
    ///
    /// Errors
    /// ----------
    /// * [`StereoFitError::UnknownTelescope`] for a telescope outside `subarray`.
    /// * [`StereoFitError::MissingTelescopePointing`] for a telescope without pointing.
    /// * [`StereoFitError::PointBehindCamera`] if a divergent re-projection fails.
    pub fn build(
        hillas: &HillasMap,
        subarray: &SubarrayDescription,
        array_pointing: &AltAz,
        telescope_pointings: Option<&PointingMap>,
        mode: PointingMode,
        axis_point_offset: Meter,
    ) -> Result<Self, StereoFitError> {
        let mut planes = BTreeMap::new();
        let mut axis_angles = BTreeMap::new();

        for (&tel_id, moments) in hillas {
            let focal_length = subarray.focal_length(tel_id)?;
            let origin = *subarray.position(tel_id)?;
            let pointing = match telescope_pointings {
                Some(pointings) => *pointings
                    .get(&tel_id)
                    .ok_or(StereoFitError::MissingTelescopePointing(tel_id))?,
                None => *array_pointing,
            };

            let camera = CameraFrame::new(focal_length, pointing);
            let (axis_x, axis_y) = moments.axis_point(axis_point_offset);
            let cog = camera.camera_to_altaz(moments.x, moments.y);
            let axis_point = camera.camera_to_altaz(axis_x, axis_y);

            let psi = match mode {
                PointingMode::Parallel => moments.psi,
                PointingMode::Divergent => {
                    let array_camera = CameraFrame::new(focal_length, *array_pointing);
                    corrected_axis_angle(&array_camera, &cog, &axis_point)?
                }
            };

            planes.insert(
                tel_id,
                ViewingPlane::new(&cog, &axis_point, origin, moments.weight()),
            );
            axis_angles.insert(tel_id, psi);
        }

        Ok(ReconstructionScope {
            planes,
            axis_angles,
            mode,
        })
    }
}

#[cfg(test)]
mod viewing_plane_test {
    use super::*;
    use crate::conversion::angular_difference;
    use crate::hillas::HillasParameters;
    use crate::instrument::{OpticsDescription, TelescopeDescription};
    use approx::assert_abs_diff_eq;

    fn two_tel_subarray() -> SubarrayDescription {
        let optics = OpticsDescription::new("MST", 16.0, 106.0, 86).unwrap();
        let tel = TelescopeDescription::new("MST", "MST", optics, "FlashCam");
        let positions = BTreeMap::from([
            (1, Vector3::new(100.0, 0.0, 0.0)),
            (2, Vector3::new(-100.0, 50.0, 0.0)),
        ]);
        let tels = BTreeMap::from([(1, tel.clone()), (2, tel)]);
        SubarrayDescription::new("pair", positions, tels).unwrap()
    }

    fn two_ellipses() -> HillasMap {
        BTreeMap::from([
            (1, HillasParameters::new(0.05, -0.02, 0.08, 0.02, 0.4, 300.0)),
            (2, HillasParameters::new(-0.03, 0.06, 0.06, 0.015, -2.1, 150.0)),
        ])
    }

    #[test]
    fn test_plane_vectors_are_orthonormal() {
        let p1 = AltAz::from_degrees(70.0, 10.0);
        let p2 = AltAz::from_degrees(69.0, 12.0);
        let plane = ViewingPlane::new(&p1, &p2, Vector3::zeros(), 2.0);

        assert_abs_diff_eq!(plane.a.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.c.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.norm.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.a.dot(&plane.c), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.norm.dot(&plane.a), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.norm.dot(&plane.b), 0.0, epsilon = 1e-12);
        // c lies on the side of b
        assert!(plane.c.dot(&plane.b) > 0.0);
    }

    #[test]
    fn test_degenerate_plane_has_zero_normal() {
        let p = AltAz::from_degrees(60.0, 0.0);
        let plane = ViewingPlane::new(&p, &p, Vector3::zeros(), 1.0);
        assert_eq!(plane.norm, Vector3::zeros());
        assert!(plane.norm.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_pointing_mode() {
        let hillas = two_ellipses();
        let array = AltAz::from_degrees(70.0, 0.0);

        assert_eq!(
            pointing_mode(&hillas, &array, None, 1e-9).unwrap(),
            PointingMode::Parallel
        );

        let equal = BTreeMap::from([(1, array), (2, array)]);
        assert_eq!(
            pointing_mode(&hillas, &array, Some(&equal), 1e-9).unwrap(),
            PointingMode::Parallel
        );

        let divergent = BTreeMap::from([(1, array), (2, AltAz::from_degrees(69.0, 2.0))]);
        assert_eq!(
            pointing_mode(&hillas, &array, Some(&divergent), 1e-9).unwrap(),
            PointingMode::Divergent
        );

        let missing = BTreeMap::from([(1, array)]);
        assert_eq!(
            pointing_mode(&hillas, &array, Some(&missing), 1e-9),
            Err(StereoFitError::MissingTelescopePointing(2))
        );
    }

    #[test]
    fn test_divergent_correction_is_noop_for_equal_pointing() {
        let hillas = two_ellipses();
        let subarray = two_tel_subarray();
        let array = AltAz::from_degrees(70.0, 30.0);
        let pointings = BTreeMap::from([(1, array), (2, array)]);

        let corrected = ReconstructionScope::build(
            &hillas,
            &subarray,
            &array,
            Some(&pointings),
            PointingMode::Divergent,
            0.1,
        )
        .unwrap();
        let native = ReconstructionScope::build(
            &hillas,
            &subarray,
            &array,
            None,
            PointingMode::Parallel,
            0.1,
        )
        .unwrap();

        for (tel_id, moments) in &hillas {
            let psi = corrected.axis_angles[tel_id];
            assert_abs_diff_eq!(
                angular_difference(psi, moments.psi),
                0.0,
                epsilon = 1e-9
            );
            assert_eq!(native.axis_angles[tel_id], moments.psi);
            assert_eq!(corrected.planes[tel_id], native.planes[tel_id]);
        }
    }

    #[test]
    fn test_build_unknown_telescope() {
        let mut hillas = two_ellipses();
        hillas.insert(7, HillasParameters::new(0.0, 0.01, 0.05, 0.01, 0.0, 80.0));
        let array = AltAz::from_degrees(70.0, 0.0);

        let err = ReconstructionScope::build(
            &hillas,
            &two_tel_subarray(),
            &array,
            None,
            PointingMode::Parallel,
            0.1,
        )
        .unwrap_err();
        assert_eq!(err, StereoFitError::UnknownTelescope(7));
    }
}
