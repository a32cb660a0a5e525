#![allow(dead_code)]

use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use stereofit::constants::{HillasMap, Meter, PointingMap, TelId};
use stereofit::conversion::angular_difference;
use stereofit::hillas::HillasParameters;
use stereofit::instrument::subarray::SubarrayDescription;
use stereofit::instrument::{OpticsDescription, TelescopeDescription};
use stereofit::reconstruction::reconstruction_result::ReconstructionResult;
use stereofit::ref_system::{AltAz, CameraFrame};

/// Straight shower axis: impact point on the ground and arrival direction.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticShower {
    pub core: Vector3<Meter>,
    pub source: AltAz,
    /// Distance along the axis from the core to the image centroid point.
    pub centroid_distance: Meter,
}

impl SyntheticShower {
    pub fn new(core_x: Meter, core_y: Meter, source: AltAz) -> Self {
        SyntheticShower {
            core: Vector3::new(core_x, core_y, 0.0),
            source,
            centroid_distance: 10_000.0,
        }
    }

    pub fn point_on_axis(&self, distance: Meter) -> Vector3<Meter> {
        self.core + distance * self.source.to_cartesian()
    }

    pub fn shower_max(&self) -> Vector3<Meter> {
        self.point_on_axis(self.centroid_distance)
    }
}

/// Four identical telescopes on the corners of a 100 m square.
pub fn square_subarray(focal_length: Meter) -> SubarrayDescription {
    let optics = OpticsDescription::new("MST", focal_length, 106.0, 86).unwrap();
    let tel = TelescopeDescription::new("MST", "MST", optics, "NectarCam");
    let positions = BTreeMap::from([
        (1, Vector3::new(50.0, 50.0, 0.0)),
        (2, Vector3::new(-50.0, 50.0, 0.0)),
        (3, Vector3::new(-50.0, -50.0, 0.0)),
        (4, Vector3::new(50.0, -50.0, 0.0)),
    ]);
    let tels = positions.keys().map(|id| (*id, tel.clone())).collect();
    SubarrayDescription::new("square", positions, tels).unwrap()
}

pub fn same_pointing(subarray: &SubarrayDescription, pointing: AltAz) -> PointingMap {
    subarray.tel_ids().into_iter().map(|id| (id, pointing)).collect()
}

/// Ellipse parameters that a noiseless image of `shower` would have in each telescope.
///
/// The centroid is the camera image of the shower point at `centroid_distance`, the
/// major axis runs towards the image of a point further down the axis.
pub fn simulate_hillas(
    subarray: &SubarrayDescription,
    shower: &SyntheticShower,
    pointings: &PointingMap,
    tel_ids: &[TelId],
) -> HillasMap {
    let head = shower.shower_max();
    let tail = shower.point_on_axis(shower.centroid_distance - 3_000.0);

    tel_ids
        .iter()
        .map(|tel_id| {
            let position = subarray.position(*tel_id).unwrap();
            let camera = CameraFrame::new(subarray.focal_length(*tel_id).unwrap(), pointings[tel_id]);
            let (x, y) = camera.sky_to_camera(&(head - position)).unwrap();
            let (tail_x, tail_y) = camera.sky_to_camera(&(tail - position)).unwrap();
            let psi = (tail_y - y).atan2(tail_x - x);

            let intensity = 100.0 * *tel_id as f64;
            (
                *tel_id,
                HillasParameters::new(x, y, 0.05, 0.01, psi, intensity),
            )
        })
        .collect()
}

/// Check direction, core and shower maximum of `result` against the true shower.
pub fn assert_geometry_close(
    result: &ReconstructionResult,
    shower: &SyntheticShower,
    angle_tol: f64,
    distance_tol: Meter,
) {
    assert!(result.is_valid, "result flagged invalid: {:?}", result.invalid_reason);
    assert_abs_diff_eq!(result.alt, shower.source.alt, epsilon = angle_tol);
    assert_abs_diff_eq!(
        angular_difference(result.az, shower.source.az),
        0.0,
        epsilon = angle_tol
    );
    assert_abs_diff_eq!(result.core_x, shower.core.x, epsilon = distance_tol);
    assert_abs_diff_eq!(result.core_y, shower.core.y, epsilon = distance_tol);
    assert_abs_diff_eq!(
        result.h_max,
        shower.shower_max().norm(),
        epsilon = distance_tol
    );
}
