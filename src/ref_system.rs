//! # Reference frames
//!
//! The closed set of frame conversions needed by the stereoscopic reconstruction.
//!
//! ```text
//!   camera plane (x, y) ──[CameraFrame]──► sky direction (AltAz) ──► ground-fixed unit vector
//!                                                                     │
//!   ground position ──[TiltedGroundFrame]──► tilted ground (u, v, w) ──┘ project_to_ground
//!
//!   sky direction ──[NominalFrame]──► (fov_lon, fov_lat) offsets around an origin
//! ```
//!
//! Conventions
//! -----------------
//! * **Ground frame**: Cartesian, meters, `x` towards north, `y` towards west, `z` up.
//! * **Horizontal coordinates** ([`AltAz`]): altitude above the horizon, azimuth counted
//!   clockwise from north (north → east). Spherical coordinate routines count longitude
//!   counter-clockwise, so a direction maps to the ground frame as
//!   `spherical_to_cartesian(1, alt, −az)`.
//! * **Camera frame**: gnomonic projection on a focal plane at `focal_length`; `x` runs
//!   towards increasing altitude, `y` towards increasing azimuth.
//! * **Tilted ground frame**: rotated so that its `w` axis is the pointing direction; its
//!   `u`, `v` axes are the camera `x`, `y` axes reversed, so angles measured in the camera
//!   describe the same lines in the tilted frame.
use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Meter, Radian, DPI, EPS, RADEG};
use crate::conversion::wrap_to_pi;
use crate::geometry::angle_between;
use crate::stereofit_errors::StereoFitError;

/// Horizontal sky direction.
///
/// Fields
/// -----------------
/// * `alt`: altitude above the horizon `[rad]`.
/// * `az`: azimuth `[rad]`, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltAz {
    pub alt: Radian,
    pub az: Radian,
}

impl AltAz {
    pub fn new(alt: Radian, az: Radian) -> Self {
        AltAz { alt, az }
    }

    pub fn from_degrees(alt: Degree, az: Degree) -> Self {
        AltAz {
            alt: alt * RADEG,
            az: az * RADEG,
        }
    }

    /// Unit vector of this direction in the ground frame.
    pub fn to_cartesian(&self) -> Vector3<f64> {
        spherical_to_cartesian(1.0, self.alt, -self.az)
    }

    /// Direction of a ground-frame vector; the azimuth is wrapped to `(-π, π]`.
    pub fn from_cartesian(v: &Vector3<f64>) -> Self {
        let (_, lat, lon) = cartesian_to_spherical(v);
        AltAz {
            alt: lat,
            az: wrap_to_pi(-lon),
        }
    }

    /// Great-circle distance to another direction.
    pub fn separation(&self, other: &AltAz) -> Radian {
        angle_between(&self.to_cartesian(), &other.to_cartesian())
    }
}

/// Spherical to Cartesian conversion.
///
/// Arguments
/// ---------
/// * `r`: radius
/// * `lat`: latitude `[rad]`, measured from the `xy` plane
/// * `lon`: longitude `[rad]`, counter-clockwise from `x` towards `y`
pub fn spherical_to_cartesian(r: f64, lat: Radian, lon: Radian) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Vector3::new(r * cos_lat * cos_lon, r * cos_lat * sin_lon, r * sin_lat)
}

/// Cartesian to spherical conversion.
///
/// Returns
/// --------
/// * Tuple `(r, lat, lon)` with `lat ∈ [−π/2, π/2]` and `lon ∈ [0, 2π)`.
///
/// Remarks
/// -------
/// * A zero vector yields `(0.0, 0.0, 0.0)`.
/// * On the poles the longitude is undefined and reported as `0.0`.
pub fn cartesian_to_spherical(v: &Vector3<f64>) -> (f64, Radian, Radian) {
    let r = v.norm();
    if r == 0. {
        return (0.0, 0.0, 0.0);
    }

    let rho = v.x.hypot(v.y);
    let lat = v.z.atan2(rho);
    if rho == 0.0 {
        return (r, lat, 0.0);
    }

    let lon = v.y.atan2(v.x);
    let lon = if lon < 0.0 { lon + DPI } else { lon };
    (r, lat, lon)
}

/// Coordinate axis of an elementary rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Elementary rotation matrix of angle `alpha` around `axis`.
///
/// The rotation is **applied to the vector** in a fixed frame: `rotmt(α, Axis::Z)`
/// turns `x̂` towards `ŷ` for positive `α`.
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Focal plane of one telescope.
///
/// Camera coordinates are projected gnomonically: a sky direction `d` lands at
/// `focal_length · (d·x̂, d·ŷ) / (d·ẑ)`, where `ẑ` is the optical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub focal_length: Meter,
    pub pointing: AltAz,
    /// Columns: camera `x` axis, camera `y` axis, optical axis, in the ground frame.
    axes: Matrix3<f64>,
}

impl CameraFrame {
    pub fn new(focal_length: Meter, pointing: AltAz) -> Self {
        let (sin_alt, cos_alt) = pointing.alt.sin_cos();
        let (sin_az, cos_az) = pointing.az.sin_cos();

        let x_axis = Vector3::new(-sin_alt * cos_az, sin_alt * sin_az, cos_alt);
        let y_axis = Vector3::new(-sin_az, -cos_az, 0.0);
        let optical_axis = pointing.to_cartesian();

        CameraFrame {
            focal_length,
            pointing,
            axes: Matrix3::from_columns(&[x_axis, y_axis, optical_axis]),
        }
    }

    /// Ground-frame unit vector seen at camera position `(x, y)`.
    pub fn camera_to_sky(&self, x: Meter, y: Meter) -> Vector3<f64> {
        let local = Vector3::new(x / self.focal_length, y / self.focal_length, 1.0);
        (self.axes * local).normalize()
    }

    pub fn camera_to_altaz(&self, x: Meter, y: Meter) -> AltAz {
        AltAz::from_cartesian(&self.camera_to_sky(x, y))
    }

    /// Camera position of a ground-frame direction.
    ///
    /// Errors
    /// ----------
    /// * [`StereoFitError::PointBehindCamera`] if the direction is 90° or more away from
    ///   the optical axis.
    pub fn sky_to_camera(&self, direction: &Vector3<f64>) -> Result<(Meter, Meter), StereoFitError> {
        let local = self.axes.transpose() * direction;
        if local.z <= EPS * direction.norm() {
            return Err(StereoFitError::PointBehindCamera);
        }
        Ok((
            self.focal_length * local.x / local.z,
            self.focal_length * local.y / local.z,
        ))
    }

    pub fn altaz_to_camera(&self, direction: &AltAz) -> Result<(Meter, Meter), StereoFitError> {
        self.sky_to_camera(&direction.to_cartesian())
    }
}

/// Ground frame tilted to be perpendicular to a pointing direction.
///
/// The rows of the rotation are
///
/// ```text
/// u = ( sin(alt)·cos(az), −sin(alt)·sin(az), −cos(alt))
/// v = ( sin(az),           cos(az),           0       )
/// w = ( cos(alt)·cos(az), −cos(alt)·sin(az),  sin(alt))   (pointing direction)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TiltedGroundFrame {
    pub pointing: AltAz,
    rotation: Matrix3<f64>,
}

impl TiltedGroundFrame {
    pub fn new(pointing: AltAz) -> Self {
        let (sin_alt, cos_alt) = pointing.alt.sin_cos();
        let (sin_az, cos_az) = pointing.az.sin_cos();

        #[rustfmt::skip]
        let rotation = Matrix3::new(
            sin_alt * cos_az, -sin_alt * sin_az, -cos_alt,
            sin_az,            cos_az,            0.0,
            cos_alt * cos_az, -cos_alt * sin_az,  sin_alt,
        );

        TiltedGroundFrame { pointing, rotation }
    }

    pub fn ground_to_tilted(&self, ground: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * ground
    }

    pub fn tilted_to_ground(&self, tilted: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * tilted
    }

    /// Project a tilted-frame point onto the ground plane `z = 0` along the pointing
    /// direction.
    ///
    /// Return
    /// ----------
    /// * `(x, y)` ground coordinates `[m]`.
    ///
    /// Errors
    /// ----------
    /// * [`StereoFitError::InvalidPointing`] if the pointing is parallel to the ground.
    pub fn project_to_ground(&self, tilted: &Vector3<f64>) -> Result<(Meter, Meter), StereoFitError> {
        let ground = self.tilted_to_ground(tilted);
        let w = self.rotation.row(2);
        if w[2].abs() < EPS {
            return Err(StereoFitError::InvalidPointing(format!(
                "pointing altitude {:.3e} rad is parallel to the ground",
                self.pointing.alt
            )));
        }
        Ok((
            ground.x - w[0] / w[2] * ground.z,
            ground.y - w[1] / w[2] * ground.z,
        ))
    }
}

/// Sky offset frame centred on an origin direction.
///
/// `fov_lon` grows with azimuth and `fov_lat` with altitude; the origin itself sits at
/// `(0, 0)`. Used to compare pointings of a divergent array with the array pointing.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalFrame {
    pub origin: AltAz,
    rotation: Matrix3<f64>,
}

impl NominalFrame {
    pub fn new(origin: AltAz) -> Self {
        let rotation = rotmt(origin.alt, Axis::Y) * rotmt(-origin.az, Axis::Z);
        NominalFrame { origin, rotation }
    }

    /// Offsets `(fov_lon, fov_lat)` of `direction` around the origin.
    pub fn to_nominal(&self, direction: &AltAz) -> (Radian, Radian) {
        let local = self.rotation * spherical_to_cartesian(1.0, direction.alt, direction.az);
        let fov_lon = wrap_to_pi(local.y.atan2(local.x));
        let fov_lat = local.z.clamp(-1.0, 1.0).asin();
        (fov_lon, fov_lat)
    }

    pub fn from_nominal(&self, fov_lon: Radian, fov_lat: Radian) -> AltAz {
        let sky = self.rotation.transpose() * spherical_to_cartesian(1.0, fov_lat, fov_lon);
        let (_, lat, lon) = cartesian_to_spherical(&sky);
        AltAz::new(lat, wrap_to_pi(lon))
    }
}
