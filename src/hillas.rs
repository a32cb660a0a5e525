//! # Hillas ellipse parameters
//!
//! Second-moment description of a cleaned shower image, as produced by the image
//! parametrisation stage upstream of the reconstruction.
//!
//! Units
//! -----------------
//! * Positions and axis lengths are camera-plane lengths `[m]`.
//! * `phi` and `psi` are angles `[rad]` in the camera frame, counted from the `x` axis.
//! * `intensity` is the total image charge (photo-electrons).
use serde::{Deserialize, Serialize};

use crate::constants::{Meter, Radian, TelId};
use crate::stereofit_errors::StereoFitError;

/// Ellipse parameters of one telescope image.
///
/// Fields
/// -----------------
/// * `x`, `y`: centroid of the image.
/// * `r`, `phi`: centroid in polar coordinates.
/// * `length`, `width`: standard deviations along the major and minor axis.
/// * `psi`: orientation of the major axis.
/// * `intensity`: total image charge.
/// * `skewness`, `kurtosis`: higher moments along the major axis (not used by the
///   geometric reconstruction).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillasParameters {
    pub x: Meter,
    pub y: Meter,
    pub r: Meter,
    pub phi: Radian,
    pub length: Meter,
    pub width: Meter,
    pub psi: Radian,
    pub intensity: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl HillasParameters {
    /// Build an ellipse from its centroid, axes, orientation and intensity.
    ///
    /// `r` and `phi` are derived from the centroid; higher moments are left at zero.
    pub fn new(
        x: Meter,
        y: Meter,
        length: Meter,
        width: Meter,
        psi: Radian,
        intensity: f64,
    ) -> Self {
        HillasParameters {
            x,
            y,
            r: x.hypot(y),
            phi: y.atan2(x),
            length,
            width,
            psi,
            intensity,
            skewness: 0.0,
            kurtosis: 0.0,
        }
    }

    /// Check that the minor axis can be used as a weight denominator.
    ///
    /// Errors
    /// ----------
    /// * [`StereoFitError::InvalidEllipseWidth`] if `width` is zero, negative or not finite.
    pub fn validate_width(&self, tel_id: TelId) -> Result<(), StereoFitError> {
        if self.width.is_finite() && self.width > 0.0 {
            Ok(())
        } else {
            Err(StereoFitError::InvalidEllipseWidth {
                tel_id,
                width: self.width,
            })
        }
    }

    /// Second camera point along the major axis, `offset` away from the centroid.
    pub fn axis_point(&self, offset: Meter) -> (Meter, Meter) {
        let (sin_psi, cos_psi) = self.psi.sin_cos();
        (self.x + offset * cos_psi, self.y + offset * sin_psi)
    }

    /// Plane weight: bright and elongated images count more.
    pub fn weight(&self) -> f64 {
        self.intensity * (self.length / self.width)
    }
}
