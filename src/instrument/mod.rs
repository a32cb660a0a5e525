//! # Instrument description
//!
//! Static description of the telescopes taking part in a reconstruction:
//!
//! - [`OpticsDescription`](crate::instrument::OpticsDescription) – mirror and focal-length data,
//! - [`TelescopeDescription`](crate::instrument::TelescopeDescription) – optics plus camera and type names,
//! - [`SubarrayDescription`](crate::instrument::subarray::SubarrayDescription) – telescopes and their
//!   ground positions keyed by telescope id.
//!
//! The reconstruction only needs the ground position and the equivalent focal length of
//! each telescope; the remaining fields allow grouping telescopes by type.
//!
//! ## Units
//!
//! - Ground positions: **meters** in the ground frame (x north, y west, z up).
//! - Focal lengths: **meters**.
//! - Mirror areas: **m²**.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::Meter;
use crate::stereofit_errors::StereoFitError;

pub mod subarray;

/// Optical system of a telescope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticsDescription {
    pub name: String,
    pub equivalent_focal_length: Meter,
    pub mirror_area: f64,
    pub num_mirrors: u32,
}

impl OpticsDescription {
    /// Errors
    /// ----------
    /// * [`StereoFitError::InvalidTelescopeDescription`] if the focal length is not a
    ///   positive finite number.
    pub fn new(
        name: impl Into<String>,
        equivalent_focal_length: Meter,
        mirror_area: f64,
        num_mirrors: u32,
    ) -> Result<Self, StereoFitError> {
        let name = name.into();
        if !(equivalent_focal_length.is_finite() && equivalent_focal_length > 0.0) {
            return Err(StereoFitError::InvalidTelescopeDescription(format!(
                "optics {name}: focal length must be positive, got {equivalent_focal_length}"
            )));
        }
        Ok(OpticsDescription {
            name,
            equivalent_focal_length,
            mirror_area,
            num_mirrors,
        })
    }
}

/// Telescope type: optics plus camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelescopeDescription {
    pub name: String,
    pub tel_type: String,
    pub optics: OpticsDescription,
    pub camera_name: String,
}

impl TelescopeDescription {
    pub fn new(
        name: impl Into<String>,
        tel_type: impl Into<String>,
        optics: OpticsDescription,
        camera_name: impl Into<String>,
    ) -> Self {
        TelescopeDescription {
            name: name.into(),
            tel_type: tel_type.into(),
            optics,
            camera_name: camera_name.into(),
        }
    }

    #[inline]
    pub fn focal_length(&self) -> Meter {
        self.optics.equivalent_focal_length
    }
}

impl fmt::Display for TelescopeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.tel_type, self.optics.name, self.camera_name)
    }
}
