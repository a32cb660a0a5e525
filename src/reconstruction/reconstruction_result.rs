//! # Reconstruction result
//!
//! [`ReconstructionResult`] is the record produced once per event by a
//! [`ShowerReconstructor`](crate::reconstruction::ShowerReconstructor). It is plain data:
//! no identity, no link back to the inputs.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{Meter, Radian, TelId};
use crate::conversion::rad_to_deg;
use crate::ref_system::{AltAz, NominalFrame};

/// Geometry of one reconstructed air shower.
///
/// Fields
/// -----------------
/// * `alt`, `az`: arrival direction `[rad]`; `az` clockwise from north in `(-π, π]`.
/// * `core_x`, `core_y`: impact point in the ground frame `[m]`.
/// * `h_max`: distance `[m]` from the array centre to the point where the image
///   centroid lines converge, an estimate of the shower-maximum height.
/// * `tel_ids`: telescopes that contributed.
/// * `average_intensity`: mean image intensity over the contributing telescopes.
/// * `is_valid`: `false` when a numerical step failed; the affected quantities are NaN.
/// * `alt_uncert`: average angle `[rad]` between the direction and the pairwise plane crossings.
/// * `invalid_reason`: description of the failure when `is_valid` is `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResult {
    pub alt: Radian,
    pub az: Radian,
    pub core_x: Meter,
    pub core_y: Meter,
    pub h_max: Meter,
    pub tel_ids: Vec<TelId>,
    pub average_intensity: f64,
    pub is_valid: bool,
    pub alt_uncert: Radian,
    pub invalid_reason: Option<String>,
}

impl ReconstructionResult {
    /// Arrival direction as a horizontal coordinate.
    pub fn direction(&self) -> AltAz {
        AltAz::new(self.alt, self.az)
    }

    /// Offsets `(fov_lon, fov_lat)` of the arrival direction around `origin`,
    /// e.g. the array pointing.
    pub fn nominal_offset(&self, origin: &AltAz) -> (Radian, Radian) {
        NominalFrame::new(*origin).to_nominal(&self.direction())
    }

    /// Mark the result invalid and append `reason` to the recorded ones.
    pub(crate) fn invalidate(&mut self, reason: String) {
        self.is_valid = false;
        match &mut self.invalid_reason {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&reason);
            }
            None => self.invalid_reason = Some(reason),
        }
    }
}

impl fmt::Display for ReconstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_valid { "valid" } else { "invalid" };
        writeln!(f, "Reconstructed shower ({status}), telescopes {:?}", self.tel_ids)?;
        writeln!(
            f,
            "  direction : alt = {:.4}°, az = {:.4}° (± {:.4}°)",
            rad_to_deg(self.alt),
            rad_to_deg(self.az),
            rad_to_deg(self.alt_uncert)
        )?;
        writeln!(
            f,
            "  core      : x = {:.2} m, y = {:.2} m",
            self.core_x, self.core_y
        )?;
        writeln!(f, "  h_max     : {:.1} m", self.h_max)?;
        write!(f, "  intensity : {:.1} (mean)", self.average_intensity)?;
        if let Some(reason) = &self.invalid_reason {
            write!(f, "\n  reason    : {reason}")?;
        }
        Ok(())
    }
}
