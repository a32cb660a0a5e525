//! # Stereoscopic geometry reconstruction
//!
//! This module defines the [`ShowerReconstructor`](crate::reconstruction::ShowerReconstructor)
//! capability shared by every reconstruction technique, and the
//! [`ReconParams`](crate::reconstruction::ReconParams) configuration struct with its builder.
//!
//! ## Purpose
//!
//! A reconstructor turns the ellipse parameters of all telescopes that saw one air shower
//! into a [`ReconstructionResult`](crate::reconstruction::reconstruction_result::ReconstructionResult):
//! arrival direction, impact point on the ground and height of the shower maximum.
//!
//! ## Pipeline overview
//!
//! 1. **Input checks**
//!    At least `min_telescopes` images, every ellipse width positive and finite, the
//!    array pointing above the horizon.
//!
//! 2. **Viewing planes**
//!    Each image centroid and a second point `axis_point_offset` further along the major
//!    axis are projected on the sky; together with the telescope position they span the
//!    telescope's viewing plane.
//!
//! 3. **Divergent pointing**
//!    When a telescope points more than `divergence_tolerance` away from the array
//!    pointing, its major-axis angle is re-measured in a camera aimed along the array
//!    pointing.
//!
//! 4. **Estimators**
//!    Direction from pairwise plane crossings, core position from the major-axis lines in
//!    the tilted ground frame, shower maximum from the centroid lines.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stereofit::reconstruction::{ReconParams, ErrorWeighting, ShowerReconstructor};
//! use stereofit::reconstruction::plane_intersection::PlaneIntersectionReconstructor;
//!
//! let params = ReconParams::builder()
//!     .axis_point_offset(0.1)
//!     .error_weighting(ErrorWeighting::ComponentCount)
//!     .build()
//!     .unwrap();
//!
//! let reconstructor = PlaneIntersectionReconstructor::new(params);
//! // let result = reconstructor.predict(&hillas, &subarray, &array_pointing, None)?;
//! ```
use std::cmp::Ordering::{Equal, Greater};

use serde::{Deserialize, Serialize};

use crate::constants::{HillasMap, Meter, PointingMap, Radian, AXIS_POINT_OFFSET};
use crate::geometry::DEFAULT_SINGULAR_TOLERANCE;
use crate::instrument::subarray::SubarrayDescription;
use crate::ref_system::AltAz;
use crate::stereofit_errors::StereoFitError;

pub mod plane_intersection;
pub mod reconstruction_result;
pub mod viewing_plane;

use reconstruction_result::ReconstructionResult;

/// Weights of the angular-spread average computed by the direction estimator.
///
/// Variants
/// -----------------
/// * `ComponentCount` – every pairwise crossing gets the number of components of the
///   crossing vector as weight, i.e. the same weight of 3. The spread is then the plain
///   mean of the off-axis angles.
/// * `PairWeight` – every crossing is weighted by the product of the weights of its two
///   viewing planes, like the direction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorWeighting {
    #[default]
    ComponentCount,
    PairWeight,
}

/// Configuration of the geometric reconstruction.
///
/// Fields
/// -----------------
/// * `axis_point_offset` – camera-plane distance `[m]` between the image centroid and the
///   second point taken along the major axis.
/// * `singular_tolerance` – smallest accepted ratio between the extreme eigenvalue
///   magnitudes of the line-intersection system.
/// * `divergence_tolerance` – telescope pointings closer than this `[rad]` to the array
///   pointing are treated as parallel.
/// * `min_telescopes` – minimum number of contributing telescopes (at least 2).
/// * `error_weighting` – weighting of the angular uncertainty, see [`ErrorWeighting`].
///
/// Defaults
/// -----------------
/// * `axis_point_offset`: 0.1 m
/// * `singular_tolerance`: 1e-10
/// * `divergence_tolerance`: 1e-9 rad
/// * `min_telescopes`: 2
/// * `error_weighting`: `ComponentCount`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconParams {
    pub axis_point_offset: Meter,
    pub singular_tolerance: f64,
    pub divergence_tolerance: Radian,
    pub min_telescopes: usize,
    pub error_weighting: ErrorWeighting,
}

impl ReconParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ReconParamsBuilder {
        ReconParamsBuilder::new()
    }
}

impl Default for ReconParams {
    fn default() -> Self {
        ReconParams {
            axis_point_offset: AXIS_POINT_OFFSET,
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            divergence_tolerance: 1e-9,
            min_telescopes: 2,
            error_weighting: ErrorWeighting::ComponentCount,
        }
    }
}

/// Builder for [`ReconParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ReconParamsBuilder {
    params: ReconParams,
}

impl ReconParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: ReconParams::default(),
        }
    }

    pub fn axis_point_offset(mut self, v: Meter) -> Self {
        self.params.axis_point_offset = v;
        self
    }
    pub fn singular_tolerance(mut self, v: f64) -> Self {
        self.params.singular_tolerance = v;
        self
    }
    pub fn divergence_tolerance(mut self, v: Radian) -> Self {
        self.params.divergence_tolerance = v;
        self
    }
    pub fn min_telescopes(mut self, v: usize) -> Self {
        self.params.min_telescopes = v;
        self
    }
    pub fn error_weighting(mut self, v: ErrorWeighting) -> Self {
        self.params.error_weighting = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `axis_point_offset > 0` and finite.
    /// * `0 ≤ singular_tolerance < 1`.
    /// * `divergence_tolerance ≥ 0`.
    /// * `min_telescopes ≥ 2`.
    pub fn build(self) -> Result<ReconParams, StereoFitError> {
        let p = &self.params;

        if !Self::gt0(p.axis_point_offset) || !p.axis_point_offset.is_finite() {
            return Err(StereoFitError::InvalidReconParameter(
                "axis_point_offset must be positive and finite".into(),
            ));
        }
        if !Self::ge0(p.singular_tolerance) || p.singular_tolerance >= 1.0 {
            return Err(StereoFitError::InvalidReconParameter(
                "singular_tolerance must be in [0, 1)".into(),
            ));
        }
        if !Self::ge0(p.divergence_tolerance) {
            return Err(StereoFitError::InvalidReconParameter(
                "divergence_tolerance must be >= 0".into(),
            ));
        }
        if p.min_telescopes < 2 {
            return Err(StereoFitError::InvalidReconParameter(
                "min_telescopes must be >= 2 for a stereoscopic reconstruction".into(),
            ));
        }

        Ok(self.params)
    }
}

/// Capability shared by the stereoscopic reconstruction techniques.
///
/// Implementations are plain values selected by the caller; a `predict` call owns all of
/// its intermediate state, so one reconstructor can serve many threads at once.
pub trait ShowerReconstructor: Send + Sync {
    /// Short name of the technique, used in logs.
    fn name(&self) -> &'static str;

    /// Reconstruct the geometry of one event.
    ///
    /// Arguments
    /// -----------------
    /// * `hillas`: ellipse parameters per contributing telescope.
    /// * `subarray`: positions and optics of the telescopes.
    /// * `array_pointing`: common pointing direction of the array.
    /// * `telescope_pointings`: pointing of each telescope when it may differ from the
    ///   array pointing; `None` means every telescope follows `array_pointing`.
    fn predict(
        &self,
        hillas: &HillasMap,
        subarray: &SubarrayDescription,
        array_pointing: &AltAz,
        telescope_pointings: Option<&PointingMap>,
    ) -> Result<ReconstructionResult, StereoFitError>;
}
