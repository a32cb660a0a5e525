use thiserror::Error;

use crate::constants::TelId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StereoFitError {
    #[error("Too few inputs for a stereoscopic fit: {0}")]
    TooFewInputs(usize),

    #[error("Hillas ellipse of telescope {tel_id} has an invalid width: {width}")]
    InvalidEllipseWidth { tel_id: TelId, width: f64 },

    #[error(
        "Line intersection matrix is singular or ill-conditioned (eigenvalue ratio {condition:e}); lines may be parallel"
    )]
    SingularIntersection { condition: f64 },

    #[error("Line intersection needs as many origins as directions (got {directions} directions, {origins} origins)")]
    LengthMismatch { directions: usize, origins: usize },

    #[error("Telescope {0} is not part of the subarray")]
    UnknownTelescope(TelId),

    #[error("No major-axis angle recorded for telescope {0}")]
    MissingAxisAngle(TelId),

    #[error("No pointing direction given for telescope {0}")]
    MissingTelescopePointing(TelId),

    #[error("Invalid pointing direction: {0}")]
    InvalidPointing(String),

    #[error("Sky direction lies behind the camera plane")]
    PointBehindCamera,

    #[error("Invalid telescope description: {0}")]
    InvalidTelescopeDescription(String),

    #[error("Subarray mismatch: {0}")]
    SubarrayMismatch(String),

    #[error("Invalid reconstruction parameter: {0}")]
    InvalidReconParameter(String),
}
