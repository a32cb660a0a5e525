//! # Constants and type definitions for stereofit
//!
//! This module centralizes the **conversion factors**, **numerical thresholds** and
//! **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians)
//! - Core type aliases for angles, lengths and telescope identifiers
//! - Container types mapping telescope ids to per-telescope inputs
//!
//! Maps are ordered by telescope id so that every reconstruction visits the
//! telescopes in the same order, which keeps floating-point sums reproducible.

use std::collections::BTreeMap;

use crate::hillas::HillasParameters;
use crate::ref_system::AltAz;

// -------------------------------------------------------------------------------------------------
// Unit conversions and numerical thresholds
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-12;

/// Distance along the ellipse major axis of the second image point, in meters
pub const AXIS_POINT_OFFSET: f64 = 0.1;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Telescope identifier inside a subarray
pub type TelId = u32;
/// Identifier of an air-shower event
pub type EventId = u64;

/// Ellipse parameters of every telescope that saw the event.
pub type HillasMap = BTreeMap<TelId, HillasParameters>;

/// Pointing direction of every telescope (divergent or parallel pointing).
pub type PointingMap = BTreeMap<TelId, AltAz>;
