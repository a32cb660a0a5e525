pub mod constants;
pub mod conversion;
pub mod event_set;
pub mod geometry;
pub mod hillas;
pub mod instrument;
pub mod reconstruction;
pub mod ref_system;
pub mod stereofit_errors;
