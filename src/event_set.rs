//! # Batch reconstruction of many events
//!
//! An [`EventSet`] maps event ids to the per-event inputs of a stereo reconstruction.
//! The [`EventSetExt`] extension trait runs any [`ShowerReconstructor`] over the whole set
//! and [`ReconstructionStats`] summarises the outcome.
//!
//! Events are independent: a failure in one event is stored in its entry of the
//! [`FullReconstructionResult`] and never aborts the batch. With the `parallel` feature
//! the events are spread over the `rayon` thread pool.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stereofit::event_set::{EventSet, EventSetExt, ReconstructionStats};
//! use stereofit::reconstruction::plane_intersection::PlaneIntersectionReconstructor;
//! # fn demo(events: EventSet, subarray: stereofit::instrument::subarray::SubarrayDescription) {
//! let reco = PlaneIntersectionReconstructor::default();
//! let results = events.reconstruct_all(&reco, &subarray);
//! let stats = ReconstructionStats::from_results(&results);
//! println!("{stats:#}");
//! # }
//! ```
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::constants::{EventId, HillasMap, PointingMap, Radian};
use crate::conversion::rad_to_deg;
use crate::instrument::subarray::SubarrayDescription;
use crate::reconstruction::reconstruction_result::ReconstructionResult;
use crate::reconstruction::ShowerReconstructor;
use crate::ref_system::AltAz;
use crate::stereofit_errors::StereoFitError;

/// Inputs of one stereo event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StereoEvent {
    pub hillas: HillasMap,
    pub array_pointing: AltAz,
    pub telescope_pointings: Option<PointingMap>,
}

/// Events keyed by id, visited in id order.
pub type EventSet = BTreeMap<EventId, StereoEvent>;

/// Outcome of every event of a batch.
pub type FullReconstructionResult = HashMap<EventId, Result<ReconstructionResult, StereoFitError>>;

/// Extension trait running a reconstructor over an [`EventSet`].
pub trait EventSetExt {
    /// Reconstruct every event of the set.
    ///
    /// Arguments
    /// -----------------
    /// * `reconstructor`: technique applied to each event.
    /// * `subarray`: description shared by all events.
    ///
    /// Return
    /// ----------
    /// * One entry per event: the result, or the error that stopped that event.
    fn reconstruct_all(
        &self,
        reconstructor: &dyn ShowerReconstructor,
        subarray: &SubarrayDescription,
    ) -> FullReconstructionResult;
}

fn reconstruct_event(
    event_id: EventId,
    event: &StereoEvent,
    reconstructor: &dyn ShowerReconstructor,
    subarray: &SubarrayDescription,
) -> (EventId, Result<ReconstructionResult, StereoFitError>) {
    let result = reconstructor.predict(
        &event.hillas,
        subarray,
        &event.array_pointing,
        event.telescope_pointings.as_ref(),
    );
    if let Err(err) = &result {
        warn!("event {event_id}: {} failed: {err}", reconstructor.name());
    }
    (event_id, result)
}

impl EventSetExt for EventSet {
    fn reconstruct_all(
        &self,
        reconstructor: &dyn ShowerReconstructor,
        subarray: &SubarrayDescription,
    ) -> FullReconstructionResult {
        info!(
            "reconstructing {} events with {} on subarray {}",
            self.len(),
            reconstructor.name(),
            subarray
        );

        #[cfg(feature = "parallel")]
        let results: FullReconstructionResult = self
            .par_iter()
            .map(|(event_id, event)| reconstruct_event(*event_id, event, reconstructor, subarray))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: FullReconstructionResult = self
            .iter()
            .map(|(event_id, event)| reconstruct_event(*event_id, event, reconstructor, subarray))
            .collect();

        results
    }
}

/// Summary of a batch reconstruction.
///
/// Fields
/// -----------------
/// * `n_events`: number of events in the batch.
/// * `n_valid`: results with every quantity reconstructed.
/// * `n_invalid`: results returned with `is_valid = false`.
/// * `n_failed`: events that ended in an error.
/// * `median_uncertainty`: median angular uncertainty `[rad]` over the valid results,
///   `None` when there is none.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionStats {
    pub n_events: usize,
    pub n_valid: usize,
    pub n_invalid: usize,
    pub n_failed: usize,
    pub median_uncertainty: Option<Radian>,
}

impl ReconstructionStats {
    pub fn from_results(results: &FullReconstructionResult) -> Self {
        let mut uncertainties: Vec<Radian> = Vec::new();
        let mut n_invalid = 0;
        let mut n_failed = 0;

        for result in results.values() {
            match result {
                Ok(reco) if reco.is_valid => uncertainties.push(reco.alt_uncert),
                Ok(_) => n_invalid += 1,
                Err(_) => n_failed += 1,
            }
        }

        uncertainties.sort_unstable_by(f64::total_cmp);
        let median_uncertainty = match uncertainties.len() {
            0 => None,
            n => Some(uncertainties[(n - 1) / 2]),
        };

        ReconstructionStats {
            n_events: results.len(),
            n_valid: uncertainties.len(),
            n_invalid,
            n_failed,
            median_uncertainty,
        }
    }
}

impl fmt::Display for ReconstructionStats {
    /// Compact by default; multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let median = match self.median_uncertainty {
            Some(angle) => format!("{:.4}°", rad_to_deg(angle)),
            None => "n/a".to_string(),
        };
        if f.alternate() {
            writeln!(f, "Stereo reconstruction summary")?;
            writeln!(f, "-----------------------------")?;
            writeln!(f, "events             : {}", self.n_events)?;
            writeln!(f, "valid              : {}", self.n_valid)?;
            writeln!(f, "invalid            : {}", self.n_invalid)?;
            writeln!(f, "failed             : {}", self.n_failed)?;
            write!(f, "median uncertainty : {median}")
        } else {
            write!(
                f,
                "events={}, valid={}, invalid={}, failed={}, median_uncert={}",
                self.n_events, self.n_valid, self.n_invalid, self.n_failed, median
            )
        }
    }
}

#[cfg(test)]
mod event_set_test {
    use super::*;

    fn result(alt_uncert: Radian, is_valid: bool) -> ReconstructionResult {
        ReconstructionResult {
            alt: 1.2,
            az: 0.1,
            core_x: 0.0,
            core_y: 0.0,
            h_max: 8000.0,
            tel_ids: vec![1, 2],
            average_intensity: 100.0,
            is_valid,
            alt_uncert,
            invalid_reason: None,
        }
    }

    #[test]
    fn test_stats() {
        let results: FullReconstructionResult = HashMap::from([
            (1, Ok(result(3e-3, true))),
            (2, Ok(result(1e-3, true))),
            (3, Ok(result(2e-3, true))),
            (4, Ok(result(f64::NAN, false))),
            (5, Err(StereoFitError::TooFewInputs(1))),
        ]);

        let stats = ReconstructionStats::from_results(&results);
        assert_eq!(stats.n_events, 5);
        assert_eq!(stats.n_valid, 3);
        assert_eq!(stats.n_invalid, 1);
        assert_eq!(stats.n_failed, 1);
        assert_eq!(stats.median_uncertainty, Some(2e-3));

        assert!(stats.to_string().starts_with("events=5, valid=3"));
        assert!(format!("{stats:#}").contains("failed             : 1"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = ReconstructionStats::from_results(&HashMap::new());
        assert_eq!(stats.median_uncertainty, None);
        assert!(stats.to_string().ends_with("median_uncert=n/a"));
    }
}
