//! # Subarray description
//!
//! A named set of telescopes with their ground positions. Telescope ids index every
//! per-telescope input of the reconstruction, and the ordered maps give each telescope
//! a stable flat index.
use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{Meter, TelId};
use crate::instrument::TelescopeDescription;
use crate::stereofit_errors::StereoFitError;

/// Collapse runs of three or more consecutive ids into `first-last`.
///
/// `[1, 2, 3, 5, 7, 8, 9, 10]` becomes `"1-3,5,7-10"`, `[4, 5]` stays `"4,5"`.
pub fn range_extraction(ids: &[TelId]) -> String {
    let runs = ids
        .iter()
        .enumerate()
        .chunk_by(|(i, id)| **id as i64 - *i as i64);

    let joined = (&runs)
        .into_iter()
        .flat_map(|(_, run)| {
            let run: Vec<TelId> = run.map(|(_, id)| *id).collect();
            if run.len() > 2 {
                vec![format!("{}-{}", run[0], run[run.len() - 1])]
            } else {
                run.iter().map(|id| id.to_string()).collect()
            }
        })
        .join(",");
    joined
}

/// Telescopes of a (sub)array and their positions on the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubarrayDescription {
    pub name: String,
    positions: BTreeMap<TelId, Vector3<Meter>>,
    tels: BTreeMap<TelId, TelescopeDescription>,
}

impl SubarrayDescription {
    /// Errors
    /// ----------
    /// * [`StereoFitError::SubarrayMismatch`] if positions and descriptions do not cover
    ///   the same telescope ids.
    pub fn new(
        name: impl Into<String>,
        positions: BTreeMap<TelId, Vector3<Meter>>,
        tels: BTreeMap<TelId, TelescopeDescription>,
    ) -> Result<Self, StereoFitError> {
        if !positions.keys().eq(tels.keys()) {
            return Err(StereoFitError::SubarrayMismatch(
                "telescope ids in positions and descriptions do not match".into(),
            ));
        }
        Ok(SubarrayDescription {
            name: name.into(),
            positions,
            tels,
        })
    }

    pub fn num_tels(&self) -> usize {
        self.tels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tels.is_empty()
    }

    pub fn tels(&self) -> &BTreeMap<TelId, TelescopeDescription> {
        &self.tels
    }

    pub fn positions(&self) -> &BTreeMap<TelId, Vector3<Meter>> {
        &self.positions
    }

    /// Telescope ids in ascending order.
    pub fn tel_ids(&self) -> Vec<TelId> {
        self.tels.keys().copied().collect()
    }

    /// Map from telescope id to flat index.
    pub fn tel_indices(&self) -> BTreeMap<TelId, usize> {
        self.tels
            .keys()
            .enumerate()
            .map(|(index, tel_id)| (*tel_id, index))
            .collect()
    }

    /// Flat index of each id, `None` for ids outside the subarray.
    pub fn tel_ids_to_indices(&self, tel_ids: &[TelId]) -> Vec<Option<usize>> {
        let indices = self.tel_indices();
        tel_ids.iter().map(|id| indices.get(id).copied()).collect()
    }

    /// Boolean mask of length `num_tels` with the given telescopes set.
    pub fn tel_ids_to_mask(&self, tel_ids: &[TelId]) -> Vec<bool> {
        let mut mask = vec![false; self.num_tels()];
        for index in self.tel_ids_to_indices(tel_ids).into_iter().flatten() {
            mask[index] = true;
        }
        mask
    }

    pub fn tel_mask_to_tel_ids(&self, tel_mask: &[bool]) -> Vec<TelId> {
        self.tels
            .keys()
            .zip(tel_mask)
            .filter(|(_, selected)| **selected)
            .map(|(tel_id, _)| *tel_id)
            .collect()
    }

    /// Area `[km²]` of the smallest circle around the array centre containing every telescope.
    pub fn footprint(&self) -> f64 {
        let max_radius = self
            .positions
            .values()
            .map(|p| p.x.hypot(p.y))
            .fold(0.0, f64::max);
        max_radius.powi(2) * std::f64::consts::PI / 1e6
    }

    /// New subarray restricted to `tel_ids`.
    ///
    /// Without an explicit name the new subarray is called `"{name}_{ranges}"`, see
    /// [`range_extraction`].
    pub fn select_subarray(
        &self,
        tel_ids: &[TelId],
        name: Option<&str>,
    ) -> Result<SubarrayDescription, StereoFitError> {
        let mut positions = BTreeMap::new();
        let mut tels = BTreeMap::new();
        for tel_id in tel_ids {
            positions.insert(*tel_id, *self.position(*tel_id)?);
            tels.insert(*tel_id, self.tel(*tel_id)?.clone());
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let sorted: Vec<TelId> = tels.keys().copied().collect();
                format!("{}_{}", self.name, range_extraction(&sorted))
            }
        };
        SubarrayDescription::new(name, positions, tels)
    }

    /// Distinct telescope types, in order of first appearance.
    pub fn telescope_types(&self) -> Vec<&TelescopeDescription> {
        self.tels
            .values()
            .unique_by(|tel| tel.to_string())
            .collect()
    }

    /// Ids of the telescopes whose description renders as `tel_type`.
    pub fn get_tel_ids_for_type(&self, tel_type: &str) -> Vec<TelId> {
        self.tels
            .iter()
            .filter(|(_, tel)| tel.to_string() == tel_type)
            .map(|(tel_id, _)| *tel_id)
            .collect()
    }

    pub fn tel(&self, tel_id: TelId) -> Result<&TelescopeDescription, StereoFitError> {
        self.tels
            .get(&tel_id)
            .ok_or(StereoFitError::UnknownTelescope(tel_id))
    }

    pub fn position(&self, tel_id: TelId) -> Result<&Vector3<Meter>, StereoFitError> {
        self.positions
            .get(&tel_id)
            .ok_or(StereoFitError::UnknownTelescope(tel_id))
    }

    pub fn focal_length(&self, tel_id: TelId) -> Result<Meter, StereoFitError> {
        Ok(self.tel(tel_id)?.focal_length())
    }

    /// Multi-line summary: name, size, footprint and ids per telescope type.
    pub fn info(&self) -> String {
        let mut out = format!(
            "Subarray : {}\nNum Tels : {}\nFootprint: {:.2} km²\n",
            self.name,
            self.num_tels(),
            self.footprint()
        );
        for tel_type in self.telescope_types() {
            let type_name = tel_type.to_string();
            let ids = self.get_tel_ids_for_type(&type_name);
            out.push_str(&format!(
                "{type_name:<24} {:>4}  {}\n",
                ids.len(),
                range_extraction(&ids)
            ));
        }
        out
    }
}

impl fmt::Display for SubarrayDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
