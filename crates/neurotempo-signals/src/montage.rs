//! Electrode montage of the reference headset and the raw-row permutation.
//!
//! Quality scores are always reported in canonical electrode order. Which raw
//! EEG row carries which electrode depends on the firmware revision, so the
//! mapping is injected as an `ElectrodeMap` rather than assumed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The four dry electrodes of the reference headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Electrode {
    TP9,
    AF7,
    AF8,
    TP10,
}

impl Electrode {
    /// Canonical reporting order (left ear, left forehead, right forehead, right ear).
    pub const CANONICAL: [Electrode; 4] = [
        Electrode::TP9,
        Electrode::AF7,
        Electrode::AF8,
        Electrode::TP10,
    ];

    /// Position in `CANONICAL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Electrode::TP9 => "TP9",
            Electrode::AF7 => "AF7",
            Electrode::AF8 => "AF8",
            Electrode::TP10 => "TP10",
        }
    }

    /// Repositioning hint shown while this electrode has no contact.
    pub fn contact_tip(self) -> &'static str {
        match self {
            Electrode::TP9 => {
                "TP9 (left ear) has no contact. Move hair away and adjust it so it rests directly on skin."
            }
            Electrode::TP10 => {
                "TP10 (right ear) has no contact. Clear any hair and gently reposition it against your ear."
            }
            Electrode::AF7 => {
                "AF7 has no contact. Move hair away from the forehead and slide the headset slightly."
            }
            Electrode::AF8 => {
                "AF8 has no contact. Make sure no hair is underneath and adjust the fit on your forehead."
            }
        }
    }
}

impl fmt::Display for Electrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MontageError {
    #[error("raw order lists {0} electrodes, expected 4")]
    WrongLength(usize),
    #[error("electrode {0} appears more than once in raw order")]
    Duplicate(Electrode),
}

/// Permutation from canonical electrode to raw EEG row (position within the
/// layout's EEG rows). Serialized as the raw electrode order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Electrode>", into = "Vec<Electrode>")]
pub struct ElectrodeMap {
    /// `rows[i]` is the raw EEG row of `Electrode::CANONICAL[i]`
    rows: [usize; 4],
}

impl ElectrodeMap {
    /// Build from the electrode order the hardware emits its EEG rows in.
    pub fn from_raw_order(raw_order: &[Electrode]) -> Result<Self, MontageError> {
        if raw_order.len() != 4 {
            return Err(MontageError::WrongLength(raw_order.len()));
        }
        let mut rows = [usize::MAX; 4];
        for (raw_row, electrode) in raw_order.iter().enumerate() {
            let slot = electrode.index();
            if rows[slot] != usize::MAX {
                return Err(MontageError::Duplicate(*electrode));
            }
            rows[slot] = raw_row;
        }
        Ok(Self { rows })
    }

    /// Identity map: raw rows already come in canonical order.
    pub fn identity() -> Self {
        Self { rows: [0, 1, 2, 3] }
    }

    pub fn raw_row(&self, electrode: Electrode) -> usize {
        self.rows[electrode.index()]
    }

    /// `(electrode, raw_row)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Electrode, usize)> + '_ {
        Electrode::CANONICAL.iter().copied().zip(self.rows.iter().copied())
    }

    /// Electrode carried by each raw EEG row.
    pub fn raw_order(&self) -> Vec<Electrode> {
        let mut order = Electrode::CANONICAL.to_vec();
        for (electrode, row) in self.iter() {
            order[row] = electrode;
        }
        order
    }
}

impl TryFrom<Vec<Electrode>> for ElectrodeMap {
    type Error = MontageError;

    fn try_from(raw_order: Vec<Electrode>) -> Result<Self, Self::Error> {
        Self::from_raw_order(&raw_order)
    }
}

impl From<ElectrodeMap> for Vec<Electrode> {
    fn from(map: ElectrodeMap) -> Self {
        map.raw_order()
    }
}

impl Default for ElectrodeMap {
    fn default() -> Self {
        Self::identity()
    }
}
