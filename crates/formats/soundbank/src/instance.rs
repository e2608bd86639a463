use serde::Serialize;

use crate::error::{Error, Result};

/// One concrete wave to hand to the playback device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInstanceRequest {
    /// Name of the wave bank holding the track.
    pub wave_bank: String,
    pub track: u16,
    /// Linear amplitude ratio (1.0 = unity).
    pub volume: f64,
    /// Pitch offset: stored pitch units / 1000, 0.0 = recorded pitch.
    pub pitch: f32,
    pub looped: bool,
}

/// The requests produced by one play of a sound.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceBatch {
    pub requests: Vec<ResolvedInstanceRequest>,
    /// Realized volume of each request, in the same order.
    pub volumes: Vec<f64>,
}

impl InstanceBatch {
    pub(crate) fn from_requests(requests: Vec<ResolvedInstanceRequest>) -> Self {
        let volumes = requests.iter().map(|r| r.volume).collect();
        Self { requests, volumes }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Look up the name of the wave bank a track index refers to.
pub fn wave_bank_name(wave_banks: &[String], index: u8) -> Result<&str> {
    wave_banks
        .get(usize::from(index))
        .map(String::as_str)
        .ok_or(Error::UnknownWaveBank {
            index,
            available: wave_banks.len(),
        })
}
