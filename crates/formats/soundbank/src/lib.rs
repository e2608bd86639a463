//! Reader for compiled XACT sound bank records.
//!
//! Decodes sounds, clips, events and cues out of a sound bank's raw bytes and
//! resolves a decoded sound into concrete playback requests (wave bank, track,
//! volume ratio, pitch, loop flag) for an external playback device.
//!
//! All offsets are absolute from the start of the bank's byte buffer and all
//! multi-byte values are little-endian.

pub mod bank;
pub mod calc;
pub mod clip;
pub mod cue;
pub mod cursor;
pub mod error;
pub mod event;
pub mod instance;
pub mod sound;
pub mod variation;

pub use bank::SoundBank;
pub use clip::Clip;
pub use cue::{Cue, MaxInstanceBehavior, ProbabilityRange};
pub use error::{Error, Result};
pub use event::{Event, PlayWave, PlayWaveFlags, SetVolume, TrackRef};
pub use instance::{InstanceBatch, ResolvedInstanceRequest};
pub use sound::{Sound, SoundFlags};
pub use variation::{SelectorState, VariationPolicy};

/// Decode the sound record at `offset` in `data`.
pub fn decode_sound(data: &[u8], offset: usize) -> Result<Sound> {
    Sound::parse(data, offset)
}
