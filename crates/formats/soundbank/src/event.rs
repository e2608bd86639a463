use bitflags::bitflags;
use rand::Rng;
use serde::Serialize;
use tracing::{trace, warn};

use crate::calc::{amplitude_ratio, parse_decibel};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::instance::{wave_bank_name, ResolvedInstanceRequest};
use crate::variation::{SelectorState, VariationPolicy};

/// Event type codes (low 5 bits of the event header).
pub mod event_type {
    pub const PLAY_WAVE: u32 = 1;
    pub const PLAY_WAVE_VARIATIONS: u32 = 3;
    pub const PLAY_WAVE_WITH_EFFECTS: u32 = 4;
    pub const PLAY_WAVE_VARIATIONS_WITH_EFFECTS: u32 = 6;
    pub const SET_VOLUME: u32 = 8;
}

/// A loop count of 255 means loop forever.
pub const LOOP_INFINITE: u8 = 255;

bitflags! {
    /// Play-wave event flags. Kept for completeness; not interpreted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct PlayWaveFlags: u8 {
        const BREAK_LOOP = 0x01;
        const USE_SPEAKER_POSITION = 0x02;
        const USE_CENTER_SPEAKER = 0x04;
        const NEW_SPEAKER_POSITION_ON_LOOP = 0x08;
    }
}

bitflags! {
    /// Variation flags of a type-6 event: which random ranges are honored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct VariationFlags: u8 {
        const PITCH = 0x10;
        const VOLUME = 0x20;
    }
}

/// A track in a wave bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TrackRef {
    /// Index into the bank's wave bank name list.
    pub wave_bank: u8,
    /// Track index within that wave bank.
    pub track: u16,
}

/// Play one of a list of tracks with optional random pitch and volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayWave {
    pub flags: PlayWaveFlags,
    /// Candidate tracks, parallel to `weights`. Never empty.
    pub tracks: Vec<TrackRef>,
    /// Random pitch offset range in stored units (cents × 1000 scale).
    pub pitch_range: (i16, i16),
    /// Random volume offset range in decibels.
    pub volume_range: (f64, f64),
    pub loop_count: u8,
    pub policy: VariationPolicy,
    pub weights: Vec<u8>,
    #[serde(skip)]
    selector: SelectorState,
}

/// Scale the volume of every wave in the clip by a constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetVolume {
    /// Gain in decibels.
    pub gain: f32,
}

/// A decoded clip event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    PlayWave(PlayWave),
    SetVolume(SetVolume),
}

impl PlayWave {
    /// A single track with no variation, as stored by type-1 events and simple sounds.
    pub fn single(track: TrackRef, flags: PlayWaveFlags, loop_count: u8) -> Self {
        Self {
            flags,
            tracks: vec![track],
            pitch_range: (0, 0),
            volume_range: (0.0, 0.0),
            loop_count,
            policy: VariationPolicy::Ordered,
            weights: vec![0xFF],
            selector: SelectorState::new(),
        }
    }

    /// Index of the track picked by the previous play, if any.
    pub fn last_picked(&self) -> Option<usize> {
        self.selector.last_picked()
    }

    pub fn is_looped(&self) -> bool {
        self.loop_count == LOOP_INFINITE
    }

    /// Pick a track and resolve its playback parameters.
    ///
    /// `sound_pitch` is already scaled to pitch units (stored value / 1000).
    pub fn generate_instance<R: Rng + ?Sized>(
        &self,
        clip_volume: f64,
        sound_volume: f64,
        sound_pitch: f32,
        wave_banks: &[String],
        rng: &mut R,
    ) -> Result<ResolvedInstanceRequest> {
        let index = self.selector.advance(self.policy, &self.weights, rng);
        let track = *self.tracks.get(index).ok_or_else(|| Error::Parse {
            context: "play-wave event",
            message: format!("picked track {index} of {}", self.tracks.len()),
        })?;
        let wave_bank = wave_bank_name(wave_banks, track.wave_bank)?;

        let (min_volume, max_volume) = self.volume_range;
        let volume_offset = rng.gen::<f64>() * (max_volume - min_volume) + min_volume;
        let volume = amplitude_ratio(sound_volume + clip_volume + volume_offset);

        let (min_pitch, max_pitch) = self.pitch_range;
        let pitch = random_pitch(min_pitch, max_pitch, rng) as f32 / 1000.0 + sound_pitch;

        Ok(ResolvedInstanceRequest {
            wave_bank: wave_bank.to_owned(),
            track: track.track,
            volume: f64::from(volume),
            pitch,
            // Finite loop counts are played once.
            looped: self.is_looped(),
        })
    }

    fn warn_inverted_ranges(&self) {
        let (min_pitch, max_pitch) = self.pitch_range;
        if min_pitch > max_pitch {
            warn!(min_pitch, max_pitch, "play-wave event has an inverted pitch range");
        }
        let (min_volume, max_volume) = self.volume_range;
        if min_volume > max_volume {
            warn!(min_volume, max_volume, "play-wave event has an inverted volume range");
        }
    }
}

/// Uniform integer in `[min, max)`; `min` when the range is empty. An inverted
/// range is not reordered: the draw lands in `[max, min]`.
fn random_pitch<R: Rng + ?Sized>(min: i16, max: i16, rng: &mut R) -> i32 {
    let span = f64::from(i32::from(max) - i32::from(min));
    i32::from(min) + (rng.gen::<f64>() * span).floor() as i32
}

impl SetVolume {
    /// The gain as a linear amplitude multiplier.
    pub fn gain_ratio(&self) -> f32 {
        amplitude_ratio(f64::from(self.gain))
    }
}

impl Event {
    /// Decode one event record at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        let start = c.position();
        let info = c.read_u32()?;
        let kind = info & 0x1F;
        trace!(offset = start, kind, "decoding event");

        let event = match kind {
            event_type::PLAY_WAVE => Self::PlayWave(read_play_wave(c)?),
            event_type::PLAY_WAVE_VARIATIONS => Self::PlayWave(read_play_wave_variations(c)?),
            event_type::PLAY_WAVE_WITH_EFFECTS => Self::PlayWave(read_play_wave_with_effects(c)?),
            event_type::PLAY_WAVE_VARIATIONS_WITH_EFFECTS => {
                Self::PlayWave(read_play_wave_variations_with_effects(c)?)
            }
            event_type::SET_VOLUME => Self::SetVolume(read_set_volume(c)?),
            other => return Err(Error::UnsupportedEventType(other)),
        };

        if let Self::PlayWave(wave) = &event {
            wave.warn_inverted_ranges();
        }
        Ok(event)
    }
}

fn read_play_wave(c: &mut Cursor<'_>) -> Result<PlayWave> {
    c.skip(3)?;
    let flags = PlayWaveFlags::from_bits_retain(c.read_u8()?);
    let track = c.read_u16()?;
    let wave_bank = c.read_u8()?;
    let loop_count = c.read_u8()?;
    let _reserved = c.read_u32()?;

    Ok(PlayWave::single(
        TrackRef { wave_bank, track },
        flags,
        loop_count,
    ))
}

fn read_play_wave_variations(c: &mut Cursor<'_>) -> Result<PlayWave> {
    c.skip(3)?;
    let flags = PlayWaveFlags::from_bits_retain(c.read_u8()?);
    c.skip(5)?;
    let (policy, tracks, weights) = read_track_table(c)?;

    Ok(PlayWave {
        flags,
        tracks,
        pitch_range: (0, 0),
        volume_range: (0.0, 0.0),
        loop_count: 0,
        policy,
        weights,
        selector: SelectorState::new(),
    })
}

fn read_play_wave_with_effects(c: &mut Cursor<'_>) -> Result<PlayWave> {
    c.skip(3)?;
    let flags = PlayWaveFlags::from_bits_retain(c.read_u8()?);
    let track = c.read_u16()?;
    let wave_bank = c.read_u8()?;
    let loop_count = c.read_u8()?;
    c.skip(4)?;
    let pitch_range = (c.read_i16()?, c.read_i16()?);
    let volume_range = (parse_decibel(c.read_u8()?), parse_decibel(c.read_u8()?));
    // Four unknown floats and a byte.
    c.skip(4 * 4 + 1)?;

    Ok(PlayWave {
        pitch_range,
        volume_range,
        ..PlayWave::single(TrackRef { wave_bank, track }, flags, loop_count)
    })
}

fn read_play_wave_variations_with_effects(c: &mut Cursor<'_>) -> Result<PlayWave> {
    c.skip(3)?;
    let flags = PlayWaveFlags::from_bits_retain(c.read_u8()?);
    c.skip(5)?;
    let mut pitch_range = (c.read_i16()?, c.read_i16()?);
    let mut volume_range = (parse_decibel(c.read_u8()?), parse_decibel(c.read_u8()?));
    c.skip(4 * 4 + 1)?;

    let variation = VariationFlags::from_bits_retain(c.read_u8()?);
    if !variation.contains(VariationFlags::VOLUME) {
        volume_range = (0.0, 0.0);
    }
    if !variation.contains(VariationFlags::PITCH) {
        pitch_range = (0, 0);
    }

    let (policy, tracks, weights) = read_track_table(c)?;

    Ok(PlayWave {
        flags,
        tracks,
        pitch_range,
        volume_range,
        loop_count: 0,
        policy,
        weights,
        selector: SelectorState::new(),
    })
}

/// Track count, playlist type, padding, then `(track, wave bank, min weight, max weight)` records.
fn read_track_table(c: &mut Cursor<'_>) -> Result<(VariationPolicy, Vec<TrackRef>, Vec<u8>)> {
    let count = c.read_u16()? as usize;
    let policy = VariationPolicy::from_u16(c.read_u16()?)?;
    c.skip(4)?;

    if count == 0 {
        return Err(Error::Parse {
            context: "play-wave event",
            message: format!("empty track list at offset {:#x}", c.position()),
        });
    }

    let mut tracks = Vec::with_capacity(count);
    let mut weights = Vec::with_capacity(count);
    for _ in 0..count {
        let track = c.read_u16()?;
        let wave_bank = c.read_u8()?;
        let min_weight = c.read_u8()?;
        let max_weight = c.read_u8()?;
        tracks.push(TrackRef { wave_bank, track });
        weights.push(max_weight.wrapping_sub(min_weight));
    }

    Ok((policy, tracks, weights))
}

fn read_set_volume(c: &mut Cursor<'_>) -> Result<SetVolume> {
    c.skip(5)?;
    let gain = c.read_f32()?;
    c.skip(8)?;
    Ok(SetVolume { gain })
}
