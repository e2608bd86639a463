use rand::Rng;
use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::event::{Event, PlayWave, PlayWaveFlags, TrackRef};
use crate::instance::ResolvedInstanceRequest;

/// An ordered list of events sharing one volume offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    /// Clip volume in decibels.
    pub volume: f64,
    pub events: Vec<Event>,
}

impl Clip {
    /// The implicit clip of a simple sound: one track, no variation, no loop.
    pub fn simple(track: u16, wave_bank: u8) -> Self {
        Self {
            volume: 0.0,
            events: vec![Event::PlayWave(PlayWave::single(
                TrackRef { wave_bank, track },
                PlayWaveFlags::empty(),
                0,
            ))],
        }
    }

    /// Decode a clip body: event count, then the events.
    ///
    /// `volume` comes from the owning sound's clip table, not the clip body.
    pub fn read(c: &mut Cursor<'_>, volume: f64) -> Result<Self> {
        let count = c.read_u8()? as usize;
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            events.push(Event::read(c)?);
        }
        Ok(Self { volume, events })
    }

    /// Resolve every play-wave event of this clip.
    ///
    /// SetVolume gains multiply together and scale every wave of the clip,
    /// regardless of where they appear relative to the play-wave events.
    pub fn generate_instances<R: Rng + ?Sized>(
        &self,
        sound_volume: f64,
        sound_pitch: f32,
        wave_banks: &[String],
        rng: &mut R,
    ) -> Result<Vec<ResolvedInstanceRequest>> {
        let mut waves = Vec::new();
        let mut event_volume = 1.0f32;
        for event in &self.events {
            match event {
                Event::PlayWave(wave) => waves.push(wave.generate_instance(
                    self.volume,
                    sound_volume,
                    sound_pitch,
                    wave_banks,
                    rng,
                )?),
                Event::SetVolume(set) => event_volume *= set.gain_ratio(),
            }
        }

        for wave in &mut waves {
            wave.volume *= f64::from(event_volume);
        }
        Ok(waves)
    }
}
