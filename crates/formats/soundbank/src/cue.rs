use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::bank::SoundBank;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::sound::Sound;

/// What to do when a cue is played while already at its instance limit.
///
/// Stored only; enforcement belongs to whoever schedules cue instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MaxInstanceBehavior {
    Fail = 0,
    Queue = 1,
    ReplaceOldest = 2,
    ReplaceQuietest = 3,
    ReplaceLowestPriority = 4,
}

impl MaxInstanceBehavior {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Fail),
            1 => Some(Self::Queue),
            2 => Some(Self::ReplaceOldest),
            3 => Some(Self::ReplaceQuietest),
            4 => Some(Self::ReplaceLowestPriority),
            _ => None,
        }
    }
}

/// Selection range of one cue variant, within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityRange {
    pub low: f32,
    pub high: f32,
}

impl ProbabilityRange {
    pub const FULL: Self = Self {
        low: 0.0,
        high: 1.0,
    };

    /// Relative weight of the variant.
    pub fn width(&self) -> f32 {
        self.high - self.low
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.low && value < self.high
    }
}

/// Cue flags bit: the record names one sound instead of a variation table.
const CUE_SINGLE_SOUND: u8 = 0x04;

/// Variation table entry layouts (bits 3..6 of the table flags).
mod table_type {
    pub const WAVE: u16 = 0;
    pub const SOUND: u16 = 1;
    pub const SOUND_FLOAT_WEIGHTS: u16 = 3;
    pub const WAVE_UNWEIGHTED: u16 = 4;
}

/// A playable cue: one or more sound variants and its instance policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    pub sounds: Vec<Arc<Sound>>,
    /// Parallel to `sounds`.
    pub probabilities: Vec<ProbabilityRange>,
    /// Category of the first variant.
    pub category: u16,
    pub is_user_controlled: bool,
    pub control_variable: Option<String>,
    pub instance_limit: u8,
    pub max_instance_behavior: MaxInstanceBehavior,
    pub fade_in_ms: u16,
    pub fade_out_ms: u16,
}

impl Cue {
    /// A cue that always plays `sound`.
    pub fn single(sound: Arc<Sound>) -> Self {
        Self {
            category: sound.category,
            sounds: vec![sound],
            probabilities: vec![ProbabilityRange::FULL],
            is_user_controlled: false,
            control_variable: None,
            instance_limit: 255,
            max_instance_behavior: MaxInstanceBehavior::ReplaceOldest,
            fade_in_ms: 0,
            fade_out_ms: 0,
        }
    }

    /// A cue choosing among `sounds` by `probabilities`. A non-empty
    /// `control_variable` makes the choice user controlled.
    pub fn with_variants(
        sounds: Vec<Arc<Sound>>,
        probabilities: Vec<ProbabilityRange>,
        control_variable: Option<String>,
    ) -> Result<Self> {
        let Some(category) = sounds.first().map(|s| s.category) else {
            return Err(Error::Parse {
                context: "cue",
                message: "cue has no sound variants".into(),
            });
        };
        if sounds.len() != probabilities.len() {
            return Err(Error::Parse {
                context: "cue",
                message: format!(
                    "{} sound variants but {} probability entries",
                    sounds.len(),
                    probabilities.len()
                ),
            });
        }

        Ok(Self {
            sounds,
            probabilities,
            category,
            is_user_controlled: false,
            control_variable: None,
            instance_limit: 255,
            max_instance_behavior: MaxInstanceBehavior::ReplaceOldest,
            fade_in_ms: 0,
            fade_out_ms: 0,
        }
        .with_control_variable(control_variable))
    }

    /// Attach (or clear) the variable that selects among the variants.
    pub fn with_control_variable(mut self, name: Option<String>) -> Self {
        self.is_user_controlled = name.as_deref().is_some_and(|v| !v.is_empty());
        self.control_variable = name;
        self
    }

    /// Apply a stored instance limit. The behavior lives in the top five bits
    /// of `behavior`.
    pub fn set_limit(&mut self, instance_limit: u8, behavior: u8) -> Result<()> {
        let raw = behavior >> 3;
        let max_instance_behavior =
            MaxInstanceBehavior::from_u8(raw).ok_or_else(|| Error::Parse {
                context: "cue",
                message: format!("unknown max instance behavior {raw}"),
            })?;
        self.instance_limit = instance_limit;
        self.max_instance_behavior = max_instance_behavior;
        Ok(())
    }

    /// Decode a simple cue record: flags, then the sound's offset.
    pub fn read_simple(c: &mut Cursor<'_>, bank: &SoundBank) -> Result<Self> {
        let _flags = c.read_u8()?;
        let sound_offset = c.read_u32()?;
        let cue = Self::single(bank.sound(sound_offset)?);
        debug!(sound_offset, "decoded simple cue");
        Ok(cue)
    }

    /// Decode a complex cue record: a single sound or a variation table,
    /// followed by instance limit, fades and instance flags.
    pub fn read_complex(c: &mut Cursor<'_>, bank: &SoundBank) -> Result<Self> {
        let flags = c.read_u8()?;
        let mut cue = if flags & CUE_SINGLE_SOUND != 0 {
            let sound_offset = c.read_u32()?;
            let _unknown = c.read_u32()?;
            Self::single(bank.sound(sound_offset)?)
        } else {
            let table_offset = c.read_u32()? as usize;
            let _transition_table_offset = c.read_u32()?;
            let (sounds, probabilities) =
                read_variation_table(&mut c.fork_at(table_offset), bank)?;
            Self::with_variants(sounds, probabilities, None)?
        };

        let instance_limit = c.read_u8()?;
        cue.fade_in_ms = c.read_u16()?;
        cue.fade_out_ms = c.read_u16()?;
        let instance_flags = c.read_u8()?;
        cue.set_limit(instance_limit, instance_flags)?;

        debug!(
            variants = cue.sounds.len(),
            instance_limit,
            behavior = ?cue.max_instance_behavior,
            "decoded complex cue"
        );
        Ok(cue)
    }
}

fn read_variation_table(
    c: &mut Cursor<'_>,
    bank: &SoundBank,
) -> Result<(Vec<Arc<Sound>>, Vec<ProbabilityRange>)> {
    let count = c.read_u16()? as usize;
    let flags = c.read_u16()?;
    let _unknown = c.read_u8()?;
    let _unknown = c.read_u16()?;
    let _unknown = c.read_u8()?;

    let kind = (flags >> 3) & 0x07;
    let mut sounds = Vec::with_capacity(count);
    let mut probabilities = Vec::with_capacity(count);
    for index in 0..count {
        let (sound, range) = match kind {
            table_type::WAVE => {
                let track = c.read_u16()?;
                let wave_bank = c.read_u8()?;
                let min = c.read_u8()?;
                let max = c.read_u8()?;
                (
                    Arc::new(Sound::simple(track, wave_bank)),
                    byte_range(min, max),
                )
            }
            table_type::SOUND => {
                let offset = c.read_u32()?;
                let min = c.read_u8()?;
                let max = c.read_u8()?;
                (bank.sound(offset)?, byte_range(min, max))
            }
            table_type::SOUND_FLOAT_WEIGHTS => {
                let offset = c.read_u32()?;
                let low = c.read_f32()?;
                let high = c.read_f32()?;
                let _unknown = c.read_u32()?;
                (bank.sound(offset)?, ProbabilityRange { low, high })
            }
            table_type::WAVE_UNWEIGHTED => {
                let track = c.read_u16()?;
                let wave_bank = c.read_u8()?;
                (
                    Arc::new(Sound::simple(track, wave_bank)),
                    // Equal slices laid end to end over [0, 1].
                    ProbabilityRange {
                        low: index as f32 / count as f32,
                        high: (index + 1) as f32 / count as f32,
                    },
                )
            }
            other => return Err(Error::UnsupportedVariationTable(other)),
        };
        sounds.push(sound);
        probabilities.push(range);
    }

    Ok((sounds, probabilities))
}

fn byte_range(min: u8, max: u8) -> ProbabilityRange {
    ProbabilityRange {
        low: f32::from(min) / 255.0,
        high: f32::from(max) / 255.0,
    }
}
