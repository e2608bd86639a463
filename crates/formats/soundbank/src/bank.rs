use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;

use crate::cue::Cue;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::instance::InstanceBatch;
use crate::sound::Sound;

/// A loaded sound bank: its raw bytes, the names of the wave banks its
/// tracks refer to, and the sounds decoded so far.
///
/// Sounds are decoded on first use and shared between the cues that refer to
/// them. Every decode reads through its own cursor over the immutable buffer,
/// so a bank can be used from several threads at once.
pub struct SoundBank {
    data: Vec<u8>,
    wave_banks: Vec<String>,
    sounds: Mutex<HashMap<u32, Arc<Sound>>>,
}

impl SoundBank {
    /// `wave_banks` maps the wave bank indices stored in play-wave events to names.
    pub fn new(data: Vec<u8>, wave_banks: Vec<String>) -> Self {
        Self {
            data,
            wave_banks,
            sounds: Mutex::new(HashMap::new()),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn wave_banks(&self) -> &[String] {
        &self.wave_banks
    }

    /// The sound record at `offset`, decoded once and cached.
    pub fn sound(&self, offset: u32) -> Result<Arc<Sound>> {
        if let Some(sound) = self.sounds.lock().get(&offset) {
            return Ok(Arc::clone(sound));
        }

        // Decode without holding the lock; a concurrent decode of the same
        // offset yields an equal sound and the first insert wins.
        let sound = Arc::new(Sound::parse(&self.data, offset as usize)?);
        Ok(Arc::clone(
            self.sounds.lock().entry(offset).or_insert(sound),
        ))
    }

    /// Number of distinct sounds decoded so far.
    pub fn cached_sounds(&self) -> usize {
        self.sounds.lock().len()
    }

    /// Decode the simple cue record at `offset`.
    pub fn simple_cue(&self, offset: u32) -> Result<Cue> {
        let mut c = Cursor::new(&self.data);
        c.seek(offset as usize);
        Cue::read_simple(&mut c, self)
    }

    /// Decode the complex cue record at `offset`.
    pub fn complex_cue(&self, offset: u32) -> Result<Cue> {
        let mut c = Cursor::new(&self.data);
        c.seek(offset as usize);
        Cue::read_complex(&mut c, self)
    }

    /// Resolve one play of `sound` against this bank's wave bank names.
    pub fn generate<R: Rng + ?Sized>(&self, sound: &Sound, rng: &mut R) -> Result<InstanceBatch> {
        sound.generate_instances(&self.wave_banks, rng)
    }
}

impl std::fmt::Debug for SoundBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundBank")
            .field("len", &self.data.len())
            .field("wave_banks", &self.wave_banks)
            .field("cached_sounds", &self.cached_sounds())
            .finish()
    }
}
