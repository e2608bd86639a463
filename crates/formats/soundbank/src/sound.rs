use bitflags::bitflags;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::calc::parse_decibel;
use crate::clip::Clip;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::instance::InstanceBatch;

bitflags! {
    /// Sound record flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct SoundFlags: u8 {
        /// Clips are stored out of line and referenced by offset.
        const COMPLEX = 0x01;
        /// Any of these bits means an RPC code list follows.
        const HAS_RPC = 0x0E;
        const HAS_DSP = 0x10;
    }
}

/// A sound entry: category, base volume and pitch, and its clips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
    pub flags: SoundFlags,
    /// Audio category index.
    pub category: u16,
    /// Base volume in decibels.
    pub volume: f64,
    /// Base pitch in stored units; see [`Sound::pitch`].
    pub pitch_cents: i16,
    /// RPC curve codes. Stored, never evaluated.
    pub rpc_codes: Vec<u32>,
    /// DSP preset codes. Stored, never evaluated.
    pub dsp_codes: Vec<u32>,
    pub clips: Vec<Clip>,
}

impl Sound {
    /// A sound wrapping a single track, as referenced directly by simple cues.
    pub fn simple(track: u16, wave_bank: u8) -> Self {
        Self {
            flags: SoundFlags::empty(),
            category: 0,
            volume: 0.0,
            pitch_cents: 0,
            rpc_codes: Vec::new(),
            dsp_codes: Vec::new(),
            clips: vec![Clip::simple(track, wave_bank)],
        }
    }

    /// Decode the sound record at `offset` in the bank `data`.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let mut c = Cursor::new(data);
        c.seek(offset);
        Self::read(&mut c)
    }

    /// Decode a sound record at the cursor.
    ///
    /// The cursor must cover the whole bank: clip offsets are absolute. Clips
    /// are decoded through their own cursors, so on return `c` sits right
    /// after the record's last field.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        let start = c.position();
        let flags = SoundFlags::from_bits_retain(c.read_u8()?);
        let category = c.read_u16()?;
        let volume = parse_decibel(c.read_u8()?);
        let pitch_cents = c.read_i16()?;
        let _unknown = c.read_u8()?;
        let _entry_length = c.read_u16()?;

        let complex = flags.contains(SoundFlags::COMPLEX);
        let mut clips = Vec::new();
        let clip_count = if complex {
            c.read_u8()? as usize
        } else {
            let track = c.read_u16()?;
            let wave_bank = c.read_u8()?;
            clips.push(Clip::simple(track, wave_bank));
            0
        };

        let rpc_codes = if flags.intersects(SoundFlags::HAS_RPC) {
            read_code_list(c)?
        } else {
            Vec::new()
        };
        let dsp_codes = if flags.contains(SoundFlags::HAS_DSP) {
            read_code_list(c)?
        } else {
            Vec::new()
        };

        clips.reserve(clip_count);
        for _ in 0..clip_count {
            let clip_volume = parse_decibel(c.read_u8()?);
            let offset = c.read_u32()? as usize;
            let _unknown = c.read_u32()?;

            let mut clip_cursor = c.fork_at(offset);
            clips.push(Clip::read(&mut clip_cursor, clip_volume)?);
        }

        debug!(
            offset = start,
            complex,
            category,
            clips = clips.len(),
            rpc = rpc_codes.len(),
            dsp = dsp_codes.len(),
            "decoded sound"
        );

        Ok(Self {
            flags,
            category,
            volume,
            pitch_cents,
            rpc_codes,
            dsp_codes,
            clips,
        })
    }

    pub fn is_complex(&self) -> bool {
        self.flags.contains(SoundFlags::COMPLEX)
    }

    /// Base pitch in playback units (stored value / 1000).
    pub fn pitch(&self) -> f32 {
        f32::from(self.pitch_cents) / 1000.0
    }

    /// Resolve one play of this sound into playback requests.
    ///
    /// Each play advances the variation state of every play-wave event.
    pub fn generate_instances<R: Rng + ?Sized>(
        &self,
        wave_banks: &[String],
        rng: &mut R,
    ) -> Result<InstanceBatch> {
        let mut requests = Vec::new();
        for clip in &self.clips {
            requests.extend(clip.generate_instances(self.volume, self.pitch(), wave_banks, rng)?);
        }
        Ok(InstanceBatch::from_requests(requests))
    }
}

/// Length (unused), count, then `count` u32 codes.
fn read_code_list(c: &mut Cursor<'_>) -> Result<Vec<u32>> {
    let _length = c.read_u16()?;
    let count = c.read_u8()? as usize;
    let mut codes = Vec::with_capacity(count);
    for _ in 0..count {
        codes.push(c.read_u32()?);
    }
    Ok(codes)
}
