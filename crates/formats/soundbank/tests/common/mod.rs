//! Builders for synthetic sound bank bytes.
//!
//! Event builders return the encoded record; sound builders append to a
//! `Writer` that represents the whole bank, so clip offsets are absolute.

#![allow(dead_code)]

use soundbank::cursor::Writer;

/// `(track, wave bank, min weight, max weight)`
pub type TrackEntry = (u16, u8, u8, u8);

fn event_header(w: &mut Writer, kind: u32) {
    // Timestamp bits above the type code are ignored by the decoder.
    w.write_u32((0x40 << 5) | kind);
}

/// Type 1: single track, no variation.
pub fn play_wave(track: u16, wave_bank: u8, loop_count: u8) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, 1);
    w.write_bytes(&[0; 3]);
    w.write_u8(0);
    w.write_u16(track);
    w.write_u8(wave_bank);
    w.write_u8(loop_count);
    w.write_u32(0);
    w.into_bytes()
}

fn track_table(w: &mut Writer, policy: u16, tracks: &[TrackEntry]) {
    w.write_u16(tracks.len() as u16);
    w.write_u16(policy);
    w.write_u32(0);
    for &(track, wave_bank, min, max) in tracks {
        w.write_u16(track);
        w.write_u8(wave_bank);
        w.write_u8(min);
        w.write_u8(max);
    }
}

/// Type 3: weighted track list, no pitch/volume variation.
pub fn play_wave_variations(policy: u16, tracks: &[TrackEntry]) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, 3);
    w.write_bytes(&[0; 3]);
    w.write_u8(0);
    w.write_bytes(&[0; 5]);
    track_table(&mut w, policy, tracks);
    w.into_bytes()
}

/// Type 4: single track with pitch and volume ranges.
pub fn play_wave_with_effects(
    track: u16,
    wave_bank: u8,
    loop_count: u8,
    pitch: (i16, i16),
    volume: (u8, u8),
) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, 4);
    w.write_bytes(&[0; 3]);
    w.write_u8(0);
    w.write_u16(track);
    w.write_u8(wave_bank);
    w.write_u8(loop_count);
    w.write_u32(0);
    w.write_i16(pitch.0);
    w.write_i16(pitch.1);
    w.write_u8(volume.0);
    w.write_u8(volume.1);
    for _ in 0..4 {
        w.write_f32(0.0);
    }
    w.write_u8(0);
    w.into_bytes()
}

/// Type 6: weighted track list with gated pitch and volume ranges.
pub fn play_wave_variations_with_effects(
    pitch: (i16, i16),
    volume: (u8, u8),
    variation_flags: u8,
    policy: u16,
    tracks: &[TrackEntry],
) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, 6);
    w.write_bytes(&[0; 3]);
    w.write_u8(0);
    w.write_bytes(&[0; 5]);
    w.write_i16(pitch.0);
    w.write_i16(pitch.1);
    w.write_u8(volume.0);
    w.write_u8(volume.1);
    for _ in 0..4 {
        w.write_f32(0.0);
    }
    w.write_u8(0);
    w.write_u8(variation_flags);
    track_table(&mut w, policy, tracks);
    w.into_bytes()
}

/// Type 8: set volume.
pub fn set_volume(gain: f32) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, 8);
    w.write_bytes(&[0; 5]);
    w.write_f32(gain);
    w.write_bytes(&[0; 8]);
    w.into_bytes()
}

/// An event record with an arbitrary type code and a zeroed body.
pub fn raw_event(kind: u32) -> Vec<u8> {
    let mut w = Writer::new();
    event_header(&mut w, kind);
    w.write_bytes(&[0; 16]);
    w.into_bytes()
}

/// A clip body: event count, then the events.
pub fn clip_body(events: &[Vec<u8>]) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(events.len() as u8);
    for event in events {
        w.write_bytes(event);
    }
    w.into_bytes()
}

/// Common sound header fields.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub category: u16,
    pub volume: u8,
    pub pitch: i16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            category: 0,
            // Close to unity gain.
            volume: 180,
            pitch: 0,
        }
    }
}

fn header(w: &mut Writer, flags: u8, h: Header) {
    w.write_u8(flags);
    w.write_u16(h.category);
    w.write_u8(h.volume);
    w.write_i16(h.pitch);
    w.write_u8(0);
    w.write_u16(0);
}

fn code_list(w: &mut Writer, codes: &[u32]) {
    w.write_u16((1 + codes.len() * 4) as u16);
    w.write_u8(codes.len() as u8);
    for &code in codes {
        w.write_u32(code);
    }
}

/// Append a simple sound record. Returns the record's offset.
pub fn simple_sound(w: &mut Writer, h: Header, track: u16, wave_bank: u8) -> usize {
    let at = w.position();
    header(w, 0x00, h);
    w.write_u16(track);
    w.write_u8(wave_bank);
    at
}

/// Offsets of an appended complex sound.
#[derive(Debug, Clone, Copy)]
pub struct ComplexSound {
    /// Start of the sound record.
    pub offset: usize,
    /// First byte after the clip table.
    pub table_end: usize,
}

/// Append a complex sound record followed by its clip bodies.
///
/// `extra_flags` adds RPC (0x0E) / DSP (0x10) bits; the matching code lists
/// are written when set. `clips` holds `(volume byte, clip body)`.
pub fn complex_sound(
    w: &mut Writer,
    h: Header,
    extra_flags: u8,
    rpc: &[u32],
    dsp: &[u32],
    clips: &[(u8, Vec<u8>)],
) -> ComplexSound {
    let offset = w.position();
    header(w, 0x01 | extra_flags, h);
    w.write_u8(clips.len() as u8);
    if extra_flags & 0x0E != 0 {
        code_list(w, rpc);
    }
    if extra_flags & 0x10 != 0 {
        code_list(w, dsp);
    }

    let mut patches = Vec::with_capacity(clips.len());
    for (volume, _) in clips {
        w.write_u8(*volume);
        patches.push(w.position());
        w.write_u32(0);
        w.write_u32(0);
    }
    let table_end = w.position();

    for (patch, (_, body)) in patches.into_iter().zip(clips) {
        let at = w.position() as u32;
        w.write_bytes(body);
        w.patch_u32(patch, at);
    }

    ComplexSound { offset, table_end }
}

pub fn wave_banks() -> Vec<String> {
    vec!["Music".to_owned(), "Effects".to_owned(), "Voice".to_owned()]
}
