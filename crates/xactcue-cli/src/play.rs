use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::Serialize;
use soundbank::variation::weighted_scan;
use soundbank::{Cue, ResolvedInstanceRequest, SoundBank};
use tracing::debug;

use crate::manifest::{BankManifest, CueKind};

/// One line of `play` output.
#[derive(Debug, Serialize)]
pub struct PlayRecord<'a> {
    pub cue: &'a str,
    pub play: usize,
    pub variant: usize,
    pub requests: Vec<ResolvedInstanceRequest>,
}

/// Decode the manifest cue called `name` and attach its control variable.
pub fn load_cue(bank: &SoundBank, manifest: &BankManifest, name: &str) -> Result<Cue> {
    let Some(entry) = manifest.cue(name) else {
        bail!("manifest has no cue named {name:?}");
    };
    let cue = match entry.kind {
        CueKind::Simple => bank.simple_cue(entry.offset),
        CueKind::Complex => bank.complex_cue(entry.offset),
    }
    .with_context(|| format!("failed to decode cue {name:?} at {:#x}", entry.offset))?;
    Ok(cue.with_control_variable(entry.control_variable.clone()))
}

/// Choose which sound variant of `cue` to play.
///
/// User-controlled cues play the variant whose range holds `variable`;
/// others draw by range width with the track selector's weighted scan.
pub fn pick_variant<R: Rng + ?Sized>(cue: &Cue, variable: Option<f32>, rng: &mut R) -> Result<usize> {
    if cue.is_user_controlled {
        let name = cue.control_variable.as_deref().unwrap_or_default();
        let Some(value) = variable else {
            bail!("cue is controlled by variable {name:?}; pass --variable");
        };
        return match cue.probabilities.iter().position(|r| r.contains(value)) {
            Some(index) => Ok(index),
            None => bail!("no variant covers {name} = {value}"),
        };
    }

    let widths: Vec<f64> = cue
        .probabilities
        .iter()
        .map(|r| f64::from(r.width().max(0.0)))
        .collect();
    let drawn = weighted_scan(widths.iter().copied().enumerate(), rng.gen::<f64>());
    Ok(drawn
        .or_else(|| widths.iter().position(|&w| w > 0.0))
        .unwrap_or(0))
}

/// Play `cue` `count` times, calling `emit` with each resolved play.
pub fn play<R: Rng + ?Sized>(
    bank: &SoundBank,
    name: &str,
    cue: &Cue,
    count: usize,
    variable: Option<f32>,
    rng: &mut R,
    mut emit: impl FnMut(&PlayRecord<'_>) -> Result<()>,
) -> Result<()> {
    for play in 0..count {
        let variant = pick_variant(cue, variable, rng)?;
        let sound = cue
            .sounds
            .get(variant)
            .with_context(|| format!("cue {name:?} has no variant {variant}"))?;
        let batch = bank
            .generate(sound, rng)
            .with_context(|| format!("failed to resolve cue {name:?}"))?;
        debug!(play, variant, instances = batch.len(), "played cue");
        emit(&PlayRecord {
            cue: name,
            play,
            variant,
            requests: batch.requests,
        })?;
    }
    Ok(())
}
