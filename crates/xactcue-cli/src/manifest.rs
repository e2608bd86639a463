use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How a cue record is laid out in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Simple,
    Complex,
}

/// A named cue: where its record lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueEntry {
    pub name: String,
    /// Absolute offset of the cue record in the bank.
    pub offset: u32,
    pub kind: CueKind,
    /// Variable whose value selects the variant of a user-controlled cue.
    #[serde(default)]
    pub control_variable: Option<String>,
}

/// Top-level bank manifest (xactcue.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankManifest {
    /// Path to the sound bank file (relative to the manifest, resolved on load).
    pub bank: PathBuf,
    /// Wave bank names, indexed by the wave bank numbers stored in events.
    pub wave_banks: Vec<String>,
    /// Default RNG seed for `play`.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub cues: Vec<CueEntry>,
}

impl BankManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&text, dir)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Parse a manifest, resolving a relative `bank` path against `dir`.
    pub fn from_json(text: &str, dir: &Path) -> Result<Self> {
        let mut manifest: Self = serde_json::from_str(text)?;
        if manifest.bank.is_relative() {
            manifest.bank = dir.join(&manifest.bank);
        }
        Ok(manifest)
    }

    pub fn cue(&self, name: &str) -> Option<&CueEntry> {
        self.cues.iter().find(|c| c.name == name)
    }
}
