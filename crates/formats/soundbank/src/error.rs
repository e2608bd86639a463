/// Errors produced while decoding a sound bank or resolving playback.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },

    /// An event record whose type code has no decoder.
    #[error("event type {0} is not implemented")]
    UnsupportedEventType(u32),

    /// A variation playlist type with no selection rule (e.g. shuffle).
    #[error("variation playlist type {0} is not implemented")]
    UnsupportedVariationPolicy(u16),

    /// A cue variation table layout with no decoder.
    #[error("cue variation table type {0} is not implemented")]
    UnsupportedVariationTable(u16),

    #[error("wave bank index {index} has no loaded wave bank ({available} loaded)")]
    UnknownWaveBank { index: u8, available: usize },
}

impl Error {
    /// The bytes are truncated or structurally impossible.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. } | Self::Parse { .. })
    }

    /// The bank uses a format feature this reader does not cover.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedEventType(_)
                | Self::UnsupportedVariationPolicy(_)
                | Self::UnsupportedVariationTable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
