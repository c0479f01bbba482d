use thiserror::Error;

#[derive(Error, Debug)]
pub enum DynaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated input reading {region}: expected {expected} bytes, got {got}")]
    TruncatedInput {
        region: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unsupported stream format id 0x{format_id:02X}")]
    UnsupportedFormat { format_id: u8 },

    #[error("invalid PES header: expected 32 bytes, got {got}")]
    InvalidPesHeader { got: usize },

    #[error("no Dynacolor format mapping for codec {codec}")]
    MuxerUnsupportedCodec { codec: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DynaError {
    /// Whether the session can still be used after this error.
    ///
    /// Only a failed classification is recoverable; everything else leaves the
    /// byte cursor at an unknown position.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DynaError::UnsupportedFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, DynaError>;
