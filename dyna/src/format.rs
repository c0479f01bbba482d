use crate::codec::{self, CodecCategory, CodecId, CodecInfo};
use crate::error::{DynaError, Result};

/// Format-id prefixes carried in the low nibble of PES byte 3.
pub const AUDIO_FORMAT_PREFIX: u8 = 0x0C;
pub const MPEG4_FORMAT_PREFIX: u8 = 0x0D;
pub const JPEG_FORMAT_PREFIX: u8 = 0x0E;
pub const H264_FORMAT_PREFIX: u8 = 0x0F;
/// Not an official value. Only ever written, never detected.
pub const H265_FORMAT_PREFIX: u8 = 0x0B;

/// Elementary stream carried by a Dynacolor file. There is exactly one per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum StreamFormat {
    Audio,
    Jpeg,
    Mpeg4,
    H264,
    /// Write-only; see [`H265_FORMAT_PREFIX`].
    H265,
}

/// Detection order. The first matching prefix wins.
pub const DETECTION_ORDER: [(u8, StreamFormat); 4] = [
    (H264_FORMAT_PREFIX, StreamFormat::H264),
    (MPEG4_FORMAT_PREFIX, StreamFormat::Mpeg4),
    (JPEG_FORMAT_PREFIX, StreamFormat::Jpeg),
    (AUDIO_FORMAT_PREFIX, StreamFormat::Audio),
];

impl StreamFormat {
    pub fn format_prefix(self) -> u8 {
        match self {
            StreamFormat::Audio => AUDIO_FORMAT_PREFIX,
            StreamFormat::Jpeg => JPEG_FORMAT_PREFIX,
            StreamFormat::Mpeg4 => MPEG4_FORMAT_PREFIX,
            StreamFormat::H264 => H264_FORMAT_PREFIX,
            StreamFormat::H265 => H265_FORMAT_PREFIX,
        }
    }

    /// Codec a reader should register for this stream.
    pub fn codec(self) -> &'static CodecInfo {
        match self {
            StreamFormat::Audio => &codec::PCM_F16LE,
            StreamFormat::Jpeg => &codec::MJPEG,
            StreamFormat::Mpeg4 => &codec::MPEG4,
            StreamFormat::H264 => &codec::H264,
            StreamFormat::H265 => &codec::HEVC,
        }
    }

    pub fn is_audio(self) -> bool {
        self == StreamFormat::Audio
    }

    /// Map an outgoing codec to the format it is written as.
    ///
    /// Any audio codec is written with the audio prefix.
    pub fn for_codec(codec: CodecId) -> Result<Self> {
        if codec.category() == CodecCategory::Audio {
            return Ok(StreamFormat::Audio);
        }

        match codec {
            CodecId::Jpeg2000
            | CodecId::JpegLs
            | CodecId::Ljpeg
            | CodecId::Mjpeg
            | CodecId::MjpegB => Ok(StreamFormat::Jpeg),
            CodecId::H264 => Ok(StreamFormat::H264),
            CodecId::Hevc => Ok(StreamFormat::H265),
            CodecId::Mpeg4 => Ok(StreamFormat::Mpeg4),
            other => Err(DynaError::MuxerUnsupportedCodec {
                codec: other.name(),
            }),
        }
    }
}

/// Classify a stream from the format id of its first PES header.
pub fn detect_stream_format(format_id: u8) -> Result<StreamFormat> {
    for (prefix, format) in DETECTION_ORDER {
        log::debug!("Validating {format:?} PES header");
        if format_id == prefix {
            log::debug!("Stream has format 0x{prefix:02X} ({format:?})");
            return Ok(format);
        }
    }

    Err(DynaError::UnsupportedFormat { format_id })
}
