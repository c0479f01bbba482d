/// Codec category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum CodecCategory {
    Video,
    Audio,
}

/// Codecs a caller may hand to the writer, plus the ones a reader registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum CodecId {
    Mjpeg,
    MjpegB,
    Ljpeg,
    JpegLs,
    Jpeg2000,
    Mpeg4,
    H264,
    Hevc,
    Av1,
    Vp9,
    PcmF16le,
    PcmMulaw,
    Aac,
}

/// Information about a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub id: CodecId,
    /// Short codec name (e.g. "h264", "mjpeg").
    pub codec_name: &'static str,
    pub category: CodecCategory,
}

// Video codecs
pub const MJPEG: CodecInfo = CodecInfo { id: CodecId::Mjpeg, codec_name: "mjpeg", category: CodecCategory::Video };
pub const MJPEGB: CodecInfo = CodecInfo { id: CodecId::MjpegB, codec_name: "mjpegb", category: CodecCategory::Video };
pub const LJPEG: CodecInfo = CodecInfo { id: CodecId::Ljpeg, codec_name: "ljpeg", category: CodecCategory::Video };
pub const JPEGLS: CodecInfo = CodecInfo { id: CodecId::JpegLs, codec_name: "jpegls", category: CodecCategory::Video };
pub const JPEG2000: CodecInfo = CodecInfo { id: CodecId::Jpeg2000, codec_name: "jpeg2000", category: CodecCategory::Video };
pub const MPEG4: CodecInfo = CodecInfo { id: CodecId::Mpeg4, codec_name: "mpeg4", category: CodecCategory::Video };
pub const H264: CodecInfo = CodecInfo { id: CodecId::H264, codec_name: "h264", category: CodecCategory::Video };
pub const HEVC: CodecInfo = CodecInfo { id: CodecId::Hevc, codec_name: "hevc", category: CodecCategory::Video };
pub const AV1: CodecInfo = CodecInfo { id: CodecId::Av1, codec_name: "av1", category: CodecCategory::Video };
pub const VP9: CodecInfo = CodecInfo { id: CodecId::Vp9, codec_name: "vp9", category: CodecCategory::Video };

// Audio codecs
pub const PCM_F16LE: CodecInfo = CodecInfo { id: CodecId::PcmF16le, codec_name: "pcm_f16le", category: CodecCategory::Audio };
pub const PCM_MULAW: CodecInfo = CodecInfo { id: CodecId::PcmMulaw, codec_name: "pcm_mulaw", category: CodecCategory::Audio };
pub const AAC: CodecInfo = CodecInfo { id: CodecId::Aac, codec_name: "aac", category: CodecCategory::Audio };

pub const ALL_CODECS: &[CodecInfo] = &[
    MJPEG, MJPEGB, LJPEG, JPEGLS, JPEG2000, MPEG4, H264, HEVC, AV1, VP9, PCM_F16LE, PCM_MULAW, AAC,
];

impl CodecId {
    pub fn info(self) -> &'static CodecInfo {
        match self {
            CodecId::Mjpeg => &MJPEG,
            CodecId::MjpegB => &MJPEGB,
            CodecId::Ljpeg => &LJPEG,
            CodecId::JpegLs => &JPEGLS,
            CodecId::Jpeg2000 => &JPEG2000,
            CodecId::Mpeg4 => &MPEG4,
            CodecId::H264 => &H264,
            CodecId::Hevc => &HEVC,
            CodecId::Av1 => &AV1,
            CodecId::Vp9 => &VP9,
            CodecId::PcmF16le => &PCM_F16LE,
            CodecId::PcmMulaw => &PCM_MULAW,
            CodecId::Aac => &AAC,
        }
    }

    pub fn name(self) -> &'static str {
        self.info().codec_name
    }

    pub fn category(self) -> CodecCategory {
        self.info().category
    }
}
