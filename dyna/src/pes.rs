use crate::error::{DynaError, Result};
use crate::format::StreamFormat;
use crate::size::SizeFields;

pub const PES_HEADER_SIZE: usize = 32;

/// Start code documented for recorder-produced files. Not checked on read.
pub const CAPTURE_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
/// Start code this crate writes.
pub const OUTPUT_START_CODE: [u8; 3] = [0x50, 0xF1, 0x63];

/// Fixed values written into every output PES header.
const OUTPUT_PICTURE_TYPE: u8 = 0x48;
const OUTPUT_IS_INTERLEAVED: u8 = 0x00;
const OUTPUT_FIELD_ID: u8 = 0x01;
const OUTPUT_SIZE_MARKER0: u8 = 0x00;
const OUTPUT_SIZE_MARKER1: u8 = 0x01;

/// The 32-byte transport header in front of each payload.
///
/// Layout:
///
/// | bytes  | content                                            |
/// |--------|----------------------------------------------------|
/// | 0-2    | start code                                         |
/// | 3      | format id (low nibble), channel id                 |
/// | 4-23   | five reserved words                                |
/// | 24-27  | payload size chunks, see [`SizeFields`]            |
/// | 28, 29 | size markers (bit 0)                               |
/// | 30     | picture type (1: I, 2: P, 3: B)                    |
/// | 31     | interleaved (bit 0), field id (bits 1-2)           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PesHeader {
    pub start_code: [u8; 3],
    pub format_id: u8,
    pub channel_id: u8,
    pub reserved: [u32; 5],
    pub size: SizeFields,
    pub size_marker0: u8,
    pub size_marker1: u8,
    pub picture_type: u8,
    pub is_interleaved: u8,
    pub field_id: u8,
}

impl PesHeader {
    /// Decode a PES header from the first 32 bytes of `data`.
    ///
    /// Size markers are read but not enforced: a header with both markers
    /// cleared still decodes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let data: &[u8; PES_HEADER_SIZE] = data
            .get(..PES_HEADER_SIZE)
            .and_then(|d| d.try_into().ok())
            .ok_or(DynaError::InvalidPesHeader { got: data.len() })?;

        let mut reserved = [0u32; 5];
        for (i, word) in reserved.iter_mut().enumerate() {
            let off = 4 + i * 4;
            *word = u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
        }

        Ok(PesHeader {
            start_code: [data[0], data[1], data[2]],
            format_id: data[3] & 0x0F,
            // A byte shifted right by 8 is always zero; kept as observed.
            channel_id: ((data[3] as u32 >> 8) & 0x0F) as u8,
            reserved,
            size: SizeFields {
                bit7to0: data[24],
                bit10to8: data[25] & 0x08,
                bit14to11: data[26] & 0x0F,
                bit21to15: data[27],
            },
            size_marker0: data[28] & 0x01,
            size_marker1: data[29] & 0x01,
            picture_type: data[30],
            is_interleaved: data[31] & 0x01,
            field_id: (data[31] >> 1) & 0x03,
        })
    }

    /// Build the PES header written in front of a payload of `payload_size` bytes.
    pub fn for_output(format: StreamFormat, payload_size: u32) -> Self {
        PesHeader {
            start_code: OUTPUT_START_CODE,
            format_id: format.format_prefix(),
            channel_id: 0x00,
            reserved: [0; 5],
            size: SizeFields::from_payload_size(payload_size),
            size_marker0: OUTPUT_SIZE_MARKER0,
            size_marker1: OUTPUT_SIZE_MARKER1,
            picture_type: OUTPUT_PICTURE_TYPE,
            is_interleaved: OUTPUT_IS_INTERLEAVED,
            field_id: OUTPUT_FIELD_ID,
        }
    }

    pub fn to_bytes(&self) -> [u8; PES_HEADER_SIZE] {
        let mut out = [0u8; PES_HEADER_SIZE];
        out[..3].copy_from_slice(&self.start_code);
        out[3] = (self.format_id & 0x0F) | ((self.channel_id & 0x0F) << 4);
        for (i, word) in self.reserved.iter().enumerate() {
            let off = 4 + i * 4;
            out[off..off + 4].copy_from_slice(&word.to_le_bytes());
        }
        out[24] = self.size.bit7to0;
        out[25] = self.size.bit10to8;
        out[26] = self.size.bit14to11;
        out[27] = self.size.bit21to15;
        out[28] = self.size_marker0 & 0x01;
        out[29] = self.size_marker1 & 0x01;
        out[30] = self.picture_type;
        out[31] = (self.is_interleaved & 0x01) | ((self.field_id & 0x03) << 1);
        out
    }

    /// Both size markers read 1, as they should in a well-formed header.
    pub fn size_markers_valid(&self) -> bool {
        self.size_marker0 == 1 && self.size_marker1 == 1
    }

    pub fn has_capture_start_code(&self) -> bool {
        self.start_code == CAPTURE_START_CODE
    }
}
