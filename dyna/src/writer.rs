use std::io::Write;

use crate::codec::CodecId;
use crate::error::{DynaError, Result};
use crate::format::StreamFormat;
use crate::record::{single_stream, EncodedHeader};
use crate::size::MAX_PAYLOAD_SIZE;

/// Writes a single-stream Dynacolor recording, one record per payload.
pub struct DynaWriter<W: Write> {
    inner: W,
    codec: CodecId,
    stream_format: StreamFormat,
    frames_written: u64,
}

impl<W: Write> DynaWriter<W> {
    /// Check the output streams before anything is written.
    ///
    /// Fails with `InvalidInput` unless there is exactly one stream, and with
    /// `MuxerUnsupportedCodec` if its codec has no Dynacolor format id.
    pub fn new(inner: W, streams: &[CodecId]) -> Result<Self> {
        let codec = single_stream(streams)?;
        let stream_format = StreamFormat::for_codec(codec)?;
        log::debug!(
            "Writing {} stream as format 0x{:02X}",
            codec.name(),
            stream_format.format_prefix()
        );

        Ok(DynaWriter {
            inner,
            codec,
            stream_format,
            frames_written: 0,
        })
    }

    pub fn stream_format(&self) -> StreamFormat {
        self.stream_format
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write one record: compound header, PES header, then `payload`.
    pub fn write_frame(&mut self, payload: &[u8], time: u32) -> Result<()> {
        let size = u32::try_from(payload.len())
            .ok()
            .filter(|&s| s <= MAX_PAYLOAD_SIZE)
            .ok_or_else(|| {
                DynaError::InvalidInput(format!(
                    "payload of {} bytes exceeds the {MAX_PAYLOAD_SIZE} byte limit",
                    payload.len()
                ))
            })?;

        let encoded = EncodedHeader::for_stream(self.codec, self.stream_format, size, time);
        self.inner.write_all(&encoded.to_bytes())?;
        self.inner.write_all(payload)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{BASIC_HEADER_SIZE, OPTIONAL_HEADERS_SIZE};
    use crate::pes::PES_HEADER_SIZE;

    const RECORD_OVERHEAD: usize = BASIC_HEADER_SIZE + OPTIONAL_HEADERS_SIZE + PES_HEADER_SIZE;

    #[test]
    fn test_write_frame_layout() {
        let mut writer = DynaWriter::new(Vec::new(), &[CodecId::H264]).unwrap();
        writer.write_frame(&[0xAA; 5], 42).unwrap();
        writer.write_frame(&[0xBB; 3], 43).unwrap();
        assert_eq!(writer.frames_written(), 2);
        assert_eq!(writer.stream_format(), StreamFormat::H264);

        let out = writer.into_inner();
        assert_eq!(out.len(), 2 * RECORD_OVERHEAD + 8);
        assert_eq!(&out[..4], &[0x40, 0x32, 0x10, 0x20]);
        assert_eq!(&out[RECORD_OVERHEAD..RECORD_OVERHEAD + 5], &[0xAA; 5]);
        let second = RECORD_OVERHEAD + 5;
        assert_eq!(&out[second + 8..second + 12], &43u32.to_le_bytes());
        assert_eq!(&out[out.len() - 3..], &[0xBB; 3]);
    }

    #[test]
    fn test_record_matches_encoded_header() {
        for codec in [CodecId::H264, CodecId::Jpeg2000, CodecId::PcmMulaw] {
            let mut writer = DynaWriter::new(Vec::new(), &[codec]).unwrap();
            writer.write_frame(&[0x5A; 7], 99).unwrap();
            let out = writer.into_inner();

            let expected = crate::record::encode_frame_header(&[codec], 7, 99).unwrap();
            assert_eq!(&out[..RECORD_OVERHEAD], &expected.to_bytes()[..], "{codec:?}");
        }
    }

    #[test]
    fn test_new_rejects_bad_streams() {
        assert!(matches!(
            DynaWriter::new(Vec::new(), &[CodecId::H264, CodecId::Aac]),
            Err(DynaError::InvalidInput(_))
        ));
        assert!(matches!(
            DynaWriter::new(Vec::new(), &[]),
            Err(DynaError::InvalidInput(_))
        ));
        assert!(matches!(
            DynaWriter::new(Vec::new(), &[CodecId::Av1]),
            Err(DynaError::MuxerUnsupportedCodec { .. })
        ));
    }

    #[test]
    fn test_hevc_written_with_h265_prefix() {
        let mut writer = DynaWriter::new(Vec::new(), &[CodecId::Hevc]).unwrap();
        writer.write_frame(&[0u8; 4], 0).unwrap();
        let out = writer.into_inner();
        let pes_start = BASIC_HEADER_SIZE + OPTIONAL_HEADERS_SIZE;
        assert_eq!(out[pes_start + 3], 0x0B);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut writer = DynaWriter::new(Vec::new(), &[CodecId::Mjpeg]).unwrap();
        let payload = vec![0u8; MAX_PAYLOAD_SIZE as usize + 1];
        assert!(matches!(
            writer.write_frame(&payload, 0),
            Err(DynaError::InvalidInput(_))
        ));
        assert_eq!(writer.frames_written(), 0);
        assert!(writer.into_inner().is_empty());
    }
}
