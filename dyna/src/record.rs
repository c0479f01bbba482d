use std::io::{ErrorKind, Read};

use crate::codec::CodecId;
use crate::error::{DynaError, Result};
use crate::format::{self, StreamFormat};
use crate::header::{
    BasicHeader, ExtraHeader, FrameHeader, SuperExtraHeader, ABSENT_HEADERS_SIZE,
    BASIC_HEADER_SIZE, EXTRA_HEADER_SIZE, SUPER_EXTRA_HEADER_SIZE,
};
use crate::pes::{PesHeader, PES_HEADER_SIZE};

/// Region name reported when the basic header is cut short.
pub(crate) const BASIC_HEADER_REGION: &str = "basic header";

/// Headers decoded from the front of one record.
#[derive(Debug)]
pub struct DecodedHeader {
    pub header: FrameHeader,
    pub pes: PesHeader,
    /// The 32 PES header bytes exactly as read.
    pub pes_raw: [u8; PES_HEADER_SIZE],
    /// Classification of the stream, only attempted for the first record.
    ///
    /// An unsupported format does not fail the decode; the caller decides
    /// whether to carry on.
    pub detection: Option<Result<StreamFormat>>,
}

/// Bytes of header in front of the payload of an encoded record.
#[derive(Debug, Clone)]
pub struct EncodedHeader {
    pub header: FrameHeader,
    pub pes: PesHeader,
}

impl EncodedHeader {
    /// Headers for one record of an already validated stream.
    pub fn for_stream(codec: CodecId, stream_format: StreamFormat, payload_size: u32, time: u32) -> Self {
        EncodedHeader {
            header: FrameHeader::for_output(codec.category(), payload_size, time),
            pes: PesHeader::for_output(stream_format, payload_size),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes();
        out.extend_from_slice(&self.pes.to_bytes());
        out
    }
}

/// Fill `buf` from `reader`, returning the number of bytes read. Stops early
/// only at EOF.
pub(crate) fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read exactly `buf.len()` bytes of a fixed-size header region.
fn read_region<R: Read>(reader: &mut R, buf: &mut [u8], region: &'static str) -> Result<()> {
    let got = read_fully(reader, buf)?;
    if got < buf.len() {
        return Err(DynaError::TruncatedInput {
            region,
            expected: buf.len(),
            got,
        });
    }
    Ok(())
}

/// Decode the compound header and PES header at the front of a record.
///
/// On return the reader is positioned at the first payload byte. Pass
/// `first = true` for the first record of a session to classify the stream.
pub fn read_frame_header<R: Read>(reader: &mut R, first: bool) -> Result<DecodedHeader> {
    let mut basic_buf = [0u8; BASIC_HEADER_SIZE];
    read_region(reader, &mut basic_buf, BASIC_HEADER_REGION)?;
    let basic = BasicHeader::from_bytes(&basic_buf);

    let (extra, super_extra) = if basic.extra_enable {
        let mut extra_buf = [0u8; EXTRA_HEADER_SIZE];
        read_region(reader, &mut extra_buf, "extra header")?;

        let mut super_buf = [0u8; SUPER_EXTRA_HEADER_SIZE];
        read_region(reader, &mut super_buf, "super-extra header")?;

        (
            ExtraHeader::from_bytes(&extra_buf),
            SuperExtraHeader::from_bytes(&super_buf),
        )
    } else {
        log::trace!("Skipping extra and super-extra headers");
        let mut skipped = [0u8; ABSENT_HEADERS_SIZE];
        read_region(reader, &mut skipped, "skipped extra headers")?;
        (ExtraHeader::SENTINEL, SuperExtraHeader::sentinel())
    };

    let mut pes_buf = [0u8; PES_HEADER_SIZE];
    read_region(reader, &mut pes_buf, "PES header")?;
    let pes = PesHeader::decode(&pes_buf)?;

    let detection = first.then(|| format::detect_stream_format(pes.format_id));

    Ok(DecodedHeader {
        header: FrameHeader {
            basic,
            extra,
            super_extra,
        },
        pes,
        pes_raw: pes_buf,
        detection,
    })
}

/// The codec of the only output stream. The format carries exactly one.
pub fn single_stream(streams: &[CodecId]) -> Result<CodecId> {
    match streams {
        [codec] => Ok(*codec),
        [] => Err(DynaError::InvalidInput("no output stream".into())),
        _ => Err(DynaError::InvalidInput(format!(
            "Dynacolor format only supports one stream, got {}",
            streams.len()
        ))),
    }
}

/// Build the headers for one output record carrying `payload_size` bytes.
///
/// `streams` lists the codecs of every output stream.
pub fn encode_frame_header(streams: &[CodecId], payload_size: u32, time: u32) -> Result<EncodedHeader> {
    let codec = single_stream(streams)?;
    let stream_format = StreamFormat::for_codec(codec)?;
    Ok(EncodedHeader::for_stream(codec, stream_format, payload_size, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DETECTION_ORDER;
    use crate::header::OPTIONAL_HEADERS_SIZE;
    use std::io::Cursor;

    fn record_without_extra(format_id: u8) -> Vec<u8> {
        let mut data = vec![
            0x40, 0x32, 0x10, 0x20, // H
            0x20, 0x00, 0x00, 0x00, // size
            0x10, 0x00, 0x00, 0x00, // time
            0x01, 0x00, 0x00, 0x11, // L: PAL, extra disabled
        ];
        // Garbage in the skipped region must not matter.
        data.extend_from_slice(&[0x5A; ABSENT_HEADERS_SIZE]);
        let mut pes = [0u8; PES_HEADER_SIZE];
        pes[..4].copy_from_slice(&[0x00, 0x00, 0x01, format_id]);
        pes[24] = 0x20;
        pes[28] = 0x01;
        pes[29] = 0x01;
        data.extend_from_slice(&pes);
        data
    }

    #[test]
    fn test_read_without_extra_fills_sentinel() {
        let data = record_without_extra(0x0F);
        let mut cursor = Cursor::new(&data);
        let decoded = read_frame_header(&mut cursor, false).unwrap();

        assert!(!decoded.header.has_extra());
        assert!(decoded.header.extra.is_sentinel());
        assert!(decoded.header.super_extra.is_sentinel());
        assert_eq!(decoded.header.extra, ExtraHeader::SENTINEL);
        assert_eq!(decoded.header.super_extra.title, [0xFF; 12]);
        assert!(decoded.header.super_extra.extra_data.iter().all(|&b| b == 0xFF));
        assert_eq!(decoded.header.super_extra.kind, -1);
        assert_eq!(decoded.header.super_extra.remain_size, -1);
        assert_eq!(decoded.pes.size.payload_size(), 0x20);
        assert!(decoded.detection.is_none());
        assert_eq!(cursor.position() as usize, data.len());
    }

    #[test]
    fn test_raw_pes_bytes_kept() {
        let mut data = record_without_extra(0x3F);
        let pes_start = BASIC_HEADER_SIZE + ABSENT_HEADERS_SIZE;
        data[pes_start + 25] = 0x07;
        data[pes_start + 31] = 0xFF;

        let decoded = read_frame_header(&mut Cursor::new(&data), false).unwrap();
        assert_eq!(&decoded.pes_raw[..], &data[pes_start..]);
        assert_eq!(decoded.pes.format_id, 0x0F);
        assert_eq!(decoded.pes.channel_id, 0);
        assert_eq!(decoded.pes.size.bit10to8, 0);

        // Masked bits cannot be rebuilt from the decoded header.
        let rebuilt = decoded.pes.to_bytes();
        assert_ne!(rebuilt, decoded.pes_raw);
        assert_eq!(rebuilt[3], 0x0F);
        assert_eq!(rebuilt[25], 0x00);
        assert_eq!(rebuilt[31], 0x07);
    }

    #[test]
    fn test_first_record_is_classified() {
        for (prefix, expected) in DETECTION_ORDER {
            let data = record_without_extra(prefix);
            let decoded = read_frame_header(&mut Cursor::new(&data), true).unwrap();
            assert_eq!(decoded.detection.unwrap().unwrap(), expected);
        }
    }

    #[test]
    fn test_unsupported_format_is_not_a_decode_failure() {
        let data = record_without_extra(0x03);
        let decoded = read_frame_header(&mut Cursor::new(&data), true).unwrap();
        match decoded.detection {
            Some(Err(DynaError::UnsupportedFormat { format_id })) => assert_eq!(format_id, 0x03),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
        assert_eq!(decoded.pes.format_id, 0x03);
    }

    #[test]
    fn test_truncated_basic_header() {
        for len in 0..BASIC_HEADER_SIZE {
            let data = vec![0x40u8; len];
            match read_frame_header(&mut Cursor::new(&data), true) {
                Err(DynaError::TruncatedInput { region, expected, got }) => {
                    assert_eq!(region, "basic header");
                    assert_eq!(expected, BASIC_HEADER_SIZE);
                    assert_eq!(got, len);
                }
                other => panic!("expected TruncatedInput for {len} bytes, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_truncated_pes_header() {
        let mut data = record_without_extra(0x0F);
        data.truncate(data.len() - 1);
        match read_frame_header(&mut Cursor::new(&data), false) {
            Err(DynaError::TruncatedInput { region, got, .. }) => {
                assert_eq!(region, "PES header");
                assert_eq!(got, PES_HEADER_SIZE - 1);
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_extra_headers() {
        let encoded = encode_frame_header(&[CodecId::H264], 4, 0).unwrap();
        let bytes = encoded.to_bytes();
        let cut = BASIC_HEADER_SIZE + EXTRA_HEADER_SIZE + 10;
        match read_frame_header(&mut Cursor::new(&bytes[..cut]), false) {
            Err(DynaError::TruncatedInput { region, expected, got }) => {
                assert_eq!(region, "super-extra header");
                assert_eq!(expected, SUPER_EXTRA_HEADER_SIZE);
                assert_eq!(got, 10);
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_then_decode_each_family() {
        let families = [
            (CodecId::H264, StreamFormat::H264),
            (CodecId::Mpeg4, StreamFormat::Mpeg4),
            (CodecId::Mjpeg, StreamFormat::Jpeg),
            (CodecId::PcmF16le, StreamFormat::Audio),
        ];
        for (codec, expected) in families {
            for size in [0u32, 255, 256, 65535, (1 << 22) - 1] {
                let encoded = encode_frame_header(&[codec], size, 1234).unwrap();
                let bytes = encoded.to_bytes();
                assert_eq!(bytes.len(), BASIC_HEADER_SIZE + OPTIONAL_HEADERS_SIZE + PES_HEADER_SIZE);

                let mut cursor = Cursor::new(&bytes);
                let decoded = read_frame_header(&mut cursor, true).unwrap();
                assert_eq!(decoded.detection.unwrap().unwrap(), expected);
                assert_eq!(decoded.header.basic.size, size);
                assert_eq!(decoded.header.basic.time, 1234);
                assert_eq!(decoded.header.extra, encoded.header.extra);
                assert_eq!(decoded.header.super_extra, encoded.header.super_extra);
                assert_eq!(cursor.position() as usize, bytes.len());

                // The reader masks bits 10..8 with 0x08, so only the chunks the
                // writer can never set there are compared.
                assert_eq!(decoded.pes.size.bit7to0, encoded.pes.size.bit7to0);
                assert_eq!(decoded.pes.size.bit14to11, encoded.pes.size.bit14to11);
                assert_eq!(decoded.pes.size.bit21to15, encoded.pes.size.bit21to15);
                assert_eq!(encoded.pes.size.nominal_payload_size(), size);
            }
        }
    }

    #[test]
    fn test_encode_audio_flags() {
        let encoded = encode_frame_header(&[CodecId::Aac], 10, 0).unwrap();
        assert!(encoded.header.basic.audio);
        assert_eq!(encoded.header.basic.stream_type, 1);
        assert_eq!(encoded.pes.format_id, 0x0C);

        let encoded = encode_frame_header(&[CodecId::Mpeg4], 10, 0).unwrap();
        assert!(!encoded.header.basic.audio);
        assert_eq!(encoded.header.basic.stream_type, 0);
    }

    #[test]
    fn test_encode_rejects_stream_count() {
        match encode_frame_header(&[CodecId::H264, CodecId::Aac], 1, 0) {
            Err(DynaError::InvalidInput(msg)) => assert!(msg.contains("one stream")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert!(matches!(
            encode_frame_header(&[], 1, 0),
            Err(DynaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_encode_rejects_unmapped_codec() {
        assert!(matches!(
            encode_frame_header(&[CodecId::Vp9], 1, 0),
            Err(DynaError::MuxerUnsupportedCodec { codec: "vp9" })
        ));
    }

    #[test]
    fn test_read_fully_reports_short_count() {
        let mut buf = [0u8; 8];
        let n = read_fully(&mut Cursor::new(vec![1, 2, 3]), &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }
}
