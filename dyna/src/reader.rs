use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{DynaError, Result};
use crate::format::{self, StreamFormat};
use crate::header::FrameHeader;
use crate::pes::{PesHeader, PES_HEADER_SIZE};
use crate::record::{self, read_fully, BASIC_HEADER_REGION};

/// Little-endian value of the first four bytes of every Dynacolor file.
pub const CONTAINER_MAGIC: u32 = 0x2010_3240;
pub const PROBE_SCORE_MAX: u32 = 100;
/// File extensions used for Dynacolor recordings.
pub const EXTENSIONS: &[&str] = &["dyna", "dyn"];

/// Score how likely `buf` (the start of a file) is to be a Dynacolor recording.
pub fn probe(buf: &[u8]) -> u32 {
    match buf.get(..4) {
        Some(&[a, b, c, d]) if u32::from_le_bytes([a, b, c, d]) == CONTAINER_MAGIC => PROBE_SCORE_MAX,
        _ => 0,
    }
}

/// Whether `path` has a Dynacolor extension, optionally followed by `.gz`.
pub fn has_dyna_extension(path: &Path) -> bool {
    let path = match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => path.with_extension(""),
        _ => path.to_path_buf(),
    };
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// A reader that transparently handles both plain and gzip-compressed recordings.
pub enum DynaSource {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for DynaSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            DynaSource::File(r) => r.read(buf),
            DynaSource::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for DynaSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            DynaSource::File(r) => r.seek(pos),
            DynaSource::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a `.dyna`/`.dyn` file, or a `.gz` copy of one, as a seekable reader.
///
/// Gzip-compressed files are fully decompressed into memory; they are only
/// used for test fixtures.
pub fn open_dyna(path: &Path) -> std::io::Result<DynaSource> {
    let is_gz = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    let file = File::open(path)?;
    if is_gz {
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(DynaSource::Memory(Cursor::new(buf)))
    } else {
        Ok(DynaSource::File(BufReader::new(file)))
    }
}

/// Where the payload length of a record is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadSizeSource {
    /// The split size in the PES header, decoded the way recorder files are.
    #[default]
    PesLiteral,
    /// The plain 32-bit size word of the basic header.
    BasicSize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    pub payload_size: PayloadSizeSource,
}

/// Headers and payload location of one record.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FrameRecord {
    /// Absolute byte offset of the record in the file.
    pub file_offset: u64,
    pub header: FrameHeader,
    pub pes: PesHeader,
    /// PES header bytes as stored; decoding drops bits.
    pub pes_raw: [u8; PES_HEADER_SIZE],
    /// Absolute byte offset of the payload.
    pub data_offset: u64,
    /// Payload size in bytes, per the reader's [`PayloadSizeSource`].
    pub data_size: u32,
}

/// A record together with its payload bytes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub record: FrameRecord,
    pub payload: Vec<u8>,
}

/// Reads records from a single-stream Dynacolor recording.
///
/// The stream format is classified once, from the first record, when the
/// reader is created.
pub struct DynaReader<R> {
    inner: R,
    options: ReaderOptions,
    stream_format: StreamFormat,
    end: u64,
    /// Payload size of the record whose header was read last, until consumed.
    pending_payload: Option<u32>,
}

impl<R: Read + Seek> DynaReader<R> {
    /// Classify the stream from the record at the current position, then
    /// rewind to it.
    ///
    /// An unrecognised format id is fatal here.
    pub fn new(mut inner: R, options: ReaderOptions) -> Result<Self> {
        let start = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        let decoded = record::read_frame_header(&mut inner, true)?;
        let stream_format = decoded
            .detection
            .unwrap_or_else(|| format::detect_stream_format(decoded.pes.format_id))?;
        log::debug!(
            "Demuxing {:?} stream ({})",
            stream_format,
            stream_format.codec().codec_name
        );

        inner.seek(SeekFrom::Start(start))?;

        Ok(DynaReader {
            inner,
            options,
            stream_format,
            end,
            pending_payload: None,
        })
    }

    pub fn stream_format(&self) -> StreamFormat {
        self.stream_format
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the headers of the next record, leaving the reader at its payload.
    ///
    /// Returns `None` when the stream ends on a record boundary.
    pub fn read_frame_header(&mut self) -> Result<Option<FrameRecord>> {
        if self.pending_payload.is_some() {
            self.skip_payload()?;
        }

        let file_offset = self.inner.stream_position()?;
        let decoded = match record::read_frame_header(&mut self.inner, false) {
            Ok(d) => d,
            Err(DynaError::TruncatedInput {
                region: BASIC_HEADER_REGION,
                got: 0,
                ..
            }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let data_offset = self.inner.stream_position()?;
        let data_size = match self.options.payload_size {
            PayloadSizeSource::PesLiteral => decoded.pes.size.payload_size(),
            PayloadSizeSource::BasicSize => decoded.header.basic.size,
        };
        log::trace!("Record at 0x{file_offset:X}: {data_size} byte payload at 0x{data_offset:X}");

        self.pending_payload = Some(data_size);

        Ok(Some(FrameRecord {
            file_offset,
            header: decoded.header,
            pes: decoded.pes,
            pes_raw: decoded.pes_raw,
            data_offset,
            data_size,
        }))
    }

    /// Read the next record and its payload.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(record) = self.read_frame_header()? else {
            return Ok(None);
        };
        self.pending_payload = None;
        self.check_payload_fits(record.data_offset, record.data_size)?;

        let mut payload = vec![0u8; record.data_size as usize];
        let got = read_fully(&mut self.inner, &mut payload)?;
        if got < payload.len() {
            return Err(DynaError::TruncatedInput {
                region: "payload",
                expected: payload.len(),
                got,
            });
        }

        Ok(Some(Frame { record, payload }))
    }

    /// Seek past the payload of the record whose header was just read, to the
    /// start of the next record.
    pub fn skip_payload(&mut self) -> Result<()> {
        let size = self
            .pending_payload
            .take()
            .ok_or_else(|| DynaError::InvalidInput("no record header to skip past".into()))?;

        let pos = self.inner.stream_position()?;
        self.check_payload_fits(pos, size)?;

        self.inner.seek(SeekFrom::Current(size as i64))?;
        Ok(())
    }

    /// Fail with `TruncatedInput` if a payload of `size` bytes at `offset`
    /// runs past the end of the stream.
    fn check_payload_fits(&self, offset: u64, size: u32) -> Result<()> {
        let available = self.end.saturating_sub(offset);
        if (size as u64) > available {
            return Err(DynaError::TruncatedInput {
                region: "payload",
                expected: size as usize,
                got: available as usize,
            });
        }
        Ok(())
    }
}

/// Record structure of a whole recording, without payloads.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct DynaFile {
    /// Whether the file starts with the container magic.
    pub magic_ok: bool,
    pub stream_format: StreamFormat,
    /// Codec a player should use for the payloads.
    pub codec: String,
    pub frames: Vec<FrameRecord>,
}

/// Scan every record header of a recording from the start.
pub fn parse_dyna<R: Read + Seek>(reader: &mut R, options: ReaderOptions) -> Result<DynaFile> {
    reader.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 4];
    let got = read_fully(reader, &mut magic)?;
    let magic_ok = probe(&magic[..got]) > 0;
    if !magic_ok {
        log::warn!("File does not start with the Dynacolor magic 0x{CONTAINER_MAGIC:08X}");
    }
    reader.seek(SeekFrom::Start(0))?;

    let mut dyna = DynaReader::new(reader, options)?;
    let stream_format = dyna.stream_format();

    let mut frames = Vec::new();
    while let Some(record) = dyna.read_frame_header()? {
        frames.push(record);
        dyna.skip_payload()?;
    }

    Ok(DynaFile {
        magic_ok,
        stream_format,
        codec: stream_format.codec().codec_name.to_string(),
        frames,
    })
}
