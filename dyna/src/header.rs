//! The compound frame header: a 16-byte basic index, optionally followed by a
//! 16-byte extra index and a super-extra index (two ints plus 108 bytes).
//!
//! All words are little-endian. Field positions are described by [`BitField`]
//! tables rather than struct layout, since on-disk compatibility depends on
//! exact bit positions.

use crate::bits::BitField;
use crate::codec::CodecCategory;

pub const BASIC_HEADER_SIZE: usize = 16;
pub const EXTRA_HEADER_SIZE: usize = 16;
pub const SUPER_EXTRA_TITLE_SIZE: usize = 12;
pub const SUPER_EXTRA_DATA_SIZE: usize = 96;
/// Value of the super-extra `remain_size` and the extra `super_extra_size`.
pub const SUPER_EXTRA_REMAIN_SIZE: usize = SUPER_EXTRA_TITLE_SIZE + SUPER_EXTRA_DATA_SIZE;
/// Type and remain-size ints, then the title and data.
pub const SUPER_EXTRA_HEADER_SIZE: usize = 8 + SUPER_EXTRA_REMAIN_SIZE;
/// Bytes read after the basic header when the extra headers are enabled.
pub const OPTIONAL_HEADERS_SIZE: usize = EXTRA_HEADER_SIZE + SUPER_EXTRA_HEADER_SIZE;
/// Bytes skipped after the basic header when the extra headers are disabled.
///
/// Recorder files skip 8 bytes fewer here than they read when the headers are
/// present.
pub const ABSENT_HEADERS_SIZE: usize = EXTRA_HEADER_SIZE + SUPER_EXTRA_REMAIN_SIZE;

/// First word of the basic header (bytes 0-3).
pub mod word_h {
    use crate::bits::BitField;

    /// "@X" marker, X being the device type.
    pub const HEADER1: BitField = BitField::exact(0, 8);
    pub const HEADER2: BitField = BitField::exact(8, 8);
    pub const RESERVED: BitField = BitField::exact(16, 4);
    /// 0: DVR, 1: IP device.
    pub const SOURCE: BitField = BitField::exact(20, 1);
    /// 0: 720, 1: 704, 2: 640.
    pub const WIDTH_BASE: BitField = BitField::exact(21, 2);
    pub const RESERVED0: BitField = BitField::exact(23, 1);
    pub const CHANNEL_EXT: BitField = BitField::new(24, 2, 0x02);
    /// 0: normal, 1: V-stream, 2: dual stream.
    pub const STREAM_TYPE: BitField = BitField::new(26, 2, 0x02);
    pub const QI: BitField = BitField::exact(28, 4);
}

/// Fourth word of the basic header (bytes 12-15).
pub mod word_l {
    use crate::bits::BitField;

    /// 0: NTSC, 1: PAL.
    pub const NTSC_PAL: BitField = BitField::exact(0, 1);
    /// 0: live, 1: playback.
    pub const IMG_MODE: BitField = BitField::exact(1, 1);
    /// 0: video, 1: audio.
    pub const AUDIO: BitField = BitField::exact(2, 1);
    pub const DST: BitField = BitField::exact(3, 1);
    pub const COVERT: BitField = BitField::exact(4, 1);
    pub const VLOSS: BitField = BitField::exact(5, 1);
    pub const ALARM_IN: BitField = BitField::exact(6, 1);
    pub const MOTION: BitField = BitField::exact(7, 1);
    pub const EXTRA_ENABLE: BitField = BitField::exact(8, 1);
    pub const EVENT_ENABLE: BitField = BitField::exact(9, 1);
    pub const PPS: BitField = BitField::new(10, 6, 0x40);
    /// 0: none, 1: I, 2: P, 3: B.
    pub const FRAME_TYPE: BitField = BitField::new(16, 3, 0x08);
    pub const CHANNEL: BitField = BitField::new(19, 5, 0x20);
    pub const CHECKSUM: BitField = BitField::exact(24, 8);
}

/// First word of the extra header.
pub mod extra_word {
    use crate::bits::BitField;

    /// 0: summer time, 1: winter time.
    pub const IS_DST_S_W: BitField = BitField::exact(0, 1);
    pub const DST_MINUTES: BitField = BitField::exact(1, 8);
    pub const OVER_SPEED: BitField = BitField::exact(9, 1);
    pub const SKIP_PIC_CNT: BitField = BitField::new(10, 5, 0x20);
    pub const EXCEPTION: BitField = BitField::exact(15, 1);
    pub const SUPER_EXTRA_SIZE: BitField = BitField::exact(16, 16);
}

/// Byte 14 of the extra header.
pub mod extra_tail {
    use crate::bits::BitField;

    pub const IS_DVR_REC: BitField = BitField::exact(0, 2);
    /// 30-minute steps starting at 1 = -12:00; 0 means off.
    pub const TIME_ZONE: BitField = BitField::new(2, 6, 0x40);
}

fn flag(field: BitField, word: u32) -> bool {
    field.get(word) != 0
}

fn put_flag(field: BitField, value: bool) -> u32 {
    field.put(value as u32)
}

/// Basic index: always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct BasicHeader {
    pub header1: u8,
    pub header2: u8,
    pub reserved: u8,
    pub source_ip: bool,
    pub width_base: u8,
    pub reserved0: bool,
    pub channel_ext: u8,
    pub stream_type: u8,
    pub qi: u8,
    pub size: u32,
    pub time: u32,
    pub pal: bool,
    pub playback: bool,
    pub audio: bool,
    pub dst: bool,
    pub covert: bool,
    pub vloss: bool,
    pub alarm_in: bool,
    pub motion: bool,
    pub extra_enable: bool,
    pub event_enable: bool,
    pub pps: u8,
    pub frame_type: u8,
    pub channel: u8,
    pub checksum: u8,
}

impl BasicHeader {
    pub fn from_words(h: u32, size: u32, time: u32, l: u32) -> Self {
        use crate::header::{word_h as wh, word_l as wl};

        BasicHeader {
            header1: wh::HEADER1.get(h) as u8,
            header2: wh::HEADER2.get(h) as u8,
            reserved: wh::RESERVED.get(h) as u8,
            source_ip: flag(wh::SOURCE, h),
            width_base: wh::WIDTH_BASE.get(h) as u8,
            reserved0: flag(wh::RESERVED0, h),
            channel_ext: wh::CHANNEL_EXT.get(h) as u8,
            stream_type: wh::STREAM_TYPE.get(h) as u8,
            qi: wh::QI.get(h) as u8,
            size,
            time,
            pal: flag(wl::NTSC_PAL, l),
            playback: flag(wl::IMG_MODE, l),
            audio: flag(wl::AUDIO, l),
            dst: flag(wl::DST, l),
            covert: flag(wl::COVERT, l),
            vloss: flag(wl::VLOSS, l),
            alarm_in: flag(wl::ALARM_IN, l),
            motion: flag(wl::MOTION, l),
            extra_enable: flag(wl::EXTRA_ENABLE, l),
            event_enable: flag(wl::EVENT_ENABLE, l),
            pps: wl::PPS.get(l) as u8,
            frame_type: wl::FRAME_TYPE.get(l) as u8,
            channel: wl::CHANNEL.get(l) as u8,
            checksum: wl::CHECKSUM.get(l) as u8,
        }
    }

    pub fn from_bytes(data: &[u8; BASIC_HEADER_SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        Self::from_words(word(0), word(4), word(8), word(12))
    }

    pub fn word_h(&self) -> u32 {
        use crate::header::word_h as wh;

        wh::HEADER1.put(self.header1 as u32)
            | wh::HEADER2.put(self.header2 as u32)
            | wh::RESERVED.put(self.reserved as u32)
            | put_flag(wh::SOURCE, self.source_ip)
            | wh::WIDTH_BASE.put(self.width_base as u32)
            | put_flag(wh::RESERVED0, self.reserved0)
            | wh::CHANNEL_EXT.put(self.channel_ext as u32)
            | wh::STREAM_TYPE.put(self.stream_type as u32)
            | wh::QI.put(self.qi as u32)
    }

    pub fn word_l(&self) -> u32 {
        use crate::header::word_l as wl;

        put_flag(wl::NTSC_PAL, self.pal)
            | put_flag(wl::IMG_MODE, self.playback)
            | put_flag(wl::AUDIO, self.audio)
            | put_flag(wl::DST, self.dst)
            | put_flag(wl::COVERT, self.covert)
            | put_flag(wl::VLOSS, self.vloss)
            | put_flag(wl::ALARM_IN, self.alarm_in)
            | put_flag(wl::MOTION, self.motion)
            | put_flag(wl::EXTRA_ENABLE, self.extra_enable)
            | put_flag(wl::EVENT_ENABLE, self.event_enable)
            | wl::PPS.put(self.pps as u32)
            | wl::FRAME_TYPE.put(self.frame_type as u32)
            | wl::CHANNEL.put(self.channel as u32)
            | wl::CHECKSUM.put(self.checksum as u32)
    }

    /// Serialise in record order: H, Size, Time, L.
    pub fn to_bytes(&self) -> [u8; BASIC_HEADER_SIZE] {
        let mut out = [0u8; BASIC_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.word_h().to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out[8..12].copy_from_slice(&self.time.to_le_bytes());
        out[12..16].copy_from_slice(&self.word_l().to_le_bytes());
        out
    }
}

/// Extra index: present when [`BasicHeader::extra_enable`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ExtraHeader {
    pub is_dst_winter: bool,
    /// 0-7 = 0-120 minutes.
    pub dst_minutes: u8,
    pub over_speed: bool,
    pub skip_pic_cnt: u8,
    pub exception: bool,
    pub super_extra_size: u16,
    pub serial_number: u32,
    /// One bit per channel, first bit is the first channel.
    pub alarm_in_mask: [u8; 2],
    pub vloss_mask: [u8; 2],
    pub motion_mask: [u8; 2],
    pub is_dvr_rec: u8,
    pub time_zone: u8,
    pub checksum: u8,
}

impl ExtraHeader {
    /// Value used when the extra header is absent: every field all-ones.
    pub const SENTINEL: ExtraHeader = ExtraHeader {
        is_dst_winter: true,
        dst_minutes: 0xFF,
        over_speed: true,
        skip_pic_cnt: 0x1F,
        exception: true,
        super_extra_size: 0xFFFF,
        serial_number: 0xFFFF_FFFF,
        alarm_in_mask: [0xFF; 2],
        vloss_mask: [0xFF; 2],
        motion_mask: [0xFF; 2],
        is_dvr_rec: 0x03,
        time_zone: 0x3F,
        checksum: 0xFF,
    };

    pub fn from_bytes(data: &[u8; EXTRA_HEADER_SIZE]) -> Self {
        use crate::header::{extra_tail as et, extra_word as ew};

        let start = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let tail = data[14] as u32;

        ExtraHeader {
            is_dst_winter: flag(ew::IS_DST_S_W, start),
            dst_minutes: ew::DST_MINUTES.get(start) as u8,
            over_speed: flag(ew::OVER_SPEED, start),
            skip_pic_cnt: ew::SKIP_PIC_CNT.get(start) as u8,
            exception: flag(ew::EXCEPTION, start),
            super_extra_size: ew::SUPER_EXTRA_SIZE.get(start) as u16,
            serial_number: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            alarm_in_mask: [data[8], data[9]],
            vloss_mask: [data[10], data[11]],
            motion_mask: [data[12], data[13]],
            is_dvr_rec: et::IS_DVR_REC.get(tail) as u8,
            time_zone: et::TIME_ZONE.get(tail) as u8,
            checksum: data[15],
        }
    }

    pub fn to_bytes(&self) -> [u8; EXTRA_HEADER_SIZE] {
        use crate::header::{extra_tail as et, extra_word as ew};

        let start = put_flag(ew::IS_DST_S_W, self.is_dst_winter)
            | ew::DST_MINUTES.put(self.dst_minutes as u32)
            | put_flag(ew::OVER_SPEED, self.over_speed)
            | ew::SKIP_PIC_CNT.put(self.skip_pic_cnt as u32)
            | put_flag(ew::EXCEPTION, self.exception)
            | ew::SUPER_EXTRA_SIZE.put(self.super_extra_size as u32);
        let tail = et::IS_DVR_REC.put(self.is_dvr_rec as u32) | et::TIME_ZONE.put(self.time_zone as u32);

        let mut out = [0u8; EXTRA_HEADER_SIZE];
        out[0..4].copy_from_slice(&start.to_le_bytes());
        out[4..8].copy_from_slice(&self.serial_number.to_le_bytes());
        out[8..10].copy_from_slice(&self.alarm_in_mask);
        out[10..12].copy_from_slice(&self.vloss_mask);
        out[12..14].copy_from_slice(&self.motion_mask);
        out[14] = tail as u8;
        out[15] = self.checksum;
        out
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// Super-extra index: camera title and an opaque GPS/text blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SuperExtraHeader {
    pub kind: i32,
    pub remain_size: i32,
    pub title: [u8; SUPER_EXTRA_TITLE_SIZE],
    /// [`SUPER_EXTRA_DATA_SIZE`] bytes when decoded. [`SuperExtraHeader::to_bytes`]
    /// writes exactly that many: longer data is cut, shorter data is zero-padded.
    pub extra_data: Vec<u8>,
}

impl SuperExtraHeader {
    /// Value used when the super-extra header is absent: every byte 0xFF.
    pub fn sentinel() -> Self {
        Self::filled(-1, -1)
    }

    /// Title and data filled with 0xFF.
    pub fn filled(kind: i32, remain_size: i32) -> Self {
        SuperExtraHeader {
            kind,
            remain_size,
            title: [0xFF; SUPER_EXTRA_TITLE_SIZE],
            extra_data: vec![0xFF; SUPER_EXTRA_DATA_SIZE],
        }
    }

    pub fn from_bytes(data: &[u8; SUPER_EXTRA_HEADER_SIZE]) -> Self {
        let mut title = [0u8; SUPER_EXTRA_TITLE_SIZE];
        title.copy_from_slice(&data[8..8 + SUPER_EXTRA_TITLE_SIZE]);

        SuperExtraHeader {
            kind: i32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            remain_size: i32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            title,
            extra_data: data[8 + SUPER_EXTRA_TITLE_SIZE..].to_vec(),
        }
    }

    /// Serialise to the fixed 116-byte layout. `extra_data` is clamped to
    /// [`SUPER_EXTRA_DATA_SIZE`] bytes, zero-padded if shorter.
    pub fn to_bytes(&self) -> [u8; SUPER_EXTRA_HEADER_SIZE] {
        let mut out = [0u8; SUPER_EXTRA_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.kind.to_le_bytes());
        out[4..8].copy_from_slice(&self.remain_size.to_le_bytes());
        out[8..20].copy_from_slice(&self.title);
        let n = self.extra_data.len().min(SUPER_EXTRA_DATA_SIZE);
        out[20..20 + n].copy_from_slice(&self.extra_data[..n]);
        out
    }

    /// Title up to the first NUL or 0xFF byte.
    pub fn title_lossy(&self) -> String {
        let end = self
            .title
            .iter()
            .position(|&b| b == 0x00 || b == 0xFF)
            .unwrap_or(SUPER_EXTRA_TITLE_SIZE);
        String::from_utf8_lossy(&self.title[..end]).into_owned()
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// A decoded compound frame header.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FrameHeader {
    pub basic: BasicHeader,
    /// Sentinel-filled when `basic.extra_enable` is clear.
    pub extra: ExtraHeader,
    /// Sentinel-filled when `basic.extra_enable` is clear.
    pub super_extra: SuperExtraHeader,
}

impl FrameHeader {
    /// Header written for every output frame. Everything except the payload
    /// size, timestamp and stream kind is a fixed value.
    pub fn for_output(category: CodecCategory, size: u32, time: u32) -> Self {
        let audio = category == CodecCategory::Audio;

        let basic = BasicHeader {
            header1: 0x40,
            header2: 0x32,
            reserved: 0x00,
            source_ip: true,
            width_base: 0x00,
            reserved0: false,
            channel_ext: 0x00,
            stream_type: if audio { 0x01 } else { 0x00 },
            qi: 0x02,
            size,
            time,
            pal: true,
            playback: false,
            audio,
            dst: false,
            covert: false,
            vloss: false,
            alarm_in: false,
            motion: false,
            extra_enable: true,
            event_enable: false,
            pps: 0x00,
            frame_type: 0x00,
            channel: 0x00,
            checksum: 0x11,
        };

        let extra = ExtraHeader {
            is_dst_winter: false,
            dst_minutes: 0x00,
            over_speed: false,
            skip_pic_cnt: 0x00,
            exception: false,
            super_extra_size: SUPER_EXTRA_REMAIN_SIZE as u16,
            serial_number: 0x0504,
            alarm_in_mask: [0x00; 2],
            vloss_mask: [0x00; 2],
            motion_mask: [0x00; 2],
            is_dvr_rec: 0x01,
            time_zone: 0x00,
            checksum: 0x00,
        };

        FrameHeader {
            basic,
            extra,
            super_extra: SuperExtraHeader::filled(0x01, 0x06),
        }
    }

    pub fn has_extra(&self) -> bool {
        self.basic.extra_enable
    }

    /// Extra header, if the record carries one.
    pub fn extra(&self) -> Option<&ExtraHeader> {
        self.has_extra().then_some(&self.extra)
    }

    pub fn super_extra(&self) -> Option<&SuperExtraHeader> {
        self.has_extra().then_some(&self.super_extra)
    }

    /// Serialise the basic header and the optional block that follows it.
    ///
    /// With extra headers disabled the block is [`ABSENT_HEADERS_SIZE`] bytes
    /// of 0xFF, matching what a reader skips.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BASIC_HEADER_SIZE + OPTIONAL_HEADERS_SIZE);
        out.extend_from_slice(&self.basic.to_bytes());
        if self.has_extra() {
            out.extend_from_slice(&self.extra.to_bytes());
            out.extend_from_slice(&self.super_extra.to_bytes());
        } else {
            out.resize(BASIC_HEADER_SIZE + ABSENT_HEADERS_SIZE, 0xFF);
        }
        out
    }
}
