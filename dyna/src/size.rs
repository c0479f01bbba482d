/// Largest payload size representable by the 22-bit PES size field.
pub const MAX_PAYLOAD_SIZE: u32 = (1 << 22) - 1;

/// The four byte-sized chunks of the PES payload size (PES bytes 24-27).
///
/// Captured files and the writer disagree on how these chunks combine, so the
/// read and write formulas are kept apart:
///
/// - [`SizeFields::payload_size`] is the formula every reader of real files
///   uses, both to read a payload and to skip to the next record.
/// - [`SizeFields::from_payload_size`] spreads a size over the chunks by their
///   nominal bit ranges (7..0, 10..8, 14..11, 21..15).
/// - [`SizeFields::nominal_payload_size`] is the exact inverse of the writer.
///
/// The literal formula only agrees with the writer for sizes below 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SizeFields {
    pub bit7to0: u8,
    pub bit10to8: u8,
    pub bit14to11: u8,
    pub bit21to15: u8,
}

impl SizeFields {
    pub fn new(bit7to0: u8, bit10to8: u8, bit14to11: u8, bit21to15: u8) -> Self {
        Self {
            bit7to0,
            bit10to8,
            bit14to11,
            bit21to15,
        }
    }

    /// Payload size as read from captured files.
    ///
    /// The masks and shifts do not line up with the field names; they are kept
    /// exactly as observed until validated against more recordings.
    pub fn payload_size(self) -> u32 {
        (self.bit7to0 as u32 & 0xFF)
            | ((self.bit10to8 as u32 & 0x04) << 15)
            | ((self.bit14to11 as u32 & 0x08) << 11)
            | ((self.bit21to15 as u32 & 0x7F) << 8)
    }

    /// Payload size reassembled from the nominal bit ranges.
    pub fn nominal_payload_size(self) -> u32 {
        (self.bit7to0 as u32)
            | ((self.bit10to8 as u32 & 0x07) << 8)
            | ((self.bit14to11 as u32 & 0x0F) << 11)
            | ((self.bit21to15 as u32 & 0x7F) << 15)
    }

    /// Split a payload size for writing. Bits above bit 21 are dropped.
    pub fn from_payload_size(size: u32) -> Self {
        Self {
            bit7to0: (size & 0xFF) as u8,
            bit10to8: ((size >> 8) & 0x07) as u8,
            bit14to11: ((size >> 11) & 0x0F) as u8,
            bit21to15: ((size >> 15) & 0x7F) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [u32; 5] = [0, 255, 256, 65535, MAX_PAYLOAD_SIZE];

    #[test]
    fn test_nominal_round_trip() {
        for size in SIZES {
            let fields = SizeFields::from_payload_size(size);
            assert_eq!(fields.nominal_payload_size(), size, "size {size}");
        }
    }

    #[test]
    fn test_literal_decode_of_written_sizes() {
        // Below 256 both directions agree.
        assert_eq!(SizeFields::from_payload_size(0).payload_size(), 0);
        assert_eq!(SizeFields::from_payload_size(255).payload_size(), 255);

        // Above that the literal formula drops and moves bits.
        assert_eq!(SizeFields::from_payload_size(256).payload_size(), 0);
        assert_eq!(SizeFields::from_payload_size(65535).payload_size(), 0x241FF);
        assert_eq!(
            SizeFields::from_payload_size(MAX_PAYLOAD_SIZE).payload_size(),
            0x27FFF
        );
    }

    #[test]
    fn test_literal_decode_bit_positions() {
        assert_eq!(SizeFields::new(0xAB, 0, 0, 0).payload_size(), 0xAB);
        // Only bit 2 of the second chunk is used, landing at bit 17.
        assert_eq!(SizeFields::new(0, 0x04, 0, 0).payload_size(), 1 << 17);
        assert_eq!(SizeFields::new(0, 0x03, 0, 0).payload_size(), 0);
        // Only bit 3 of the third chunk is used, landing at bit 14.
        assert_eq!(SizeFields::new(0, 0, 0x08, 0).payload_size(), 1 << 14);
        assert_eq!(SizeFields::new(0, 0, 0x07, 0).payload_size(), 0);
        // The fourth chunk lands at bits 8-14.
        assert_eq!(SizeFields::new(0, 0, 0, 0x7F).payload_size(), 0x7F00);
        assert_eq!(SizeFields::new(0, 0, 0, 0x80).payload_size(), 0);
    }

    #[test]
    fn test_from_payload_size_splits_nominal_ranges() {
        let fields = SizeFields::from_payload_size(0x2A_5C_3D);
        assert_eq!(fields.bit7to0, 0x3D);
        assert_eq!(fields.bit10to8, 0x04);
        assert_eq!(fields.bit14to11, 0x0B);
        assert_eq!(fields.bit21to15, 0x54);
    }

    #[test]
    fn test_from_payload_size_drops_high_bits() {
        let fields = SizeFields::from_payload_size(MAX_PAYLOAD_SIZE + 1);
        assert_eq!(fields, SizeFields::default());
    }
}
