/// A sub-byte field inside a little-endian header word.
///
/// `mask` is applied after shifting on read. For most fields it covers
/// `width` bits, but some recorder fields are read with a mask that does not
/// match their width (e.g. a 2-bit field read as `& 0x02`); those masks are
/// kept verbatim. Writes always use the full `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub offset: u32,
    pub width: u32,
    pub mask: u32,
}

impl BitField {
    pub const fn new(offset: u32, width: u32, mask: u32) -> Self {
        Self {
            offset,
            width,
            mask,
        }
    }

    /// A field whose read mask covers exactly its width.
    pub const fn exact(offset: u32, width: u32) -> Self {
        Self::new(offset, width, (1 << width) - 1)
    }

    pub const fn get(self, word: u32) -> u32 {
        (word >> self.offset) & self.mask
    }

    pub const fn put(self, value: u32) -> u32 {
        (value & ((1 << self.width) - 1)) << self.offset
    }

    /// Value with every bit of the field set.
    pub const fn all_ones(self) -> u32 {
        (1 << self.width) - 1
    }

    /// Whether the read mask differs from the field width.
    pub const fn is_irregular(self) -> bool {
        self.mask != self.all_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_field() {
        let f = BitField::exact(21, 2);
        assert_eq!(f.mask, 0x03);
        assert_eq!(f.get(0b11 << 21), 3);
        assert_eq!(f.put(3), 0b11 << 21);
        assert_eq!(f.put(0xFF), 0b11 << 21);
        assert!(!f.is_irregular());
    }

    #[test]
    fn test_irregular_field_reads_with_literal_mask() {
        // 2-bit field read with & 0x02: the low bit is lost.
        let f = BitField::new(24, 2, 0x02);
        assert!(f.is_irregular());
        assert_eq!(f.get(0x03 << 24), 0x02);
        assert_eq!(f.get(0x01 << 24), 0x00);
        // Writes still cover both bits.
        assert_eq!(f.put(0x03), 0x03 << 24);
    }

    #[test]
    fn test_all_ones() {
        assert_eq!(BitField::exact(16, 16).all_ones(), 0xFFFF);
        assert_eq!(BitField::new(10, 5, 0x20).all_ones(), 0x1F);
    }
}
