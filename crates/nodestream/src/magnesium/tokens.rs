// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire constants of the Magnesium format.

use crate::error::EncodingError;

/// Node header: kind in bits 0-3, addressing in bits 4-5, predicates in bits 6-7.
pub(crate) mod node {
    pub(crate) const END: u8 = 0x00;
    pub(crate) const LEAF: u8 = 0x01;
    pub(crate) const CONTAINER: u8 = 0x02;
    pub(crate) const LIST: u8 = 0x03;
    pub(crate) const MAP: u8 = 0x04;
    pub(crate) const MAP_ORDERED: u8 = 0x05;
    pub(crate) const LEAFSET: u8 = 0x06;
    pub(crate) const LEAFSET_ORDERED: u8 = 0x07;
    pub(crate) const CHOICE: u8 = 0x08;
    pub(crate) const AUGMENTATION: u8 = 0x09;
    pub(crate) const ANYXML: u8 = 0x0A;
    pub(crate) const LIST_ENTRY: u8 = 0x0B;
    pub(crate) const LEAFSET_ENTRY: u8 = 0x0C;
    pub(crate) const MAP_ENTRY: u8 = 0x0D;
    pub(crate) const ANYXML_MODELED: u8 = 0x0E;
    pub(crate) const TYPE_MASK: u8 = 0x0F;

    pub(crate) const ADDR_DEFINE: u8 = 0x00;
    pub(crate) const ADDR_LOOKUP_1B: u8 = 0x10;
    pub(crate) const ADDR_LOOKUP_4B: u8 = 0x20;
    pub(crate) const ADDR_PARENT: u8 = 0x30;
    pub(crate) const ADDR_MASK: u8 = 0x30;

    // On a leaf, PREDICATE_ONE marks a key leaf whose value is elided.
    pub(crate) const PREDICATE_ZERO: u8 = 0x00;
    pub(crate) const PREDICATE_ONE: u8 = 0x40;
    pub(crate) const PREDICATE_1B: u8 = 0x80;
    pub(crate) const PREDICATE_4B: u8 = 0xC0;
    pub(crate) const PREDICATE_MASK: u8 = 0xC0;
}

/// Value and name opcodes.
pub(crate) mod value {
    pub(crate) const BOOLEAN_FALSE: u8 = 0x00;
    pub(crate) const BOOLEAN_TRUE: u8 = 0x01;
    pub(crate) const EMPTY: u8 = 0x02;
    pub(crate) const INT8: u8 = 0x03;
    pub(crate) const INT16: u8 = 0x04;
    pub(crate) const INT32: u8 = 0x05;
    pub(crate) const INT64: u8 = 0x06;
    pub(crate) const UINT8: u8 = 0x07;
    pub(crate) const UINT16: u8 = 0x08;
    pub(crate) const UINT32: u8 = 0x09;
    pub(crate) const UINT64: u8 = 0x0A;
    pub(crate) const STRING_EMPTY: u8 = 0x0B;
    pub(crate) const STRING_1B: u8 = 0x0C;
    pub(crate) const STRING_2B: u8 = 0x0D;
    pub(crate) const STRING_4B: u8 = 0x0E;
    pub(crate) const BIGINTEGER: u8 = 0x0F;
    pub(crate) const BIGDECIMAL: u8 = 0x10;

    pub(crate) const INT8_0: u8 = 0x11;
    pub(crate) const INT8_1: u8 = 0x12;
    pub(crate) const INT8_MIN: u8 = 0x13;
    pub(crate) const INT8_MAX: u8 = 0x14;
    pub(crate) const INT16_0: u8 = 0x15;
    pub(crate) const INT16_1: u8 = 0x16;
    pub(crate) const INT16_MIN: u8 = 0x17;
    pub(crate) const INT16_MAX: u8 = 0x18;
    pub(crate) const INT32_0: u8 = 0x19;
    pub(crate) const INT32_1: u8 = 0x1A;
    pub(crate) const INT32_MIN: u8 = 0x1B;
    pub(crate) const INT32_MAX: u8 = 0x1C;
    pub(crate) const INT64_0: u8 = 0x1D;
    pub(crate) const INT64_1: u8 = 0x1E;
    pub(crate) const INT64_MIN: u8 = 0x1F;
    pub(crate) const INT64_MAX: u8 = 0x20;
    pub(crate) const UINT8_0: u8 = 0x21;
    pub(crate) const UINT8_1: u8 = 0x22;
    pub(crate) const UINT8_MAX: u8 = 0x23;
    pub(crate) const UINT16_0: u8 = 0x24;
    pub(crate) const UINT16_1: u8 = 0x25;
    pub(crate) const UINT16_MAX: u8 = 0x26;
    pub(crate) const UINT32_0: u8 = 0x27;
    pub(crate) const UINT32_1: u8 = 0x28;
    pub(crate) const UINT32_MAX: u8 = 0x29;
    pub(crate) const UINT64_0: u8 = 0x2A;
    pub(crate) const UINT64_1: u8 = 0x2B;
    pub(crate) const UINT64_MAX: u8 = 0x2C;

    // Non-negative values carried in fewer bytes than their type.
    pub(crate) const INT32_2B: u8 = 0x2D;
    pub(crate) const INT64_4B: u8 = 0x2E;
    pub(crate) const UINT32_2B: u8 = 0x2F;
    pub(crate) const UINT64_4B: u8 = 0x30;

    pub(crate) const QNAME: u8 = 0x31;
    pub(crate) const QNAME_REF_1B: u8 = 0x32;
    pub(crate) const QNAME_REF_2B: u8 = 0x33;
    pub(crate) const QNAME_REF_4B: u8 = 0x34;
    pub(crate) const MODREF_1B: u8 = 0x35;
    pub(crate) const MODREF_2B: u8 = 0x36;
    pub(crate) const MODREF_4B: u8 = 0x37;
    pub(crate) const STRING_REF_1B: u8 = 0x38;
    pub(crate) const STRING_REF_2B: u8 = 0x39;
    pub(crate) const STRING_REF_4B: u8 = 0x3A;

    pub(crate) const BINARY_1B: u8 = 0x3B;
    pub(crate) const BINARY_2B: u8 = 0x3C;
    pub(crate) const BINARY_4B: u8 = 0x3D;
    pub(crate) const YIID: u8 = 0x3E;

    pub(crate) const BITS_0: u8 = 0x40;
    pub(crate) const BITS_1B: u8 = 0x5D;
    pub(crate) const BITS_2B: u8 = 0x5E;
    pub(crate) const BITS_4B: u8 = 0x5F;
    pub(crate) const YIID_0: u8 = 0x60;
    pub(crate) const BINARY_0: u8 = 0x80;

    /// Bit sets of up to this many names carry the count in the opcode.
    pub(crate) const BITS_INLINE: usize = 29;
    /// Instance paths of up to this many arguments carry the count in the opcode.
    pub(crate) const YIID_INLINE: usize = 32;
    /// Binaries shorter than this carry the length in the opcode.
    pub(crate) const BINARY_INLINE: usize = 128;
}

/// Path-argument header: type in bits 0-2, name addressing in bits 3-4,
/// predicate count in bits 5-7. Augmentations use bits 3-7 for the child count.
pub(crate) mod path {
    pub(crate) const AUGMENTATION: u8 = 0x00;
    pub(crate) const NODE_IDENTIFIER: u8 = 0x01;
    pub(crate) const WITH_PREDICATES: u8 = 0x02;
    pub(crate) const WITH_VALUE: u8 = 0x03;
    pub(crate) const MOUNTPOINT: u8 = 0x04;
    pub(crate) const TYPE_MASK: u8 = 0x07;

    pub(crate) const QNAME_DEF: u8 = 0x00;
    pub(crate) const QNAME_REF_1B: u8 = 0x08;
    pub(crate) const QNAME_REF_2B: u8 = 0x10;
    pub(crate) const QNAME_REF_4B: u8 = 0x18;
    pub(crate) const QNAME_MASK: u8 = 0x18;

    pub(crate) const SIZE_SHIFT: u8 = 5;
    pub(crate) const SIZE_INLINE: usize = 5;
    pub(crate) const SIZE_1B: u8 = 5;
    pub(crate) const SIZE_2B: u8 = 6;
    pub(crate) const SIZE_4B: u8 = 7;

    pub(crate) const AID_COUNT_SHIFT: u8 = 3;
    pub(crate) const AID_COUNT_INLINE: usize = 29;
    pub(crate) const AID_COUNT_1B: u8 = 29;
    pub(crate) const AID_COUNT_2B: u8 = 30;
    pub(crate) const AID_COUNT_4B: u8 = 31;
}

/// How a count or code is carried: in the opcode, or in 1, 2 or 4 trailing bytes.
///
/// One-byte forms store `n - inline`, two-byte forms `n - inline - 256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Width {
    Inline(u8),
    Byte(u8),
    Short(u16),
    Int(u32),
}

impl Width {
    pub(crate) fn of(what: &'static str, n: usize, inline: usize) -> Result<Self, EncodingError> {
        if n < inline {
            return u8::try_from(n)
                .map(Self::Inline)
                .map_err(|_| EncodingError::TooLarge { what, count: n });
        }
        let rest = n - inline;
        if let Ok(byte) = u8::try_from(rest) {
            return Ok(Self::Byte(byte));
        }
        if let Ok(short) = u16::try_from(rest - 256) {
            return Ok(Self::Short(short));
        }
        u32::try_from(n)
            .ok()
            .filter(|v| *v <= 0x7FFF_FFFF)
            .map(Self::Int)
            .ok_or(EncodingError::TooLarge { what, count: n })
    }

    /// Inverse of the offsets applied by [`Width::of`] for the trailing forms.
    pub(crate) fn byte_value(byte: u8, inline: usize) -> usize {
        usize::from(byte) + inline
    }

    pub(crate) fn short_value(short: u16, inline: usize) -> usize {
        usize::from(short) + inline + 256
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn width_classes_cover_their_ranges() {
        assert_eq!(Width::of("x", 0, 29).unwrap(), Width::Inline(0));
        assert_eq!(Width::of("x", 28, 29).unwrap(), Width::Inline(28));
        assert_eq!(Width::of("x", 29, 29).unwrap(), Width::Byte(0));
        assert_eq!(Width::of("x", 284, 29).unwrap(), Width::Byte(255));
        assert_eq!(Width::of("x", 285, 29).unwrap(), Width::Short(0));
        assert_eq!(Width::of("x", 285 + 65_535, 29).unwrap(), Width::Short(65_535));
        assert_eq!(
            Width::of("x", 285 + 65_536, 29).unwrap(),
            Width::Int(285 + 65_536)
        );
        assert_eq!(Width::of("x", 255, 0).unwrap(), Width::Byte(255));
        assert_eq!(Width::of("x", 256, 0).unwrap(), Width::Short(0));
    }

    #[test]
    fn width_offsets_invert() {
        assert_eq!(Width::byte_value(0, 29), 29);
        assert_eq!(Width::short_value(0, 29), 285);
        assert_eq!(Width::short_value(10, 0), 266);
    }

    #[test]
    fn header_fields_do_not_overlap() {
        assert_eq!(node::TYPE_MASK & node::ADDR_MASK, 0);
        assert_eq!(node::ADDR_MASK & node::PREDICATE_MASK, 0);
        assert_eq!(path::TYPE_MASK & path::QNAME_MASK, 0);
        assert_eq!(path::SIZE_4B << path::SIZE_SHIFT, 0xE0);
        assert_eq!(path::AID_COUNT_4B << path::AID_COUNT_SHIFT, 0xF8);
        assert_eq!(value::BITS_0 + 29, value::BITS_1B);
        assert_eq!(value::YIID_0 + 31, 0x7F);
    }
}
