// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire constants of the Lithium, NeonSr2 and SodiumSr1 formats.

/// One-byte node record tags.
pub(crate) mod node {
    pub(crate) const LEAF: u8 = 1;
    pub(crate) const LEAF_SET: u8 = 2;
    pub(crate) const LEAF_SET_ENTRY: u8 = 3;
    pub(crate) const CONTAINER: u8 = 4;
    pub(crate) const UNKEYED_LIST: u8 = 5;
    pub(crate) const UNKEYED_LIST_ITEM: u8 = 6;
    pub(crate) const MAP: u8 = 7;
    pub(crate) const MAP_ENTRY: u8 = 8;
    pub(crate) const ORDERED_MAP: u8 = 9;
    pub(crate) const CHOICE: u8 = 10;
    pub(crate) const AUGMENTATION: u8 = 11;
    pub(crate) const ANY_XML: u8 = 12;
    pub(crate) const END: u8 = 13;
    pub(crate) const ORDERED_LEAF_SET: u8 = 14;
    pub(crate) const YANG_MODELED_ANY_XML: u8 = 15;
}

/// Prefixes of coded strings and dictionary-coded names.
pub(crate) mod token {
    pub(crate) const IS_CODE_VALUE: u8 = 1;
    pub(crate) const IS_STRING_VALUE: u8 = 2;
    pub(crate) const IS_NULL_VALUE: u8 = 3;
    // NeonSr2 onwards.
    pub(crate) const IS_QNAME_CODE: u8 = 4;
    pub(crate) const IS_QNAME_VALUE: u8 = 5;
    pub(crate) const IS_AUGMENT_CODE: u8 = 6;
    pub(crate) const IS_AUGMENT_VALUE: u8 = 7;
    pub(crate) const IS_MODULE_CODE: u8 = 8;
    pub(crate) const IS_MODULE_VALUE: u8 = 9;
}

/// Leaf value type tags.
pub(crate) mod value {
    pub(crate) const SHORT: u8 = 1;
    pub(crate) const BYTE: u8 = 2;
    pub(crate) const INT: u8 = 3;
    pub(crate) const LONG: u8 = 4;
    pub(crate) const BOOL: u8 = 5;
    pub(crate) const QNAME: u8 = 6;
    pub(crate) const BITS: u8 = 7;
    pub(crate) const INSTANCE_PATH: u8 = 8;
    pub(crate) const STRING: u8 = 9;
    pub(crate) const BIG_INTEGER: u8 = 10;
    pub(crate) const DECIMAL: u8 = 11;
    pub(crate) const BINARY: u8 = 12;
    pub(crate) const NULL: u8 = 13;
    pub(crate) const STRING_BYTES: u8 = 14;
    pub(crate) const EMPTY: u8 = 15;
    // SodiumSr1 onwards.
    pub(crate) const UINT8: u8 = 16;
    pub(crate) const UINT16: u8 = 17;
    pub(crate) const UINT32: u8 = 18;
    pub(crate) const UINT64: u8 = 19;
}

/// Path argument type tags.
pub(crate) mod path {
    pub(crate) const AUGMENTATION: u8 = 1;
    pub(crate) const NODE_IDENTIFIER: u8 = 2;
    pub(crate) const WITH_VALUE: u8 = 3;
    pub(crate) const WITH_PREDICATES: u8 = 4;
}
