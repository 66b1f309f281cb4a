// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Variable-length 7-bit unsigned integers.
//!
//! Each byte carries seven value bits; the high bit flags a following byte.
//! The least significant group is written first, so a `u32` takes one to
//! five bytes.

use std::io::{Read, Write};

use crate::error::{InvalidStream, Result};

/// Longest encoding of a `u32`.
pub const MAX_LEN: usize = 5;

/// Number of bytes [`write`] emits for `value`.
pub const fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Encode `value` into a fixed buffer, returning the used prefix length.
#[allow(clippy::cast_possible_truncation)]
pub fn encode(value: u32, buf: &mut [u8; MAX_LEN]) -> usize {
    let mut v = value;
    let mut i = 0;
    loop {
        let low7 = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf[i] = low7;
            return i + 1;
        }
        buf[i] = 0x80 | low7;
        i += 1;
    }
}

/// Write `value` to `out`.
pub fn write<W: Write + ?Sized>(out: &mut W, value: u32) -> Result<()> {
    let mut buf = [0_u8; MAX_LEN];
    let len = encode(value, &mut buf);
    out.write_all(&buf[..len])?;
    Ok(())
}

/// Read one value from `input`.
pub fn read<R: Read + ?Sized>(input: &mut R) -> Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0_u32;
    for index in 0..MAX_LEN {
        let mut byte = [0_u8; 1];
        input.read_exact(&mut byte)?;
        let data = u32::from(byte[0] & 0x7F);
        // The fifth byte may only carry the top four bits of a u32.
        if index == MAX_LEN - 1 && (data > 0x0F || byte[0] & 0x80 != 0) {
            return Err(InvalidStream::VarintOverflow.into());
        }
        result |= data << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
    Err(InvalidStream::VarintOverflow.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StreamError;

    fn round_trip(value: u32) -> (usize, u32) {
        let mut out = Vec::new();
        write(&mut out, value).unwrap();
        let decoded = read(&mut out.as_slice()).unwrap();
        (out.len(), decoded)
    }

    // ── 1. byte-length boundaries ──────────────────────────────────────

    #[test]
    fn boundaries_take_expected_byte_counts() {
        let cases = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            (268_435_455, 4),
            (268_435_456, 5),
            (u32::MAX, 5),
        ];
        for (value, len) in cases {
            assert_eq!(round_trip(value), (len, value), "value {value}");
            assert_eq!(encoded_len(value), len, "encoded_len({value})");
        }
    }

    // ── 2. wire layout ─────────────────────────────────────────────────

    #[test]
    fn least_significant_group_comes_first() {
        let mut out = Vec::new();
        write(&mut out, 300).unwrap();
        assert_eq!(out, [0xAC, 0x02]);
    }

    // ── 3. rejection ───────────────────────────────────────────────────

    #[test]
    fn rejects_overlong_and_overflowing_input() {
        let six = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            read(&mut six.as_slice()),
            Err(StreamError::Invalid(InvalidStream::VarintOverflow))
        ));
        let too_big = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        assert!(matches!(
            read(&mut too_big.as_slice()),
            Err(StreamError::Invalid(InvalidStream::VarintOverflow))
        ));
    }

    #[test]
    fn truncated_input_is_reported() {
        assert!(matches!(
            read(&mut [0x80_u8].as_slice()),
            Err(StreamError::Invalid(InvalidStream::Truncated))
        ));
    }
}
