// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream versions and the three-byte stream header.
//!
//! ```text
//! [0xAB signature][u16 big-endian version][payload ...]
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidStream, Result};

/// First byte of every stream.
pub const SIGNATURE_MARKER: u8 = 0xAB;

/// Header length in bytes.
pub const HEADER_LEN: usize = 3;

/// Known wire formats, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamVersion {
    /// Names as raw coded strings; no name dictionary.
    Lithium,
    /// Adds name, module and augmentation dictionaries.
    NeonSr2,
    /// Adds native unsigned values and child-count size hints.
    SodiumSr1,
    /// Compact headers, variable-width references, key-leaf elision.
    Magnesium,
}

impl StreamVersion {
    /// Every version, oldest first.
    pub const ALL: [Self; 4] = [Self::Lithium, Self::NeonSr2, Self::SodiumSr1, Self::Magnesium];

    /// Newest format; the default for new streams.
    pub const CURRENT: Self = Self::Magnesium;

    /// Wire tag.
    pub const fn code(self) -> u16 {
        match self {
            Self::Lithium => 1,
            Self::NeonSr2 => 2,
            Self::SodiumSr1 => 3,
            Self::Magnesium => 4,
        }
    }

    /// Map a wire tag back to a version.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Lithium),
            2 => Some(Self::NeonSr2),
            3 => Some(Self::SodiumSr1),
            4 => Some(Self::Magnesium),
            _ => None,
        }
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lithium => "lithium",
            Self::NeonSr2 => "neon-sr2",
            Self::SodiumSr1 => "sodium-sr1",
            Self::Magnesium => "magnesium",
        }
    }

    /// Whether unsigned integers travel as such (older formats widen them).
    pub const fn has_native_unsigned(self) -> bool {
        matches!(self, Self::SodiumSr1 | Self::Magnesium)
    }
}

impl Default for StreamVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for StreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error from parsing a version name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stream version {0:?} (expected one of lithium, neon-sr2, sodium-sr1, magnesium)")]
pub struct ParseVersionError(String);

impl FromStr for StreamVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.name() == lowered || v.code().to_string() == lowered)
            .ok_or_else(|| ParseVersionError(s.to_owned()))
    }
}

/// Encode the header for `version`.
pub fn header_bytes(version: StreamVersion) -> [u8; HEADER_LEN] {
    let [hi, lo] = version.code().to_be_bytes();
    [SIGNATURE_MARKER, hi, lo]
}

/// Write the header for `version`.
pub fn write_header<W: Write>(out: &mut W, version: StreamVersion) -> Result<()> {
    out.write_all(&header_bytes(version))?;
    Ok(())
}

/// Read and validate a header.
pub fn read_header<R: Read>(input: &mut R) -> Result<StreamVersion> {
    let mut buf = [0_u8; HEADER_LEN];
    input.read_exact(&mut buf)?;
    if buf[0] != SIGNATURE_MARKER {
        return Err(InvalidStream::BadSignature(buf[0]).into());
    }
    let code = u16::from_be_bytes([buf[1], buf[2]]);
    StreamVersion::from_code(code).ok_or_else(|| InvalidStream::UnknownVersion(code).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StreamError;

    #[test]
    fn header_layout_is_signature_then_big_endian_version() {
        assert_eq!(header_bytes(StreamVersion::Magnesium), [0xAB, 0x00, 0x04]);
        assert_eq!(header_bytes(StreamVersion::Lithium), [0xAB, 0x00, 0x01]);
    }

    #[test]
    fn header_round_trips_every_version() {
        for v in StreamVersion::ALL {
            let mut buf = Vec::new();
            write_header(&mut buf, v).unwrap();
            assert_eq!(read_header(&mut buf.as_slice()).unwrap(), v);
        }
    }

    #[test]
    fn rejects_bad_signature_and_unknown_version() {
        let err = read_header(&mut [0xAC, 0, 4].as_slice()).unwrap_err();
        assert_eq!(err.as_invalid(), Some(&InvalidStream::BadSignature(0xAC)));
        let err = read_header(&mut [0xAB, 0, 9].as_slice()).unwrap_err();
        assert_eq!(err.as_invalid(), Some(&InvalidStream::UnknownVersion(9)));
        let err = read_header(&mut [0xAB].as_slice()).unwrap_err();
        assert!(matches!(err, StreamError::Invalid(InvalidStream::Truncated)));
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("Magnesium".parse::<StreamVersion>().unwrap(), StreamVersion::Magnesium);
        assert_eq!("neon-sr2".parse::<StreamVersion>().unwrap(), StreamVersion::NeonSr2);
        assert_eq!("3".parse::<StreamVersion>().unwrap(), StreamVersion::SodiumSr1);
        assert!("beryllium".parse::<StreamVersion>().is_err());
    }
}
