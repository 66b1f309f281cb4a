// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Big-endian primitive writer/reader shared by every stream format.
//!
//! `DataOutput` also owns the pending stream header: the header goes out
//! right before the first payload byte, exactly once.

use std::io::{Read, Write};

use crate::error::{EncodingError, InvalidStream, Result};
use crate::version::{self, StreamVersion};
use crate::varint;

/// Upper bound on speculative pre-allocation for length-prefixed payloads.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Primitive writer over a byte sink.
#[derive(Debug)]
pub(crate) struct DataOutput<W> {
    inner: W,
    pending_header: Option<StreamVersion>,
    written: u64,
}

impl<W: Write> DataOutput<W> {
    pub(crate) fn new(inner: W, version: StreamVersion) -> Self {
        Self {
            inner,
            pending_header: Some(version),
            written: 0,
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if let Some(version) = self.pending_header.take() {
            tracing::debug!(%version, "writing stream header");
            version::write_header(&mut self.inner, version)?;
            self.written += version::HEADER_LEN as u64;
        }
        Ok(())
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_header()?;
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub(crate) fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub(crate) fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub(crate) fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Signed 32-bit count, as the legacy formats expect.
    pub(crate) fn write_count(&mut self, what: &'static str, count: usize) -> Result<()> {
        let count = i32::try_from(count).map_err(|_| EncodingError::TooLarge { what, count })?;
        self.write_i32(count)
    }

    pub(crate) fn write_varint(&mut self, value: u32) -> Result<()> {
        let mut buf = [0_u8; varint::MAX_LEN];
        let len = varint::encode(value, &mut buf);
        self.write_bytes(&buf[..len])
    }

    /// Two-byte length prefix followed by UTF-8 bytes.
    pub(crate) fn write_utf(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| EncodingError::StringTooLong(value.len()))?;
        self.write_u16(len)?;
        self.write_bytes(value.as_bytes())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.written
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

/// Primitive reader over a byte source. EOF surfaces as [`InvalidStream::Truncated`].
#[derive(Debug)]
pub(crate) struct DataInput<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> DataInput<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    pub(crate) fn read_header(&mut self) -> Result<StreamVersion> {
        let version = version::read_header(&mut self.inner)?;
        self.consumed += version::HEADER_LEN as u64;
        Ok(version)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0_u8; N];
        self.inner.read_exact(&mut buf)?;
        self.consumed += N as u64;
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Signed 32-bit count; negative values are structural errors.
    pub(crate) fn read_count(&mut self, what: &'static str) -> Result<usize> {
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| {
            InvalidStream::InvalidLength {
                what,
                len: i64::from(raw),
            }
            .into()
        })
    }

    pub(crate) fn read_varint(&mut self) -> Result<u32> {
        let mut counted = CountingRead {
            inner: &mut self.inner,
            count: 0,
        };
        let value = varint::read(&mut counted)?;
        self.consumed += counted.count;
        Ok(value)
    }

    /// Read exactly `len` bytes without trusting `len` for allocation.
    pub(crate) fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.consumed += got as u64;
        if got != len {
            return Err(InvalidStream::Truncated.into());
        }
        Ok(buf)
    }

    pub(crate) fn read_utf8(&mut self, len: usize) -> Result<String> {
        String::from_utf8(self.read_vec(len)?).map_err(|_| InvalidStream::InvalidUtf8.into())
    }

    /// Two-byte length prefix followed by UTF-8 bytes.
    pub(crate) fn read_utf(&mut self) -> Result<String> {
        let len = self.read_u16()?;
        self.read_utf8(usize::from(len))
    }

    pub(crate) fn bytes_read(&self) -> u64 {
        self.consumed
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

struct CountingRead<'a, R> {
    inner: &'a mut R,
    count: u64,
}

impl<R: Read> Read for CountingRead<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}
