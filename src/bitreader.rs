// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For reading bit-granular fields from a FLAC stream

use crate::{Error, InvalidStream};
use bitstream_io::{BigEndian, BitRead};
use std::io::ErrorKind;

/// An MSB-first bit cursor over a byte source
///
/// Every successful read advances the cursor by exactly
/// the number of bits requested.
/// A read which runs past the end of the source
/// (or past the reader's limit, if it has one)
/// fails with [`Error::InsufficientData`], after which
/// the cursor's position is unspecified and the subframe
/// being decoded must be abandoned.
///
/// # Example
/// ```
/// use flac_subframe::bitreader::BitReader;
///
/// let data: &[u8] = &[0b1010_1100, 0b0101_0001];
/// let mut r = BitReader::new(data);
/// assert_eq!(r.read_bits_u32(4).unwrap(), 0b1010);
/// assert_eq!(r.read_bits_i32(4).unwrap(), -4);     // 0b1100
/// assert_eq!(r.read_unary().unwrap(), 1);          // 0b01
/// assert_eq!(r.read_bits_u32(6).unwrap(), 0b010001);
/// assert_eq!(r.position(), 16);
/// assert!(r.read_bit().is_err());
/// ```
pub struct BitReader<R> {
    reader: bitstream_io::BitReader<R, BigEndian>,
    position: u64,
    limit: Option<u64>,
}

impl<R: std::io::Read> BitReader<R> {
    /// Builds a reader over the whole of the given source
    pub fn new(source: R) -> Self {
        Self {
            reader: bitstream_io::BitReader::endian(source, BigEndian),
            position: 0,
            limit: None,
        }
    }

    /// Builds a reader which yields at most `bits` bits from the source
    ///
    /// # Example
    /// ```
    /// use flac_subframe::{Error, bitreader::BitReader};
    ///
    /// let data: &[u8] = &[0xFF];
    /// assert!(matches!(
    ///     BitReader::with_limit(data, 7).read_bits_u32(8),
    ///     Err(Error::InsufficientData { position: 0, requested: 8 }),
    /// ));
    /// assert_eq!(BitReader::with_limit(data, 7).read_bits_u32(7).unwrap(), 0x7F);
    /// ```
    pub fn with_limit(source: R, bits: u64) -> Self {
        Self {
            limit: Some(bits),
            ..Self::new(source)
        }
    }

    /// Number of bits consumed so far
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bits left before the reader's limit, if it has one
    #[inline]
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.position))
    }

    /// Whether the cursor sits on a byte boundary
    #[inline]
    pub fn byte_aligned(&self) -> bool {
        self.reader.byte_aligned()
    }

    /// Discards any bits remaining in the current byte
    pub fn byte_align(&mut self) {
        self.reader.byte_align();
        self.position = self.position.next_multiple_of(8);
    }

    /// Builds an [`Error::InvalidStream`] at the current position
    pub fn invalid(&self, reason: InvalidStream) -> Error {
        Error::InvalidStream {
            position: self.position,
            reason,
        }
    }

    /// Reads a single bit
    pub fn read_bit(&mut self) -> Result<bool, Error> {
        self.reserve(1)?;
        let result = self.reader.read_bit();
        self.settle(1, result)
    }

    /// Reads an unsigned value of `bits` bits, up to 32
    ///
    /// Reading 0 bits always yields 0.
    pub fn read_bits_u32(&mut self, bits: u32) -> Result<u32, Error> {
        match bits {
            0 => Ok(0),
            1..=32 => {
                self.reserve(bits)?;
                let result = self.reader.read_var(bits);
                self.settle(bits, result)
            }
            _ => Err(self.invalid(InvalidStream::InvalidBitWidth(bits))),
        }
    }

    /// Reads a two's complement signed value of `bits` bits, from 1 to 32
    pub fn read_bits_i32(&mut self, bits: u32) -> Result<i32, Error> {
        match bits {
            1..=32 => {
                self.reserve(bits)?;
                let result = self.reader.read_signed_var(bits);
                self.settle(bits, result)
            }
            _ => Err(self.invalid(InvalidStream::InvalidBitWidth(bits))),
        }
    }

    /// Reads an unsigned value of `bits` bits, up to 64
    ///
    /// Reading 0 bits always yields 0.
    pub fn read_bits_u64(&mut self, bits: u32) -> Result<u64, Error> {
        match bits {
            0 => Ok(0),
            1..=64 => {
                self.reserve(bits)?;
                let result = self.reader.read_var(bits);
                self.settle(bits, result)
            }
            _ => Err(self.invalid(InvalidStream::InvalidBitWidth(bits))),
        }
    }

    /// Reads a two's complement signed value of `bits` bits, from 1 to 64
    pub fn read_bits_i64(&mut self, bits: u32) -> Result<i64, Error> {
        match bits {
            1..=64 => {
                self.reserve(bits)?;
                let result = self.reader.read_signed_var(bits);
                self.settle(bits, result)
            }
            _ => Err(self.invalid(InvalidStream::InvalidBitWidth(bits))),
        }
    }

    /// Counts 0 bits up to and including a terminating 1 bit
    ///
    /// Returns the number of 0 bits.
    pub fn read_unary(&mut self) -> Result<u32, Error> {
        let start = self.position;
        self.reserve(1)?;
        let result = self.reader.read_unary::<1>();
        let zeros = self.settle(1, result)?;
        self.position += u64::from(zeros);
        match self.limit {
            Some(limit) if self.position > limit => Err(Error::InsufficientData {
                position: start,
                requested: zeros.saturating_add(1),
            }),
            _ => Ok(zeros),
        }
    }

    /// Skips the given number of bits
    pub fn skip(&mut self, bits: u32) -> Result<(), Error> {
        self.reserve(bits)?;
        let result = self.reader.skip(bits);
        self.settle(bits, result)
    }

    /// Returns the underlying byte source
    ///
    /// Any partially consumed byte is discarded.
    pub fn into_inner(self) -> R {
        self.reader.into_reader()
    }

    fn reserve(&self, bits: u32) -> Result<(), Error> {
        match self.remaining() {
            Some(remaining) if remaining < u64::from(bits) => Err(Error::InsufficientData {
                position: self.position,
                requested: bits,
            }),
            _ => Ok(()),
        }
    }

    fn settle<T>(&mut self, bits: u32, result: std::io::Result<T>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                self.position += u64::from(bits);
                Ok(value)
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(Error::InsufficientData {
                position: self.position,
                requested: bits,
            }),
            Err(err) => Err(Error::Io(err)),
        }
    }
}
