// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling common FLAC subframe items

use crate::bitreader::BitReader;
use crate::{Error, InvalidStream};
use arrayvec::ArrayVec;

/// The maximum FIXED subframe predictor order
pub const MAX_FIXED_ORDER: u8 = 4;

/// The maximum LPC subframe predictor order
pub const MAX_LPC_ORDER: usize = 32;

/// A subframe's type, as given by its 6-bit type field
///
/// | Bits | Type |
/// |-----:|------|
/// | `000000` | CONSTANT |
/// | `000001` | VERBATIM |
/// | `001xxx` | FIXED, order `xxx` from 0 to 4 |
/// | `1xxxxx` | LPC, order `xxxxx` + 1 |
///
/// All other values are reserved.
///
/// # Example
/// ```
/// use flac_subframe::stream::SubframeType;
///
/// assert_eq!(SubframeType::try_from(0b001_010), Ok(SubframeType::Fixed(2)));
/// assert_eq!(SubframeType::try_from(0b1_00111), Ok(SubframeType::Lpc(8)));
/// assert!(SubframeType::try_from(0b001_101).is_err());
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SubframeType {
    /// A single sample for the whole block
    Constant,
    /// Samples stored uncompressed
    Verbatim,
    /// A fixed predictor of the given order
    Fixed(u8),
    /// A linear predictor of the given order
    Lpc(u8),
}

impl SubframeType {
    /// The number of warm-up samples preceding the residual
    pub const fn order(self) -> usize {
        match self {
            Self::Constant | Self::Verbatim => 0,
            Self::Fixed(order) | Self::Lpc(order) => order as usize,
        }
    }
}

impl TryFrom<u8> for SubframeType {
    type Error = InvalidStream;

    fn try_from(tag: u8) -> Result<Self, InvalidStream> {
        match tag {
            0b000000 => Ok(Self::Constant),
            0b000001 => Ok(Self::Verbatim),
            v @ 0b001000..=0b001100 => Ok(Self::Fixed(v & 0b111)),
            v @ 0b100000..=0b111111 => Ok(Self::Lpc((v & 0b11111) + 1)),
            v => Err(InvalidStream::ReservedSubframeType(v)),
        }
    }
}

impl From<SubframeType> for u8 {
    fn from(type_: SubframeType) -> u8 {
        match type_ {
            SubframeType::Constant => 0b000000,
            SubframeType::Verbatim => 0b000001,
            SubframeType::Fixed(order) => 0b001000 | order,
            SubframeType::Lpc(order) => 0b100000 | (order - 1),
        }
    }
}

/// A FLAC subframe header
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 1    | padding | always 0 |
/// | 6    | `type_` | subframe type |
/// | 1    | wasted flag | whether wasted bits follow |
/// | 0+   | `wasted_bits` | if flagged, unary-coded count (-1) |
///
/// # Example
/// ```
/// use flac_subframe::bitreader::BitReader;
/// use flac_subframe::stream::{SubframeHeader, SubframeType};
///
/// let data: &[u8] = &[0b0_001010_1, 0b001_00000];
/// let mut r = BitReader::new(data);
/// assert_eq!(
///     SubframeHeader::read(&mut r).unwrap(),
///     SubframeHeader {
///         type_: SubframeType::Fixed(2),  // 0b001010
///         wasted_bits: 2 + 1,             // 0b1, 0b001
///     },
/// );
/// assert_eq!(r.position(), 11);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SubframeHeader {
    /// The subframe's type
    pub type_: SubframeType,
    /// Number of low-order zero bits stripped from every sample
    pub wasted_bits: u32,
}

impl SubframeHeader {
    /// Reads subframe header from the given reader
    ///
    /// # Errors
    ///
    /// Returns an error if the padding bit is set,
    /// the subframe type is reserved,
    /// or the stream runs out of data.
    pub fn read<R: std::io::Read>(r: &mut BitReader<R>) -> Result<Self, Error> {
        if r.read_bit()? {
            return Err(r.invalid(InvalidStream::NonZeroPadding));
        }

        let tag = r.read_bits_u32(6)? as u8;

        Ok(Self {
            type_: SubframeType::try_from(tag).map_err(|reason| r.invalid(reason))?,
            wasted_bits: match r.read_bit()? {
                false => 0,
                true => r.read_unary()? + 1,
            },
        })
    }
}

/// An LPC subframe's quantized predictor parameters
///
/// These follow the subframe's warm-up samples.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 4    | `precision` | coefficient precision (-1), `1111` is reserved |
/// | 5    | `shift` | signed right shift of each prediction |
/// | `precision`×order | `coefficients` | signed predictor coefficients |
///
/// # Example
/// ```
/// use flac_subframe::bitreader::BitReader;
/// use flac_subframe::stream::QuantizedLpcParameters;
///
/// let data: &[u8] = &[0b0011_0010, 0b1_0110_110, 0b1_0000000];
/// let mut r = BitReader::new(data);
/// let p = QuantizedLpcParameters::read(&mut r, 2).unwrap();
/// assert_eq!(p.precision, 3 + 1);
/// assert_eq!(p.shift, 5);
/// assert_eq!(p.coefficients.as_slice(), &[6, -3]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuantizedLpcParameters {
    /// Bits per coefficient, from 1 to 15
    pub precision: u32,
    /// Right shift applied to each prediction, from 0 to 15
    pub shift: u32,
    /// Predictor coefficients, one per order
    pub coefficients: ArrayVec<i32, MAX_LPC_ORDER>,
}

impl QuantizedLpcParameters {
    /// Reads parameters for a predictor of the given order
    ///
    /// # Errors
    ///
    /// Returns an error if the precision is the reserved value,
    /// the shift is negative, or the stream runs out of data.
    pub fn read<R: std::io::Read>(r: &mut BitReader<R>, order: usize) -> Result<Self, Error> {
        let precision = match r.read_bits_u32(4)? {
            0b1111 => return Err(r.invalid(InvalidStream::ReservedLpcPrecision)),
            p => p + 1,
        };

        let shift = u32::try_from(r.read_bits_i32(5)?)
            .map_err(|_| r.invalid(InvalidStream::NegativeLpcShift))?;

        let mut coefficients = ArrayVec::new();
        for _ in 0..order.min(MAX_LPC_ORDER) {
            coefficients.push(r.read_bits_i32(precision)?);
        }

        Ok(Self {
            precision,
            shift,
            coefficients,
        })
    }

    /// The predictor's order
    #[inline]
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }
}
