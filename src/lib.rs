// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A bit-exact decoder for FLAC subframes
//!
//! Each FLAC frame carries one subframe per channel.
//! This crate turns the bit-packed, Rice-coded contents of
//! a subframe back into the exact integer samples
//! that were originally encoded.
//!
//! | Subframe Type | Contents |
//! |--------------:|----------|
//! | [CONSTANT](`subframe::Constant`) | a single sample repeated for the whole block |
//! | [VERBATIM](`subframe::Verbatim`) | every sample stored as-is |
//! | [FIXED](`subframe::Fixed`) | warm-up samples plus a residual for one of five fixed predictors |
//! | [LPC](`subframe::Lpc`) | warm-up samples, quantized predictor coefficients and a residual |
//!
//! Frame headers, metadata blocks, checksums and channel decorrelation
//! are left to the caller, which supplies each subframe's
//! block size and bits-per-sample.
//!
//! # Example
//!
//! ```
//! use flac_subframe::decode::Decoder;
//! use flac_subframe::subframe::ReadResult;
//!
//! // a CONSTANT subframe of 8-bit samples, all -3
//! let data: &[u8] = &[0b0_000000_0, 0b11111101];
//!
//! let mut decoder = Decoder::new(data);
//! let subframe = decoder.read_subframe(4, 8).unwrap();
//!
//! let mut samples = [0; 4];
//! assert_eq!(subframe.read(&mut samples), ReadResult::Filled(4));
//! assert_eq!(samples, [-3, -3, -3, -3]);
//! ```

#![warn(missing_docs)]

pub mod bitreader;
pub mod decode;
pub mod pool;
pub mod residual;
pub mod restore;
pub mod stream;
pub mod subframe;

/// A subframe decoding error
#[derive(Debug)]
pub enum Error {
    /// An error from the underlying byte source
    Io(std::io::Error),
    /// Fewer bits remain in the stream than were requested
    InsufficientData {
        /// Bit position at which the read was attempted
        position: u64,
        /// Number of bits requested
        requested: u32,
    },
    /// The stream's contents are not a valid subframe
    InvalidStream {
        /// Bit position at which the problem was detected
        position: u64,
        /// What is wrong with the stream
        reason: InvalidStream,
    },
    /// A destination buffer is too small for a subframe's samples
    DestinationTooSmall {
        /// Number of samples in the subframe
        required: usize,
        /// Size of the destination buffer
        available: usize,
    },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::InsufficientData {
                position,
                requested,
            } => write!(
                f,
                "insufficient data for {requested} bit read at bit {position}"
            ),
            Self::InvalidStream { position, reason } => {
                write!(f, "{reason} at bit {position}")
            }
            Self::DestinationTooSmall {
                required,
                available,
            } => write!(
                f,
                "destination holds {available} samples but {required} are required"
            ),
        }
    }
}

/// Why a stream is not a valid subframe
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InvalidStream {
    /// The subframe header's leading padding bit is set
    NonZeroPadding,
    /// The subframe type is one of the reserved values
    ReservedSubframeType(u8),
    /// The wasted bits count meets or exceeds the bits-per-sample
    ExcessiveWastedBits,
    /// Bits-per-sample is outside of 1 to 32
    InvalidBitsPerSample(u32),
    /// Block size is zero or larger than permitted
    InvalidBlockSize(u32),
    /// The predictor order exceeds the block size
    ExcessivePredictorOrder,
    /// The residual coding method is one of the reserved values
    InvalidCodingMethod(u8),
    /// The residual partition order doesn't fit the block size
    InvalidPartitionOrder,
    /// A Rice-coded residual is too large for a 32-bit sample
    ResidualOverflow,
    /// The LPC coefficient precision is the reserved value
    ReservedLpcPrecision,
    /// The LPC shift is negative
    NegativeLpcShift,
    /// A restored sample doesn't fit in the subframe's bits-per-sample
    SampleOutOfRange,
    /// A field is empty or wider than the value it is being read into
    InvalidBitWidth(u32),
}

impl std::fmt::Display for InvalidStream {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NonZeroPadding => "non-zero subframe padding bit".fmt(f),
            Self::ReservedSubframeType(t) => write!(f, "reserved subframe type {t:#08b}"),
            Self::ExcessiveWastedBits => "excessive wasted bits per sample".fmt(f),
            Self::InvalidBitsPerSample(bps) => write!(f, "invalid bits-per-sample {bps}"),
            Self::InvalidBlockSize(size) => write!(f, "invalid block size {size}"),
            Self::ExcessivePredictorOrder => "predictor order larger than block size".fmt(f),
            Self::InvalidCodingMethod(m) => write!(f, "invalid residual coding method {m}"),
            Self::InvalidPartitionOrder => "invalid residual partition order".fmt(f),
            Self::ResidualOverflow => "residual value too large".fmt(f),
            Self::ReservedLpcPrecision => "reserved LPC coefficient precision".fmt(f),
            Self::NegativeLpcShift => "negative LPC shift".fmt(f),
            Self::SampleOutOfRange => "restored sample out of range".fmt(f),
            Self::InvalidBitWidth(bits) => write!(f, "invalid {bits} bit field width"),
        }
    }
}
