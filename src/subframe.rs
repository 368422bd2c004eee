// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding FLAC subframes to samples
//!
//! A subframe is fully decoded when it is constructed.
//! Afterward, it is an immutable buffer of samples
//! which can be copied out any number of times.

use crate::bitreader::BitReader;
use crate::decode::DecodeOptions;
use crate::pool::{SamplePool, Samples};
use crate::residual::read_residual;
use crate::restore::{Accumulator, restore_fixed, restore_lpc};
use crate::stream::{QuantizedLpcParameters, SubframeHeader, SubframeType};
use crate::{Error, InvalidStream};

/// The outcome of copying a subframe's samples
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadResult {
    /// The given number of samples were copied
    Filled(usize),
    /// The destination is too small to hold the subframe's samples
    EndOfStream,
}

/// A decoded FLAC subframe
#[derive(Debug)]
pub enum SubFrame {
    /// A CONSTANT subframe
    Constant(Constant),
    /// A VERBATIM subframe
    Verbatim(Verbatim),
    /// A FIXED subframe
    Fixed(Fixed),
    /// An LPC subframe
    Lpc(Lpc),
}

impl SubFrame {
    /// Decodes a whole subframe from the given reader
    ///
    /// `bits_per_sample` is the channel's effective sample size,
    /// which is one more than the frame's for the side channel
    /// of a decorrelated stereo pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the subframe is invalid,
    /// `block_size` or `bits_per_sample` are out of range,
    /// or the stream runs out of data.
    /// No partially decoded subframe is ever returned.
    pub fn decode<R: std::io::Read>(
        r: &mut BitReader<R>,
        block_size: u32,
        bits_per_sample: u32,
        options: &DecodeOptions,
    ) -> Result<Self, Error> {
        if !(1..=options.max_block_size).contains(&block_size) {
            return Err(r.invalid(InvalidStream::InvalidBlockSize(block_size)));
        }

        if !(1..=32).contains(&bits_per_sample) {
            return Err(r.invalid(InvalidStream::InvalidBitsPerSample(bits_per_sample)));
        }

        let header = SubframeHeader::read(r)?;

        log::trace!(
            "{:?} subframe, {block_size} samples, {bits_per_sample} bps, {} wasted",
            header.type_,
            header.wasted_bits,
        );

        let block = Block {
            size: usize::try_from(block_size)
                .map_err(|_| r.invalid(InvalidStream::InvalidBlockSize(block_size)))?,
            bits: bits_per_sample
                .checked_sub(header.wasted_bits)
                .filter(|bits| *bits > 0)
                .ok_or_else(|| r.invalid(InvalidStream::ExcessiveWastedBits))?,
            wasted_bits: header.wasted_bits,
            pool: options.pool.as_ref(),
        };

        if header.type_.order() > block.size {
            return Err(r.invalid(InvalidStream::ExcessivePredictorOrder));
        }

        match header.type_ {
            SubframeType::Constant => Constant::read(r, &block).map(Self::Constant),
            SubframeType::Verbatim => Verbatim::read(r, &block).map(Self::Verbatim),
            SubframeType::Fixed(order) => Fixed::read(r, &block, order).map(Self::Fixed),
            SubframeType::Lpc(order) => {
                Lpc::read(r, &block, order, options.always_wide).map(Self::Lpc)
            }
        }
    }

    /// Copies all of the subframe's samples to the start of `dest`
    ///
    /// Returns [`ReadResult::EndOfStream`] without copying anything
    /// if `dest` is smaller than the subframe.
    pub fn read(&self, dest: &mut [i32]) -> ReadResult {
        let samples = self.samples();
        match dest.get_mut(0..samples.len()) {
            Some(dest) => {
                dest.copy_from_slice(samples);
                ReadResult::Filled(samples.len())
            }
            None => ReadResult::EndOfStream,
        }
    }

    /// Copies all of the subframe's samples to the start of `dest`
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestinationTooSmall`] if `dest` is smaller than the subframe.
    pub fn copy_to(&self, dest: &mut [i32]) -> Result<usize, Error> {
        match self.read(dest) {
            ReadResult::Filled(filled) => Ok(filled),
            ReadResult::EndOfStream => Err(Error::DestinationTooSmall {
                required: self.len(),
                available: dest.len(),
            }),
        }
    }

    /// The subframe's decoded samples
    pub fn samples(&self) -> &[i32] {
        match self {
            Self::Constant(Constant { samples, .. })
            | Self::Verbatim(Verbatim { samples, .. })
            | Self::Fixed(Fixed { samples, .. })
            | Self::Lpc(Lpc { samples, .. }) => &samples[..],
        }
    }

    /// The subframe's block size, in samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples().len()
    }

    /// Whether the subframe has no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    /// Number of low-order bits restored to every sample
    pub fn wasted_bits(&self) -> u32 {
        match self {
            Self::Constant(Constant { wasted_bits, .. })
            | Self::Verbatim(Verbatim { wasted_bits, .. })
            | Self::Fixed(Fixed { wasted_bits, .. })
            | Self::Lpc(Lpc { wasted_bits, .. }) => *wasted_bits,
        }
    }

    /// The subframe's type
    pub fn subframe_type(&self) -> SubframeType {
        match self {
            Self::Constant(_) => SubframeType::Constant,
            Self::Verbatim(_) => SubframeType::Verbatim,
            Self::Fixed(Fixed { order, .. }) => SubframeType::Fixed(*order),
            Self::Lpc(Lpc { parameters, .. }) => SubframeType::Lpc(parameters.order() as u8),
        }
    }
}

// the shape of the block a subframe decodes into
struct Block<'p> {
    size: usize,
    // bits actually stored per sample, less any wasted bits
    bits: u32,
    wasted_bits: u32,
    pool: Option<&'p SamplePool>,
}

impl Block<'_> {
    fn samples(&self) -> Samples {
        Samples::acquire(self.pool, self.size)
    }

    fn restore_wasted_bits(&self, samples: &mut [i32]) {
        if self.wasted_bits > 0 {
            samples.iter_mut().for_each(|s| *s <<= self.wasted_bits);
        }
    }

    fn read_samples<R: std::io::Read>(
        &self,
        r: &mut BitReader<R>,
        samples: &mut [i32],
    ) -> Result<(), Error> {
        samples
            .iter_mut()
            .try_for_each(|s| r.read_bits_i32(self.bits).map(|v| *s = v))
    }
}

/// A subframe whose every sample is the same
#[derive(Debug)]
pub struct Constant {
    value: i32,
    wasted_bits: u32,
    samples: Samples,
}

impl Constant {
    fn read<R: std::io::Read>(r: &mut BitReader<R>, block: &Block) -> Result<Self, Error> {
        let value = r.read_bits_i32(block.bits)? << block.wasted_bits;
        let mut samples = block.samples();
        samples.fill(value);

        Ok(Self {
            value,
            wasted_bits: block.wasted_bits,
            samples,
        })
    }

    /// The subframe's single sample value
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }
}

/// A subframe of uncompressed samples
#[derive(Debug)]
pub struct Verbatim {
    wasted_bits: u32,
    samples: Samples,
}

impl Verbatim {
    fn read<R: std::io::Read>(r: &mut BitReader<R>, block: &Block) -> Result<Self, Error> {
        let mut samples = block.samples();
        block.read_samples(r, &mut samples)?;
        block.restore_wasted_bits(&mut samples);

        Ok(Self {
            wasted_bits: block.wasted_bits,
            samples,
        })
    }
}

/// A subframe restored by one of the fixed predictors
///
/// | Order | Prediction |
/// |------:|------------|
/// | 0 | 0 |
/// | 1 | s₋₁ |
/// | 2 | 2s₋₁ - s₋₂ |
/// | 3 | 3s₋₁ - 3s₋₂ + s₋₃ |
/// | 4 | 4s₋₁ - 6s₋₂ + 4s₋₃ - s₋₄ |
#[derive(Debug)]
pub struct Fixed {
    order: u8,
    partition_order: u32,
    wasted_bits: u32,
    samples: Samples,
}

impl Fixed {
    fn read<R: std::io::Read>(
        r: &mut BitReader<R>,
        block: &Block,
        order: u8,
    ) -> Result<Self, Error> {
        let mut samples = block.samples();
        let (warm_up, residual) = samples.split_at_mut(usize::from(order));

        block.read_samples(r, warm_up)?;
        let partition_order = read_residual(r, usize::from(order), residual)?;

        restore_fixed(usize::from(order), block.bits, &mut samples)
            .map_err(|reason| r.invalid(reason))?;
        block.restore_wasted_bits(&mut samples);

        Ok(Self {
            order,
            partition_order,
            wasted_bits: block.wasted_bits,
            samples,
        })
    }

    /// The predictor's order, from 0 to 4
    #[inline]
    pub fn order(&self) -> u8 {
        self.order
    }

    /// The residual had 2ⁿ partitions
    #[inline]
    pub fn partition_order(&self) -> u32 {
        self.partition_order
    }
}

/// A subframe restored by a quantized linear predictor
#[derive(Debug)]
pub struct Lpc {
    parameters: QuantizedLpcParameters,
    accumulator: Accumulator,
    partition_order: u32,
    wasted_bits: u32,
    samples: Samples,
}

impl Lpc {
    fn read<R: std::io::Read>(
        r: &mut BitReader<R>,
        block: &Block,
        order: u8,
        always_wide: bool,
    ) -> Result<Self, Error> {
        let order = usize::from(order);
        let mut samples = block.samples();

        block.read_samples(r, &mut samples[0..order])?;
        let parameters = QuantizedLpcParameters::read(r, order)?;
        let partition_order = read_residual(r, order, &mut samples[order..])?;

        let accumulator = match always_wide {
            true => Accumulator::Wide,
            false => Accumulator::select(block.bits, parameters.precision, order),
        };

        log::debug!(
            "order {order} LPC, {} bit coefficients, shift {}, {accumulator:?} accumulator",
            parameters.precision,
            parameters.shift,
        );

        restore_lpc(
            &parameters.coefficients,
            parameters.shift,
            block.bits,
            accumulator,
            &mut samples,
        )
        .map_err(|reason| r.invalid(reason))?;
        block.restore_wasted_bits(&mut samples);

        Ok(Self {
            parameters,
            accumulator,
            partition_order,
            wasted_bits: block.wasted_bits,
            samples,
        })
    }

    /// The predictor's quantized parameters
    #[inline]
    pub fn parameters(&self) -> &QuantizedLpcParameters {
        &self.parameters
    }

    /// Which accumulator the samples were restored with
    #[inline]
    pub fn accumulator(&self) -> Accumulator {
        self.accumulator
    }

    /// The residual had 2ⁿ partitions
    #[inline]
    pub fn partition_order(&self) -> u32 {
        self.partition_order
    }
}
