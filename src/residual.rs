// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding partitioned Rice residuals
//!
//! A predicted subframe's residual is split into
//! 2ⁿ partitions (where n is the partition order),
//! each with its own Rice parameter.
//! Because the residual starts after the subframe's warm-up samples,
//! the first partition is shorter than the rest by the predictor order.
//!
//! | Bits | Field | Meaning |
//! |-----:|------:|---------|
//! | 2    | coding method | `00` for 4-bit parameters, `01` for 5-bit parameters |
//! | 4    | partition order | 2ⁿ partitions follow |
//!
//! Each partition then starts with its Rice parameter.
//! A parameter with all bits set is an escape code,
//! followed by a 5-bit sample width and the partition's residuals
//! as plain signed values of that width.

use crate::bitreader::BitReader;
use crate::{Error, InvalidStream};

/// How a residual's Rice parameters are stored
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CodingMethod {
    /// 4-bit Rice parameters
    Rice,
    /// 5-bit Rice parameters
    Rice2,
}

impl CodingMethod {
    /// Size of each partition's Rice parameter, in bits
    #[inline]
    pub fn parameter_bits(self) -> u32 {
        match self {
            Self::Rice => 4,
            Self::Rice2 => 5,
        }
    }

    /// The parameter value indicating an escaped partition
    #[inline]
    pub fn escape_code(self) -> u32 {
        match self {
            Self::Rice => 0b1111,
            Self::Rice2 => 0b11111,
        }
    }

    fn read<R: std::io::Read>(r: &mut BitReader<R>) -> Result<Self, Error> {
        match r.read_bits_u32(2)? {
            0b00 => Ok(Self::Rice),
            0b01 => Ok(Self::Rice2),
            m => Err(r.invalid(InvalidStream::InvalidCodingMethod(m as u8))),
        }
    }
}

/// How a single residual partition is coded
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RiceParameter {
    /// Rice coded with the given parameter
    Rice(u32),
    /// Escaped, with residuals stored as signed values of the given width
    Escaped(u32),
}

/// A fully decoded residual
///
/// # Example
/// ```
/// use flac_subframe::bitreader::BitReader;
/// use flac_subframe::residual::{CodingMethod, Residual, RiceParameter};
///
/// let data: &[u8] = &[
///     0b00_0000_00,   // method 0, partition order 0
///     0b01_010_11_0,  // parameter 1, residuals 1, -1
///     0b11_000000,    // residual -2
/// ];
/// let mut r = BitReader::new(data);
/// assert_eq!(
///     Residual::read(&mut r, 1, 4).unwrap(),
///     Residual {
///         coding_method: CodingMethod::Rice,
///         partition_order: 0,
///         rice_parameters: vec![RiceParameter::Rice(1)],
///         errors: vec![1, -1, -2],
///     },
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Residual {
    /// How Rice parameters are stored
    pub coding_method: CodingMethod,
    /// The residual has 2ⁿ partitions
    pub partition_order: u32,
    /// Each partition's coding, in stream order
    pub rice_parameters: Vec<RiceParameter>,
    /// Prediction errors, one per non-warm-up sample
    pub errors: Vec<i32>,
}

impl Residual {
    /// Reads the residual of a predictor with the given order
    /// over a block of `block_size` samples
    ///
    /// # Errors
    ///
    /// Returns an error if the residual is invalid
    /// or the stream runs out of data.
    pub fn read<R: std::io::Read>(
        r: &mut BitReader<R>,
        order: usize,
        block_size: usize,
    ) -> Result<Self, Error> {
        let mut errors = vec![
            0;
            block_size
                .checked_sub(order)
                .ok_or_else(|| r.invalid(InvalidStream::ExcessivePredictorOrder))?
        ];
        let mut rice_parameters = Vec::new();

        let (coding_method, partition_order) =
            read_partitions(r, order, &mut errors, |p| rice_parameters.push(p))?;

        Ok(Self {
            coding_method,
            partition_order,
            rice_parameters,
            errors,
        })
    }
}

/// Reads the residual of a predictor with the given order into `errors`
///
/// The block size is `order + errors.len()`.
/// Returns the residual's partition order.
///
/// # Errors
///
/// Returns an error if the residual is invalid
/// or the stream runs out of data.
pub fn read_residual<R: std::io::Read>(
    r: &mut BitReader<R>,
    order: usize,
    errors: &mut [i32],
) -> Result<u32, Error> {
    read_partitions(r, order, errors, |_| {}).map(|(_, partition_order)| partition_order)
}

fn read_partitions<R: std::io::Read>(
    r: &mut BitReader<R>,
    order: usize,
    errors: &mut [i32],
    mut on_partition: impl FnMut(RiceParameter),
) -> Result<(CodingMethod, u32), Error> {
    let coding_method = CodingMethod::read(r)?;
    let partition_order = r.read_bits_u32(4)?;

    let block_size = order + errors.len();
    let partition_len = block_size >> partition_order;

    if partition_len == 0 || partition_len << partition_order != block_size || partition_len < order
    {
        return Err(r.invalid(InvalidStream::InvalidPartitionOrder));
    }

    log::trace!(
        "residual {coding_method:?}, {} partitions of {partition_len} samples",
        1 << partition_order
    );

    let (first, rest) = errors.split_at_mut(partition_len - order);

    for partition in std::iter::once(first).chain(rest.chunks_exact_mut(partition_len)) {
        match r.read_bits_u32(coding_method.parameter_bits())? {
            escape if escape == coding_method.escape_code() => {
                let width = r.read_bits_u32(5)?;
                on_partition(RiceParameter::Escaped(width));
                match width {
                    0 => partition.fill(0),
                    width => {
                        for e in partition.iter_mut() {
                            *e = r.read_bits_i32(width)?;
                        }
                    }
                }
            }
            parameter => {
                on_partition(RiceParameter::Rice(parameter));
                for e in partition.iter_mut() {
                    *e = read_rice(r, parameter)?;
                }
            }
        }
    }

    Ok((coding_method, partition_order))
}

/// Reads a single Rice-coded residual with parameter `k`
///
/// The value is stored as a unary quotient,
/// followed by a `k`-bit remainder,
/// which together form the folded value.
///
/// # Errors
///
/// Returns an error if the folded value doesn't fit in 32 bits
/// or the stream runs out of data.
#[inline]
pub fn read_rice<R: std::io::Read>(r: &mut BitReader<R>, k: u32) -> Result<i32, Error> {
    let quotient = r.read_unary()?;
    let remainder = r.read_bits_u32(k)?;

    u32::try_from((u64::from(quotient) << k) | u64::from(remainder))
        .map(unfold_rice)
        .map_err(|_| r.invalid(InvalidStream::ResidualOverflow))
}

/// Maps a folded value back to a signed residual
///
/// Even values are non-negative, odd values negative.
///
/// ```
/// use flac_subframe::residual::unfold_rice;
///
/// assert_eq!(
///     [0, 1, 2, 3, 4, u32::MAX].map(unfold_rice),
///     [0, -1, 1, -2, 2, i32::MIN],
/// );
/// ```
#[inline]
pub fn unfold_rice(folded: u32) -> i32 {
    ((folded >> 1) as i32) ^ -((folded & 1) as i32)
}

/// Maps a signed residual to its folded value
///
/// This is the inverse of [`unfold_rice`].
#[inline]
pub fn fold_rice(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}
