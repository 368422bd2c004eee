// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For restoring predicted samples from their residuals
//!
//! Every function here works in place on a buffer whose first
//! `order` entries are the subframe's warm-up samples
//! and whose remaining entries are the residual.
//! On success, the residual has been replaced by restored samples.
//!
//! Restored samples must fit in the subframe's bits-per-sample.
//! Checking this as we go keeps every sample in the
//! prediction history in range, which is what the
//! [narrow](`Accumulator::Narrow`) accumulator's overflow bound relies on.

use crate::InvalidStream;
use crate::stream::MAX_FIXED_ORDER;

/// Which arithmetic width LPC restoration runs at
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accumulator {
    /// Predictions summed in 32 bits
    Narrow,
    /// Predictions summed in 64 bits
    Wide,
}

impl Accumulator {
    /// Picks the narrowest accumulator which cannot overflow
    ///
    /// ```
    /// use flac_subframe::restore::Accumulator;
    ///
    /// // 16 + 12 + ceil(log2(8)) = 31
    /// assert_eq!(Accumulator::select(16, 12, 8), Accumulator::Narrow);
    /// // 16 + 14 + ceil(log2(5)) = 33
    /// assert_eq!(Accumulator::select(16, 14, 5), Accumulator::Wide);
    /// ```
    pub fn select(bits_per_sample: u32, precision: u32, order: usize) -> Self {
        match overflow_bound(bits_per_sample, precision, order) {
            0..=32 => Self::Narrow,
            _ => Self::Wide,
        }
    }
}

/// Bits needed to hold a worst-case LPC prediction sum
///
/// This is `bits_per_sample + precision + ceil(log2(order))`.
pub fn overflow_bound(bits_per_sample: u32, precision: u32, order: usize) -> u32 {
    bits_per_sample + precision + order.next_power_of_two().trailing_zeros()
}

const FIXED_COEFFICIENTS: [&[i64]; MAX_FIXED_ORDER as usize + 1] = [
    &[],
    &[1],
    &[2, -1],
    &[3, -3, 1],
    &[4, -6, 4, -1],
];

/// Restores samples of a FIXED subframe of the given order
///
/// # Example
/// ```
/// use flac_subframe::restore::restore_fixed;
///
/// let mut samples = [10, 12, 1, -2];  // warm-up, then residual
/// restore_fixed(2, 16, &mut samples).unwrap();
/// assert_eq!(samples, [10, 12, 15, 16]);
/// ```
///
/// # Errors
///
/// Returns an error if a restored sample doesn't fit in `bits_per_sample`.
///
/// # Panics
///
/// Panics if `order` is greater than 4.
pub fn restore_fixed(
    order: usize,
    bits_per_sample: u32,
    samples: &mut [i32],
) -> Result<(), InvalidStream> {
    let coefficients = FIXED_COEFFICIENTS[order];

    for n in order..samples.len() {
        let (history, rest) = samples.split_at_mut(n);
        let prediction: i64 = coefficients
            .iter()
            .zip(history.iter().rev())
            .map(|(c, s)| c * i64::from(*s))
            .sum();
        rest[0] = fit(prediction + i64::from(rest[0]), bits_per_sample)?;
    }

    Ok(())
}

/// Restores samples of an LPC subframe using the given accumulator
///
/// The predictor's order is `coefficients.len()`.
/// Callers should obtain `accumulator` from [`Accumulator::select`]
/// (or always pass [`Accumulator::Wide`]).
///
/// # Errors
///
/// Returns an error if a restored sample doesn't fit in `bits_per_sample`.
pub fn restore_lpc(
    coefficients: &[i32],
    shift: u32,
    bits_per_sample: u32,
    accumulator: Accumulator,
    samples: &mut [i32],
) -> Result<(), InvalidStream> {
    match accumulator {
        Accumulator::Narrow => restore_lpc_narrow(coefficients, shift, bits_per_sample, samples),
        Accumulator::Wide => restore_lpc_wide(coefficients, shift, bits_per_sample, samples),
    }
}

/// Restores samples of an LPC subframe with a 32-bit accumulator
///
/// Only exact when [`overflow_bound`] is no more than 32
/// for the given bits-per-sample, coefficient precision and order.
///
/// # Errors
///
/// Returns an error if a restored sample doesn't fit in `bits_per_sample`.
pub fn restore_lpc_narrow(
    coefficients: &[i32],
    shift: u32,
    bits_per_sample: u32,
    samples: &mut [i32],
) -> Result<(), InvalidStream> {
    let order = coefficients.len();

    for n in order..samples.len() {
        let (history, rest) = samples.split_at_mut(n);
        let sum = coefficients
            .iter()
            .zip(history[n - order..].iter().rev())
            .fold(0i32, |acc, (c, s)| acc.wrapping_add(c.wrapping_mul(*s)));
        rest[0] = fit(
            i64::from(sum >> shift.min(31)) + i64::from(rest[0]),
            bits_per_sample,
        )?;
    }

    Ok(())
}

/// Restores samples of an LPC subframe with a 64-bit accumulator
///
/// # Errors
///
/// Returns an error if a restored sample doesn't fit in `bits_per_sample`.
pub fn restore_lpc_wide(
    coefficients: &[i32],
    shift: u32,
    bits_per_sample: u32,
    samples: &mut [i32],
) -> Result<(), InvalidStream> {
    let order = coefficients.len();

    for n in order..samples.len() {
        let (history, rest) = samples.split_at_mut(n);
        let sum: i64 = coefficients
            .iter()
            .zip(history[n - order..].iter().rev())
            .map(|(c, s)| i64::from(*c) * i64::from(*s))
            .sum();
        rest[0] = fit((sum >> shift.min(63)) + i64::from(rest[0]), bits_per_sample)?;
    }

    Ok(())
}

/// Ensures a restored sample fits in the given bits-per-sample (1 to 32)
#[inline]
fn fit(sample: i64, bits_per_sample: u32) -> Result<i32, InvalidStream> {
    let limit = 1i64 << (bits_per_sample - 1);
    if (-limit..limit).contains(&sample) {
        Ok(sample as i32)
    } else {
        Err(InvalidStream::SampleOutOfRange)
    }
}
