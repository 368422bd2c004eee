// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// helpers for building subframe streams bit-by-bit
#![allow(dead_code)]

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use flac_subframe::residual::fold_rice;

pub struct Stream(BitWriter<Vec<u8>, BigEndian>);

impl Stream {
    pub fn new() -> Self {
        Self(BitWriter::endian(Vec::new(), BigEndian))
    }

    pub fn bits(mut self, bits: u32, value: u32) -> Self {
        if bits > 0 {
            self.0.write_var(bits, value).unwrap();
        }
        self
    }

    pub fn bits64(mut self, bits: u32, value: u64) -> Self {
        if bits > 0 {
            self.0.write_var(bits, value).unwrap();
        }
        self
    }

    pub fn signed(mut self, bits: u32, value: i32) -> Self {
        self.0.write_signed_var(bits, value).unwrap();
        self
    }

    pub fn signed64(mut self, bits: u32, value: i64) -> Self {
        self.0.write_signed_var(bits, value).unwrap();
        self
    }

    pub fn samples(self, bits: u32, samples: &[i32]) -> Self {
        samples.iter().fold(self, |s, v| s.signed(bits, *v))
    }

    pub fn unary(mut self, zeros: u32) -> Self {
        self.0.write_unary::<1>(zeros).unwrap();
        self
    }

    /// padding bit, 6-bit type and wasted bits
    pub fn header(self, tag: u8, wasted_bits: u32) -> Self {
        let s = self.bits(1, 0).bits(6, tag.into());
        match wasted_bits {
            0 => s.bits(1, 0),
            wasted => s.bits(1, 1).unary(wasted - 1),
        }
    }

    pub fn rice(self, k: u32, value: i32) -> Self {
        let folded = fold_rice(value);
        self.unary(folded >> k).bits(k, folded & ((1u64 << k) - 1) as u32)
    }

    /// a single-partition residual with Rice parameter `k`
    pub fn residual(self, k: u32, errors: &[i32]) -> Self {
        let s = match k {
            0..=14 => self.bits(2, 0).bits(4, 0).bits(4, k),
            _ => self.bits(2, 1).bits(4, 0).bits(5, k),
        };
        errors.iter().fold(s, |s, e| s.rice(k, *e))
    }

    /// a single escaped partition of `width`-bit residuals
    pub fn escaped_residual(self, width: u32, errors: &[i32]) -> Self {
        let s = self.bits(2, 0).bits(4, 0).bits(4, 0b1111).bits(5, width);
        match width {
            0 => s,
            width => s.samples(width, errors),
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.0.byte_align().unwrap();
        self.0.into_writer()
    }
}

/// computes the residual of `signal` for the given LPC predictor
pub fn lpc_residual(signal: &[i32], coefficients: &[i32], shift: u32) -> Vec<i32> {
    let order = coefficients.len();
    (order..signal.len())
        .map(|n| {
            let prediction: i64 = coefficients
                .iter()
                .zip(signal[n - order..n].iter().rev())
                .map(|(c, s)| i64::from(*c) * i64::from(*s))
                .sum();
            i32::try_from(i64::from(signal[n]) - (prediction >> shift)).unwrap()
        })
        .collect()
}

/// computes the residual of `signal` for the fixed predictor of the given order
pub fn fixed_residual(signal: &[i32], order: usize) -> Vec<i32> {
    const COEFFICIENTS: [&[i32]; 5] = [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];
    lpc_residual(signal, COEFFICIENTS[order], 0)
}

/// a random signal of `len` samples fitting in `bits`
pub fn random_signal(len: usize, bits: u32) -> Vec<i32> {
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    (0..len)
        .map(|_| fastrand::i64(min..=max) as i32)
        .collect()
}

/// a signal of `len` samples fitting in `bits` that wanders slowly,
/// so predictors have something to predict
pub fn smooth_signal(len: usize, bits: u32) -> Vec<i32> {
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    let step = (max / 64).max(1);
    let mut sample = 0i64;
    (0..len)
        .map(|_| {
            sample = (sample + fastrand::i64(-step..=step)).clamp(min, max);
            sample as i32
        })
        .collect()
}

/// smallest Rice parameter covering every residual without long unary runs
pub fn rice_parameter(errors: &[i32]) -> u32 {
    let largest = errors.iter().map(|e| fold_rice(*e)).max().unwrap_or(0);
    (32 - largest.leading_zeros()).saturating_sub(4).min(30)
}
