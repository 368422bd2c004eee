// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding a FLAC frame's subframes to PCM samples

use crate::Error;
use crate::bitreader::BitReader;
use crate::pool::SamplePool;
use crate::subframe::SubFrame;

/// FLAC subframe decoding options
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    pub(crate) max_block_size: u32,
    pub(crate) always_wide: bool,
    pub(crate) pool: Option<SamplePool>,
}

impl DecodeOptions {
    /// The largest block size a FLAC frame can signal
    pub const MAX_BLOCK_SIZE: u32 = 65535;

    /// Assigns the largest block size to accept
    ///
    /// Subframes with larger blocks fail to decode
    /// rather than allocate.
    pub fn max_block_size(self, max_block_size: u32) -> Self {
        Self {
            max_block_size,
            ..self
        }
    }

    /// Restores every LPC subframe with a 64-bit accumulator
    ///
    /// Normally, subframes whose coefficients are small enough
    /// use a 32-bit accumulator instead.
    /// Output is identical either way.
    pub fn always_wide(self) -> Self {
        Self {
            always_wide: true,
            ..self
        }
    }

    /// Takes subframe sample buffers from the given pool
    pub fn sample_pool(self, pool: SamplePool) -> Self {
        Self {
            pool: Some(pool),
            ..self
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_block_size: Self::MAX_BLOCK_SIZE,
            always_wide: false,
            pool: None,
        }
    }
}

/// A FLAC subframe decoder
///
/// Owns the bit cursor for a decoding session,
/// so consecutive subframes (and frames) are read
/// from the same position in the stream.
/// Frame headers and footers are handled by the caller
/// through [`Decoder::reader`].
///
/// # Example
/// ```
/// use flac_subframe::decode::Decoder;
///
/// let data: &[u8] = &[
///     0b0_000000_0, 0b00000111,           // CONSTANT, 7
///     0b0_000001_0, 0x01, 0x02, 0xFF,     // VERBATIM, 1, 2, -1
/// ];
///
/// let mut decoder = Decoder::new(data);
/// let channels = decoder.read_subframes(3, &[8, 8]).unwrap();
/// assert_eq!(channels[0].samples(), &[7, 7, 7]);
/// assert_eq!(channels[1].samples(), &[1, 2, -1]);
/// ```
pub struct Decoder<R> {
    reader: BitReader<R>,
    options: DecodeOptions,
}

impl<R: std::io::Read> Decoder<R> {
    /// Builds a new decoder with default options
    /// positioned at the start of a subframe
    pub fn new(source: R) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    /// Builds a new decoder with the given options
    pub fn with_options(source: R, options: DecodeOptions) -> Self {
        Self::from_reader(BitReader::new(source), options)
    }

    /// Builds a new decoder around an existing bit reader
    ///
    /// This allows a decoder to start mid-byte,
    /// or to be bounded with [`BitReader::with_limit`].
    pub fn from_reader(reader: BitReader<R>, options: DecodeOptions) -> Self {
        Self { reader, options }
    }

    /// Returns our decoding options
    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a single subframe
    ///
    /// # Errors
    ///
    /// Returns an error if the subframe is invalid
    /// or the stream runs out of data.
    /// The cursor is then somewhere within the subframe,
    /// so the rest of the frame cannot be decoded.
    pub fn read_subframe(
        &mut self,
        block_size: u32,
        bits_per_sample: u32,
    ) -> Result<SubFrame, Error> {
        SubFrame::decode(&mut self.reader, block_size, bits_per_sample, &self.options)
    }

    /// Decodes one subframe per channel, in order
    ///
    /// `channel_bits` gives each channel's effective bits-per-sample.
    ///
    /// # Errors
    ///
    /// Returns an error if any subframe is invalid
    /// or the stream runs out of data.
    pub fn read_subframes(
        &mut self,
        block_size: u32,
        channel_bits: &[u32],
    ) -> Result<Vec<SubFrame>, Error> {
        channel_bits
            .iter()
            .map(|bits_per_sample| self.read_subframe(block_size, *bits_per_sample))
            .collect()
    }

    /// Skips any padding bits following a frame's final subframe
    #[inline]
    pub fn byte_align(&mut self) {
        self.reader.byte_align()
    }

    /// Mutable access to our bit cursor
    #[inline]
    pub fn reader(&mut self) -> &mut BitReader<R> {
        &mut self.reader
    }

    /// Returns our bit cursor
    pub fn into_reader(self) -> BitReader<R> {
        self.reader
    }
}
