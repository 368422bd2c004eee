// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod common;

use common::Stream;

// a stereo frame's subframes: CONSTANT, then a FIXED side channel at 17 bps
fn stereo_subframes(block_size: usize) -> (Vec<u8>, Vec<i32>) {
    let side = common::smooth_signal(block_size, 17);
    let residual = common::fixed_residual(&side, 1);
    let data = Stream::new()
        .header(0, 0)
        .signed(16, -7)
        .header(0b001001, 0)
        .signed(17, side[0])
        .residual(common::rice_parameter(&residual), &residual)
        .finish();
    (data, side)
}

#[test]
fn test_sequential_subframes() {
    use flac_subframe::decode::Decoder;
    use flac_subframe::stream::SubframeType;

    let (mut data, side) = stereo_subframes(1152);
    let subframes_len = data.len() as u64;
    data.extend([0xAB, 0xCD]);

    let mut decoder = Decoder::new(data.as_slice());
    let channels = decoder.read_subframes(1152, &[16, 17]).unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].subframe_type(), SubframeType::Constant);
    assert!(channels[0].samples().iter().all(|s| *s == -7));
    assert_eq!(channels[1].subframe_type(), SubframeType::Fixed(1));
    assert_eq!(channels[1].samples(), side.as_slice());

    // the frame footer follows the padding
    decoder.byte_align();
    assert_eq!(decoder.reader().position(), subframes_len * 8);
    assert_eq!(decoder.reader().read_bits_u32(16).unwrap(), 0xABCD);
}

#[test]
fn test_consecutive_frames() {
    use flac_subframe::decode::Decoder;

    let frames = (0..10).map(|_| stereo_subframes(256)).collect::<Vec<_>>();
    let data = frames
        .iter()
        .flat_map(|(data, _)| data.iter().copied())
        .collect::<Vec<_>>();

    let mut decoder = Decoder::new(data.as_slice());
    for (_, side) in frames.iter() {
        let channels = decoder.read_subframes(256, &[16, 17]).unwrap();
        assert_eq!(channels[1].samples(), side.as_slice());
        decoder.byte_align();
    }
    assert_eq!(decoder.reader().position(), data.len() as u64 * 8);
}

#[test]
fn test_mid_byte_start() {
    use flac_subframe::bitreader::BitReader;
    use flac_subframe::decode::{DecodeOptions, Decoder};

    // 3 bits of something else, then a VERBATIM subframe
    let data = Stream::new()
        .bits(3, 0b101)
        .header(1, 0)
        .samples(12, &[100, -100, 2047, -2048])
        .finish();

    let mut reader = BitReader::new(data.as_slice());
    assert_eq!(reader.read_bits_u32(3).unwrap(), 0b101);

    let mut decoder = Decoder::from_reader(reader, DecodeOptions::default());
    assert_eq!(
        decoder.read_subframe(4, 12).unwrap().samples(),
        &[100, -100, 2047, -2048]
    );
    assert_eq!(decoder.into_reader().position(), 3 + 8 + 48);
}

#[test]
fn test_error_keeps_earlier_subframes() {
    use flac_subframe::decode::Decoder;
    use flac_subframe::{Error, InvalidStream};

    let data = Stream::new()
        .header(1, 0)
        .samples(8, &[1, 2, 3, 4])
        .header(0b010000, 0)
        .bits(32, 0)
        .finish();

    let mut decoder = Decoder::new(data.as_slice());
    let first = decoder.read_subframe(4, 8).unwrap();

    assert!(matches!(
        decoder.read_subframe(4, 8),
        Err(Error::InvalidStream {
            position: 47,
            reason: InvalidStream::ReservedSubframeType(0b010000)
        })
    ));
    assert_eq!(first.samples(), &[1, 2, 3, 4]);

    // reading the whole frame at once yields nothing
    assert!(
        Decoder::new(data.as_slice())
            .read_subframes(4, &[8, 8])
            .is_err()
    );
}

#[test]
fn test_pool() {
    use flac_subframe::decode::{DecodeOptions, Decoder};
    use flac_subframe::pool::SamplePool;

    let pool = SamplePool::new();
    let (data, side) = stereo_subframes(4096);
    let options = DecodeOptions::default().sample_pool(pool.clone());

    let channels = Decoder::with_options(data.as_slice(), options.clone())
        .read_subframes(4096, &[16, 17])
        .unwrap();
    assert_eq!(pool.idle(), 0);
    drop(channels);
    assert_eq!(pool.idle(), 2);

    // recycled buffers are fully overwritten
    let channels = Decoder::with_options(data.as_slice(), options.clone())
        .read_subframes(4096, &[16, 17])
        .unwrap();
    assert_eq!(pool.idle(), 0);
    assert!(channels[0].samples().iter().all(|s| *s == -7));
    assert_eq!(channels[1].samples(), side.as_slice());
    drop(channels);

    // a smaller block reuses the larger buffers
    let (small, small_side) = stereo_subframes(16);
    let channels = Decoder::with_options(small.as_slice(), options)
        .read_subframes(16, &[16, 17])
        .unwrap();
    assert_eq!(channels[0].samples(), &[-7; 16]);
    assert_eq!(channels[1].samples(), small_side.as_slice());
    drop(channels);
    assert_eq!(pool.idle(), 2);
}

#[test]
fn test_pool_on_error() {
    use flac_subframe::Error;
    use flac_subframe::decode::{DecodeOptions, Decoder};
    use flac_subframe::pool::SamplePool;

    let pool = SamplePool::new();
    let (data, _) = stereo_subframes(4096);

    // truncated inside the second subframe's residual
    let result = Decoder::with_options(
        &data[0..data.len() / 2],
        DecodeOptions::default().sample_pool(pool.clone()),
    )
    .read_subframes(4096, &[16, 17]);

    assert!(matches!(result, Err(Error::InsufficientData { .. })));
    assert_eq!(pool.idle(), 2);
}

#[test]
fn test_pool_capacity() {
    use flac_subframe::decode::{DecodeOptions, Decoder};
    use flac_subframe::pool::SamplePool;

    let pool = SamplePool::with_capacity(1);
    let (data, _) = stereo_subframes(64);

    let channels = Decoder::with_options(
        data.as_slice(),
        DecodeOptions::default().sample_pool(pool.clone()),
    )
    .read_subframes(64, &[16, 17])
    .unwrap();
    drop(channels);

    assert_eq!(pool.idle(), 1);
}

#[test]
fn test_threads() {
    use flac_subframe::decode::{DecodeOptions, Decoder};
    use flac_subframe::pool::SamplePool;
    use flac_subframe::subframe::SubFrame;

    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SubFrame>();
    assert_send_sync::<SamplePool>();
    assert_send_sync::<DecodeOptions>();
    assert_send_sync::<flac_subframe::Error>();

    let pool = SamplePool::with_capacity(16);
    let frames = (0..8).map(|_| stereo_subframes(1024)).collect::<Vec<_>>();

    let decoded: Vec<Vec<SubFrame>> = std::thread::scope(|s| {
        frames
            .iter()
            .map(|(data, _)| {
                let options = DecodeOptions::default().sample_pool(pool.clone());
                s.spawn(move || {
                    Decoder::with_options(data.as_slice(), options)
                        .read_subframes(1024, &[16, 17])
                        .unwrap()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (channels, (_, side)) in decoded.iter().zip(frames.iter()) {
        assert_eq!(channels[1].samples(), side.as_slice());
    }

    drop(decoded);
    assert_eq!(pool.idle(), 16);
}
