//! Wrap-aware sample copies between streams and linear buffers.
//!
//! Offsets and counts are in samples of the source stream's width. Copies
//! read at the source read position and write at the sink write position;
//! neither position is committed, callers follow up with `consume`/`produce`.

use super::AudioStream;

/// Copy `samples` samples from `source` (starting `ioffset` samples past its
/// read position) to `sink` (starting `ooffset` samples past its write
/// position). Returns the number of samples copied.
pub fn copy<A, B>(
    source: &AudioStream<A>,
    ioffset: usize,
    sink: &mut AudioStream<B>,
    ooffset: usize,
    samples: usize,
) -> usize
where
    A: AsRef<[u8]>,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let sample_bytes = source.sample_bytes();
    let mut bytes = samples * sample_bytes;
    let mut src = source.wrap(source.read_pos() + ioffset * sample_bytes);
    let mut dst = sink.wrap(sink.write_pos() + ooffset * sample_bytes);

    while bytes > 0 {
        let chunk = bytes
            .min(source.bytes_without_wrap(src))
            .min(sink.bytes_without_wrap(dst));

        sink.data_mut()[dst..dst + chunk].copy_from_slice(&source.data()[src..src + chunk]);

        bytes -= chunk;
        src = source.wrap(src + chunk);
        dst = sink.wrap(dst + chunk);
    }

    samples
}

/// Copy `samples` samples of `sink`'s width from a linear buffer into `sink`.
///
/// Reads `linear` starting at sample `ioffset`; writes `ooffset` samples
/// past the sink write position.
pub fn copy_from_linear<B>(
    linear: &[u8],
    ioffset: usize,
    sink: &mut AudioStream<B>,
    ooffset: usize,
    samples: usize,
) -> usize
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let sample_bytes = sink.sample_bytes();
    let mut bytes = samples * sample_bytes;
    let mut src = ioffset * sample_bytes;
    let mut dst = sink.wrap(sink.write_pos() + ooffset * sample_bytes);

    while bytes > 0 {
        let chunk = bytes.min(sink.bytes_without_wrap(dst));

        sink.data_mut()[dst..dst + chunk].copy_from_slice(&linear[src..src + chunk]);

        bytes -= chunk;
        src += chunk;
        dst = sink.wrap(dst + chunk);
    }

    samples
}

/// Copy `samples` samples of `source`'s width from `source` into a linear buffer.
///
/// Reads `ioffset` samples past the source read position; writes `linear`
/// starting at sample `ooffset`.
pub fn copy_to_linear<A>(
    source: &AudioStream<A>,
    ioffset: usize,
    linear: &mut [u8],
    ooffset: usize,
    samples: usize,
) -> usize
where
    A: AsRef<[u8]>,
{
    let sample_bytes = source.sample_bytes();
    let mut bytes = samples * sample_bytes;
    let mut src = source.wrap(source.read_pos() + ioffset * sample_bytes);
    let mut dst = ooffset * sample_bytes;

    while bytes > 0 {
        let chunk = bytes.min(source.bytes_without_wrap(src));

        linear[dst..dst + chunk].copy_from_slice(&source.data()[src..src + chunk]);

        bytes -= chunk;
        src = source.wrap(src + chunk);
        dst += chunk;
    }

    samples
}
