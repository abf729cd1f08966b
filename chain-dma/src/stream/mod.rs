//! Format-aware circular audio buffer.
//!
//! [`AudioStream`] tracks how many bytes are available to read and free to
//! write in a fixed-size ring, and converts those counts to samples and
//! frames using the applied [`StreamParams`]. It never allocates: the
//! backing memory is handed in by the owner and only borrowed as `[u8]`.
//!
//! ## Ring layout
//!
//! ```text
//!  0                r_pos               w_pos                size
//!  ├────── free ─────┼────── avail ───────┼────── free ─────────┤
//! ```
//!
//! Positions are byte offsets in `[0, size)`. When `r_pos == w_pos` the
//! buffer is either empty or full; the cached `avail`/`free` counters
//! disambiguate, and always satisfy `avail + free == size`.
//!
//! ## Producer / consumer protocol
//!
//! 1. The producer writes at [`write_pos`](AudioStream::write_pos) (see
//!    [`write_regions`](AudioStream::write_regions)) and commits with
//!    [`produce`](AudioStream::produce).
//! 2. The consumer reads at [`read_pos`](AudioStream::read_pos) and commits
//!    with [`consume`](AudioStream::consume).
//!
//! `produce` never fails: writing more than the free space discards the
//! oldest unread data. Downstream code detects overruns through
//! [`can_copy_bytes`] / [`AudioStream::free_bytes`] instead.

mod cache;
mod copy;
mod format;

pub use cache::{CacheOps, NoCache};
pub use copy::{copy, copy_from_linear, copy_to_linear};
pub use format::{BufferFormat, FrameFormat, Ipc4SampleType, Sample, SampleWidth, StreamParams};

use core::ops::Range;

use crate::constants::{DEFAULT_BYTE_ALIGN, DEFAULT_FRAME_ALIGN};
use crate::error::StreamError;
use crate::math;

/// Result of [`can_copy_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyCheck {
    /// Enough data in the source and enough space in the sink.
    Ok,
    /// Not enough free space in the sink.
    SinkFull,
    /// Not enough data in the source. Wins over `SinkFull`.
    SourceEmpty,
}

/// Circular buffer over caller-owned storage `S`.
pub struct AudioStream<S> {
    storage: S,
    /// Ring size in bytes (a period multiple), fixed at init.
    size: usize,
    avail: usize,
    free: usize,
    r_pos: usize,
    w_pos: usize,
    params: StreamParams,
    /// Cached at `apply_format` / `set_frame_format`.
    width: SampleWidth,
    underrun_permitted: bool,
    overrun_permitted: bool,
    byte_align_req: u32,
    frame_align_req: u32,
    /// Frames per aligned processing chunk.
    align_frame_cnt: u32,
    /// `bytes >> align_shift_idx` is a safe count of aligned chunks.
    align_shift_idx: u32,
}

impl<S: AsRef<[u8]>> AudioStream<S> {
    /// Bind a stream to `storage`, using its first `size` bytes as the ring.
    ///
    /// # Panics
    ///
    /// If `size` is zero or larger than the storage.
    pub fn init(storage: S, size: usize) -> Self {
        assert!(size > 0, "audio stream size must be non-zero");
        assert!(
            size <= storage.as_ref().len(),
            "audio stream size exceeds backing storage"
        );

        let params = StreamParams::default();
        let mut stream = AudioStream {
            storage,
            size,
            avail: 0,
            free: size,
            r_pos: 0,
            w_pos: 0,
            params,
            width: params.frame_format.width(),
            underrun_permitted: false,
            overrun_permitted: false,
            byte_align_req: DEFAULT_BYTE_ALIGN,
            frame_align_req: DEFAULT_FRAME_ALIGN,
            align_frame_cnt: 1,
            align_shift_idx: 0,
        };
        stream.set_align(DEFAULT_BYTE_ALIGN, DEFAULT_FRAME_ALIGN);
        stream.reset();
        stream
    }

    /// Bind a stream to the whole of `storage`.
    pub fn new(storage: S) -> Self {
        let size = storage.as_ref().len();
        Self::init(storage, size)
    }

    /// The ring contents, `size` bytes long.
    pub fn data(&self) -> &[u8] {
        &self.storage.as_ref()[..self.size]
    }

    /// Readable region of `bytes` bytes at the read position, split at the wrap point.
    pub fn read_regions(&self, bytes: usize) -> (&[u8], &[u8]) {
        let (head, tail) = self.split(self.r_pos, bytes);
        let data = self.data();
        (&data[head], &data[tail])
    }

    /// Invalidate `bytes` bytes at the read position before reading DMA-written data.
    pub fn invalidate<C: CacheOps>(&self, cache: &C, bytes: usize) {
        let (head, tail) = self.read_regions(bytes);
        cache.invalidate_region(head);
        if !tail.is_empty() {
            cache.invalidate_region(tail);
        }
    }

    /// Write back `bytes` bytes at the write position before a DMA engine reads them.
    pub fn writeback<C: CacheOps>(&self, cache: &C, bytes: usize) {
        let (head, tail) = self.split(self.w_pos, bytes);
        let data = self.data();
        cache.writeback_region(&data[head]);
        if !tail.is_empty() {
            cache.writeback_region(&data[tail]);
        }
    }

    /// Read sample `idx` (counted from the read position) as `T`.
    pub fn read_sample<T: Sample>(&self, idx: usize) -> T {
        let width = T::WIDTH.bytes() as usize;
        let offset = self.frag_offset(self.r_pos, idx, width);
        T::read_le(&self.data()[offset..offset + width])
    }

    /// Consume the stream and return the backing storage.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> AudioStream<S> {
    /// Mutable ring contents, `size` bytes long.
    pub fn data_mut(&mut self) -> &mut [u8] {
        let size = self.size;
        &mut self.storage.as_mut()[..size]
    }

    /// Writable region of `bytes` bytes at the write position, split at the wrap point.
    ///
    /// Writing here does not commit anything; call [`produce`](Self::produce).
    pub fn write_regions(&mut self, bytes: usize) -> (&mut [u8], &mut [u8]) {
        let (head, tail) = self.split(self.w_pos, bytes);
        let w_pos = self.w_pos;
        let (before, after) = self.data_mut().split_at_mut(w_pos);
        (&mut after[..head.len()], &mut before[..tail.len()])
    }

    /// Write sample `idx` (counted from the write position) as `T`.
    pub fn write_sample<T: Sample>(&mut self, idx: usize, value: T) {
        let width = T::WIDTH.bytes() as usize;
        let offset = self.frag_offset(self.w_pos, idx, width);
        value.write_le(&mut self.data_mut()[offset..offset + width]);
    }

    /// Zero `bytes` bytes at the write position without committing them.
    ///
    /// Fails with [`StreamError::Overrun`] and leaves the buffer untouched
    /// if there is not enough free space.
    pub fn set_zero(&mut self, bytes: usize) -> Result<(), StreamError> {
        if self.free_bytes() < bytes {
            return Err(StreamError::Overrun);
        }

        let (head, tail) = self.write_regions(bytes);
        head.fill(0);
        tail.fill(0);
        Ok(())
    }
}

impl<S> AudioStream<S> {
    /// Rewind both positions to the start and mark the buffer empty.
    ///
    /// Format and alignment settings are kept.
    pub fn reset(&mut self) {
        self.w_pos = 0;
        self.r_pos = 0;
        self.free = self.size;
        self.avail = 0;
    }

    /// Apply runtime stream parameters.
    ///
    /// Missing parameters or a zero channel count are rejected and leave the
    /// current format untouched.
    pub fn apply_format(&mut self, params: Option<&StreamParams>) -> Result<(), StreamError> {
        let params = params.ok_or(StreamError::InvalidArgument)?;
        if params.channels == 0 {
            return Err(StreamError::InvalidArgument);
        }

        self.params = *params;
        self.width = params.frame_format.width();
        self.recalc_align();
        Ok(())
    }

    /// Ring size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw count of unread bytes, ignoring the underrun policy.
    pub fn avail(&self) -> usize {
        self.avail
    }

    /// Raw count of free bytes, ignoring the overrun policy.
    pub fn free(&self) -> usize {
        self.free
    }

    pub fn read_pos(&self) -> usize {
        self.r_pos
    }

    pub fn write_pos(&self) -> usize {
        self.w_pos
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    pub fn frame_format(&self) -> FrameFormat {
        self.params.frame_format
    }

    pub fn valid_sample_format(&self) -> FrameFormat {
        self.params.valid_sample_format
    }

    pub fn rate(&self) -> u32 {
        self.params.rate
    }

    pub fn channels(&self) -> u16 {
        self.params.channels
    }

    /// Sample width resolved from the current frame format.
    pub fn sample_width(&self) -> SampleWidth {
        self.width
    }

    pub fn set_frame_format(&mut self, format: FrameFormat) {
        self.params.frame_format = format;
        self.width = format.width();
        self.recalc_align();
    }

    pub fn set_valid_sample_format(&mut self, format: FrameFormat) {
        self.params.valid_sample_format = format;
    }

    pub fn set_rate(&mut self, rate: u32) {
        self.params.rate = rate;
    }

    pub fn set_channels(&mut self, channels: u16) {
        self.params.channels = channels;
        self.recalc_align();
    }

    pub fn underrun_permitted(&self) -> bool {
        self.underrun_permitted
    }

    pub fn overrun_permitted(&self) -> bool {
        self.overrun_permitted
    }

    /// Report a full buffer instead of an empty one (see [`avail_bytes`](Self::avail_bytes)).
    pub fn set_underrun_permitted(&mut self, permitted: bool) {
        self.underrun_permitted = permitted;
    }

    /// Report an empty buffer instead of a full one (see [`free_bytes`](Self::free_bytes)).
    pub fn set_overrun_permitted(&mut self, permitted: bool) {
        self.overrun_permitted = permitted;
    }

    /// Bytes per sample container.
    pub fn sample_bytes(&self) -> usize {
        self.width.bytes() as usize
    }

    /// Bytes per frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.sample_bytes() * self.params.channels as usize
    }

    /// Bytes in a period of `frames` frames.
    pub fn period_bytes(&self, frames: usize) -> usize {
        frames * self.frame_bytes()
    }

    // ── Alignment ───────────────────────────────────────────────────────

    /// Set the processing alignment requirements and recompute the
    /// aligned-frame constants.
    pub fn set_align(&mut self, byte_align: u32, frame_align_req: u32) {
        self.byte_align_req = byte_align;
        self.frame_align_req = frame_align_req;
        self.recalc_align();
    }

    /// Frames per aligned processing chunk.
    pub fn align_frame_count(&self) -> u32 {
        self.align_frame_cnt
    }

    /// Shift converting a byte count into a count of aligned chunks.
    pub fn align_shift(&self) -> u32 {
        self.align_shift_idx
    }

    fn recalc_align(&mut self) {
        let frame_bytes = self.frame_bytes() as u32;
        if frame_bytes == 0 {
            return;
        }

        let frames = math::frame_align_count(self.byte_align_req, self.frame_align_req, frame_bytes);
        if frames == 0 {
            return;
        }
        let process_size = frames * frame_bytes;
        self.align_frame_cnt = frames;
        self.align_shift_idx = math::align_shift(process_size);
    }

    // ── Position arithmetic ─────────────────────────────────────────────

    /// Fold an offset that walked past the end (by less than one lap) back into the ring.
    ///
    /// # Panics
    ///
    /// If `pos` is a full lap or more past the end.
    #[inline]
    pub fn wrap(&self, pos: usize) -> usize {
        let pos = if pos >= self.size { pos - self.size } else { pos };
        assert!(pos < self.size, "offset more than one lap past the ring end");
        pos
    }

    /// Fold an offset that walked before the start (by at most one lap) back into the ring.
    ///
    /// # Panics
    ///
    /// If `pos` is more than one lap before the start.
    #[inline]
    pub fn rewind_wrap(&self, pos: isize) -> usize {
        let pos = if pos < 0 { pos + self.size as isize } else { pos };
        assert!(pos >= 0, "offset more than one lap before the ring start");
        pos as usize
    }

    /// Bytes from `pos` to the end of the ring.
    #[inline]
    pub fn bytes_without_wrap(&self, pos: usize) -> usize {
        assert!(pos <= self.size);
        self.size - pos
    }

    /// Bytes from `pos` back to the start of the ring.
    #[inline]
    pub fn rewind_bytes_without_wrap(&self, pos: usize) -> usize {
        assert!(pos <= self.size);
        pos
    }

    /// Whole frames from `pos` to the end of the ring.
    pub fn frames_without_wrap(&self, pos: usize) -> usize {
        self.bytes_without_wrap(pos) / self.frame_bytes()
    }

    /// Whole samples from `pos` to the end of the ring.
    pub fn samples_without_wrap(&self, pos: usize) -> usize {
        self.bytes_without_wrap(pos) / self.sample_bytes()
    }

    /// Where the write position was before the last `bytes` bytes were produced.
    pub fn rewind_write_pos_by_bytes(&self, bytes: usize) -> usize {
        assert!(bytes <= self.size);
        self.rewind_wrap(self.w_pos as isize - bytes as isize)
    }

    /// Offset of sample `idx` of `sample_size` bytes counted from `pos`, with rollover.
    #[inline]
    pub fn frag_offset(&self, pos: usize, idx: usize, sample_size: usize) -> usize {
        self.wrap(pos + idx * sample_size)
    }

    /// Split a `bytes` long region starting at `pos` into head and tail ranges.
    fn split(&self, pos: usize, bytes: usize) -> (Range<usize>, Range<usize>) {
        assert!(bytes <= self.size, "region larger than the ring");
        let head = bytes.min(self.bytes_without_wrap(pos));
        (pos..pos + head, 0..bytes - head)
    }

    // ── Capacity queries ────────────────────────────────────────────────

    /// Bytes available for reading.
    ///
    /// An underrun-permitted stream that is empty reports itself full, so
    /// a tolerant branch keeps processing at a steady pace instead of
    /// stalling downstream timing.
    pub fn avail_bytes(&self) -> usize {
        if self.underrun_permitted && self.avail == 0 {
            return self.size;
        }
        self.avail
    }

    pub fn avail_samples(&self) -> usize {
        self.avail_bytes() / self.sample_bytes()
    }

    pub fn avail_frames(&self) -> usize {
        self.avail_bytes() / self.frame_bytes()
    }

    /// Bytes free for writing.
    ///
    /// An overrun-permitted stream that is full reports itself empty.
    pub fn free_bytes(&self) -> usize {
        if self.overrun_permitted && self.free == 0 {
            return self.size;
        }
        self.free
    }

    pub fn free_samples(&self) -> usize {
        self.free_bytes() / self.sample_bytes()
    }

    pub fn free_frames(&self) -> usize {
        self.free_bytes() / self.frame_bytes()
    }

    /// Avail bytes rounded down to whole aligned chunks, in frames.
    fn avail_frames_aligned(&self) -> usize {
        (self.avail_bytes() >> self.align_shift_idx) * self.align_frame_cnt as usize
    }

    /// Free bytes rounded down to whole aligned chunks, in frames.
    fn free_frames_aligned(&self) -> usize {
        (self.free_bytes() >> self.align_shift_idx) * self.align_frame_cnt as usize
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// Commit `bytes` bytes written at the write position.
    ///
    /// If `bytes` exceeds the free space the oldest unread data is
    /// discarded: the read position jumps to the new write position and
    /// the buffer reports full.
    pub fn produce(&mut self, bytes: usize) {
        let overwrite = bytes > self.free_bytes();

        self.w_pos = (self.w_pos + bytes) % self.size;
        if overwrite {
            self.r_pos = self.w_pos;
        }

        self.avail = if self.r_pos == self.w_pos {
            self.size
        } else {
            self.distance(self.r_pos, self.w_pos)
        };
        self.free = self.size - self.avail;
    }

    /// Commit `bytes` bytes read at the read position.
    ///
    /// The caller must not consume more than is available.
    pub fn consume(&mut self, bytes: usize) {
        self.r_pos = self.wrap(self.r_pos + bytes);

        self.avail = if self.r_pos == self.w_pos {
            0
        } else {
            self.distance(self.r_pos, self.w_pos)
        };
        self.free = self.size - self.avail;
    }

    /// Forward distance from `from` to `to` around the ring, for `from != to`.
    #[inline]
    fn distance(&self, from: usize, to: usize) -> usize {
        if from < to {
            to - from
        } else {
            self.size - (from - to)
        }
    }
}

/// Check whether `bytes` bytes can move from `source` to `sink`.
pub fn can_copy_bytes<A, B>(source: &AudioStream<A>, sink: &AudioStream<B>, bytes: usize) -> CopyCheck {
    if source.avail_bytes() < bytes {
        return CopyCheck::SourceEmpty;
    }
    if sink.free_bytes() < bytes {
        return CopyCheck::SinkFull;
    }
    CopyCheck::Ok
}

/// Largest byte count that can move from `source` to `sink` right now.
pub fn copy_bytes<A, B>(source: &AudioStream<A>, sink: &AudioStream<B>) -> usize {
    source.avail_bytes().min(sink.free_bytes())
}

/// Largest frame count that can move from `source` to `sink` right now.
pub fn avail_frames<A, B>(source: &AudioStream<A>, sink: &AudioStream<B>) -> usize {
    source.avail_frames().min(sink.free_frames())
}

/// Like [`avail_frames`], rounded down to each side's processing alignment.
pub fn avail_frames_aligned<A, B>(source: &AudioStream<A>, sink: &AudioStream<B>) -> usize {
    source.avail_frames_aligned().min(sink.free_frames_aligned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: usize = 64;

    fn stream(storage: &mut [u8; SIZE]) -> AudioStream<&mut [u8; SIZE]> {
        AudioStream::new(storage)
    }

    fn assert_counters<S>(s: &AudioStream<S>) {
        assert_eq!(s.avail() + s.free(), s.size(), "avail + free != size");
    }

    #[test]
    fn init_is_empty() {
        let mut mem = [0u8; SIZE];
        let s = stream(&mut mem);
        assert_eq!(s.size(), SIZE);
        assert_eq!(s.avail(), 0);
        assert_eq!(s.free(), SIZE);
        assert_eq!(s.read_pos(), 0);
        assert_eq!(s.write_pos(), 0);
    }

    #[test]
    fn init_with_smaller_size() {
        let mut mem = [0u8; SIZE];
        let s = AudioStream::init(&mut mem[..], 48);
        assert_eq!(s.size(), 48);
        assert_eq!(s.data().len(), 48);
    }

    #[test]
    #[should_panic]
    fn init_rejects_oversized_ring() {
        let mut mem = [0u8; 16];
        let _ = AudioStream::init(&mut mem[..], 32);
    }

    #[test]
    fn produce_consume_keeps_counters_consistent() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);

        let steps: [(usize, usize); 8] = [(16, 8), (24, 20), (40, 0), (0, 30), (12, 12), (60, 2), (8, 40), (4, 0)];
        for (p, c) in steps {
            s.produce(p);
            assert_counters(&s);
            let c = c.min(s.avail());
            s.consume(c);
            assert_counters(&s);
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.set_channels(1);
        s.produce(20);
        s.consume(6);

        s.reset();
        let once = (s.read_pos(), s.write_pos(), s.avail(), s.free(), s.channels());
        s.reset();
        let twice = (s.read_pos(), s.write_pos(), s.avail(), s.free(), s.channels());

        assert_eq!(once, twice);
        assert_eq!(once, (0, 0, 0, SIZE, 1));
    }

    #[test]
    fn produce_then_consume_round_trip() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(10);
        s.consume(4);

        let avail = s.avail();
        let coincide = s.read_pos() == s.write_pos();
        s.produce(30);
        s.consume(30);
        assert_eq!(s.avail(), avail);
        assert_eq!(s.read_pos() == s.write_pos(), coincide);
    }

    #[test]
    fn produce_to_exactly_full() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(SIZE);
        assert_eq!(s.avail(), SIZE);
        assert_eq!(s.free(), 0);
        assert_eq!(s.read_pos(), s.write_pos());

        s.consume(SIZE);
        assert_eq!(s.avail(), 0);
        assert_eq!(s.free(), SIZE);
    }

    #[test]
    fn produce_past_free_overwrites_oldest() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(20);
        s.consume(5);

        for k in [1, 7, SIZE] {
            let free = s.free();
            s.produce(free + k);
            assert_eq!(s.avail(), SIZE, "k = {k}");
            assert_eq!(s.read_pos(), s.write_pos(), "k = {k}");
            s.consume(13);
        }
    }

    #[test]
    fn wraps_around_end() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(50);
        s.consume(50);
        s.produce(30);
        assert_eq!(s.write_pos(), 16);
        assert_eq!(s.read_pos(), 50);
        assert_eq!(s.avail(), 30);
        assert_eq!(s.free(), 34);
    }

    #[test]
    fn wrap_stays_in_range() {
        let mut mem = [0u8; SIZE];
        let s = stream(&mut mem);
        for x in 0..2 * SIZE {
            let w = s.wrap(x);
            assert!(w < SIZE);
            assert_eq!(w, x % SIZE);
        }
    }

    #[test]
    #[should_panic]
    fn wrap_two_laps_is_a_bug() {
        let mut mem = [0u8; SIZE];
        let s = stream(&mut mem);
        s.wrap(2 * SIZE);
    }

    #[test]
    fn rewind_wrap_and_distances() {
        let mut mem = [0u8; SIZE];
        let s = stream(&mut mem);
        assert_eq!(s.rewind_wrap(-4), SIZE - 4);
        assert_eq!(s.rewind_wrap(10), 10);
        assert_eq!(s.bytes_without_wrap(10), SIZE - 10);
        assert_eq!(s.rewind_bytes_without_wrap(10), 10);
        // Default stereo s16: 4 bytes per frame.
        assert_eq!(s.frames_without_wrap(8), (SIZE - 8) / 4);
        assert_eq!(s.samples_without_wrap(8), (SIZE - 8) / 2);
    }

    #[test]
    fn rewind_write_pos() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(10);
        assert_eq!(s.rewind_write_pos_by_bytes(4), 6);
        assert_eq!(s.rewind_write_pos_by_bytes(10), 0);
        assert_eq!(s.rewind_write_pos_by_bytes(12), SIZE - 2);
    }

    #[test]
    fn underrun_permitted_reports_full_when_empty() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        assert_eq!(s.avail_bytes(), 0);

        s.set_underrun_permitted(true);
        assert_eq!(s.avail_bytes(), SIZE);

        s.produce(8);
        assert_eq!(s.avail_bytes(), 8);
    }

    #[test]
    fn overrun_permitted_reports_empty_when_full() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(SIZE);
        assert_eq!(s.free_bytes(), 0);

        s.set_overrun_permitted(true);
        assert_eq!(s.free_bytes(), SIZE);
    }

    #[test]
    fn apply_format_requires_params() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        assert_eq!(s.apply_format(None), Err(StreamError::InvalidArgument));

        let params = StreamParams::new(FrameFormat::S32Le, 96_000, 4);
        s.apply_format(Some(&params)).unwrap();
        assert_eq!(s.frame_format(), FrameFormat::S32Le);
        assert_eq!(s.rate(), 96_000);
        assert_eq!(s.channels(), 4);
        assert_eq!(s.sample_width(), SampleWidth::W32);
        assert_eq!(s.frame_bytes(), 16);
        assert_eq!(s.period_bytes(3), 48);
    }

    #[test]
    fn apply_format_rejects_zero_channels() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(16);

        let params = StreamParams::new(FrameFormat::S32Le, 96_000, 0);
        assert_eq!(s.apply_format(Some(&params)), Err(StreamError::InvalidArgument));
        assert_eq!(s.channels(), 2);
        assert_eq!(s.frame_format(), FrameFormat::S16Le);
        assert_eq!(s.frame_bytes(), 4);
        assert_eq!(s.avail_frames(), 4);
        assert_eq!(s.free_frames(), 12);
    }

    #[test]
    fn sample_and_frame_counts() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(24);
        assert_eq!(s.avail_samples(), 12);
        assert_eq!(s.avail_frames(), 6);
        assert_eq!(s.free_samples(), 20);
        assert_eq!(s.free_frames(), 10);
    }

    #[test]
    fn can_copy_prefers_source_empty() {
        let mut a = [0u8; SIZE];
        let mut b = [0u8; SIZE];
        let mut src = stream(&mut a);
        let mut sink = stream(&mut b);

        sink.produce(SIZE - 4);
        assert_eq!(can_copy_bytes(&src, &sink, 8), CopyCheck::SourceEmpty);

        src.produce(16);
        assert_eq!(can_copy_bytes(&src, &sink, 8), CopyCheck::SinkFull);
        assert_eq!(can_copy_bytes(&src, &sink, 4), CopyCheck::Ok);
    }

    #[test]
    fn copy_bytes_is_min_of_avail_and_free() {
        let mut a = [0u8; SIZE];
        let mut b = [0u8; SIZE];
        let mut src = stream(&mut a);
        let mut sink = stream(&mut b);

        for (produced, filled) in [(0, 0), (10, 0), (10, 60), (40, 30), (64, 64)] {
            src.reset();
            sink.reset();
            src.produce(produced);
            sink.produce(filled);
            let expected = src.avail_bytes().min(sink.free_bytes());
            assert_eq!(copy_bytes(&src, &sink), expected);
        }
    }

    #[test]
    fn aligned_frames_round_down() {
        let mut a = [0u8; SIZE];
        let mut b = [0u8; SIZE];
        let mut src = stream(&mut a);
        let sink = stream(&mut b);

        // Stereo s16 source with 8-byte alignment: chunks of 2 frames (8 bytes).
        src.set_align(8, 1);
        assert_eq!(src.align_frame_count(), 2);
        assert_eq!(src.align_shift(), 3);

        src.produce(28); // 7 frames
        assert_eq!(avail_frames(&src, &sink), 7);
        assert_eq!(avail_frames_aligned(&src, &sink), 6);
    }

    #[test]
    fn aligned_frames_non_power_of_two_chunk() {
        let mut a = [0u8; SIZE];
        let mut b = [0u8; SIZE];
        let mut src = stream(&mut a);
        let sink = stream(&mut b);

        // 3 frames of 4 bytes = 12 byte chunk; the shift rounds to 16.
        src.set_align(1, 3);
        assert_eq!(src.align_frame_count(), 3);
        assert_eq!(src.align_shift(), 4);

        src.produce(48);
        let frames = avail_frames_aligned(&src, &sink);
        assert_eq!(frames % 3, 0);
        assert!(frames <= 12);
    }

    #[test]
    fn set_zero_checks_free_space() {
        let mut mem = [0xAAu8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(56);
        s.consume(56);
        s.produce(4);

        // w_pos = 60, free = 60: the zeroed range wraps past the end.
        assert_eq!(s.set_zero(61), Err(StreamError::Overrun));
        assert!(s.data().iter().all(|&b| b == 0xAA));

        s.set_zero(12).unwrap();
        assert!(s.data()[60..].iter().all(|&b| b == 0));
        assert!(s.data()[..8].iter().all(|&b| b == 0));
        assert_eq!(s.data()[8], 0xAA);
        // set_zero does not commit.
        assert_eq!(s.write_pos(), 60);
        assert_eq!(s.avail(), 4);
    }

    #[test]
    fn regions_split_at_wrap() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(60);
        s.consume(60);

        let (head, tail) = s.write_regions(10);
        assert_eq!(head.len(), 4);
        assert_eq!(tail.len(), 6);
        head.fill(1);
        tail.fill(2);
        s.produce(10);

        let (head, tail) = s.read_regions(10);
        assert_eq!(head, &[1u8; 4]);
        assert_eq!(tail, &[2u8; 6]);
    }

    #[test]
    fn typed_samples_follow_positions() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        s.produce(60);
        s.consume(60);

        // Write 4 s16 samples straddling the end.
        for i in 0..4 {
            s.write_sample::<i16>(i, (i as i16 + 1) * -100);
        }
        s.produce(8);
        for i in 0..4 {
            assert_eq!(s.read_sample::<i16>(i), (i as i16 + 1) * -100);
        }
        assert_eq!(s.frag_offset(s.read_pos(), 2, 2), 0);
    }

    struct CountingCache {
        invalidated: core::cell::Cell<usize>,
        written_back: core::cell::Cell<usize>,
        calls: core::cell::Cell<usize>,
    }

    impl CacheOps for CountingCache {
        fn invalidate_region(&self, region: &[u8]) {
            self.invalidated.set(self.invalidated.get() + region.len());
            self.calls.set(self.calls.get() + 1);
        }

        fn writeback_region(&self, region: &[u8]) {
            self.written_back.set(self.written_back.get() + region.len());
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn cache_maintenance_splits_like_copies() {
        let mut mem = [0u8; SIZE];
        let mut s = stream(&mut mem);
        let cache = CountingCache {
            invalidated: Default::default(),
            written_back: Default::default(),
            calls: Default::default(),
        };

        s.invalidate(&cache, 16);
        assert_eq!(cache.calls.get(), 1);
        assert_eq!(cache.invalidated.get(), 16);

        s.produce(56);
        s.consume(56);
        s.writeback(&cache, 16);
        assert_eq!(cache.calls.get(), 3);
        assert_eq!(cache.written_back.get(), 16);

        // Read position 56: 8 bytes up to the end, 8 from the start.
        s.produce(16);
        s.invalidate(&cache, 16);
        assert_eq!(cache.calls.get(), 5);
        assert_eq!(cache.invalidated.get(), 32);

        // No-op implementation is usable through the same entry points.
        s.writeback(&NoCache, 16);
        s.invalidate(&NoCache, 16);
    }
}
