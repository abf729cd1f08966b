//! Integer helpers for buffer sizing and processing alignment.

/// Greatest common divisor (Euclid). `gcd(0, b) == b`.
#[inline]
pub const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple. Returns 0 if either argument is 0.
#[inline]
pub const fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Round `value` up to the next multiple of `align`. `align` of 0 or 1 is a no-op.
///
/// Returns `None` if the rounded value does not fit in a `u32`.
#[inline]
pub const fn align_up(value: u32, align: u32) -> Option<u32> {
    if align <= 1 {
        return Some(value);
    }
    value.div_ceil(align).checked_mul(align)
}

/// Number of frames needed so that a processing chunk meets both the byte
/// alignment and the frame-count alignment requirements.
///
/// `lcm(byte_align / gcd(byte_align, frame_bytes), frame_align_req)`
pub const fn frame_align_count(byte_align: u32, frame_align_req: u32, frame_bytes: u32) -> u32 {
    let frames_for_bytes = byte_align / gcd(byte_align, frame_bytes);
    lcm(frames_for_bytes, frame_align_req)
}

/// Shift such that `bytes >> shift` never over-counts chunks of `process_size`.
///
/// Exact `log2` for powers of two, otherwise one past the highest set bit.
pub const fn align_shift(process_size: u32) -> u32 {
    debug_assert!(process_size != 0);
    let base = if process_size.is_power_of_two() { 31 } else { 32 };
    base - process_size.leading_zeros()
}
