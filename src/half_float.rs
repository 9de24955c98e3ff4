//! Bit-level IEEE-754 `binary32 <-> binary16` conversion.
//!
//! Rounding on encode is round-to-nearest with the half-way case rounded
//! up in magnitude: bit 12 of the binary32 significand is inspected and, if
//! set, `0x2000` is added before the 13 low bits are truncated. Zeros keep
//! their sign, infinities stay infinite, NaNs stay NaN (the upper ten
//! payload bits survive) and values too large for binary16 become a signed
//! infinity. None of these functions allocate or panic.

const F16_SIGN: i32 = 0x8000;
const F16_EXP_INF: i32 = 0x7c00;
/// Difference between the binary32 (127) and binary16 (15) exponent bias.
const BIAS_DELTA: i32 = 127 - 15;

/// Converts an `f32` to the bit pattern of the nearest binary16 value.
pub fn to_float16(value: f32) -> u16 {
    let i = value.to_bits() as i32;

    let s = (i >> 16) & F16_SIGN;
    let mut e = ((i >> 23) & 0xff) - BIAS_DELTA;
    let mut m = i & 0x007f_ffff;

    if e <= 0 {
        if e < -10 {
            // Below the smallest binary16 subnormal, including binary32
            // zeros and subnormals: signed zero.
            return s as u16;
        }

        // Normal binary32, subnormal binary16. Restore the implicit bit and
        // shift it into place. A carry out of the significand while rounding
        // lands in the exponent field and yields the smallest normal.
        m = (m | 0x0080_0000) >> (1 - e);
        if m & 0x0000_1000 != 0 {
            m += 0x0000_2000;
        }
        return (s | (m >> 13)) as u16;
    }

    if e == 0xff - BIAS_DELTA {
        if m == 0 {
            return (s | F16_EXP_INF) as u16;
        }
        // Keep the top ten payload bits. If they are all zero the result
        // would read back as infinity, so force one bit on.
        m >>= 13;
        return (s | F16_EXP_INF | m | i32::from(m == 0)) as u16;
    }

    if m & 0x0000_1000 != 0 {
        m += 0x0000_2000;
        if m & 0x0080_0000 != 0 {
            // Significand overflowed.
            m = 0;
            e += 1;
        }
    }

    if e > 30 {
        return (s | F16_EXP_INF) as u16;
    }

    (s | (e << 10) | (m >> 13)) as u16
}

/// Converts a binary16 bit pattern to the exactly equal `f32`.
pub fn to_float32(half: u16) -> f32 {
    let h = u32::from(half);
    let s = (h >> 15) & 0x1;
    let mut e = ((h >> 10) & 0x1f) as i32;
    let mut m = h & 0x03ff;

    if e == 0 {
        if m == 0 {
            return f32::from_bits(s << 31);
        }
        // Subnormal: renormalize until the implicit bit shows up.
        while m & 0x0400 == 0 {
            m <<= 1;
            e -= 1;
        }
        e += 1;
        m &= !0x0400;
    } else if e == 31 {
        if m == 0 {
            return f32::from_bits((s << 31) | 0x7f80_0000);
        }
        return f32::from_bits((s << 31) | 0x7f80_0000 | (m << 13));
    }

    let e = (e + BIAS_DELTA) as u32;
    f32::from_bits((s << 31) | (e << 23) | (m << 13))
}

/// Round-trips `value` through binary16, i.e. the value a receiver decodes.
pub fn quantize(value: f32) -> f32 {
    to_float32(to_float16(value))
}
