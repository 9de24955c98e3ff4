//! Fixed-width packing of unit vectors, rotations and rigid transforms.
//!
//! A packed word holds three 10-bit signed fixed-point fields at bits
//! `[0:10)`, `[10:20)` and `[20:30)` plus a 2-bit tag at `[30:32)`.
//! Positive values scale by 511 and negative values by 512 so the whole
//! `[-512, 511]` field range is used.
//!
//! Rotations use "smallest three": the component with the largest magnitude
//! is dropped and its index stored in the tag. The scan order `x, y, z, w`
//! and the first-match tie-break are part of the wire format.

use crate::error::{LinkError, Result};
use crate::math::{Quat, Transform, Vec3};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::f32::consts::SQRT_2;

/// Tag written by [`compress_vector3`] when the caller has nothing to store.
pub const EMPTY_TAG: u32 = 0;

/// Fixed-point positions are stored in hundredths of a unit.
pub const POSITION_SCALE: f64 = 100.0;
pub const POSITION_FIXED_MIN: i32 = -0x80_0000;
pub const POSITION_FIXED_MAX: i32 = 0x7f_ffff;

const FIELD_MASK: u32 = 0x3ff;
const FIELD_SIGN: u32 = 0x200;
const TAG_SHIFT: u32 = 30;

fn pack_field(value: f32) -> u32 {
    let v = value.clamp(-1.0, 1.0);
    // `as i32` truncates toward zero, so both halves round half away from zero.
    let part = if v > 0.0 {
        (v * 511.0 + 0.5) as i32
    } else {
        (v * 512.0 - 0.5) as i32
    };
    (part as u32) & FIELD_MASK
}

fn unpack_field(part: u32) -> f32 {
    if part & FIELD_SIGN != 0 {
        (part as f32 - 1024.0) / 512.0
    } else {
        part as f32 / 511.0
    }
}

fn pack_1010102(fields: [f32; 3], tag: u32) -> u32 {
    pack_field(fields[0])
        | (pack_field(fields[1]) << 10)
        | (pack_field(fields[2]) << 20)
        | ((tag & 0x3) << TAG_SHIFT)
}

fn unpack_1010102(packed: u32) -> ([f32; 3], u32) {
    (
        [
            unpack_field(packed & FIELD_MASK),
            unpack_field((packed >> 10) & FIELD_MASK),
            unpack_field((packed >> 20) & FIELD_MASK),
        ],
        packed >> TAG_SHIFT,
    )
}

/// Packs a unit vector. Non-unit input is not checked and does not round-trip.
pub fn compress_vector3(unit_vector: Vec3) -> u32 {
    compress_vector3_tagged(unit_vector, EMPTY_TAG)
}

/// Like [`compress_vector3`] but stores the low two bits of `tag`.
pub fn compress_vector3_tagged(unit_vector: Vec3, tag: u32) -> u32 {
    pack_1010102(unit_vector.to_array(), tag)
}

/// Unpacks and re-normalizes, since quantization moves the vector off the
/// unit sphere.
pub fn decompress_vector3(packed: u32) -> Vec3 {
    let (fields, _) = unpack_1010102(packed);
    Vec3::from_array(fields).normalize()
}

/// The tag of a packed vector or the dropped component index of a packed
/// quaternion.
pub fn packed_tag(packed: u32) -> u32 {
    packed >> TAG_SHIFT
}

/// Index (`0..4`, order `x, y, z, w`) of the largest-magnitude component.
/// Ties go to the first index scanned.
fn largest_component(components: &[f32; 4]) -> usize {
    let mut largest = 0;
    for i in 1..4 {
        if components[i].abs() > components[largest].abs() {
            largest = i;
        }
    }
    largest
}

/// Packs a rotation by dropping its largest component.
///
/// # Panics
///
/// Panics on a zero-length quaternion: a transform always carries a valid
/// rotation, so this is a logic error upstream, not bad network input.
pub fn compress_quaternion(q: Quat) -> u32 {
    let Some(q) = q.try_normalize() else {
        panic!("cannot compress a zero-length quaternion: {:?}", q);
    };

    let components = q.to_array();
    let largest = largest_component(&components);
    let neg = if components[largest] < 0.0 { -1.0 } else { 1.0 };
    // The kept components are at most 1/sqrt(2) in magnitude, so scaling
    // by sqrt(2) spreads them over the full field range.
    let scale = neg * SQRT_2;

    let mut fields = [0.0f32; 3];
    let kept = (0..4).filter(|&i| i != largest);
    for (field, i) in fields.iter_mut().zip(kept) {
        *field = components[i] * scale;
    }

    pack_1010102(fields, largest as u32)
}

/// Unpacks a rotation.
///
/// With `recover_largest` the dropped component is rebuilt from the unit
/// length constraint and the result normalized. Without it the three stored
/// fields are returned as-is with the dropped slot left at zero.
pub fn decompress_quaternion(packed: u32, recover_largest: bool) -> Quat {
    let (mut fields, tag) = unpack_1010102(packed);
    let dropped = tag as usize;

    let mut largest = 0.0;
    if recover_largest {
        for field in fields.iter_mut() {
            *field /= SQRT_2;
        }
        let sum: f32 = fields.iter().map(|f| f * f).sum();
        largest = (1.0 - sum).max(0.0).sqrt();
    }

    let mut components = [0.0f32; 4];
    let mut kept = fields.iter();
    for (i, component) in components.iter_mut().enumerate() {
        if i == dropped {
            *component = largest;
        } else if let Some(&field) = kept.next() {
            *component = field;
        }
    }

    let q = Quat::from_array(components);
    if recover_largest {
        q.normalize()
    } else {
        q
    }
}

fn position_to_fixed(value: f32) -> i32 {
    let scaled = (f64::from(value) * POSITION_SCALE).round();
    // NaN saturates to zero on the cast.
    scaled.clamp(f64::from(POSITION_FIXED_MIN), f64::from(POSITION_FIXED_MAX)) as i32
}

fn fixed_to_position(fixed: i32) -> f32 {
    let fixed = fixed.clamp(POSITION_FIXED_MIN, POSITION_FIXED_MAX);
    (f64::from(fixed) / POSITION_SCALE) as f32
}

/// A rigid transform as it travels on the wire: three signed fixed-point
/// position words followed by one packed quaternion, all little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressedTransform {
    pub position: [i32; 3],
    pub rotation: u32,
}

impl CompressedTransform {
    pub const WIRE_SIZE: usize = 16;

    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        for fixed in self.position {
            buf.put_i32_le(fixed);
        }
        buf.put_u32_le(self.rotation);
    }

    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(LinkError::Truncated {
                needed: Self::WIRE_SIZE,
                available: buf.remaining(),
            });
        }

        let position = [buf.get_i32_le(), buf.get_i32_le(), buf.get_i32_le()];
        let rotation = buf.get_u32_le();
        Ok(Self { position, rotation })
    }

    /// Out-of-range position words are clamped rather than rejected.
    pub fn decompress(&self) -> Transform {
        Transform {
            position: Vec3::new(
                fixed_to_position(self.position[0]),
                fixed_to_position(self.position[1]),
                fixed_to_position(self.position[2]),
            ),
            rotation: decompress_quaternion(self.rotation, true),
        }
    }
}

/// Compresses `transform` and snaps it to exactly what the receiver will
/// decode, so sender and receiver simulate from the same state.
pub fn compress_transform(transform: &mut Transform) -> CompressedTransform {
    let p = transform.position;
    let compressed = CompressedTransform {
        position: [
            position_to_fixed(p.x),
            position_to_fixed(p.y),
            position_to_fixed(p.z),
        ],
        rotation: compress_quaternion(transform.rotation),
    };
    *transform = compressed.decompress();
    compressed
}

pub fn decompress_transform(compressed: &CompressedTransform) -> Transform {
    compressed.decompress()
}
