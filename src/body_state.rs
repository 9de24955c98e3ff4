//! Compressed physical state of a rigid body, as saved for rewind and sent
//! to clients.

use crate::codec::{compress_transform, CompressedTransform};
use crate::debug;
use crate::error::{LinkError, Result};
use crate::half_float::{to_float16, to_float32};
use crate::math::{Transform, Vec3};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Transform plus linear and angular velocity of one body.
///
/// Wire layout: a 16-byte [`CompressedTransform`] followed by six
/// little-endian binary16 words, linear `x y z` then angular `x y z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkBodyState {
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

fn put_half_vec3<B: BufMut>(buf: &mut B, v: Vec3) -> Vec3 {
    let halves = v.to_array().map(to_float16);
    for half in halves {
        buf.put_u16_le(half);
    }
    Vec3::from_array(halves.map(to_float32))
}

fn get_half_vec3<B: Buf>(buf: &mut B) -> Vec3 {
    let x = to_float32(buf.get_u16_le());
    let y = to_float32(buf.get_u16_le());
    let z = to_float32(buf.get_u16_le());
    Vec3::new(x, y, z)
}

impl NetworkBodyState {
    pub const WIRE_SIZE: usize = CompressedTransform::WIRE_SIZE + 6 * 2;

    pub fn new(transform: Transform, linear_velocity: Vec3, angular_velocity: Vec3) -> Self {
        Self {
            transform,
            linear_velocity,
            angular_velocity,
        }
    }

    /// Writes the compressed state and snaps `self` to what a reader of
    /// the buffer will reconstruct.
    pub fn compress<B: BufMut>(&mut self, buf: &mut B) {
        let compressed = compress_transform(&mut self.transform);
        compressed.encode(buf);
        self.linear_velocity = put_half_vec3(buf, self.linear_velocity);
        self.angular_velocity = put_half_vec3(buf, self.angular_velocity);
        debug::trace_wire("wrote", Self::WIRE_SIZE);
    }

    pub fn decompress<B: Buf>(buf: &mut B) -> Result<Self> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(LinkError::Truncated {
                needed: Self::WIRE_SIZE,
                available: buf.remaining(),
            });
        }

        let transform = CompressedTransform::decode(buf)?.decompress();
        let linear_velocity = get_half_vec3(buf);
        let angular_velocity = get_half_vec3(buf);
        debug::trace_wire("read", Self::WIRE_SIZE);

        Ok(Self {
            transform,
            linear_velocity,
            angular_velocity,
        })
    }
}
