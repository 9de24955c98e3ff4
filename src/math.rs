//! Small engine-agnostic vector, quaternion and rigid transform types.
//!
//! Everything is single-precision and `Copy`. Nothing here depends on a
//! physics or rendering engine; the reconciler and the codec only need
//! normalization, linear interpolation, slerp and point transforms.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Below this squared length a vector or quaternion is treated as zero.
const ZERO_LENGTH_SQUARED: f32 = 1e-12;

/// Above this cosine two rotations are close enough that slerp degrades to
/// a normalized lerp (the `sin` denominator would lose precision).
const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UNIT_X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const UNIT_Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const UNIT_Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Returns the unit vector pointing the same way. A zero vector stays zero.
    pub fn normalize(self) -> Vec3 {
        let len_sq = self.length_squared();
        if len_sq <= ZERO_LENGTH_SQUARED {
            return Vec3::ZERO;
        }
        self * (1.0 / len_sq.sqrt())
    }

    /// `self` at `t = 0`, `to` at `t = 1`.
    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        self + (to - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation quaternion, `w` is the scalar part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Component order is `[x, y, z, w]`; the codec depends on it.
    pub const fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Rotation of `angle` radians around `axis` (normalized here).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Quat {
        let axis = axis.normalize();
        let (sin, cos) = (angle * 0.5).sin_cos();
        Quat::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    pub fn dot(self, other: Quat) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// `None` when the quaternion has (numerically) zero length.
    pub fn try_normalize(self) -> Option<Quat> {
        let len_sq = self.length_squared();
        if len_sq <= ZERO_LENGTH_SQUARED || !len_sq.is_finite() {
            return None;
        }
        let inv = 1.0 / len_sq.sqrt();
        Some(Quat::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv))
    }

    /// Unit-length copy; a degenerate quaternion becomes the identity.
    pub fn normalize(self) -> Quat {
        self.try_normalize().unwrap_or(Quat::IDENTITY)
    }

    pub fn conjugate(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates `v` by this (unit) quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Spherical linear interpolation from `self` (`t = 0`) to `to` (`t = 1`).
    ///
    /// Does not flip `to` onto the shorter arc: callers that care align the
    /// signs beforehand so that the hemisphere choice is made only once.
    pub fn slerp(self, to: Quat, t: f32) -> Quat {
        let cos = self.dot(to).clamp(-1.0, 1.0);
        if cos.abs() > SLERP_LINEAR_THRESHOLD {
            return Quat::new(
                self.x + (to.x - self.x) * t,
                self.y + (to.y - self.y) * t,
                self.z + (to.z - self.z) * t,
                self.w + (to.w - self.w) * t,
            )
            .normalize();
        }

        let theta = cos.acos();
        let sin = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin;
        let b = (t * theta).sin() / sin;
        Quat::new(
            self.x * a + to.x * b,
            self.y * a + to.y * b,
            self.z * a + to.z * b,
            self.w * a + to.w * b,
        )
        .normalize()
    }

    /// Negated copy when `self` lies in the opposite hemisphere of `reference`.
    pub fn aligned_to(self, reference: Quat) -> Quat {
        if self.dot(reference) < 0.0 {
            -self
        } else {
            self
        }
    }

    /// Rotation angle in radians between two unit quaternions, treating `q`
    /// and `-q` as the same rotation.
    pub fn angle_to(self, other: Quat) -> f32 {
        // atan2 of the relative rotation stays accurate for tiny angles,
        // where acos of the dot product does not.
        let rel = self.conjugate() * other;
        let sin_half = Vec3::new(rel.x, rel.y, rel.z).length();
        2.0 * sin_half.atan2(rel.w.abs())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl Neg for Quat {
    type Output = Quat;

    fn neg(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, -self.w)
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl Mul for Quat {
    type Output = Quat;

    fn mul(self, b: Quat) -> Quat {
        let a = self;
        Quat::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

/// Rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// The rotation is normalized on construction.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Local-space point to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(local)
    }

    /// World-space point to this transform's local space.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(world - self.position)
    }
}
