use bytes::BytesMut;
use proptest::prelude::*;
use smooth_link::{
    compress_quaternion, compress_transform, compress_vector3, decompress_quaternion,
    decompress_vector3, to_float16, to_float32, CompressedTransform, NetworkBodyState, Quat,
    Transform, Vec3,
};

fn unit_vector() -> impl Strategy<Value = Vec3> {
    (-1.0f32..=1.0, 0.0f32..std::f32::consts::TAU).prop_map(|(z, phi)| {
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    })
}

fn rotation() -> impl Strategy<Value = Quat> {
    (
        -1.0f32..=1.0,
        -1.0f32..=1.0,
        -1.0f32..=1.0,
        -1.0f32..=1.0,
    )
        .prop_filter("degenerate quaternion", |(x, y, z, w)| {
            x * x + y * y + z * z + w * w > 0.01
        })
        .prop_map(|(x, y, z, w)| Quat::new(x, y, z, w).normalize())
}

proptest! {
    #[test]
    fn unit_vector_round_trip_within_one_step(v in unit_vector()) {
        let decoded = decompress_vector3(compress_vector3(v));
        let err = decoded.distance(v);
        prop_assert!(err <= 1.0 / 511.0 + 1e-3, "{:?} -> {:?} (error {})", v, decoded, err);
        prop_assert!((decoded.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn quaternion_round_trip_within_hundredth_radian(q in rotation()) {
        let decoded = decompress_quaternion(compress_quaternion(q), true);
        let angle = decoded.angle_to(q);
        prop_assert!(angle < 0.01, "{:?} -> {:?} ({} rad)", q, decoded, angle);
    }

    #[test]
    fn any_packed_quaternion_decodes_to_unit(packed in any::<u32>()) {
        let q = decompress_quaternion(packed, true);
        prop_assert!(q.is_finite());
        prop_assert!((q.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn centimetre_positions_survive_exactly(
        k in (-1_000_000i32..=1_000_000, -1_000_000i32..=1_000_000, -1_000_000i32..=1_000_000),
        q in rotation(),
    ) {
        let to_pos = |k: i32| (k as f64 / 100.0) as f32;
        let position = Vec3::new(to_pos(k.0), to_pos(k.1), to_pos(k.2));
        let mut transform = Transform::new(position, q);

        let compressed = compress_transform(&mut transform);
        prop_assert_eq!(compressed.position, [k.0, k.1, k.2]);
        prop_assert_eq!(transform.position, position);
        prop_assert_eq!(compressed.decompress(), transform);
    }

    #[test]
    fn half_float_conversion_is_idempotent(bits in any::<u32>()) {
        let x = f32::from_bits(bits);
        let h = to_float16(x);
        let back = to_float32(h);
        if x.is_nan() {
            prop_assert!(back.is_nan());
        } else {
            prop_assert_eq!(to_float16(back), h);
            prop_assert_eq!(back.is_sign_negative(), x.is_sign_negative());
        }
    }

    #[test]
    fn half_float_relative_error_in_normal_range(x in 6.2e-5f32..65000.0) {
        let back = to_float32(to_float16(x));
        prop_assert!(((back - x) / x).abs() <= 1.0 / 2048.0 + 1e-7);
    }

    #[test]
    fn decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut reader = &bytes[..];
        match CompressedTransform::decode(&mut reader) {
            Ok(compressed) => {
                prop_assert!(bytes.len() >= CompressedTransform::WIRE_SIZE);
                let t = compressed.decompress();
                prop_assert!(t.position.is_finite());
                prop_assert!(t.rotation.is_finite());
            }
            Err(_) => prop_assert!(bytes.len() < CompressedTransform::WIRE_SIZE),
        }

        let mut reader = &bytes[..];
        let res = NetworkBodyState::decompress(&mut reader);
        prop_assert_eq!(res.is_ok(), bytes.len() >= NetworkBodyState::WIRE_SIZE);
    }

    #[test]
    fn body_state_sender_equals_receiver(
        position in (-5000.0f32..5000.0, -5000.0f32..5000.0, -5000.0f32..5000.0),
        q in rotation(),
        linear in (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
    ) {
        let mut state = NetworkBodyState::new(
            Transform::new(Vec3::new(position.0, position.1, position.2), q),
            Vec3::new(linear.0, linear.1, linear.2),
            Vec3::new(0.0, linear.1 * 0.1, 0.0),
        );
        let mut buf = BytesMut::new();
        state.compress(&mut buf);

        let mut reader = buf.freeze();
        prop_assert_eq!(NetworkBodyState::decompress(&mut reader).unwrap(), state);
    }
}

#[test]
fn quaternion_ties_and_axes_round_trip() {
    let h = std::f32::consts::FRAC_1_SQRT_2;
    let cases = [
        Quat::IDENTITY,
        Quat::new(0.0, 0.0, 0.0, -1.0),
        Quat::new(1.0, 0.0, 0.0, 0.0),
        Quat::new(0.0, -1.0, 0.0, 0.0),
        Quat::new(0.5, 0.5, 0.5, 0.5),
        Quat::new(-0.5, 0.5, -0.5, 0.5),
        Quat::new(h, h, 0.0, 0.0),
        Quat::new(0.0, 0.0, -h, h),
    ];

    for q in cases {
        let decoded = decompress_quaternion(compress_quaternion(q), true);
        assert!(decoded.angle_to(q) < 0.01, "{:?} -> {:?}", q, decoded);
    }
}

#[test]
fn out_of_range_positions_clamp() {
    let mut far = Transform::from_position(Vec3::new(1.0e6, -1.0e6, 0.0));
    let compressed = compress_transform(&mut far);
    assert_eq!(compressed.position, [0x7f_ffff, -0x80_0000, 0]);
    assert_eq!(
        far.position,
        Vec3::new((8_388_607.0f64 / 100.0) as f32, (-8_388_608.0f64 / 100.0) as f32, 0.0)
    );
}
