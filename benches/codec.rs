use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use bytes::BytesMut;
use smooth_link::{
    compress_quaternion, compress_transform, decompress_quaternion, to_float16, to_float32,
    BinaryFormat, BinarySerializer, CompressedTransform, NetworkBodyState, Quat, Reconciler,
    SmoothingConfig, SmoothingRegistry, Transform, Vec3,
};

fn create_test_transforms(count: usize) -> Vec<Transform> {
    (0..count)
        .map(|i| {
            let f = i as f32;
            Transform::new(
                Vec3::new(f * 1.37, (f * 0.5).sin() * 4.0, -f * 0.91),
                Quat::from_axis_angle(Vec3::new(0.3, 1.0, 0.2), f * 0.17),
            )
        })
        .collect()
}

fn benchmark_half_float(c: &mut Criterion) {
    let values: Vec<f32> = (0..1024).map(|i| (i as f32 - 512.0) * 0.173).collect();
    let halves: Vec<u16> = values.iter().map(|v| to_float16(*v)).collect();

    let mut group = c.benchmark_group("half_float");
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("to_float16", |b| {
        b.iter(|| {
            for v in &values {
                black_box(to_float16(black_box(*v)));
            }
        });
    });

    group.bench_function("to_float32", |b| {
        b.iter(|| {
            for h in &halves {
                black_box(to_float32(black_box(*h)));
            }
        });
    });

    group.finish();
}

fn benchmark_quaternion(c: &mut Criterion) {
    let rotation = Quat::from_axis_angle(Vec3::new(0.2, 0.9, -0.4), 1.1);
    let packed = compress_quaternion(rotation);

    c.bench_function("compress_quaternion", |b| {
        b.iter(|| black_box(compress_quaternion(black_box(rotation))));
    });

    c.bench_function("decompress_quaternion", |b| {
        b.iter(|| black_box(decompress_quaternion(black_box(packed), true)));
    });
}

fn benchmark_transform_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_batch");

    for count in &[10, 100, 1000] {
        let transforms = create_test_transforms(*count);
        group.throughput(Throughput::Bytes(
            (*count * CompressedTransform::WIRE_SIZE) as u64,
        ));

        group.bench_with_input(BenchmarkId::new("compress", count), count, |b, _| {
            b.iter(|| {
                let mut buf = BytesMut::with_capacity(transforms.len() * CompressedTransform::WIRE_SIZE);
                for transform in &transforms {
                    let mut t = *transform;
                    compress_transform(&mut t).encode(&mut buf);
                }
                black_box(buf);
            });
        });

        let mut encoded = BytesMut::new();
        for transform in &transforms {
            let mut t = *transform;
            compress_transform(&mut t).encode(&mut encoded);
        }
        let encoded = encoded.freeze();

        group.bench_with_input(BenchmarkId::new("decompress", count), count, |b, count| {
            b.iter(|| {
                let mut reader = encoded.clone();
                for _ in 0..*count {
                    black_box(CompressedTransform::decode(&mut reader).unwrap().decompress());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_body_state(c: &mut Criterion) {
    let state = NetworkBodyState::new(
        create_test_transforms(8)[7],
        Vec3::new(21.0, -0.4, 3.5),
        Vec3::new(0.0, 1.3, 0.0),
    );

    c.bench_function("body_state_compress", |b| {
        b.iter(|| {
            let mut s = state;
            let mut buf = BytesMut::with_capacity(NetworkBodyState::WIRE_SIZE);
            s.compress(&mut buf);
            black_box(buf);
        });
    });
}

fn benchmark_reconciler(c: &mut Criterion) {
    let config = SmoothingConfig::new().with_adjust_length(0.05, 50.0);

    c.bench_function("reconciler_correction_and_blend", |b| {
        b.iter(|| {
            let mut reconciler = Reconciler::new(config.clone());
            reconciler.prepare_sample(Transform::IDENTITY, Vec3::UNIT_X * 10.0);
            reconciler.check_correction(
                Transform::from_position(Vec3::new(1.0, 0.0, 0.2)),
                Vec3::UNIT_X * 10.0,
            );
            for step in 0..30 {
                let x = 1.0 + step as f32 * 10.0 / 60.0;
                reconciler.prepare_sample(Transform::from_position(Vec3::new(x, 0.0, 0.2)), Vec3::UNIT_X * 10.0);
                black_box(reconciler.tick(1.0 / 60.0));
            }
        });
    });

    let mut group = c.benchmark_group("registry_tick_all");
    for count in &[16u32, 256] {
        let mut registry = SmoothingRegistry::new(config.clone());
        for (id, transform) in (0..*count).zip(create_test_transforms(*count as usize)) {
            let reconciler = registry.register(id, transform);
            reconciler.prepare_sample(transform, Vec3::UNIT_X * 8.0);
            let mut corrected = transform;
            corrected.position += Vec3::new(0.5, 0.0, 0.0);
            reconciler.check_correction(corrected, Vec3::UNIT_X * 8.0);
        }
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| registry.tick_all(black_box(1.0 / 240.0)));
        });
    }
    group.finish();
}

fn benchmark_snapshot_formats(c: &mut Criterion) {
    let mut reconciler = Reconciler::default();
    reconciler.prepare_sample(Transform::IDENTITY, Vec3::UNIT_X * 5.0);
    reconciler.check_correction(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)), Vec3::UNIT_X * 5.0);
    reconciler.tick(1.0 / 60.0);
    let snapshot = reconciler.snapshot();

    let mut group = c.benchmark_group("snapshot_formats");

    for format in &[BinaryFormat::Json, BinaryFormat::MessagePack, BinaryFormat::Bincode] {
        let format_name = match format {
            BinaryFormat::Json => "JSON",
            BinaryFormat::MessagePack => "MessagePack",
            BinaryFormat::Bincode => "Bincode",
        };

        let serializer = BinarySerializer::new(*format);
        let serialized = serializer.serialize_snapshot(&snapshot).unwrap();
        println!("{} snapshot size: {} bytes", format_name, serialized.len());

        group.bench_with_input(
            BenchmarkId::new("serialize_snapshot", format_name),
            format,
            |b, format| {
                let serializer = BinarySerializer::new(*format);
                b.iter(|| {
                    black_box(serializer.serialize_snapshot(&snapshot).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_half_float,
    benchmark_quaternion,
    benchmark_transform_batches,
    benchmark_body_state,
    benchmark_reconciler,
    benchmark_snapshot_formats,
);

criterion_main!(benches);
