// Criterion benchmarks for the varwire codec hot path.
//
// Run with:
//   cargo bench -p varwire-codec

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use varwire_codec::{decode_from_slice, encode_to_vec, NullContext, TypeRegistry, Value};

fn call_value() -> Value {
    Value::mapping([
        ("o", Value::from("servant-1")),
        ("m", Value::from("sum")),
        (
            "a",
            Value::Sequence(vec![Value::Sequence(
                (0..32).map(Value::Int32).collect(),
            )]),
        ),
        ("O", Value::from("QRJSY2M9RA0H")),
    ])
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("int32", |b| {
        b.iter(|| encode_to_vec(black_box(&Value::Int32(42)), &NullContext));
    });

    group.bench_function("call_mapping", |b| {
        let value = call_value();
        b.iter(|| encode_to_vec(black_box(&value), &NullContext));
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let registry = TypeRegistry::with_builtins();

    group.bench_function("int32", |b| {
        let bytes = encode_to_vec(&Value::Int32(42), &NullContext).unwrap();
        b.iter(|| decode_from_slice(black_box(&bytes), &registry, &NullContext));
    });

    group.bench_function("call_mapping", |b| {
        let bytes = encode_to_vec(&call_value(), &NullContext).unwrap();
        b.iter(|| decode_from_slice(black_box(&bytes), &registry, &NullContext));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
