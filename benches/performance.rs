//! Performance benchmarks for ingestion, encoding and dispatch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tickrelay::{
    encode, Bundle, Category, ChangeRecord, Dispatcher, FieldKey, MemoryTransport, PipelineConfig,
    Session, Timestep, Value,
};

const FIELDS: [FieldKey; 6] = [
    FieldKey::Health,
    FieldKey::Air,
    FieldKey::FoodLevel,
    FieldKey::SaturationLevel,
    FieldKey::Score,
    FieldKey::Name,
];

fn records(entities: usize, ticks: i64) -> Vec<ChangeRecord> {
    (0..ticks)
        .flat_map(|tick| {
            (0..entities).flat_map(move |e| {
                FIELDS.into_iter().map(move |field| {
                    ChangeRecord::new(format!("entity-{}", e), tick, field, None, tick as i32)
                })
            })
        })
        .collect()
}

fn bundle_with(entities: usize) -> Bundle {
    let mut bundle = Bundle::new();
    for e in 0..entities {
        for &field in &FIELDS {
            bundle.set(
                Category::state_update(),
                format!("entity-{}", e).into(),
                field,
                Value::from(e as f64 * 0.5),
            );
        }
    }
    bundle
}

/// Benchmark ingestion with different numbers of entities per tick
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for entities in [1, 10, 100] {
        let batch = records(entities, 20);
        group.throughput(Throughput::Elements(batch.len() as u64));
        group.bench_with_input(BenchmarkId::new("entities", entities), &batch, |b, batch| {
            b.iter(|| {
                let (session, _notices) = Session::new(PipelineConfig::default()).unwrap();
                black_box(session.ingest_all(batch.iter().cloned()));
            });
        });
    }

    group.finish();
}

/// Benchmark encoding as bundles grow
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for entities in [1, 10, 100, 1000] {
        let bundle = bundle_with(entities);
        group.bench_with_input(BenchmarkId::new("entities", entities), &bundle, |b, bundle| {
            b.iter(|| black_box(encode(Timestep(42), bundle).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark draining a backlog through the dispatcher
fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    for ticks in [10, 100] {
        let batch = records(10, ticks);
        group.bench_with_input(BenchmarkId::new("ticks", ticks), &batch, |b, batch| {
            b.iter(|| {
                let config = PipelineConfig::default();
                let (session, _notices) = Session::new(config).unwrap();
                let mut dispatcher = Dispatcher::for_session(&session);
                let mut transport = MemoryTransport::new();
                session.ingest_all(batch.iter().cloned());

                let mut now = 0;
                while session.queue_len() > 0 {
                    dispatcher.tick(&session, &mut transport, Timestep(now));
                    now += 1;
                }
                black_box(transport.sent().len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_encode, bench_drain);
criterion_main!(benches);
