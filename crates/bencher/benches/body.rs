use bencher::{TestCase, TestPayload};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_message::codec::Json;
use micro_message::protocol::body::Body;
use micro_message::protocol::{RequestHeader, Response};
use serde::Serialize;
use std::hint::black_box;
use std::io::{Cursor, Write};

static SMALL_PAYLOAD: TestPayload = TestPayload::new(256, 64);
static NORMAL_PAYLOAD: TestPayload = TestPayload::new(64 * 1024, 4 * 1024);
static LARGE_PAYLOAD: TestPayload = TestPayload::new(6 * 1024 * 1024, 64 * 1024);

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("small_body", SMALL_PAYLOAD),
        TestCase::normal("normal_body", NORMAL_PAYLOAD),
        TestCase::large("large_body", LARGE_PAYLOAD),
    ]
}

fn benchmark_response_write(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("response_write");

    for case in create_test_cases() {
        let content = case.payload().content();
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter_batched_ref(
                || Response::new(RequestHeader::default()),
                |response| {
                    for chunk in content.chunks(case.payload().chunk_size()) {
                        response.write_all(chunk).expect("in-memory body should accept writes");
                    }
                    black_box(response.payload_size());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_stream_snapshot(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("stream_snapshot");

    for case in create_test_cases() {
        let content = case.payload().content();
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &content, |b, content| {
            b.iter_batched_ref(
                || Body::from_reader(Cursor::new(content.clone())),
                |body| {
                    let first = body.snapshot().expect("stream should be readable");
                    let second = body.snapshot().expect("buffer should be readable");
                    black_box((first, second));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

#[derive(Serialize)]
struct Record<'a> {
    id: usize,
    name: &'a str,
}

fn benchmark_json_encode(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("json_encode");

    for case in create_test_cases() {
        let content = case.payload().content();
        let names = content.chunks(case.payload().chunk_size()).map(|chunk| std::str::from_utf8(chunk).unwrap_or_default()).collect::<Vec<_>>();
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &names, |b, names| {
            b.iter_batched_ref(
                || Response::new(RequestHeader::default()),
                |response| {
                    let records = names.iter().enumerate().map(|(id, name)| Record { id, name }).collect::<Vec<_>>();
                    response.encode(Json(records));
                    black_box(response.payload_size());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(body, benchmark_response_write, benchmark_stream_snapshot, benchmark_json_encode);
criterion_main!(body);
