// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for Catchonika
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Ingestion throughput into the rolling buffer
//! - Sweeping a full retention window
//! - Reconstruction and export planning
//! - Standard MIDI file encoding

use std::sync::Arc;

use catchonika::capture::{CaptureSession, EventIngestor, RollingBuffer, Source};
use catchonika::recording::{
    EncodeSettings, Encoder, ExportRange, ExportRequest, Grouping, RangeExporter, SmfEncoder,
};
use catchonika::timing::ManualClock;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

/// Raw messages for `notes` notes spread over four channels, with the
/// pedal cycled every eight notes
fn performance(notes: usize) -> Vec<(f64, [u8; 3])> {
    let mut events = Vec::with_capacity(notes * 2 + notes / 4);
    for i in 0..notes {
        let t = i as f64 * 50.0;
        let channel = (i % 4) as u8;
        let key = 36 + (i % 48) as u8;
        if i % 8 == 0 {
            events.push((t, [0xB0 | channel, 64, 127]));
        }
        events.push((t, [0x90 | channel, key, 90]));
        events.push((t + 120.0, [0x80 | channel, key, 0]));
        if i % 8 == 7 {
            events.push((t + 200.0, [0xB0 | channel, 64, 0]));
        }
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    events
}

fn filled_buffer(notes: usize) -> RollingBuffer {
    let source = Source::new("bench", "Bench Keyboard");
    let mut ingestor = EventIngestor::new();
    let mut buffer = RollingBuffer::new();
    for (t, bytes) in performance(notes) {
        ingestor.ingest(&mut buffer, t, &bytes, &source);
    }
    buffer
}

/// Benchmark ingestion (the per-message hot path)
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    let source = Source::new("bench", "Bench Keyboard");

    for size in [100, 1000, 10000].iter() {
        let events = performance(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| {
                let mut ingestor = EventIngestor::new();
                let mut buffer = RollingBuffer::new();
                for (t, bytes) in events {
                    ingestor.ingest(&mut buffer, *t, bytes, &source);
                }
                black_box(buffer.len())
            })
        });
    }

    group.finish();
}

/// Benchmark sweeping half of a buffer away
fn bench_sweep(c: &mut Criterion) {
    let buffer = filled_buffer(10000);
    let end = buffer.last_time().unwrap_or(0.0);
    let retention_minutes = end / 2.0 / 60_000.0;

    c.bench_function("sweep_half", |b| {
        b.iter_batched(
            || buffer.clone(),
            |mut buffer| black_box(buffer.sweep(end, retention_minutes)),
            BatchSize::LargeInput,
        )
    });
}

/// Benchmark export planning (slice, reconstruct, group)
fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let exporter = RangeExporter::new();

    for size in [100, 1000, 10000].iter() {
        let buffer = filled_buffer(*size);
        let end = buffer.last_time().unwrap_or(0.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &buffer, |b, buffer| {
            b.iter(|| {
                let plan = exporter
                    .plan(buffer, 0.0, end, 120.0, Grouping::ByChannel)
                    .unwrap();
                black_box(plan.note_count())
            })
        });
    }

    group.finish();
}

/// Benchmark encoding a planned export
fn bench_encode(c: &mut Criterion) {
    let buffer = filled_buffer(1000);
    let end = buffer.last_time().unwrap_or(0.0);
    let plan = RangeExporter::new()
        .plan(&buffer, 0.0, end, 120.0, Grouping::ByChannel)
        .unwrap();
    let placements = plan.placements();
    let settings = EncodeSettings::new(120.0);
    let encoder = SmfEncoder::new();

    c.bench_function("encode_1000_notes", |b| {
        b.iter(|| black_box(encoder.encode(&placements, &settings).unwrap().len()))
    });
}

/// Benchmark a full export through the session
fn bench_session_export(c: &mut Criterion) {
    let clock = ManualClock::new();
    let mut session = CaptureSession::builder()
        .clock(Arc::new(clock.clone()))
        .encoder(Arc::new(SmfEncoder::new()))
        .build()
        .unwrap();
    let source = Source::new("bench", "Bench Keyboard");
    for (t, bytes) in performance(2000) {
        clock.set(t);
        session.ingest(&bytes, &source);
    }
    clock.advance(1000.0);

    let request = ExportRequest::new(ExportRange::Last(60.0));
    c.bench_function("session_export_last_minute", |b| {
        b.iter(|| black_box(session.export(&request).unwrap().bytes.len()))
    });
}

criterion_group!(
    benches,
    bench_ingest,
    bench_sweep,
    bench_plan,
    bench_encode,
    bench_session_export,
);

criterion_main!(benches);
