// Benchmark for the full per-session analytics pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use emg_rehab_core::{
    ProcessingParameters, RawChannel, SessionAnalyzer, SessionInput, SessionParameters,
};
use std::f32::consts::PI;

const FS: f32 = 1000.0;

fn therapy_channel(label: &str, bursts: usize) -> RawChannel {
    let mut samples = Vec::new();
    for _ in 0..bursts {
        samples.extend(std::iter::repeat(0.0f32).take(1000));
        let offset = samples.len();
        samples.extend((0..3000).map(|i| (2.0 * PI * 80.0 * (offset + i) as f32 / FS).sin()));
    }
    samples.extend(std::iter::repeat(0.0f32).take(1000));
    RawChannel::new(samples, FS, label)
}

fn bench_session_analysis(c: &mut Criterion) {
    // twelve contractions per side, roughly a 49 s recording
    let input = SessionInput {
        left: therapy_channel("left", 12),
        right: therapy_channel("right", 12),
        left_activated: None,
        right_activated: None,
    };
    let session = SessionParameters {
        bfr_pressure_percent: Some(50.0),
        effort_rating: Some(5),
        ..Default::default()
    };
    let analyzer = SessionAnalyzer::new(ProcessingParameters::default(), session).unwrap();

    c.bench_function("analyze_session_49s", |b| {
        b.iter(|| analyzer.analyze(black_box(&input)).unwrap())
    });
}

fn bench_single_channel(c: &mut Criterion) {
    let channel = therapy_channel("left", 12);
    let analyzer = SessionAnalyzer::new(
        ProcessingParameters::default(),
        SessionParameters::default(),
    )
    .unwrap();

    c.bench_function("analyze_channel_49s", |b| {
        b.iter(|| {
            analyzer
                .analyze_channel(black_box(&channel), None, &Default::default())
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_session_analysis, bench_single_channel);
criterion_main!(benches);
