use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neurotempo_core::{
    FrozenSource, NeurotempoConfig, Pipeline, Scenario, ScriptStep, SignalSource,
    SimulatedHeadset,
};
use neurotempo_signals::{BandPowerExtractor, ContactQualityEstimator, ElectrodeMap};

fn focused_frame(seconds: f64) -> ndarray::Array2<f64> {
    let mut sim = SimulatedHeadset::new(42, vec![ScriptStep::new(Scenario::Focused, 60.0)])
        .expect("simulator");
    sim.advance(seconds).expect("advance");
    sim.get_window(seconds as f32)
        .frame()
        .expect("ready")
        .data()
        .to_owned()
}

fn benchmark_pipeline_tick(c: &mut Criterion) {
    let mut pipeline = Pipeline::new(NeurotempoConfig::default(), 0.6).expect("pipeline");
    let mut source = FrozenSource::new(focused_frame(9.0), SimulatedHeadset::layout(), 256.0);
    // Warmup past debounce and settling
    for t in 0..10 {
        pipeline.tick(&mut source, t as f64);
    }

    let mut now = 10.0;
    c.bench_function("pipeline_tick", |b| {
        b.iter(|| {
            now += 1.0;
            black_box(pipeline.tick(&mut source, black_box(now)));
        })
    });
}

fn benchmark_contact_quality(c: &mut Criterion) {
    let mut estimator = ContactQualityEstimator::new(ElectrodeMap::identity());
    let frame = focused_frame(2.0);
    let eeg = frame.slice(ndarray::s![0..4, ..]).mapv(|v| v as f32);

    c.bench_function("contact_quality_2s", |b| {
        b.iter(|| black_box(estimator.estimate(black_box(eeg.view()), 256.0)))
    });
}

fn benchmark_band_powers(c: &mut Criterion) {
    let mut group = c.benchmark_group("band_powers");
    for seconds in [2.0, 4.0, 8.0] {
        let frame = focused_frame(seconds);
        let eeg = frame.slice(ndarray::s![0..4, ..]).mapv(|v| v as f32);
        let mut extractor = BandPowerExtractor::new();
        group.bench_with_input(BenchmarkId::from_parameter(seconds), &eeg, |b, eeg| {
            b.iter(|| black_box(extractor.extract(eeg.view(), &[0, 1, 2, 3], 256.0)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_pipeline_tick,
    benchmark_contact_quality,
    benchmark_band_powers
);
criterion_main!(benches);
