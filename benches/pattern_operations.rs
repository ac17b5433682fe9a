use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stitchwise::prelude::*;

fn create_pattern(stitch_count: usize) -> EmbPattern {
    let mut pattern = EmbPattern::new();
    pattern.add_thread(EmbThread::from_string("red").unwrap());
    for i in 0..stitch_count {
        let x = (i % 100) as f64 * 10.0;
        let y = (i / 100) as f64 * 10.0;
        pattern.stitch_abs(x, y);
    }
    pattern
}

fn bench_transcode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode");
    for size in [1_000, 10_000] {
        let pattern = create_pattern(size);
        let settings = EncoderSettings {
            max_stitch: 121.0,
            max_jump: 121.0,
            round: true,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &pattern, |b, p| {
            b.iter(|| {
                let transcoder = Transcoder::with_settings(settings.clone());
                black_box(transcoder.transcode(p))
            })
        });
    }
    group.finish();
}

fn bench_dst_write(c: &mut Criterion) {
    let pattern = create_pattern(10_000);
    c.bench_function("dst_write_10k", |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            stitchwise::formats::io::writers::dst::write(
                &mut buffer,
                &pattern,
                &stitchwise::formats::io::writers::dst::DstSettings::default(),
            )
            .unwrap();
            black_box(buffer)
        })
    });
}

criterion_group!(benches, bench_transcode, bench_dst_write);
criterion_main!(benches);
