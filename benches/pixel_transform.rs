use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chromakey_router_rs::chroma_pipeline::{
    Bgra, ClassifierConfig, Frame, HsvMode, Metric, OutputComposer, PixelTransform, SinkFormat,
    Background, ThresholdBand,
};

fn generate_mock_frame(width: usize, height: usize) -> Frame {
    let pixels: Vec<Bgra> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                if (x / 16 + y / 16) % 2 == 0 {
                    Bgra::GREEN
                } else {
                    Bgra::rgb((x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8)
                }
            })
        })
        .collect();
    Frame::from_pixels(width, height, &pixels).unwrap()
}

fn transform_for(metric: Metric) -> PixelTransform {
    let band = ThresholdBand::new(Some(8), None, 96).unwrap();
    let config = ClassifierConfig::new(Bgra::GREEN, band, metric);
    PixelTransform::from_config(&config, true, Some(Bgra::rgb(255, 0, 255)))
}

fn benchmark_transform_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_by_size");

    let sizes = vec![
        (320, 240, "320x240"),
        (720, 480, "720x480"),
        (1920, 1080, "1920x1080"),
    ];

    for (width, height, label) in sizes {
        let frame = generate_mock_frame(width, height);
        let transform = transform_for(Metric::default());

        group.bench_with_input(BenchmarkId::from_parameter(label), &frame, |b, frame| {
            b.iter(|| {
                let mut frame = frame.clone();
                let _ = transform.apply(black_box(&mut frame));
            });
        });
    }

    group.finish();
}

fn benchmark_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let frame = generate_mock_frame(720, 480);

    let metrics = vec![
        Metric::default(),
        Metric::YCbCr,
        Metric::Rgb,
        Metric::Luma,
        Metric::Redmean,
        Metric::Hsv { mode: HsvMode::Semifull },
        Metric::Hsv { mode: HsvMode::Full },
    ];

    for metric in metrics {
        let transform = transform_for(metric);
        group.bench_with_input(BenchmarkId::from_parameter(metric.name()), &frame, |b, frame| {
            b.iter(|| {
                let mut frame = frame.clone();
                let _ = transform.apply(black_box(&mut frame));
            });
        });
    }

    group.finish();
}

fn benchmark_parallel_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_overhead");
    let frame = generate_mock_frame(720, 480);
    let transform = transform_for(Metric::YCbCr);

    group.bench_function("parallel", |b| {
        b.iter(|| {
            let mut frame = frame.clone();
            let _ = transform.apply(black_box(&mut frame));
        });
    });

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let mut frame = frame.clone();
            let _ = transform.apply_sequential(black_box(&mut frame));
        });
    });

    group.finish();
}

fn benchmark_output_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_packing");
    let frame = generate_mock_frame(720, 480);

    for (format, background, label) in [
        (SinkFormat::Rgb24, Background::None, "rgb24"),
        (SinkFormat::Bgra32, Background::None, "bgra32"),
        (SinkFormat::Rgb24, Background::Color(Bgra::BLACK), "rgb24_over_color"),
    ] {
        let mut composer = OutputComposer::new(format, background);
        composer.prepare(720, 480).unwrap();
        group.bench_function(label, |b| {
            b.iter(|| {
                let _ = composer.compose(black_box(&frame));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_transform_sizes,
    benchmark_metrics,
    benchmark_parallel_overhead,
    benchmark_output_packing
);
criterion_main!(benches);
