use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use imageproc::point::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pupil2d::conic::{fit_ellipse_pixels, Ellipse};
use pupil2d::contour::decompose;
use pupil2d::search::{merge_search, FitVarianceTest};
use pupil2d::{DetectionParameters, Detector, FrameInput, Overlays, SearchConfig};

fn synthetic_eye(w: u32, h: u32, pupil: &Ellipse, noise: u8, seed: u64) -> GrayImage {
    let conic = pupil.to_conic();
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(w, h, |x, y| {
        if (20..30).contains(&x) && (20..30).contains(&y) {
            return Luma([255]);
        }
        let base: i32 = if conic.algebraic_distance(x as f64, y as f64) < 0.0 {
            30
        } else {
            150
        };
        let n = if noise > 0 {
            rng.gen_range(-(noise as i32)..=noise as i32)
        } else {
            0
        };
        Luma([(base + n).clamp(0, 250) as u8])
    })
}

fn arc_points(e: &Ellipse, t0: f64, t1: f64, n: usize) -> Vec<Point<i32>> {
    let (s, c) = e.angle.sin_cos();
    (0..n)
        .map(|i| {
            let t = t0 + (t1 - t0) * i as f64 / (n - 1) as f64;
            let (px, py) = (e.a * t.cos(), e.b * t.sin());
            Point::new(
                (e.cx + c * px - s * py).round() as i32,
                (e.cy + s * px + c * py).round() as i32,
            )
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let e = Ellipse::new(160.0, 120.0, 45.0, 32.0, 0.4);
    let pts = arc_points(&e, 0.0, std::f64::consts::TAU, 400);
    c.bench_function("fit_ellipse_pixels_400", |b| {
        b.iter(|| fit_ellipse_pixels(black_box(&pts)))
    });
}

fn bench_merge_search(c: &mut Criterion) {
    let e = Ellipse::new(160.0, 120.0, 45.0, 32.0, 0.4);
    let step = std::f64::consts::TAU / 8.0;
    let mut segments: Vec<Vec<Point<i32>>> = (0..8)
        .map(|k| arc_points(&e, k as f64 * step, (k as f64 + 0.9) * step, 30))
        .collect();
    let clutter = Ellipse::circle(60.0, 60.0, 15.0);
    segments.extend((0..4).map(|k| arc_points(&clutter, k as f64, k as f64 + 1.2, 20)));
    let config = SearchConfig::default();

    c.bench_function("merge_search_12_segments", |b| {
        b.iter(|| {
            let mut test = FitVarianceTest::new(&segments, 1.8);
            merge_search(black_box(segments.len()), &[0, 1], &config, &mut test)
        })
    });
}

fn bench_decompose(c: &mut Criterion) {
    let img = synthetic_eye(320, 240, &Ellipse::new(160.0, 120.0, 45.0, 32.0, 0.4), 0, 1);
    let edges = imageproc::edges::canny(&img, 20.0, 40.0);
    c.bench_function("decompose_320x240", |b| {
        b.iter(|| decompose(black_box(&edges), 5))
    });
}

fn bench_detect(c: &mut Criterion) {
    let img = synthetic_eye(320, 240, &Ellipse::new(160.0, 120.0, 40.0, 30.0, 0.3), 6, 7);
    let params = DetectionParameters::default();
    c.bench_function("detect_320x240", |b| {
        b.iter(|| {
            let mut detector = Detector::new();
            detector.detect(
                &FrameInput::full_frame(black_box(&img), 0.0),
                &params,
                Overlays::none(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_fit,
    bench_merge_search,
    bench_decompose,
    bench_detect
);
criterion_main!(benches);
