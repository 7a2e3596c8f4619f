//! Criterion benchmarks for the relative-motion filter.
//!
//! Run with:
//! ```bash
//! cargo bench --package remote-core --bench motion_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use remote_core::{MotionFilter, PixelDelta, ScreenSize};

fn bench_step(c: &mut Criterion) {
    // A sweep through all three acceleration bands plus deadzone samples.
    let samples: Vec<(f64, f64)> = (0..256)
        .map(|i| {
            let t = f64::from(i) / 64.0;
            (t.sin() * 0.9, t.cos() * 0.4)
        })
        .collect();

    c.bench_function("motion_filter_step_256", |b| {
        let mut filter = MotionFilter::default();
        b.iter(|| {
            for &(dx, dy) in &samples {
                black_box(filter.step(black_box(dx), black_box(dy)));
            }
        })
    });
}

fn bench_clamp(c: &mut Criterion) {
    let screen = ScreenSize::new(2560, 1440);
    c.bench_function("screen_offset_clamped", |b| {
        b.iter(|| {
            screen.offset_clamped(
                black_box((2550, 5)),
                black_box(PixelDelta { dx: 30, dy: -30 }),
            )
        })
    });
}

criterion_group!(benches, bench_step, bench_clamp);
criterion_main!(benches);
