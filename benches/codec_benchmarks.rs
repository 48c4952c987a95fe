//! Performance benchmarks for frame conversion
//!
//! Conversion runs on the worker pool ahead of every upload, so regressions
//! here show up directly as upload latency.

use criterion::{Criterion, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pixer::codec::{DEFAULT_HEIGHT, DEFAULT_WIDTH, ImageCodec, pack_4bit};
use std::hint::black_box;
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// Benchmark nibble packing of a full panel
fn benchmark_packing(c: &mut Criterion) {
    let samples: Vec<u8> = (0..(DEFAULT_WIDTH * DEFAULT_HEIGHT))
        .map(|i| (i % 256) as u8)
        .collect();

    c.bench_function("pack_4bit_native_panel", |b| {
        b.iter(|| black_box(pack_4bit(black_box(&samples))));
    });
}

/// Benchmark rendering of an already decoded image
fn benchmark_render(c: &mut Criterion) {
    let codec = ImageCodec::default();
    let landscape = gradient(2000, 1500);
    let portrait = gradient(1500, 2000);

    c.bench_function("render_landscape", |b| {
        b.iter(|| black_box(codec.render(landscape.clone())));
    });

    c.bench_function("render_portrait", |b| {
        b.iter(|| black_box(codec.render(portrait.clone())));
    });
}

/// Benchmark the whole decode and convert path from PNG bytes
fn benchmark_process(c: &mut Criterion) {
    let codec = ImageCodec::default();
    let mut png = Vec::new();
    gradient(1200, 900)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("Failed to encode benchmark image");

    c.bench_function("process_png", |b| {
        b.iter(|| black_box(codec.process(black_box(&png))));
    });
}

criterion_group!(
    benches,
    benchmark_packing,
    benchmark_render,
    benchmark_process
);
criterion_main!(benches);
