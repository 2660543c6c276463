// Run with:  cargo bench --bench clear

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::prelude::*;
use mbi5034_panel::encoder::PixelEncoder;
use mbi5034_panel::framebuffer::FrameBuffer;
use mbi5034_panel::layout::{PanelLayout, Stack4x64x16};
use mbi5034_panel::Color;
use std::hint::black_box;

type Layout = Stack4x64x16;

const PLANES: usize = 5;
const BANKS: usize = Layout::BANKS;
const BYTES: usize = Layout::BYTES_PER_BANK;

fn clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("clear");
    group.throughput(Throughput::Bytes(FrameBuffer::<PLANES, BANKS, BYTES>::size_bytes() as u64));

    let frame = FrameBuffer::<PLANES, BANKS, BYTES>::new();

    group.bench_function("fill_black", |b| {
        b.iter(|| {
            black_box(&frame).clear(false);
        });
    });

    group.bench_function("draw_target_clear_colour", |b| {
        // not black or white, so this goes pixel by pixel
        let mut canvas = PixelEncoder::<Layout, PLANES, BANKS, BYTES>::new(&frame);

        b.iter(|| {
            black_box(&mut canvas).clear(black_box(Color::MAGENTA)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, clear);
criterion_main!(benches);
