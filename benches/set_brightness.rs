// Run with:  cargo bench --bench set_brightness

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mbi5034_panel::control::{write_control, ControlRegister};
use mbi5034_panel::pins::Pins;
use mbi5034_panel::port::OutputPort;
use std::hint::black_box;

const BANKS: usize = 4;
const CHIPS: usize = mbi5034_panel::compute_chips_per_line(384, 1);

#[derive(Default)]
struct NullPort(u32);

impl OutputPort for NullPort {
    fn enable_outputs(&mut self, _mask: u32) {}

    fn write(&mut self, word: u32) {
        self.0 = black_box(word);
    }

    fn set_bits(&mut self, mask: u32) {
        self.0 = black_box(self.0 | mask);
    }

    fn clear_bits(&mut self, mask: u32) {
        self.0 = black_box(self.0 & !mask);
    }

    fn read(&self) -> u32 {
        self.0
    }
}

fn set_brightness(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_brightness");
    group.throughput(Throughput::Elements((BANKS * CHIPS * 16) as u64));

    let pins = Pins::ESP32_DEVKITC;

    group.bench_function("write_control", |b| {
        let mut port = NullPort::default();

        b.iter(|| {
            write_control(
                black_box(&mut port),
                &pins,
                BANKS,
                CHIPS,
                ControlRegister::from_percent(black_box(100)),
            );
        });
    });

    group.finish();
}

criterion_group!(benches, set_brightness);
criterion_main!(benches);
