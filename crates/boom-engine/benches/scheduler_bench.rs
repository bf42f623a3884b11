use std::sync::Arc;

use boom_engine::{pattern_slot, Processor, SharedParams};
use boom_ir::{Bars, Pattern, TimeSignature, TransportSnapshot};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn busy_pattern() -> Pattern {
    // Every 16th step of 8 bars on all seven lanes
    let mut pattern = Pattern::new();
    for step in 0..128 {
        for row in 0..7 {
            pattern.toggle_drum_cell(row, step);
        }
    }
    pattern
}

fn bench_process_block(c: &mut Criterion) {
    let (_tx, rx) = pattern_slot(Arc::new(busy_pattern()));
    let params = Arc::new(SharedParams::default());
    params.set_bars(Bars::Eight);
    let mut processor = Processor::new(rx, params);
    processor.prepare(48_000.0);

    let mut position = 0.0;
    c.bench_function("process_block 896 notes x 512", |b| {
        b.iter(|| {
            let transport = TransportSnapshot::playing(120.0, TimeSignature::FOUR_FOUR, position);
            let events = processor.process_block(Some(&transport), 512).len();
            position = (position + 512.0 / 24_000.0) % 32.0;
            black_box(events)
        })
    });
}

criterion_group!(benches, bench_process_block);
criterion_main!(benches);
