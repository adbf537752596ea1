//! Screen and executor benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tatami_term::core::Screen;
use tatami_term::Terminal;

fn bench_print_glyphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    let text = "Hello, World! ".repeat(10);
    group.bench_function("print_glyphs", |b| {
        b.iter(|| {
            let mut screen = Screen::new(80, 24, 0);
            for ch in text.chars() {
                screen.print(ch);
            }
            black_box(screen)
        })
    });

    group.finish();
}

fn bench_scroll_through(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    let mut lines = String::new();
    for i in 0..100 {
        lines.push_str(&format!("Line {i}: some text content here\r\n"));
    }
    group.throughput(Throughput::Bytes(lines.len() as u64));

    group.bench_function("scroll_through", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, 1000);
            term.process(black_box(lines.as_bytes()));
            black_box(term)
        })
    });

    group.finish();
}

fn bench_sgr_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    let input = "\x1b[H\x1b[2J\x1b[1;31mHello\x1b[0m".repeat(100);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("sgr_heavy", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, 0);
            term.process(black_box(input.as_bytes()));
            black_box(term)
        })
    });

    group.finish();
}

fn bench_full_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    // A full-screen repaint the way vim does one.
    let mut input = String::new();
    for row in 1..=24 {
        input.push_str(&format!("\x1b[{row};1H"));
        input.push_str(&"X".repeat(80));
    }
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("full_redraw", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, 0);
            term.process(black_box(input.as_bytes()));
            black_box(term)
        })
    });

    group.finish();
}

fn bench_resize_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    let fill = "Hello, World!\r\n".repeat(20);
    group.bench_function("resize_cycle", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, 100);
            term.process(fill.as_bytes());
            term.resize(120, 40);
            term.resize(80, 24);
            term.resize(132, 50);
            black_box(term)
        })
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    let mut term = Terminal::new(80, 24, 100);
    let fill = "All work and no play makes Jack a dull boy.\r\n".repeat(30);
    term.process(fill.as_bytes());

    group.bench_function("snapshot", |b| b.iter(|| black_box(term.snapshot())));

    group.finish();
}

criterion_group!(
    benches,
    bench_print_glyphs,
    bench_scroll_through,
    bench_sgr_heavy,
    bench_full_redraw,
    bench_resize_cycle,
    bench_snapshot
);

criterion_main!(benches);
