use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memscan::{Address, MemoryAccessor, MemoryPattern, MemorySnapshot, ScanOptions};

const MODULE_BASE: Address = Address::new(0x40_0000);

fn module(size: usize) -> MemoryAccessor<MemorySnapshot> {
    let mut image: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
    let needle = [0x48, 0x8B, 0x05, 0x11, 0x22, 0x33, 0x44, 0xC3];
    image[size - 64..size - 64 + needle.len()].copy_from_slice(&needle);

    let snapshot = MemorySnapshot::new().with_module("bench.exe", MODULE_BASE, &image);
    MemoryAccessor::new(snapshot).unwrap()
}

fn benchmark_scan(c: &mut Criterion) {
    let pattern = MemoryPattern::new("global", "48 8B 05 ?? ?? ?? ?? C3", []).unwrap();
    let mut group = c.benchmark_group("pattern_scan");

    for size in [1 << 16, 1 << 20] {
        let accessor = module(size);
        group.throughput(Throughput::Bytes(size as u64));

        for chunk_size in [4096usize, 65536] {
            let options = ScanOptions { chunk_size };
            group.bench_with_input(
                BenchmarkId::new(format!("chunk_{}", chunk_size), size),
                &options,
                |b, options| {
                    b.iter(|| {
                        let count = pattern
                            .find_with(&accessor, options)
                            .unwrap()
                            .filter(Result::is_ok)
                            .count();
                        black_box(count)
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("pattern_parse", |b| {
        b.iter(|| MemoryPattern::new("parse", black_box("48 8B 05 ?? ?? ?? ?? xx 90 C3"), []))
    });
}

criterion_group!(benches, benchmark_scan, benchmark_parse);
criterion_main!(benches);
