use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memscan::marshal::{FieldReader, FieldWriter};
use memscan::{Address, Marshal, MemoryAccessor, MemorySnapshot, TypeDescriptor};

const MODULE_BASE: Address = Address::new(0x40_0000);

#[derive(Debug, Clone, Copy)]
struct Transform {
    position: [f32; 3],
    rotation: [f32; 4],
    visible: bool,
}

impl Marshal for Transform {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure()
            .fixed_buffer::<f32>("position", 3)
            .fixed_buffer::<f32>("rotation", 4)
            .field::<bool>("visible")
            .build()
    }

    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
        Some(Transform {
            position: reader.read()?,
            rotation: reader.read()?,
            visible: reader.read()?,
        })
    }

    fn marshal(&self, writer: &mut FieldWriter) {
        writer.write(&self.position);
        writer.write(&self.rotation);
        writer.write(&self.visible);
    }

    fn zeroed() -> Self {
        Transform {
            position: [0.0; 3],
            rotation: [0.0; 4],
            visible: false,
        }
    }
}

fn benchmark_memory_ops(c: &mut Criterion) {
    let snapshot = MemorySnapshot::new().with_module("bench.exe", MODULE_BASE, &[0u8; 0x1000]);
    let accessor = MemoryAccessor::new(snapshot).unwrap();

    c.bench_function("read_bytes_1k", |b| {
        b.iter(|| accessor.read_bytes(black_box(MODULE_BASE), 1024).unwrap())
    });

    c.bench_function("read_value_u64", |b| {
        b.iter(|| accessor.read_value::<u64>(black_box(MODULE_BASE)).unwrap())
    });

    c.bench_function("read_value_struct", |b| {
        b.iter(|| accessor.read_value::<Transform>(black_box(MODULE_BASE)).unwrap())
    });

    c.bench_function("write_value_u32", |b| {
        b.iter(|| accessor.write_value(black_box(MODULE_BASE), &0xABCDu32).unwrap())
    });
}

criterion_group!(benches, benchmark_memory_ops);
criterion_main!(benches);
