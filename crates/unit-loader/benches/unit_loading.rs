use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use unit_format::UnitBinary;
use unit_loader::{Loader, LoaderConfig, MemorySearchPath, SystemLoader, UnitLoader};

fn hierarchy(depth: usize) -> MemorySearchPath {
    let mut search_path = MemorySearchPath::new();
    search_path.insert_unit(&UnitBinary::new_interface("bench.Marker"));
    search_path.insert_unit(&UnitBinary::new_class("bench.C0").implements("bench.Marker"));
    for i in 1..depth {
        search_path.insert_unit(
            &UnitBinary::new_class(format!("bench.C{i}"))
                .extends(format!("bench.C{}", i - 1))
                .field("value", "i64"),
        );
    }
    search_path
}

fn bench_loading(c: &mut Criterion) {
    let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(hierarchy(16)));

    c.bench_function("fresh_loader_deep_hierarchy", |b| {
        b.iter(|| {
            let loader = UnitLoader::new(LoaderConfig::new("bench"), system.clone()).unwrap();
            black_box(loader.load("bench.C15").unwrap())
        })
    });

    let warm = UnitLoader::new(LoaderConfig::new("bench"), system.clone()).unwrap();
    warm.load("bench.C15").unwrap();
    c.bench_function("cached_load", |b| {
        b.iter(|| black_box(warm.load(black_box("bench.C15")).unwrap()))
    });

    c.bench_function("unit_decode", |b| {
        let bytes = UnitBinary::new_class("bench.Decoded")
            .extends("bench.C0")
            .implements("bench.Marker")
            .field("a", "i32")
            .field("b", "bench.C1")
            .encode();
        b.iter(|| black_box(UnitBinary::decode(black_box(&bytes)).unwrap()))
    });
}

criterion_group!(benches, bench_loading);
criterion_main!(benches);
