//! Benchmarks for packfs sync throughput

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use packfs::Archive;
use tempfile::TempDir;

/// Build an unsynced archive holding `count` small files
fn populate(dir: &TempDir, count: usize) -> Archive {
    let source = dir.path().join("payload.src");
    std::fs::write(&source, vec![0xA5u8; 4096]).unwrap();

    let path = dir.path().join(format!("bench_{}.pack", count));
    let _ = std::fs::remove_file(&path);

    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    for i in 0..count {
        archive
            .add_file(root, &format!("file_{:04}", i), &source)
            .unwrap();
    }
    archive
}

fn sync_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();

    c.bench_function("sync_100_files", |b| {
        b.iter_batched(
            || populate(&dir, 100),
            |mut archive| archive.sync().unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("remove_half_and_compact", |b| {
        b.iter_batched(
            || {
                let mut archive = populate(&dir, 100);
                archive.sync().unwrap();
                let root = archive.root();
                let doomed: Vec<usize> = archive
                    .entries(root)
                    .map(|(index, _)| index)
                    .step_by(2)
                    .collect();
                for index in doomed.into_iter().rev() {
                    archive.remove(root, index);
                }
                archive
            },
            |mut archive| archive.sync().unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, sync_benchmarks);
criterion_main!(benches);
