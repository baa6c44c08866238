//! This bench test simulates building a wide, shallow tree one item at a time.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use treestore::{Item, TreeStore};

fn add_many(c: &mut Criterion) {
    c.bench_function("add many", |b| {
        b.iter_batched(
            TreeStore::default,
            |mut store| {
                for i in 0..100 {
                    store.add_item(Item::root(i, format!("root {i}"))).unwrap();
                    for j in 0..10 {
                        let id = format!("{i}-{j}");
                        store.add_item(Item::child(id, i, "leaf")).unwrap();
                    }
                }
                store
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, add_many);
criterion_main!(benches);
