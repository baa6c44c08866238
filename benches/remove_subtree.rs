//! This bench test simulates removing a large subtree from a deep hierarchy.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use treestore::{Item, ItemId, TreeStore};

/// Generates a binary tree with `count` nodes, numbered in level order.
fn binary_tree(count: i64) -> Vec<Item> {
    (0..count)
        .map(|i| {
            if i == 0 {
                Item::root(i, "root")
            } else {
                Item::child(i, (i - 1) / 2, format!("node {i}"))
            }
        })
        .collect()
}

fn remove_subtree(c: &mut Criterion) {
    let items = binary_tree(4_095);

    c.bench_function("remove subtree", |b| {
        b.iter_batched(
            || TreeStore::new(items.clone()),
            |mut store| {
                store.remove_item(&ItemId::Int(1));
                store
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, remove_subtree);
criterion_main!(benches);
