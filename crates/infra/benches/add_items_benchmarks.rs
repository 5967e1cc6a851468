use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use satchel_core::{CharacterId, ItemId};
use satchel_infra::{BackpackService, InMemoryInventoryStore, InventoryStore};
use satchel_inventory::{Character, Item, SeedData};
use std::sync::Arc;
use tokio::runtime::Runtime;

const CHARACTER: CharacterId = CharacterId::new(1);

/// One featherweight item and a character that never runs out of room.
fn roomy_service() -> BackpackService<Arc<InMemoryInventoryStore>> {
    let seed = SeedData {
        items: vec![Item::new(ItemId::new(1), "feather", 1).expect("valid item")],
        characters: vec![
            Character::new(CHARACTER, "Bench", "Mark", 0, u32::MAX).expect("valid character"),
        ],
        ..SeedData::default()
    };
    BackpackService::new(Arc::new(
        InMemoryInventoryStore::from_seed(seed).expect("valid seed"),
    ))
}

fn bench_add_items_batch_sizes(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("add_items");

    for batch_size in [1usize, 10, 100].iter() {
        let batch = vec![ItemId::new(1); *batch_size];
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch,
            |b, batch| {
                // Fresh store per batch so the backpack does not grow across samples.
                b.iter_batched(
                    roomy_service,
                    |svc| {
                        rt.block_on(svc.add_items(CHARACTER, black_box(batch)))
                            .expect("batch admitted")
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_capacity_rejection(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let svc = BackpackService::new(Arc::new(
        InMemoryInventoryStore::seeded().expect("reference seed"),
    ));
    let over = [ItemId::new(1), ItemId::new(1)];

    c.bench_function("add_items_rejected_over_capacity", |b| {
        b.iter(|| {
            let result = rt.block_on(svc.add_items(CHARACTER, black_box(&over)));
            assert!(result.is_err());
        });
    });
}

fn bench_profile_read(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let store = Arc::new(InMemoryInventoryStore::seeded().expect("reference seed"));

    c.bench_function("character_profile", |b| {
        b.iter(|| rt.block_on(store.character_profile(black_box(CHARACTER))))
    });
}

criterion_group!(
    benches,
    bench_add_items_batch_sizes,
    bench_capacity_rejection,
    bench_profile_read
);
criterion_main!(benches);
