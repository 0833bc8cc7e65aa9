use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::{Arc, Barrier};

use chrono::Utc;
use outletops_auth::{Actor, PrincipalId};
use outletops_catalog::MeasuringUnit;
use outletops_core::{OutletId, ProductId};
use outletops_events::RecordingEmitter;
use outletops_infra::services::{NewOutlet, NewProduct, ServiceRegistry};
use outletops_infra::stock_store::{InMemoryStockStore, StockStore};
use outletops_inventory::plan_batch;

fn setup(products: usize, stock: i64) -> (ServiceRegistry, OutletId, Vec<ProductId>) {
    let services = ServiceRegistry::in_memory(Arc::new(RecordingEmitter::new()), 0);
    let owner = Actor::owner(PrincipalId::new());
    let outlet = services
        .catalog
        .register_outlet(
            &owner,
            NewOutlet {
                name: "Bench outlet".to_string(),
                address: "Nowhere".to_string(),
                contact: Default::default(),
            },
        )
        .unwrap()
        .id_typed();

    let ids: Vec<_> = (0..products)
        .map(|i| {
            let id = services
                .catalog
                .create_product(
                    &owner,
                    NewProduct {
                        name: format!("item-{i}"),
                        category: "bench".to_string(),
                        unit_price: 100,
                        measuring_unit: MeasuringUnit::Piece,
                    },
                )
                .unwrap()
                .id_typed();
            services.ledger.apply_delta(outlet, id, stock).unwrap();
            id
        })
        .collect();

    (services, outlet, ids)
}

fn bench_plan_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_batch");

    for size in [1usize, 10, 100] {
        let deltas: Vec<_> = (0..size).map(|_| (ProductId::new(), -1)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &deltas, |b, deltas| {
            b.iter(|| plan_batch(black_box(deltas), |_| 1_000).unwrap());
        });
    }

    group.finish();
}

fn bench_store_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("stock_store_commit");

    for size in [1usize, 10, 100] {
        let store = InMemoryStockStore::new();
        let outlet = OutletId::new();
        let credit: Vec<_> = (0..size).map(|_| (ProductId::new(), 1)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &credit, |b, credit| {
            b.iter(|| store.commit_batch(outlet, black_box(credit), Utc::now()).unwrap());
        });
    }

    group.finish();
}

fn bench_ledger_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_apply_batch");
    group.sample_size(200);

    let (services, outlet, products) = setup(10, i64::MAX / 4);
    let debit: Vec<_> = products.iter().map(|p| (*p, -1)).collect();
    group.bench_function("debit_10_products", |b| {
        b.iter(|| services.ledger.apply_batch(outlet, black_box(&debit)).unwrap());
    });

    group.finish();
}

fn bench_contended_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_contended");
    group.sample_size(20);

    for threads in [2usize, 4, 8] {
        let (services, outlet, products) = setup(4, i64::MAX / 4);
        let debit: Vec<_> = products.iter().map(|p| (*p, -1)).collect();
        group.throughput(Throughput::Elements((threads * 100) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let barrier = Barrier::new(threads);
                std::thread::scope(|s| {
                    for _ in 0..threads {
                        s.spawn(|| {
                            barrier.wait();
                            for _ in 0..100 {
                                services.ledger.apply_batch(outlet, &debit).unwrap();
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_plan_batch,
    bench_store_commit,
    bench_ledger_batches,
    bench_contended_ledger
);
criterion_main!(benches);
