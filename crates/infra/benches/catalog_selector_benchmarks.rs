use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use shopfront_catalog::{NewCategory, NewProduct, slugify};
use shopfront_core::UserId;
use shopfront_infra::CatalogService;
use shopfront_infra::store::{CatalogStore, CounterField, InMemoryCatalogStore};

/// Catalog of `size` products in one category, with spread-out views,
/// sales and likes so every ordering has work to do.
fn seeded_service(size: usize) -> CatalogService<Arc<InMemoryCatalogStore>> {
    let store = Arc::new(InMemoryCatalogStore::new());
    let svc = CatalogService::new(store.clone());
    let category = svc.create_category(NewCategory::named("Bench")).unwrap();
    let users: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();

    for i in 0..size {
        let viewed_at = Utc::now() - Duration::minutes(i as i64);
        let mut input = NewProduct::new(
            category.id,
            format!("Item {i}"),
            format!("SKU-{i}"),
            Decimal::new(100 + (i as i64 * 37) % 9_000, 2),
        );
        if i % 3 == 0 {
            input = input.hot();
        }
        let product = svc.create_product(input).unwrap();
        store
            .increment(product.id, CounterField::Views, (i % 50) as u64, viewed_at)
            .unwrap();
        store
            .increment(product.id, CounterField::Sales, (i % 17) as u64, viewed_at)
            .unwrap();
        for user in users.iter().take(i % users.len()) {
            store.add_like(*user, product.id).unwrap();
        }
    }
    svc
}

fn bench_selections(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_selections");

    for size in [100usize, 1_000, 10_000].iter() {
        let svc = seeded_service(*size);
        let anchor = svc.list_hot(Some(1)).unwrap().remove(0);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("trending", size), size, |b, _| {
            b.iter(|| black_box(svc.list_trending(None, None).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("popular", size), size, |b, _| {
            b.iter(|| black_box(svc.list_popular(None).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("up_sell", size), size, |b, _| {
            b.iter(|| black_box(svc.list_up_sell(anchor.id, None).unwrap()))
        });
    }

    group.finish();
}

fn bench_slug_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("slug_assignment");

    group.bench_function("slugify", |b| {
        b.iter(|| black_box(slugify(black_box("  Men's Organic Cotton T-Shirt (XL)  "))))
    });

    for duplicates in [0usize, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("create_with_duplicates", duplicates),
            duplicates,
            |b, &duplicates| {
                b.iter_with_setup(
                    || {
                        let svc = CatalogService::new(Arc::new(InMemoryCatalogStore::new()));
                        let category = svc.create_category(NewCategory::named("Mugs")).unwrap();
                        for i in 0..duplicates {
                            svc.create_product(NewProduct::new(
                                category.id,
                                "Blue Mug",
                                format!("MUG-{i}"),
                                Decimal::TEN,
                            ))
                            .unwrap();
                        }
                        (svc, category.id)
                    },
                    |(svc, category_id)| {
                        black_box(
                            svc.create_product(NewProduct::new(
                                category_id,
                                "Blue Mug",
                                "MUG-NEW",
                                Decimal::TEN,
                            ))
                            .unwrap(),
                        )
                    },
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_selections, bench_slug_assignment);
criterion_main!(benches);
