use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fitboost::models::Gym;
use fitboost::services::gyms::{sort_gyms, GymSort};
use fitboost::services::{Catalog, MapService};
use std::hint::black_box;

/// Gyms scattered over a ~20 km square around central Bengaluru.
fn synthetic_gyms(count: usize) -> Vec<Gym> {
    let prices = [Some("$"), Some("$$"), Some("$$$"), None];
    (0..count)
        .map(|i| {
            let step = i as f64 / count as f64;
            Gym {
                id: format!("gym-{}", i),
                name: format!("Gym {}", i),
                address: format!("{} Main Road", i),
                description: None,
                amenities: vec!["Weights".to_string(), "Cardio".to_string()],
                // every tenth gym has no coordinates
                latitude: (i % 10 != 0).then(|| 12.85 + 0.2 * step),
                longitude: (i % 10 != 0).then(|| 77.50 + 0.2 * (1.0 - step)),
                price_range: prices[i % prices.len()].map(str::to_string),
                rating: 2.5 + (i % 25) as f64 / 10.0,
                created_at: Utc::now(),
            }
        })
        .collect()
}

fn benchmark_map_view(c: &mut Criterion) {
    let maps = MapService::new(
        fitboost::config::DEFAULT_TILE_URL,
        fitboost::config::DEFAULT_TILE_ATTRIBUTION,
    );
    let catalog = Catalog::load_from_file("data/catalog.json").expect("Failed to load catalog");

    let mut group = c.benchmark_group("map_view");

    group.bench_function("catalog_gyms", |b| {
        b.iter(|| maps.build_view(black_box(&catalog.gyms)))
    });
    group.bench_function("catalog_events", |b| {
        b.iter(|| maps.build_view(black_box(&catalog.events)))
    });

    for count in [100, 1_000, 10_000] {
        let gyms = synthetic_gyms(count);
        group.bench_with_input(BenchmarkId::new("synthetic_gyms", count), &gyms, |b, gyms| {
            b.iter(|| maps.build_view(black_box(gyms)))
        });
    }

    group.finish();
}

fn benchmark_sort(c: &mut Criterion) {
    let gyms = synthetic_gyms(1_000);

    c.bench_function("sort_gyms_price_low", |b| {
        b.iter(|| {
            let mut gyms = gyms.clone();
            sort_gyms(black_box(&mut gyms), GymSort::PriceLow);
            gyms
        })
    });
}

criterion_group!(benches, benchmark_map_view, benchmark_sort);
criterion_main!(benches);
