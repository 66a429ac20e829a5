use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rust_decimal::Decimal;

use billcraft_core::{LineItemId, VatRate};
use billcraft_totals::{compute_totals, DiscountConfig, LineItem};

fn items(count: usize) -> Vec<LineItem> {
    (0..count)
        .map(|i| LineItem {
            id: LineItemId::new(),
            product_ref: None,
            name: format!("position {i}"),
            quantity: Decimal::from((i % 40) as u32 + 1),
            unit: "m2".to_string(),
            unit_price: Decimal::new(1250 + (i % 300) as i64, 2),
            vat_rate: VatRate::Standard,
            discount_percent: Decimal::from((i % 25) as u32),
        })
        .collect()
}

fn bench_compute_totals(c: &mut Criterion) {
    let config = DiscountConfig {
        use_per_item_discount: true,
        use_global_discount: true,
        global_discount_percent: Decimal::from(5u32),
        ..DiscountConfig::default()
    };

    let mut group = c.benchmark_group("compute_totals");
    for size in [5usize, 50, 500] {
        let items = items(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| compute_totals(black_box(items), black_box(&config)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_totals);
criterion_main!(benches);
