use common::{BuyerId, OrderId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, Money, Order, OrderItem, ProductId};

fn sample_items(count: i64) -> Vec<OrderItem> {
    (1..=count)
        .map(|product| {
            OrderItem::new(
                ProductId::new(product),
                format!("Product {product}"),
                Money::from_cents(1000),
                Money::zero(),
                2,
            )
            .unwrap()
        })
        .collect()
}

fn bench_place_order(c: &mut Criterion) {
    let buyer_id = BuyerId::new();

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            Order::place(
                OrderId::new(1),
                buyer_id,
                Address::new("1 Main St", "Seattle", "WA", "US", "98101"),
                sample_items(5),
                None,
            )
            .unwrap()
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let buyer_id = BuyerId::new();

    c.bench_function("domain/full_lifecycle", |b| {
        b.iter(|| {
            let mut order = Order::place(
                OrderId::new(1),
                buyer_id,
                Address::default(),
                sample_items(3),
                None,
            )
            .unwrap();

            order.set_awaiting_validation_status().unwrap();
            order.set_stock_confirmed_status().unwrap();
            order.set_paid_status().unwrap();
            order.set_shipped_status().unwrap();
            order.take_events()
        });
    });
}

criterion_group!(benches, bench_place_order, bench_full_lifecycle);
criterion_main!(benches);
