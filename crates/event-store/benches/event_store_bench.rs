use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, EventEnvelope, GlobalPosition, InMemoryEventStore, Version, store::EventStore,
};

fn make_event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Order")
        .event_type("OrderCreated")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "type": "OrderCreated",
            "data": { "order_id": aggregate_id.to_string(), "total_cents": 2500 }
        }))
        .build()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let event = make_event(agg_id, 1);
                store
                    .append(vec![event], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let events: Vec<EventEnvelope> = (1..=10).map(|v| make_event(agg_id, v)).collect();
                store.append(events, AppendOptions::new()).await.unwrap();
            });
        });
    });
}

fn bench_replay_100_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let agg_id = AggregateId::new();

    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
        store.append(events, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("event_store/replay_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.get_events_for_aggregate(agg_id).await.unwrap();
            });
        });
    });
}

fn bench_stream_all_events(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    // 1000 events across 10 aggregates
    rt.block_on(async {
        for _ in 0..10 {
            let agg_id = AggregateId::new();
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
            store.append(events, AppendOptions::new()).await.unwrap();
        }
    });

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = store
                    .stream_all_events_from(GlobalPosition::start())
                    .await
                    .unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_replay_100_events,
    bench_stream_all_events,
);
criterion_main!(benches);
