use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, EventEnvelope, EventQuery, EventStoreExt, FileEventStore, InMemoryEventStore,
    Version, store::EventStore,
};

fn make_event(version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .event_type("set-bid")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "id": 252350,
            "bid": 7500
        }))
        .build()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                store
                    .append(vec![make_event(1)], AppendOptions::expect_empty())
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
                let events: Vec<EventEnvelope> = (1..=10).map(make_event).collect();
                store.append(events, AppendOptions::new()).await.unwrap();
            });
        });
    });
}

fn bench_file_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = rt
        .block_on(FileEventStore::open(dir.path().join("db.jsonl")))
        .unwrap();

    c.bench_function("event_store/file_append_synced", |b| {
        b.iter(|| {
            rt.block_on(async {
                let version = store.current_version().await.unwrap();
                store
                    .append_event(
                        make_event(version.next().as_i64()),
                        AppendOptions::expect_version(version),
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_query_by_type(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=1000).map(make_event).collect();
        store.append(events, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("event_store/query_from_version_500", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .query_events(EventQuery::new().from_version(Version::new(500)))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_replay_file_log(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.jsonl");

    rt.block_on(async {
        let store = FileEventStore::open(&path).await.unwrap();
        let events: Vec<EventEnvelope> = (1..=1000).map(make_event).collect();
        store.append(events, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("event_store/replay_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = FileEventStore::open(&path).await.unwrap();
                let events = store.load_all().await.unwrap();
                assert_eq!(events.len(), 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_file_append,
    bench_query_by_type,
    bench_replay_file_log,
);
criterion_main!(benches);
