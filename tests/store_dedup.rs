// tests/store_dedup.rs
use chrono::{Duration, Utc};
use krx_news_aggregator::{InsertOutcome, NewNewsRecord, NewsStore, SourceType};

fn record(source: SourceType, title: &str, link: &str, age_days: i64) -> NewNewsRecord {
    NewNewsRecord {
        source_type: source,
        symbol_code: "005930".into(),
        symbol_name: "삼성전자".into(),
        title: title.into(),
        link: link.into(),
        occurred_at: Utc::now() - Duration::days(age_days),
        feature_tag: "수주".into(),
        status_label: "오늘".into(),
    }
}

#[test]
fn no_two_records_share_link_or_title() {
    let store = NewsStore::new();
    store.insert(record(SourceType::KeywordSearch, "t1", "l1", 0));
    store.insert(record(SourceType::KeywordSearch, "t2", "l1", 0)); // link dup
    store.insert(record(SourceType::Syndicated, "t1", "l3", 0)); // title dup
    store.insert(record(SourceType::Syndicated, "t3", "l3b", 0));
    assert_eq!(store.len(), 2);
}

#[test]
fn repolling_the_same_batch_is_idempotent() {
    let store = NewsStore::new();
    let batch: Vec<NewNewsRecord> = (0..10)
        .map(|i| record(SourceType::Disclosure, &format!("t{i}"), &format!("l{i}"), 0))
        .collect();

    for rec in batch.clone() {
        assert!(matches!(store.insert(rec), InsertOutcome::Inserted(_)));
    }
    let after_first = store.len();
    for rec in batch {
        assert_eq!(store.insert(rec), InsertOutcome::Duplicate);
    }
    assert_eq!(store.len(), after_first);
}

#[test]
fn sweep_leaves_nothing_older_than_the_threshold() {
    let store = NewsStore::new();
    for (i, age) in [0i64, 1, 2, 4, 7].iter().enumerate() {
        store.insert(record(
            SourceType::Syndicated,
            &format!("t{i}"),
            &format!("l{i}"),
            *age,
        ));
    }
    let cutoff = Utc::now() - Duration::days(3);
    let removed = store.delete_older_than(cutoff);
    assert_eq!(removed, 2);
    assert!(store
        .by_source(SourceType::Syndicated)
        .iter()
        .all(|r| r.occurred_at >= cutoff));
}

#[test]
fn partition_sort_is_recency_desc_with_stable_ties() {
    let store = NewsStore::new();
    let ts = Utc::now();
    for i in 0..3 {
        let mut rec = record(SourceType::KeywordSearch, &format!("tie{i}"), &format!("tl{i}"), 0);
        rec.occurred_at = ts;
        store.insert(rec);
    }
    let mut newer = record(SourceType::KeywordSearch, "newest", "tln", 0);
    newer.occurred_at = ts + Duration::seconds(5);
    store.insert(newer);

    let out = store.by_source(SourceType::KeywordSearch);
    assert_eq!(out[0].title, "newest");
    // Equal timestamps keep insertion order (id ascending).
    let tie_ids: Vec<u64> = out[1..].iter().map(|r| r.id).collect();
    let mut sorted = tie_ids.clone();
    sorted.sort_unstable();
    assert_eq!(tie_ids, sorted);
}

#[test]
fn partitions_do_not_leak_into_each_other() {
    let store = NewsStore::new();
    store.insert(record(SourceType::Disclosure, "d", "ld", 0));
    store.insert(record(SourceType::AuthenticatedFeed, "k", "lk", 0));
    assert_eq!(store.by_source(SourceType::Disclosure).len(), 1);
    assert_eq!(store.by_source(SourceType::AuthenticatedFeed).len(), 1);
    assert!(store.by_source(SourceType::Syndicated).is_empty());
}
