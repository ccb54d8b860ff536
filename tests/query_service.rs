// tests/query_service.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use krx_news_aggregator::{ListQuery, NewNewsRecord, NewsStore, QueryService, SourceType};

fn seed(store: &NewsStore, n: usize) {
    for i in 0..n {
        store.insert(NewNewsRecord {
            source_type: SourceType::KeywordSearch,
            symbol_code: format!("{i:06}"),
            symbol_name: if i % 2 == 0 { "한빛소프트".into() } else { "기타종목".into() },
            title: format!("기사 {i} 수주 소식"),
            link: format!("https://news.example/{i}"),
            occurred_at: Utc::now() - Duration::minutes(i as i64),
            feature_tag: "수주".into(),
            status_label: "오늘".into(),
        });
    }
}

#[test]
fn pagination_matches_the_contract() {
    let store = Arc::new(NewsStore::new());
    seed(&store, 23);
    let svc = QueryService::new(store);

    let q = ListQuery {
        page: 0,
        size: 10,
        ..Default::default()
    };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert_eq!(page.total_elements, 23);
    assert_eq!(page.total_pages, Some(3));
    assert_eq!(page.content.len(), 10);

    let q = ListQuery { page: 2, size: 10, ..Default::default() };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert_eq!(page.content.len(), 3);

    // Out-of-range page is an empty answer, not an error.
    let q = ListQuery { page: 5, size: 10, ..Default::default() };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 23);
}

#[test]
fn client_mode_and_disabled_pagination_return_everything() {
    let store = Arc::new(NewsStore::new());
    seed(&store, 8);
    let svc = QueryService::new(store);

    let q = ListQuery { mode: "client".into(), page: 3, size: 2, ..Default::default() };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert_eq!(page.content.len(), 8);
    assert_eq!(page.total_pages, None);

    let q = ListQuery { pagination: false, ..Default::default() };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert_eq!(page.content.len(), 8);
}

#[test]
fn search_is_case_insensitive_across_title_name_and_code() {
    let store = Arc::new(NewsStore::new());
    store.insert(NewNewsRecord {
        source_type: SourceType::Syndicated,
        symbol_code: "A12345".into(),
        symbol_name: "XYZ Corp".into(),
        title: "급등 마감".into(),
        link: "l1".into(),
        occurred_at: Utc::now(),
        feature_tag: "급등".into(),
        status_label: "오늘".into(),
    });
    let svc = QueryService::new(store);

    for needle in ["xyz", "a12345", "급등"] {
        let q = ListQuery { search: needle.into(), ..Default::default() };
        let page = svc.get_list(SourceType::Syndicated, &q);
        assert_eq!(page.content.len(), 1, "needle {needle}");
    }

    let q = ListQuery { search: "없는말".into(), ..Default::default() };
    assert!(svc.get_list(SourceType::Syndicated, &q).content.is_empty());
}

#[test]
fn match_all_sentinel_and_good_news_shortcut() {
    let store = Arc::new(NewsStore::new());
    seed(&store, 3); // feature_tag "수주" — in the good-news set
    store.insert(NewNewsRecord {
        source_type: SourceType::KeywordSearch,
        symbol_code: String::new(),
        symbol_name: "네이버뉴스".into(),
        title: "평범한 기사".into(),
        link: "plain".into(),
        occurred_at: Utc::now(),
        feature_tag: "재료".into(),
        status_label: "오늘".into(),
    });
    let svc = QueryService::new(store);

    let q = ListQuery { search: "1".into(), ..Default::default() };
    assert_eq!(svc.get_list(SourceType::KeywordSearch, &q).total_elements, 4);

    let q = ListQuery { search: "3".into(), ..Default::default() };
    assert_eq!(svc.get_list(SourceType::KeywordSearch, &q).total_elements, 3);
}

#[test]
fn dashboard_mode_caps_at_five() {
    let store = Arc::new(NewsStore::new());
    seed(&store, 9);
    let svc = QueryService::new(store);
    let q = ListQuery { mode: "dashboard".into(), ..Default::default() };
    let page = svc.get_list(SourceType::KeywordSearch, &q);
    assert_eq!(page.content.len(), 5);
    assert_eq!(page.total_pages, None);
}

#[test]
fn every_read_sweeps_expired_records_first() {
    let store = Arc::new(NewsStore::new());
    store.insert(NewNewsRecord {
        source_type: SourceType::Disclosure,
        symbol_code: String::new(),
        symbol_name: "옛날회사".into(),
        title: "오래된 공시".into(),
        link: "old".into(),
        occurred_at: Utc::now() - Duration::days(10),
        feature_tag: "[재무미확인]".into(),
        status_label: "코스피".into(),
    });
    store.insert(NewNewsRecord {
        source_type: SourceType::Disclosure,
        symbol_code: String::new(),
        symbol_name: "새회사".into(),
        title: "새 공시".into(),
        link: "new".into(),
        occurred_at: Utc::now(),
        feature_tag: "[재무미확인]".into(),
        status_label: "코스피".into(),
    });
    let svc = QueryService::new(store.clone());
    let page = svc.get_list(SourceType::Disclosure, &ListQuery::default());
    assert_eq!(page.total_elements, 1);
    assert_eq!(store.len(), 1);
}
