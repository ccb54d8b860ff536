// tests/token_lifecycle.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use krx_news_aggregator::{TokenExchange, TokenManager};

struct SlowExchange {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl TokenExchange for SlowExchange {
    async fn exchange(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.fail {
            Err(anyhow!("upstream rejected the grant"))
        } else {
            Ok(format!("token-{n}"))
        }
    }
}

#[tokio::test]
async fn concurrent_obtains_share_one_exchange() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mgr = Arc::new(TokenManager::new(Box::new(SlowExchange {
        calls: calls.clone(),
        delay: Duration::from_millis(50),
        fail: false,
    })));

    let a = {
        let mgr = mgr.clone();
        tokio::spawn(async move { mgr.obtain().await })
    };
    let b = {
        let mgr = mgr.clone();
        tokio::spawn(async move { mgr.obtain().await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    // Exactly one upstream exchange; both callers see the same token.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a, b);
    assert_eq!(a.unwrap(), "token-1");
}

#[tokio::test]
async fn failure_cooldown_suppresses_upstream_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mgr = TokenManager::new(Box::new(SlowExchange {
        calls: calls.clone(),
        delay: Duration::from_millis(1),
        fail: true,
    }));

    assert!(mgr.obtain().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Within the 65 s cooldown: no credential, zero new upstream calls.
    for _ in 0..3 {
        assert!(mgr.obtain().await.is_none());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

struct FlakyExchange {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TokenExchange for FlakyExchange {
    async fn exchange(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == 1 {
            Err(anyhow!("first attempt fails"))
        } else {
            Ok(format!("token-{n}"))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn retry_after_cooldown_succeeds_and_caches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mgr = TokenManager::new(Box::new(FlakyExchange { calls: calls.clone() }));

    assert!(mgr.obtain().await.is_none());
    assert!(mgr.obtain().await.is_none()); // still cooling down
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(66)).await;
    assert_eq!(mgr.obtain().await.as_deref(), Some("token-2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Cached now; the failure state is gone.
    assert_eq!(mgr.obtain().await.as_deref(), Some("token-2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn aged_out_token_triggers_a_fresh_exchange() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mgr = TokenManager::new(Box::new(SlowExchange {
        calls: calls.clone(),
        delay: Duration::from_millis(1),
        fail: false,
    }));

    assert_eq!(mgr.obtain().await.as_deref(), Some("token-1"));
    tokio::time::advance(Duration::from_secs(3599)).await;
    assert_eq!(mgr.obtain().await.as_deref(), Some("token-1"));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(mgr.obtain().await.as_deref(), Some("token-2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
