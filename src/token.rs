// src/token.rs
//! Bearer-credential lifecycle for the authenticated market-data feed.
//!
//! One cached token, refreshed via a client-credential exchange when it is
//! older than an hour. A failed refresh puts the manager into a 65 second
//! cooldown during which `obtain` returns nothing without touching the
//! upstream — the token endpoint rejects rapid retries, and hammering it only
//! extends the lockout.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
// tokio's Instant honors paused test time.
use tokio::time::Instant;
use tracing::{info, warn};

const TOKEN_TTL: Duration = Duration::from_secs(3600);
const FAILURE_COOLDOWN: Duration = Duration::from_secs(65);

/// The upstream exchange, kept behind a trait so tests can count calls.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<String>;
}

#[derive(Serialize)]
struct GrantRequest<'a> {
    grant_type: &'a str,
    appkey: &'a str,
    appsecret: &'a str,
}

#[derive(serde::Deserialize)]
struct GrantResponse {
    access_token: Option<String>,
}

/// Production exchange: POST the client-credential grant to the OAuth
/// endpoint and pull `access_token` out of the response.
pub struct ClientCredentialExchange {
    client: reqwest::Client,
    token_url: String,
    app_key: String,
    app_secret: String,
}

impl ClientCredentialExchange {
    pub fn new(client: reqwest::Client, base_url: &str, app_key: &str, app_secret: &str) -> Self {
        Self {
            client,
            token_url: format!("{}/oauth2/tokenP", base_url.trim_end_matches('/')),
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
        }
    }
}

#[async_trait]
impl TokenExchange for ClientCredentialExchange {
    async fn exchange(&self) -> Result<String> {
        let resp: GrantResponse = self
            .client
            .post(&self.token_url)
            .json(&GrantRequest {
                grant_type: "client_credentials",
                appkey: &self.app_key,
                appsecret: &self.app_secret,
            })
            .send()
            .await
            .context("token exchange request")?
            .json()
            .await
            .context("token exchange response body")?;
        resp.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("token response carried no access_token"))
    }
}

struct TokenState {
    token: Option<String>,
    issued_at: Option<Instant>,
    last_failure: Option<Instant>,
}

/// Owns the single cached credential. `obtain` is single-flight: the state
/// mutex is held across the refresh call, so concurrent callers wait for the
/// in-flight exchange and then see its result instead of issuing their own.
/// This is the only lock in the system held across a network call.
pub struct TokenManager {
    exchange: Box<dyn TokenExchange>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(exchange: Box<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            state: Mutex::new(TokenState {
                token: None,
                issued_at: None,
                last_failure: None,
            }),
        }
    }

    /// Returns the cached token while it is younger than an hour; otherwise
    /// refreshes. During the post-failure cooldown, returns `None` without an
    /// upstream call. `None` means "no credential this cycle" — the
    /// authenticated adapter skips silently on it.
    pub async fn obtain(&self) -> Option<String> {
        let mut state = self.state.lock().await;

        if let (Some(token), Some(issued_at)) = (&state.token, state.issued_at) {
            if issued_at.elapsed() < TOKEN_TTL {
                return Some(token.clone());
            }
        }

        if let Some(failed_at) = state.last_failure {
            if failed_at.elapsed() < FAILURE_COOLDOWN {
                warn!("token refresh suppressed, still in failure cooldown");
                return None;
            }
        }

        match self.exchange.exchange().await {
            Ok(token) => {
                info!("credential refreshed");
                state.token = Some(token.clone());
                state.issued_at = Some(Instant::now());
                state.last_failure = None;
                Some(token)
            }
            Err(e) => {
                warn!(error = ?e, "token refresh failed, entering cooldown");
                state.token = None;
                state.issued_at = None;
                state.last_failure = Some(Instant::now());
                None
            }
        }
    }
}
