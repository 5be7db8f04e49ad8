// src/core/http.rs

//! The HTTP collaborator. Owns every network concern the engine delegates:
//! user agent, TLS verification, redirects, per-request timeouts, retries
//! with backoff, inter-request rate limiting and request statistics. A
//! request never raises — transport failure comes back as a
//! `FetchedResponse` with the `error` field set.

use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use crate::config::ScanConfig;

/// A captured HTTP exchange in the shape the engine scores against.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub headers: HeaderMap,
    pub cookie_header: String,
    pub body: String,
    pub response_time: f64,
    pub error: Option<String>,
}

impl FetchedResponse {
    fn failed(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: 0,
            headers: HeaderMap::new(),
            cookie_header: String::new(),
            body: String::new(),
            response_time: 0.0,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClientStats {
    pub total_requests: u64,
    pub errors: u64,
}

pub struct HttpClient {
    client: Client,
    client_no_redirect: Client,
    max_retries: u32,
    retry_delay: Duration,
    rate_limit: Duration,
    last_request: Mutex<Option<Instant>>,
    request_count: AtomicU64,
    error_count: AtomicU64,
}

impl HttpClient {
    pub fn new(config: &ScanConfig) -> reqwest::Result<Self> {
        let builder = || {
            Client::builder()
                .user_agent(config.user_agent.clone())
                .danger_accept_invalid_certs(!config.verify_ssl)
        };
        Ok(Self {
            client: builder().build()?,
            client_no_redirect: builder().redirect(Policy::none()).build()?,
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            rate_limit: Duration::from_millis(config.rate_limit_ms),
            last_request: Mutex::new(None),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        })
    }

    /// Issues a GET and always returns a response record; after
    /// `max_retries` failed attempts the record carries the last transport
    /// error instead of a body.
    pub async fn get(&self, url: &str, timeout: Duration, allow_redirects: bool) -> FetchedResponse {
        let client = if allow_redirects {
            &self.client
        } else {
            &self.client_no_redirect
        };

        let mut last_error = String::new();
        for attempt in 0..self.max_retries {
            self.enforce_rate_limit().await;
            let started = Instant::now();

            match client.get(url).timeout(timeout).send().await {
                Ok(response) => {
                    let final_url = response.url().to_string();
                    let status_code = response.status().as_u16();
                    let headers = response.headers().clone();
                    let cookie_header = headers
                        .get_all(SET_COOKIE)
                        .iter()
                        .filter_map(|value| value.to_str().ok())
                        .collect::<Vec<_>>()
                        .join("; ");

                    match response.text().await {
                        Ok(body) => {
                            let response_time = started.elapsed().as_secs_f64();
                            self.request_count.fetch_add(1, Ordering::Relaxed);
                            debug!(url, status_code, response_time, "GET completed.");
                            return FetchedResponse {
                                url: url.to_string(),
                                final_url,
                                status_code,
                                headers,
                                cookie_header,
                                body,
                                response_time,
                                error: None,
                            };
                        }
                        Err(e) => last_error = format!("Failed to read response body: {}", e),
                    }
                }
                Err(e) => last_error = e.to_string(),
            }

            warn!(
                url,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                error = %last_error,
                "Request failed."
            );
            if attempt + 1 < self.max_retries {
                // Linear backoff, as in the scanner this client fronts for.
                sleep(self.retry_delay * (attempt + 1)).await;
            }
        }

        self.error_count.fetch_add(1, Ordering::Relaxed);
        error!(url, retries = self.max_retries, error = %last_error, "Request failed after all retries.");
        FetchedResponse::failed(url, last_error)
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            total_requests: self.request_count.load(Ordering::Relaxed),
            errors: self.error_count.load(Ordering::Relaxed),
        }
    }

    /// Keeps at least `rate_limit` between request starts. One request at a
    /// time holds the slot; probes and phase fetches all go through here.
    async fn enforce_rate_limit(&self) {
        if self.rate_limit.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.rate_limit {
                sleep(self.rate_limit - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
