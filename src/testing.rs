//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::utils::http::{HttpResponse, Transport};

/// In-memory transport serving canned responses.
///
/// Counts calls per URL and records the highest number of requests that
/// were in flight at the same time.
#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, HttpResponse>,
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<HashMap<String, usize>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every request open for `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Serve `html` with status 200 and an HTML content type.
    pub fn page(self, url: &str, html: &str) -> Self {
        self.respond(url, 200, "text/html; charset=utf-8", html.as_bytes())
    }

    pub fn respond(mut self, url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpResponse {
                status,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    /// Fail the first `times` requests to `url` with a connection reset.
    pub fn fail_first(self, url: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, url: &str) -> Result<HttpResponse> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url).filter(|r| **r > 0) {
                *remaining -= 1;
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    format!("connection reset by {url}"),
                )));
            }
        }

        Ok(self.routes.get(url).cloned().unwrap_or(HttpResponse {
            status: 404,
            content_type: Some("text/html".into()),
            body: Vec::new(),
        }))
    }
}
