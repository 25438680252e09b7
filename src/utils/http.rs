// src/utils/http.rs

//! HTTP client utilities.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,

    /// Raw `Content-Type` header, parameters included
    pub content_type: Option<String>,

    /// Body bytes; left empty for statuses of 400 and above
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Outbound HTTP used by discovery, extraction and downloads.
///
/// One transport is shared by every worker of a stage. Errors mean the
/// request did not produce a response (connect, timeout, body read);
/// rejecting statuses come back as a normal [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<HttpResponse>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn fetch(&self, url: &str) -> Result<HttpResponse> {
        let response = self.get(url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if status >= 400 {
            Vec::new()
        } else {
            response.bytes().await?.to_vec()
        };

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page that must be HTML.
///
/// Non-2xx statuses and non-HTML content types are rejections, not retried.
pub async fn fetch_html(transport: &dyn Transport, url: &str) -> Result<String> {
    let response = transport.fetch(url).await?;
    if !response.is_success() {
        return Err(AppError::status(url, response.status));
    }
    if !response.is_html() {
        return Err(AppError::NotHtml {
            url: url.to_string(),
            content_type: response.content_type.unwrap_or_default(),
        });
    }
    Ok(response.text().into_owned())
}
