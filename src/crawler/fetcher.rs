//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during a run:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests for HTML pages and feeds
//! - Document downloads with their own, longer timeout
//! - Error classification into [`FetchError`]

use crate::config::HttpConfig;
use crate::FetchError;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    pub body: String,
}

/// A successfully downloaded document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// Builds the HTTP client shared by all workers
///
/// The client-wide timeout is the page timeout; downloads override it per
/// request.
///
/// # Example
///
/// ```no_run
/// use leafcutter::config::HttpConfig;
/// use leafcutter::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches an HTML page
///
/// | Condition | Result |
/// |-----------|--------|
/// | Non-2xx status | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection, TLS or redirect failure | `FetchError::Transport` |
/// | Content-Type present and not HTML | `FetchError::ContentMismatch` |
/// | Body cannot be read | `FetchError::Body` |
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = send(client.get(url.clone()), url).await?;
    let final_url = response.url().clone();

    if let Some(content_type) = header_value(&response, CONTENT_TYPE) {
        if !is_html(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }
    }

    let body = response.text().await.map_err(|e| body_error(url, e))?;

    Ok(FetchedPage { final_url, body })
}

/// Fetches a text resource such as a feed, without a content-type check
pub async fn fetch_text(client: &Client, url: &Url) -> Result<String, FetchError> {
    let response = send(client.get(url.clone()), url).await?;
    response.text().await.map_err(|e| body_error(url, e))
}

/// Downloads a document as raw bytes using `timeout` instead of the page timeout
pub async fn fetch_document(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<FetchedDocument, FetchError> {
    let response = send(client.get(url.clone()).timeout(timeout), url).await?;
    let content_type = header_value(&response, CONTENT_TYPE);
    let content_disposition = header_value(&response, CONTENT_DISPOSITION);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| body_error(url, e))?
        .to_vec();

    Ok(FetchedDocument {
        content_type,
        content_disposition,
        bytes,
    })
}

async fn send(request: reqwest::RequestBuilder, url: &Url) -> Result<Response, FetchError> {
    let response = request.send().await.map_err(|e| request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn request_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

fn body_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
