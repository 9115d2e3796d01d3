//! HTTP fetch + server-side parse strategy.
//!
//! Cheap and fast, but exposed to bot detection and to markup that is only
//! rendered client-side. Browser-like headers keep the job board serving the
//! full results page.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::extraction::parser::parse_listings;
use crate::extraction::{ExtractError, JobSource};
use crate::models::job::JobListing;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scrapes the search results page with a single GET.
pub struct HttpJobSource {
    client: Client,
    origin: Url,
}

impl HttpJobSource {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
        headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
        if let Ok(referer) = HeaderValue::from_str(origin.as_str()) {
            headers.insert(header::REFERER, referer);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to build job site HTTP client")?;

        Ok(Self { client, origin })
    }

    /// `<origin>/search/?keywords=<urlencoded keyword>`
    pub fn search_url(&self, keyword: &str) -> Result<Url, ExtractError> {
        let mut url = self.origin.join("/search/")?;
        url.query_pairs_mut().append_pair("keywords", keyword);
        Ok(url)
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    async fn search(&self, keyword: &str) -> Result<Vec<JobListing>, ExtractError> {
        let url = self.search_url(keyword)?;

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Job site returned {status} for {url}");
            return Err(ExtractError::Transport {
                status: Some(status.as_u16()),
                message: format!("Upstream error: {status}"),
            });
        }

        let html = response.text().await?;
        let listings = parse_listings(&html, &self.origin);
        info!("Scraped {} jobs for query: {keyword}", listings.len());

        Ok(listings)
    }
}
