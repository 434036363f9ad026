use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::SubmissionPage;

const SUBMISSIONS_ENDPOINT: &str = "api/v2/submissions";

#[derive(Deserialize)]
struct ApiResponse {
    data: SubmissionPage,
}

/// What the judge answered for one page request.
#[derive(Debug)]
pub enum PageResponse {
    Page(SubmissionPage),
    /// Anything but 200: there is no data for this user (or this page).
    NoData(StatusCode),
}

impl PageResponse {
    pub fn into_page(self) -> Option<SubmissionPage> {
        match self {
            PageResponse::Page(page) => Some(page),
            PageResponse::NoData(_) => None,
        }
    }
}

/// Thin client over the judge's submission listing.
#[derive(Debug, Clone)]
pub struct JudgeClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl JudgeClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Could not build the HTTP client.")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetches one page of `username`'s submissions. Without a `page` the judge serves the first one.
    ///
    /// A non-200 answer is `PageResponse::NoData` with its status. A failed request or a body
    /// that isn't a submission page is an error.
    pub async fn fetch_page(&self, username: &str, page: Option<u32>) -> Result<PageResponse> {
        log::trace!("[fetch_page] Requesting page {page:?} of {username}'s submissions...");

        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, SUBMISSIONS_ENDPOINT))
            .query(&[("user", username)]);
        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request for {username}'s submissions failed"))?;

        let status = response.status();
        if status != StatusCode::OK {
            log::warn!("[fetch_page] Judge answered {status} for {username} (page {page:?})");
            return Ok(PageResponse::NoData(status));
        }

        let body = response
            .json::<ApiResponse>()
            .await
            .with_context(|| format!("Malformed submission page for {username}"))?;

        Ok(PageResponse::Page(body.data))
    }
}
