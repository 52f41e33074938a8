// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream client for the creature catalog.
//!
//! Performs exactly one GET per call and classifies the outcome. Every
//! non-2xx status is reported as `ResourceNotFound`; handlers only see the
//! classification, so splitting 404 from other statuses stays local to this
//! module.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;
use crate::metrics::Metrics;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned status {status}")]
    ResourceNotFound { status: StatusCode },
    #[error("upstream unreachable: {0}")]
    Unavailable(String),
    #[error("upstream returned a non-JSON body: {0}")]
    Malformed(String),
}

/// Read access to catalog resources addressed by kind and key
/// (`pokemon`, `pikachu`). The key is always sent as a single path segment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn fetch_resource(&self, kind: &str, key: &str) -> Result<Value, UpstreamError>;
}

/// HTTP client wrapper for talking to the upstream catalog.
#[derive(Clone)]
pub struct CatalogClient {
    base_url: String,
    client: Client,
}

impl CatalogClient {
    /// Construct a new upstream client with a bounded per-call timeout.
    pub fn try_new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// `None` for keys that cannot name a resource: empty, `.` and `..`
    /// would be collapsed by URL normalization even when percent-encoded.
    fn url_for(&self, kind: &str, key: &str) -> Option<String> {
        if matches!(key, "" | "." | "..") {
            return None;
        }

        Some(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            kind,
            urlencoding::encode(key)
        ))
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn fetch_resource(&self, kind: &str, key: &str) -> Result<Value, UpstreamError> {
        let Some(url) = self.url_for(kind, key) else {
            tracing::debug!(kind, key, "key cannot address a catalog resource");
            return Err(UpstreamError::ResourceNotFound {
                status: StatusCode::NOT_FOUND,
            });
        };
        tracing::debug!(%url, "fetching catalog resource");

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(%url, error = %e, "upstream request failed");
            UpstreamError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, %status, "upstream returned non-success status");
            return Err(UpstreamError::ResourceNotFound { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

/// Records latency and outcome of every call made through `inner`.
#[derive(Clone)]
pub struct MeteredCatalog {
    inner: Arc<dyn Catalog>,
    metrics: Metrics,
}

impl MeteredCatalog {
    pub fn new(inner: Arc<dyn Catalog>, metrics: Metrics) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl Catalog for MeteredCatalog {
    async fn fetch_resource(&self, kind: &str, key: &str) -> Result<Value, UpstreamError> {
        let start = tokio::time::Instant::now();
        let result = self.inner.fetch_resource(kind, key).await;
        self.metrics
            .record_upstream(start.elapsed().as_secs_f64(), result.is_ok());
        result
    }
}
