// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics collection for the gateway.
//!
//! Tracks login outcomes, guard rejections and upstream call health.

use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

use crate::error::AppError;

/// Metrics collector for the gateway
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,

    // Authentication metrics
    pub logins_issued: IntCounter,
    pub logins_rejected: IntCounter,
    pub auth_rejections: IntCounter,

    // Upstream metrics
    pub upstream_requests: IntCounter,
    pub upstream_failures: IntCounter,
    pub upstream_latency: Histogram,
}

fn counter(name: &str, help: &str) -> Result<IntCounter, AppError> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))
}

impl Metrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let logins_issued = counter(
            "pokegate_logins_issued_total",
            "Total number of access tokens issued",
        )?;
        let logins_rejected = counter(
            "pokegate_logins_rejected_total",
            "Total number of login attempts rejected",
        )?;
        let auth_rejections = counter(
            "pokegate_auth_rejections_total",
            "Total number of protected requests rejected by the bearer guard",
        )?;
        let upstream_requests = counter(
            "pokegate_upstream_requests_total",
            "Total number of catalog requests attempted",
        )?;
        let upstream_failures = counter(
            "pokegate_upstream_failures_total",
            "Total number of catalog requests that did not yield a document",
        )?;

        let upstream_latency = Histogram::with_opts(
            HistogramOpts::new(
                "pokegate_upstream_latency_seconds",
                "Duration of catalog requests in seconds",
            )
            .buckets(vec![
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0, 10.0,
            ]),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))?;

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(logins_issued.clone()),
            Box::new(logins_rejected.clone()),
            Box::new(auth_rejections.clone()),
            Box::new(upstream_requests.clone()),
            Box::new(upstream_failures.clone()),
            Box::new(upstream_latency.clone()),
        ];
        for collector in collectors {
            registry.register(collector).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e))
            })?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            logins_issued,
            logins_rejected,
            auth_rejections,
            upstream_requests,
            upstream_failures,
            upstream_latency,
        })
    }

    pub fn record_login_issued(&self) {
        self.logins_issued.inc();
    }

    pub fn record_login_rejected(&self) {
        self.logins_rejected.inc();
    }

    pub fn record_auth_rejection(&self) {
        self.auth_rejections.inc();
    }

    /// Record the outcome of one catalog call
    pub fn record_upstream(&self, seconds: f64, succeeded: bool) {
        self.upstream_requests.inc();
        self.upstream_latency.observe(seconds);
        if !succeeded {
            self.upstream_failures.inc();
        }
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to convert metrics to string: {}",
                e
            ))
        })
    }
}
