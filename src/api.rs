// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for the gateway.
//!
//! - `GET /healthz` - Service health check
//! - `GET /metrics` - Prometheus metrics export
//! - `POST /login` - Exchange credentials for a bearer token
//! - `GET /pokemon/type/{name}` - Types of a pokemon
//! - `GET /pokemon/type/random/{type}` - Random pokemon of a type
//! - `GET /pokemon/type/longer/{type}` - Longest pokemon name of a type
//!
//! The `/pokemon` routes sit behind [`crate::guard::require_bearer`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::auth::{AuthError, Subject, TokenService};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::model::{LoginRequest, LoginResponse, MemberResponse, TypesResponse};
use crate::pokemon::{self, MemberPicker, RandomPicker};
use crate::upstream::{Catalog, CatalogClient, MeteredCatalog};

#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub catalog: Arc<dyn Catalog>,
    pub picker: Arc<dyn MemberPicker>,
    pub metrics: Metrics,
}

impl AppState {
    /// Wire the catalog through metrics so every upstream call is observed.
    pub fn new(
        tokens: TokenService,
        catalog: Arc<dyn Catalog>,
        picker: Arc<dyn MemberPicker>,
        metrics: Metrics,
    ) -> Self {
        let catalog: Arc<dyn Catalog> = Arc::new(MeteredCatalog::new(catalog, metrics.clone()));
        Self {
            tokens,
            catalog,
            picker,
            metrics,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, AppError> {
        let tokens = TokenService::new(cfg.credentials.clone(), &cfg.jwt_secret);
        let client = CatalogClient::try_new(cfg.upstream_base_url.clone(), cfg.upstream_timeout())?;
        let metrics = Metrics::new()?;

        Ok(Self::new(
            tokens,
            Arc::new(client),
            Arc::new(RandomPicker),
            metrics,
        ))
    }
}

/// Health check endpoint
pub async fn health() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "pokegate",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.metrics.export()
}

/// Issue an access token for the configured credential pair
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    tracing::info!("login requested");

    // Empty or non-JSON bodies count as missing credentials.
    let request: LoginRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LoginRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "login body is not a credentials object");
            state.metrics.record_login_rejected();
            AppError::bad_request(AuthError::MissingCredentials.to_string())
        })?
    };

    match state
        .tokens
        .issue_token(request.username.as_deref(), request.password.as_deref())
    {
        Ok(token) => {
            state.metrics.record_login_issued();
            tracing::info!(subject = %token.subject.0, expires_at = %token.expires_at, "login succeeded");
            Ok(Json(LoginResponse {
                access_token: token.token,
            }))
        }
        Err(err @ AuthError::Signing(_)) => Err(err.into()),
        Err(err) => {
            state.metrics.record_login_rejected();
            tracing::warn!(reason = %err, "login rejected");
            Err(err.into())
        }
    }
}

/// Types of a pokemon, in catalog order
pub async fn pokemon_types(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(name): Path<String>,
) -> Result<Json<TypesResponse>, AppError> {
    tracing::debug!(subject = %subject.0, "pokemon types requested");
    let response = pokemon::get_types(state.catalog.as_ref(), &name).await?;
    Ok(Json(response))
}

/// Random pokemon belonging to a type
pub async fn random_by_type(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(type_name): Path<String>,
) -> Result<Json<MemberResponse>, AppError> {
    tracing::debug!(subject = %subject.0, "random pokemon requested");
    let response =
        pokemon::get_random_by_type(state.catalog.as_ref(), state.picker.as_ref(), &type_name)
            .await?;
    Ok(Json(response))
}

/// Pokemon with the longest name within a type
pub async fn longest_name_by_type(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(type_name): Path<String>,
) -> Result<Json<MemberResponse>, AppError> {
    tracing::debug!(subject = %subject.0, "longest pokemon name requested");
    let response = pokemon::get_longest_name_by_type(state.catalog.as_ref(), &type_name).await?;
    Ok(Json(response))
}
