// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! pokegate: a bearer-token protected JSON gateway over the PokeAPI catalog.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod model;
pub mod pokemon;
pub mod upstream;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use api::AppState;

/// Build the application router. Only the `/pokemon` routes require a token.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/pokemon/type/:name", get(api::pokemon_types))
        .route("/pokemon/type/random/:type_name", get(api::random_by_type))
        .route("/pokemon/type/longer/:type_name", get(api::longest_name_by_type))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            guard::require_bearer,
        ));

    Router::new()
        .route("/healthz", get(api::health))
        .route("/metrics", get(api::metrics))
        .route("/login", post(api::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
