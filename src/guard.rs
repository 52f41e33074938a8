//! Bearer-token guard for the protected routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::AppState;
use crate::auth::{extract_bearer_token, AuthError, Subject};
use crate::error::AppError;

/// Axum middleware: verifies `Authorization: Bearer <token>` and injects the
/// token's [`Subject`] into request extensions.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let subject = match authorize(&state, &request) {
        Ok(subject) => subject,
        Err(err) => {
            state.metrics.record_auth_rejection();
            tracing::warn!(path = %request.uri().path(), reason = %err, "rejected protected request");
            return Err(err.into());
        }
    };

    request.extensions_mut().insert(subject);

    Ok(next.run(request).await)
}

fn authorize(state: &AppState, request: &Request) -> Result<Subject, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::InvalidToken))
        .transpose()?;

    let token = extract_bearer_token(header)?;
    state.tokens.authorize(token)
}
