//! Request gate: bearer-token authentication extractor.
//!
//! Handlers that need a caller identity take [`RequireIdentity`] as an
//! argument. Extraction fails before the handler body runs, so a request
//! with a missing or rejected credential never reaches the ledger. The gate
//! does not look at the request body; ownership is checked downstream.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use volunteer_board_core::VerifiedIdentity;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

const NO_TOKEN: &str = "Unauthorized - No token provided";

/// Extractor that requires a verified bearer credential.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireIdentity(caller): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", caller.email)
/// }
/// ```
pub struct RequireIdentity(pub VerifiedIdentity);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.verifier().verify(token).await?;

        set_sentry_user(&identity.subject_id, identity.email.as_str());
        tracing::debug!(
            subject = %identity.subject_id,
            email = %identity.email,
            "Caller authenticated"
        );

        Ok(Self(identity))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns `AppError::Unauthenticated` if the header is missing, not valid
/// ASCII, not a bearer credential, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let unauthenticated = || AppError::Unauthenticated(NO_TOKEN.to_string());

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(unauthenticated)?;

    let (scheme, token) = value.split_once(' ').ok_or_else(unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(unauthenticated());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(unauthenticated());
    }
    Ok(token)
}
