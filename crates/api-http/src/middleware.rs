//! Request Middleware & Extractors
//!
//! Bearer-token authentication plus the extractors handlers lean on. The
//! middleware runs before every task route; no task operation is reachable
//! without a resolved identity.

use std::collections::BTreeMap;

use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use taskbox_core::domain::Identity;
use taskbox_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Authorization middleware: extract the bearer token, verify the claim,
/// resolve the user, and attach the identity to the request. Any failed
/// step rejects the request before the handler runs.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match state.authenticator.authenticate(header.as_deref()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// The authenticated identity attached by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                ApiError::from(AppError::Authentication(
                    "handler reached without an authenticated identity".to_string(),
                ))
            })
    }
}

/// JSON body extractor whose rejection wears the error envelope instead of
/// axum's plain-text default.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let mut fields = BTreeMap::new();
                fields.insert("body".to_string(), rejection.body_text());
                Err(ApiError::validation(fields))
            }
        }
    }
}
