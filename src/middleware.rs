use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    error::AppError,
    models::{Claims, User},
    store::Store,
};

/// Authenticated caller, resolved from the bearer token before any handler
/// logic runs. Rejection is a 401.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Store: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::AuthError("Missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::AuthError("Invalid token format".to_string()));
        }

        let token = &auth_header[7..];

        let secret = std::env::var("SECRET_KEY").unwrap_or_else(|_| "secret".to_string());

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::AuthError(format!("Invalid token: {}", e)))?;

        let store = Store::from_ref(state);

        let user = store.find_user_by_username(&token_data.claims.sub).await?;

        if let Some(user) = user {
            Ok(CurrentUser(user))
        } else {
            Err(AppError::AuthError("User not found".to_string()))
        }
    }
}

/// `axum::Json` with the rejection mapped through `AppError`, so malformed
/// bodies answer 400 with the usual error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Same for query strings: a bad `?skip=abc` answers 400 in the standard
/// error shape instead of axum's plain-text rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
