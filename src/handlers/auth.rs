use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand_core::OsRng;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    error::AppError,
    middleware::AppJson,
    models::{Claims, CreateUser, LoginRequest, Token, User},
    store::Store,
};

const MIN_PASSWORD_LEN: usize = 8;

#[utoipa::path(
    post,
    path = "/register",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Username already taken or password too weak")
    )
)]
pub async fn register(
    State(store): State<Store>,
    AppJson(payload): AppJson<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::ValidationError(
            "username must not be empty".to_string(),
        ));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    let user = store
        .create_user(
            username,
            payload.email.as_deref().unwrap_or(""),
            &password_hash,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = Token),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(store): State<Store>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<Token>, AppError> {
    let user = store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.hashed_password)
        .map_err(|_| AppError::AuthError("Invalid password hash in DB".to_string()))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::AuthError("Invalid credentials".to_string()))?;

    let secret = env::var("SECRET_KEY").unwrap_or_else(|_| "secret".to_string());

    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .as_secs() as usize
        + 60 * 30; // 30 minutos

    let claims = Claims {
        sub: user.username,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::AuthError(format!("Token creation failed: {}", e)))?;

    Ok(Json(Token {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}
