//! Authentication primitives.
//!
//! Requests carry an HS256 bearer token whose claims name the subject, its
//! role and the hospital it belongs to. The middleware turns a valid token
//! into an `ActorContext` stored in the request extensions; handlers pick it
//! up with the `Actor` extractor.

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{
    services::{ActorContext, Role},
    state::AppState,
    Config,
};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl From<Claims> for ActorContext {
    fn from(claims: Claims) -> Self {
        ActorContext::new(claims.sub, claims.role, claims.hospital)
    }
}

#[derive(Debug, Clone)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
    Misconfigured(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingToken => "Missing bearer token".to_string(),
            Self::InvalidToken(msg) => format!("Invalid bearer token: {msg}"),
            Self::Misconfigured(msg) => format!("Authentication misconfigured: {msg}"),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication failed");
        }

        let body = axum::Json(json!({
            "error": {
                "code": "login",
                "message": self.message()
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[derive(Clone)]
pub struct AuthManager {
    config: Arc<Config>,
    keys: Option<Arc<(EncodingKey, DecodingKey)>>,
}

impl AuthManager {
    pub fn new(config: Arc<Config>) -> Result<Self, AuthError> {
        let keys = match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Some(Arc::new((
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            ))),
            _ if config.auth.enabled => {
                return Err(AuthError::Misconfigured(
                    "auth.jwt_secret is not set".to_string(),
                ))
            }
            _ => None,
        };

        Ok(Self { config, keys })
    }

    pub fn enabled(&self) -> bool {
        self.config.auth.enabled
    }

    pub fn is_public_path(&self, path: &str) -> bool {
        self.config.auth.public_paths.iter().any(|p| p == path)
    }

    fn keys(&self) -> Result<&(EncodingKey, DecodingKey), AuthError> {
        self.keys
            .as_deref()
            .ok_or_else(|| AuthError::Misconfigured("auth.jwt_secret is not set".to_string()))
    }

    /// Resolve the actor for a request.
    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Result<ActorContext, AuthError> {
        if !self.enabled() {
            return Ok(ActorContext::system());
        }

        let authz = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| {
                AuthError::InvalidToken("Authorization header is not valid UTF-8".to_string())
            })?;

        let token = authz
            .strip_prefix("Bearer ")
            .or_else(|| authz.strip_prefix("bearer "))
            .ok_or_else(|| {
                AuthError::InvalidToken("Authorization header must be 'Bearer <token>'".to_string())
            })?;

        Ok(self.verify(token)?.into())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (_, decoding_key) = self.keys()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60;
        if let Some(issuer) = &self.config.auth.issuer {
            validation.set_issuer(&[issuer]);
        }

        let claims = decode::<Claims>(token, decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.role != Role::SuperAdmin && claims.hospital.as_deref().unwrap_or("").is_empty() {
            return Err(AuthError::InvalidToken(format!(
                "Role {} requires a 'hospital' claim",
                claims.role
            )));
        }
        Ok(claims)
    }

    /// Sign a token for an actor, valid for `ttl`.
    pub fn issue(&self, actor: &ActorContext, ttl: Duration) -> Result<String, AuthError> {
        let (encoding_key, _) = self.keys()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Misconfigured(e.to_string()))?;

        let claims = Claims {
            sub: actor.actor_id.clone(),
            role: actor.role,
            hospital: actor.hospital.clone(),
            exp: (now + ttl).as_secs(),
            iss: self.config.auth.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
            .map_err(|e| AuthError::Misconfigured(format!("Failed to sign token: {e}")))
    }
}

/// Extractor for the actor attached by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .map(Actor)
            .ok_or_else(|| AuthError::MissingToken.into_response())
    }
}

/// Attach the request's `ActorContext`, or reject the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let path = req.uri().path();
    if state.auth.enabled()
        && (state.auth.is_public_path(path) || req.method() == axum::http::Method::OPTIONS)
    {
        return next.run(req).await;
    }

    match state.auth.authenticate_headers(req.headers()) {
        Ok(actor) => {
            tracing::debug!(actor = %actor.actor_id, role = %actor.role, "Authenticated request");
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, path = %req.uri().path(), "Rejected request");
            err.into_response()
        }
    }
}
