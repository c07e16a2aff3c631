use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, TokenKind},
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Role::Customer),
            "seller" => Some(Role::Seller),
            _ => None,
        }
    }
}

/// A permission the caller either holds or does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Customer,
    Seller,
}

/// What a route demands of its caller before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Requires(Capability),
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Customer => self.is_customer(),
            Capability::Seller => self.is_seller(),
        }
    }
}

pub fn ensure_capability(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if !user.has(capability) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_customer(user: &AuthUser) -> Result<(), AppError> {
    ensure_capability(user, Capability::Customer)
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_capability(user, Capability::Seller)
}

/// Signing material and lifetimes for bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    inner: Arc<TokenKeysInner>,
}

struct TokenKeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(TokenKeysInner {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                access_ttl,
                refresh_ttl,
            }),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, kind: TokenKind) -> AppResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.inner.access_ttl,
            TokenKind::Refresh => self.inner.refresh_ttl,
        };
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            token_type: kind,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.inner.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Decode a token and check that it is of the expected kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> AppResult<AuthUser> {
        let decoded = decode::<Claims>(token, &self.inner.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        if decoded.claims.token_type != kind {
            return Err(AppError::Unauthorized("Wrong token type".into()));
        }

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role,
        })
    }

    /// Resolve the caller from an `Authorization: Bearer <access token>` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        self.verify(token, TokenKind::Access)
    }
}

/// Per-route state for [`require_access`].
#[derive(Clone)]
pub struct Guard {
    pub access: Access,
    pub keys: TokenKeys,
}

/// Authenticates and authorizes the caller according to the route's [`Access`],
/// leaving the resolved [`AuthUser`] in the request extensions.
pub async fn require_access(
    State(guard): State<Guard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Access::Requires(capability) = guard.access {
        let user = guard.keys.authenticate(request.headers())?;
        ensure_capability(&user, capability)?;
        tracing::debug!(user_id = %user.user_id, role = user.role.as_str(), "caller authorized");
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}
