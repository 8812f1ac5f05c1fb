//! Identity boundary and request extractors.
//!
//! Token issuance lives outside this service. Handlers only need the caller's
//! identity ([`AuthUser`]) or proof that the caller is the configured admin
//! ([`AdminUser`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

/// Resolves bearer tokens to identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns `None` for unknown or expired tokens.
    async fn identify(&self, token: &str) -> Option<Identity>;
}

/// Fixed token table, loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parses `token=user_uuid:email` pairs separated by commas.
    ///
    /// Malformed entries are skipped with a warning.
    pub fn parse(raw: &str) -> Self {
        let mut provider = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match parse_entry(entry) {
                Some((token, identity)) => {
                    provider.tokens.insert(token, identity);
                }
                None => tracing::warn!(entry, "ignoring malformed auth token entry"),
            }
        }
        provider
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn parse_entry(entry: &str) -> Option<(String, Identity)> {
    let (token, rest) = entry.split_once('=')?;
    let (user_id, email) = rest.split_once(':')?;
    let token = token.trim();
    let email = email.trim();
    if token.is_empty() || email.is_empty() {
        return None;
    }

    let identity = Identity {
        user_id: UserId::parse(user_id.trim()).ok()?,
        email: email.to_lowercase(),
    };
    Some((token.to_string(), identity))
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn identify(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid authorization format. Expected 'Bearer <token>'".to_string())
        })
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state
            .identity
            .identify(token)
            .await
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authentication credentials".to_string()))
    }
}

/// The configured admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if state.admin_email.is_none() {
            return Err(ApiError::Internal("Admin email not configured".to_string()));
        }
        if !state.is_admin(&identity) {
            tracing::warn!(user_id = %identity.user_id, "non-admin called an admin route");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(identity))
    }
}
