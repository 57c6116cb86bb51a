//! Session gate over the hosted auth service. The service itself is an
//! external collaborator; this module only carries tokens to it and
//! attaches the verified identity to the request.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth endpoint unreachable: {0}")]
    Transport(String),
    #[error("auth endpoint returned status {0}")]
    Endpoint(u16),
}

/// Verified identity attached to the request by the session gate.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthedUser {
    pub user_id: String,
}

/// Token in, identity or nothing out.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Option<AuthedUser>, AuthError>;
}

/// Gate that introspects bearer tokens against the hosted auth endpoint.
pub struct HttpAuthGate {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthGate {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
        }
    }
}

#[async_trait]
impl AuthGate for HttpAuthGate {
    async fn verify(&self, token: &str) -> Result<Option<AuthedUser>, AuthError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let user = response
                .json::<AuthedUser>()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;
            return Ok(Some(user));
        }
        match status.as_u16() {
            401 | 403 => Ok(None),
            code => Err(AuthError::Endpoint(code)),
        }
    }
}

/// Axum middleware gating the review API. Unauthenticated requests receive
/// 401 with a login redirect carrying the original target.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let target = request.uri().path().to_string();

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        return Err(AppError::Unauthorized { next: target });
    };

    match state.auth.verify(&token).await {
        Ok(Some(user)) => {
            debug!("session verified for user {}", user.user_id);
            request.extensions_mut().insert(Arc::new(user));
            Ok(next.run(request).await)
        }
        Ok(None) => Err(AppError::Unauthorized { next: target }),
        Err(e) => {
            // Gate failure denies access; requests never pass unverified.
            warn!("session verification unavailable: {e}");
            Err(AppError::Unauthorized { next: target })
        }
    }
}
