#![allow(dead_code)]

use async_trait::async_trait;
use tokio::sync::Notify;

use tillgate::ability::mapper::PermissionSource;
use tillgate::session::auth::{AuthError, AuthResponse, Authenticator};
use tillgate::session::Identity;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

pub fn identity(username: &str) -> Identity {
    Identity {
        user_id: format!("u-{username}"),
        username: username.to_string(),
        display_name: None,
    }
}

/// Answers immediately with a fixed identity and permission source.
pub struct StaticAuthenticator {
    pub username: String,
    pub source: PermissionSource,
}

impl StaticAuthenticator {
    pub fn with_role(username: &str, role: &str) -> Self {
        Self {
            username: username.to_string(),
            source: PermissionSource::Role(role.to_string()),
        }
    }

    pub fn with_grants(username: &str, grants: &[&str]) -> Self {
        Self {
            username: username.to_string(),
            source: PermissionSource::Grants(grants.iter().map(|g| g.to_string()).collect()),
        }
    }

    fn response(&self) -> AuthResponse {
        AuthResponse {
            identity: identity(&self.username),
            credential: format!("token-{}", self.username),
            source: self.source.clone(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn login(&self, _username: &str, _password: &str) -> Result<AuthResponse, AuthError> {
        Ok(self.response())
    }

    async fn resume(&self, _credential: &str) -> Result<AuthResponse, AuthError> {
        Ok(self.response())
    }
}

/// Holds every request until `release` is notified, so tests can interleave
/// a logout with an in-flight permission fetch.
pub struct BlockingAuthenticator {
    pub release: Notify,
    inner: StaticAuthenticator,
}

impl BlockingAuthenticator {
    pub fn with_role(username: &str, role: &str) -> Self {
        Self {
            release: Notify::new(),
            inner: StaticAuthenticator::with_role(username, role),
        }
    }
}

#[async_trait]
impl Authenticator for BlockingAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.release.notified().await;
        self.inner.login(username, password).await
    }

    async fn resume(&self, credential: &str) -> Result<AuthResponse, AuthError> {
        self.release.notified().await;
        self.inner.resume(credential).await
    }
}

/// Rejects every request.
pub struct RejectingAuthenticator;

#[async_trait]
impl Authenticator for RejectingAuthenticator {
    async fn login(&self, _username: &str, _password: &str) -> Result<AuthResponse, AuthError> {
        Err(AuthError::Rejected)
    }

    async fn resume(&self, _credential: &str) -> Result<AuthResponse, AuthError> {
        Err(AuthError::Rejected)
    }
}
