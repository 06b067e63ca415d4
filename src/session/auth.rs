//! The authenticator seam: how the session layer reaches the HTTP backend.
//!
//! The backend itself is an external collaborator; this module only defines
//! the contract the session flow calls and the payload it consumes. No
//! retry happens at this layer.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::ability::mapper::PermissionSource;
use crate::session::Identity;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthError {
    /// Bad credentials, or an expired/revoked credential on resume.
    #[error("credentials rejected by the backend")]
    #[diagnostic(code(tillgate::auth::rejected))]
    Rejected,

    /// Transport or payload trouble talking to the backend.
    #[error("backend error: {0}")]
    #[diagnostic(code(tillgate::auth::backend))]
    Backend(String),
}

/// Successful authentication payload. The session layer consumes the
/// permission source; everything else is carried through.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub identity: Identity,
    pub credential: String,
    pub source: PermissionSource,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate with username/password and return the actor's identity,
    /// a credential for later resumption, and the permission payload.
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Re-establish a session from a persisted credential.
    async fn resume(&self, credential: &str) -> Result<AuthResponse, AuthError>;
}
