use miette::Diagnostic;
use thiserror::Error;

use crate::ability::errors::AbilityError;
use crate::session::auth::AuthError;

#[derive(Debug, Error, Diagnostic)]
pub enum TillError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(tillgate::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(tillgate::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(tillgate::serde))]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Auth(#[from] AuthError),

    #[error("Session store error: {0}")]
    #[diagnostic(code(tillgate::session_store))]
    Store(String),
}
