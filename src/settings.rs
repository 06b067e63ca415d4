use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub backend: Backend,
    pub session: SessionFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backend {
    /// Base URL of the back-office HTTP API, e.g. https://pos.example.com/api
    pub base_url: String,
    /// Per-request timeout for authenticator calls, in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    /// Path to persist the session record. Default: data/session.json
    pub store_path: PathBuf,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/session.json"),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("backend.base_url", Backend::default().base_url)
            .into_diagnostic()?
            .set_default(
                "backend.request_timeout_secs",
                Backend::default().request_timeout_secs,
            )
            .into_diagnostic()?
            .set_default(
                "session.store_path",
                SessionFile::default().store_path.to_string_lossy().to_string(),
            )
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: TILLGATE__BACKEND__BASE_URL=..., etc.
        builder = builder.add_source(config::Environment::with_prefix("TILLGATE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize the store path to be relative to the current dir
        if s.session.store_path.is_relative() {
            s.session.store_path = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.session.store_path);
        }

        Ok(s)
    }
}
