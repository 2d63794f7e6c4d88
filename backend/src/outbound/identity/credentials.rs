//! Startup resolution of the identity provider project.
//!
//! Providers are tried in order and the first project id wins. Each failure
//! is logged so operators can see why a source was skipped.

use std::fs;
use std::path::{Path, PathBuf};

use mockable::Env;
use serde::Deserialize;
use tracing::info;

/// Placeholder `private_key_id` shipped in template key files.
pub const PLACEHOLDER_PRIVATE_KEY_ID: &str = "REPLACE_WITH_YOUR_PRIVATE_KEY_ID";

const GOOGLE_APPLICATION_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Reasons a credential source could not supply a project id.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid credential JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} still contains placeholder values")]
    Placeholder { path: PathBuf },

    #[error("{0} does not name a project")]
    MissingProject(String),

    #[error("no credential source yielded a project id")]
    Exhausted,
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    quota_project_id: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
}

impl CredentialFile {
    fn read(path: &Path) -> Result<Self, CredentialError> {
        let raw = fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CredentialError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A source of the project whose tokens the backend accepts.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Resolve the project id.
    fn project_id(&self) -> Result<String, CredentialError>;
}

/// Service account key file downloaded from the Firebase console.
#[derive(Debug, Clone)]
pub struct ServiceAccountKeyFile {
    path: PathBuf,
}

impl ServiceAccountKeyFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for ServiceAccountKeyFile {
    fn name(&self) -> &'static str {
        "service_account_key_file"
    }

    fn project_id(&self) -> Result<String, CredentialError> {
        let file = CredentialFile::read(&self.path)?;
        if file.private_key_id.as_deref() == Some(PLACEHOLDER_PRIVATE_KEY_ID) {
            return Err(CredentialError::Placeholder {
                path: self.path.clone(),
            });
        }
        non_blank(file.project_id)
            .ok_or_else(|| CredentialError::MissingProject(self.path.display().to_string()))
    }
}

/// Google application default credentials and project environment variables.
#[derive(Debug, Clone)]
pub struct ApplicationDefaultCredentials<E> {
    env: E,
}

impl<E: Env> ApplicationDefaultCredentials<E> {
    #[must_use]
    pub fn new(env: E) -> Self {
        Self { env }
    }

    fn from_credentials_file(&self) -> Option<String> {
        let path = non_blank(self.env.string(GOOGLE_APPLICATION_CREDENTIALS_ENV))?;
        match CredentialFile::read(Path::new(&path)) {
            Ok(file) => non_blank(file.project_id).or_else(|| non_blank(file.quota_project_id)),
            Err(error) => {
                info!(%error, "application default credentials file unusable");
                None
            }
        }
    }
}

impl<E: Env + Send + Sync> CredentialProvider for ApplicationDefaultCredentials<E> {
    fn name(&self) -> &'static str {
        "application_default_credentials"
    }

    fn project_id(&self) -> Result<String, CredentialError> {
        self.from_credentials_file()
            .or_else(|| non_blank(self.env.string(FIREBASE_PROJECT_ID_ENV)))
            .or_else(|| non_blank(self.env.string(GOOGLE_CLOUD_PROJECT_ENV)))
            .ok_or_else(|| CredentialError::MissingProject("environment".to_owned()))
    }
}

/// Resolve the project id from the first provider that yields one.
///
/// # Errors
/// Returns [`CredentialError::Exhausted`] when every provider fails.
pub fn resolve_identity_project(
    providers: &[Box<dyn CredentialProvider>],
) -> Result<String, CredentialError> {
    for provider in providers {
        match provider.project_id() {
            Ok(project_id) => {
                info!(source = provider.name(), %project_id, "identity provider project resolved");
                return Ok(project_id);
            }
            Err(error) => info!(source = provider.name(), %error, "credential source skipped"),
        }
    }
    Err(CredentialError::Exhausted)
}
