use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::credential::Credential;
use super::oauth::OAuthClient;
use crate::config::QwenCliConfig;
use crate::error::Result;

/// Owns the OAuth credential for one plugin instance.
///
/// The record is read from disk lazily, refreshed over the network once it
/// expires, and written back after every refresh. Refreshes are single-flight:
/// callers that find an expired token queue on `refresh_lock` and re-check
/// before issuing their own request.
pub struct CredentialStore {
    path: PathBuf,
    oauth: OAuthClient,
    credential: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, oauth: OAuthClient) -> Self {
        Self {
            path: path.into(),
            oauth,
            credential: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &QwenCliConfig) -> Result<Self> {
        let oauth = OAuthClient::new(&config.token_url, &config.client_id)?;
        Ok(Self::new(config.credentials_path(), oauth))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the in-memory credential
    pub async fn current(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    /// Read the credential file into memory.
    ///
    /// A missing, unreadable or malformed file leaves the store empty; no
    /// error is surfaced.
    pub async fn load(&self) {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("No OAuth credentials at {}: {}", self.path.display(), e);
                return;
            }
        };

        match serde_json::from_slice::<Credential>(&raw) {
            Ok(credential) => {
                tracing::debug!("Loaded OAuth credentials from {}", self.path.display());
                *self.credential.write().await = Some(credential);
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed OAuth credentials at {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }

    /// Return a credential that is not expired, loading and refreshing as needed.
    ///
    /// `Ok(None)` means no credential could be loaded; the caller decides what
    /// an unauthenticated request looks like. Refresh failures are returned.
    pub async fn ensure_fresh(&self) -> Result<Option<Credential>> {
        // Lazy loads share the refresh lock so a slow read cannot land on top
        // of a credential another caller just refreshed.
        if self.credential.read().await.is_none() {
            let _guard = self.refresh_lock.lock().await;
            if self.credential.read().await.is_none() {
                self.load().await;
            }
        }

        match self.current().await {
            Some(credential) if credential.is_expired() => {}
            other => return Ok(other),
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        match self.current().await {
            Some(credential) if credential.is_expired() => {
                let refreshed = self.refresh(&credential.refresh_token).await?;
                Ok(Some(refreshed))
            }
            other => Ok(other),
        }
    }

    /// Exchange `refresh_token` for a new access token, then store and persist it.
    ///
    /// The in-memory record is replaced before the file write, so a failed
    /// write still leaves the new token usable for this process.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        let response = self.oauth.refresh_access_token(refresh_token).await?;
        let credential = Credential::from_token_response(response, refresh_token, Utc::now());

        *self.credential.write().await = Some(credential.clone());
        self.persist(&credential).await?;

        if let Some(expiry) = credential.expiry_instant() {
            tracing::info!("OAuth credentials valid until {}", expiry.to_rfc3339());
        }

        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::debug!("Saved OAuth credentials to {}", self.path.display());
        Ok(())
    }
}
