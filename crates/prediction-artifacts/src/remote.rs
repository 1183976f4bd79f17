// prediction-artifacts/src/remote.rs
// ============================================================================
// Module: Remote Artifact Store
// Description: Bearer-token-authenticated remote ArtifactStore (spec §4.8).
// Purpose: Upload artifacts via multipart with idempotent overwrite; stage
//          downloads through a signed, time-limited URL rather than
//          assuming direct network access to the underlying object store.
// Dependencies: prediction-core, reqwest (blocking)
// ============================================================================

//! ## Overview
//! The remote backend talks to a companion artifact service over HTTP
//! using a service-issued bearer token (the same authentication shape as
//! `decision-gate-mcp`'s bearer-token handling). Upload is `PUT
//! {base_url}/artifacts/{type}/{model_id}` with a multipart body — the
//! service is expected to replace any existing object at that key
//! (idempotent overwrite). Download first requests a signed, time-limited
//! URL from `GET {base_url}/artifacts/{type}/{model_id}/download-url`, then
//! fetches the bytes from that URL directly, so this client never assumes
//! it has direct network access to the backing object store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use prediction_core::core::ModelId;
use prediction_core::core::ModelType;
use prediction_core::interfaces::ArtifactError;
use prediction_core::interfaces::ArtifactStore;
use serde::Deserialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`RemoteArtifactStore`] (spec §6 `artifact.remote.baseUrl`).
#[derive(Debug, Clone)]
pub struct RemoteArtifactStoreConfig {
    /// Base URL of the remote artifact service, no trailing slash.
    pub base_url: String,
    /// Bearer token presented on every request.
    pub bearer_token: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Local directory downloads are staged into.
    pub download_staging_dir: PathBuf,
}

impl RemoteArtifactStoreConfig {
    /// Builds a configuration with a default 30s timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>, download_staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            request_timeout: Duration::from_secs(30),
            download_staging_dir: download_staging_dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    download_url: String,
}

// ============================================================================
// SECTION: Remote Store
// ============================================================================

/// An [`ArtifactStore`] backed by a remote service over bearer-token auth.
pub struct RemoteArtifactStore {
    config: RemoteArtifactStoreConfig,
    client: reqwest::blocking::Client,
}

impl RemoteArtifactStore {
    /// Builds a remote store from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: RemoteArtifactStoreConfig) -> Result<Self, ArtifactError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(Self { config, client })
    }

    fn object_path(&self, model_id: &ModelId, model_type: ModelType) -> String {
        format!("{}/artifacts/{}/{}", self.config.base_url, model_type.as_str(), model_id.as_str())
    }

    fn authorized(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        builder.bearer_auth(&self.config.bearer_token)
    }

    fn map_status(status: reqwest::StatusCode, model_id: &ModelId) -> ArtifactError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            ArtifactError::Unauthorized(format!("remote artifact service rejected credentials ({status})"))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            ArtifactError::NotFound(model_id.clone())
        } else {
            ArtifactError::Io(format!("remote artifact service returned {status}"))
        }
    }
}

impl ArtifactStore for RemoteArtifactStore {
    fn upload(&self, local_path: &Path, model_id: &ModelId, model_type: ModelType) -> Result<String, ArtifactError> {
        let bytes = fs::read(local_path).map_err(|err| ArtifactError::Io(err.to_string()))?;
        let part = reqwest::blocking::multipart::Part::bytes(bytes).file_name("artifact.bin");
        let form = reqwest::blocking::multipart::Form::new().part("artifact", part);

        let response = self
            .authorized(self.client.put(self.object_path(model_id, model_type)))
            .multipart(form)
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::map_status(response.status(), model_id));
        }
        Ok(self.object_path(model_id, model_type))
    }

    fn download(&self, model_id: &ModelId, model_type: ModelType) -> Result<PathBuf, ArtifactError> {
        let signed_url_endpoint = format!("{}/download-url", self.object_path(model_id, model_type));
        let response = self
            .authorized(self.client.get(&signed_url_endpoint))
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::map_status(response.status(), model_id));
        }
        let signed: SignedUrlResponse = response.json().map_err(|err| ArtifactError::Io(err.to_string()))?;

        let payload = self
            .client
            .get(&signed.download_url)
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if !payload.status().is_success() {
            return Err(Self::map_status(payload.status(), model_id));
        }
        let bytes = payload.bytes().map_err(|err| ArtifactError::Io(err.to_string()))?;

        fs::create_dir_all(&self.config.download_staging_dir).map_err(|err| ArtifactError::Io(err.to_string()))?;
        let staged_path = self
            .config
            .download_staging_dir
            .join(format!("{}-{}.bin", model_type.as_str(), model_id.as_str()));
        let mut file = fs::File::create(&staged_path).map_err(|err| ArtifactError::Io(err.to_string()))?;
        file.write_all(&bytes).map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(staged_path)
    }

    fn download_cancellable(
        &self,
        model_id: &ModelId,
        model_type: ModelType,
        cancellation: &prediction_core::core::CancellationToken,
    ) -> Result<PathBuf, ArtifactError> {
        if cancellation.is_cancelled() {
            return Err(ArtifactError::Cancelled);
        }

        let signed_url_endpoint = format!("{}/download-url", self.object_path(model_id, model_type));
        let response = self
            .authorized(self.client.get(&signed_url_endpoint))
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::map_status(response.status(), model_id));
        }
        let signed: SignedUrlResponse = response.json().map_err(|err| ArtifactError::Io(err.to_string()))?;

        if cancellation.is_cancelled() {
            return Err(ArtifactError::Cancelled);
        }

        let payload = self
            .client
            .get(&signed.download_url)
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if !payload.status().is_success() {
            return Err(Self::map_status(payload.status(), model_id));
        }
        let bytes = payload.bytes().map_err(|err| ArtifactError::Io(err.to_string()))?;

        fs::create_dir_all(&self.config.download_staging_dir).map_err(|err| ArtifactError::Io(err.to_string()))?;
        let staged_path = self
            .config
            .download_staging_dir
            .join(format!("{}-{}.bin", model_type.as_str(), model_id.as_str()));
        let mut file = fs::File::create(&staged_path).map_err(|err| ArtifactError::Io(err.to_string()))?;
        file.write_all(&bytes).map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(staged_path)
    }

    fn exists(&self, model_id: &ModelId, model_type: ModelType) -> Result<bool, ArtifactError> {
        let response = self
            .authorized(self.client.head(self.object_path(model_id, model_type)))
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(Self::map_status(status, model_id)),
        }
    }

    fn delete(&self, model_id: &ModelId, model_type: ModelType) -> Result<(), ArtifactError> {
        let response = self
            .authorized(self.client.delete(self.object_path(model_id, model_type)))
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_status(response.status(), model_id))
        }
    }

    fn list(&self, model_type: ModelType) -> Result<Vec<ModelId>, ArtifactError> {
        let endpoint = format!("{}/artifacts/{}", self.config.base_url, model_type.as_str());
        let response = self
            .authorized(self.client.get(&endpoint))
            .send()
            .map_err(|err| ArtifactError::Io(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ArtifactError::Io(format!("remote artifact service returned {}", response.status())));
        }
        let ids: Vec<String> = response.json().map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(ids.into_iter().map(ModelId::new).collect())
    }
}
