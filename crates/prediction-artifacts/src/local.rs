// prediction-artifacts/src/local.rs
// ============================================================================
// Module: Local Filesystem Artifact Store
// Description: Development/test ArtifactStore backend (spec §4.8).
// Purpose: Persist artifacts under a base directory laid out by model type,
//          with idempotent overwrite semantics.
// Dependencies: prediction-core, std::fs
// ============================================================================

//! ## Overview
//! Artifacts are stored at `{base_dir}/{model_type}/{model_id}.bin`. Upload
//! copies the caller's local file into place, replacing any existing
//! artifact for the same `(model_id, type)` (idempotent overwrite).
//! Download returns the stored path directly rather than staging a copy,
//! since there is no network boundary to cross for this backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use prediction_core::core::ModelId;
use prediction_core::core::ModelType;
use prediction_core::interfaces::ArtifactError;
use prediction_core::interfaces::ArtifactStore;

// ============================================================================
// SECTION: Local Filesystem Store
// ============================================================================

/// An [`ArtifactStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFsArtifactStore {
    base_dir: PathBuf,
}

impl LocalFsArtifactStore {
    /// Creates a store rooted at `base_dir`, creating it if it does not
    /// already exist.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if `base_dir` cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(Self { base_dir })
    }

    fn type_dir(&self, model_type: ModelType) -> PathBuf {
        self.base_dir.join(model_type.as_str())
    }

    fn artifact_path(&self, model_id: &ModelId, model_type: ModelType) -> PathBuf {
        self.type_dir(model_type).join(format!("{}.bin", model_id.as_str()))
    }

    /// Returns the `local://` URI form used to record `artifact_uri` on a
    /// [`prediction_core::core::Model`].
    #[must_use]
    pub fn uri_for(&self, model_id: &ModelId, model_type: ModelType) -> String {
        format!("local://{}", self.artifact_path(model_id, model_type).display())
    }
}

impl ArtifactStore for LocalFsArtifactStore {
    fn upload(&self, local_path: &Path, model_id: &ModelId, model_type: ModelType) -> Result<String, ArtifactError> {
        let dir = self.type_dir(model_type);
        fs::create_dir_all(&dir).map_err(|err| ArtifactError::Io(err.to_string()))?;
        let dest = self.artifact_path(model_id, model_type);
        // Copy-then-rename so a concurrent reader never observes a partial
        // file at the final path (idempotent overwrite semantics).
        let staging = dest.with_extension("bin.tmp");
        fs::copy(local_path, &staging).map_err(|err| ArtifactError::Io(err.to_string()))?;
        fs::rename(&staging, &dest).map_err(|err| ArtifactError::Io(err.to_string()))?;
        Ok(self.uri_for(model_id, model_type))
    }

    fn download(&self, model_id: &ModelId, model_type: ModelType) -> Result<PathBuf, ArtifactError> {
        let path = self.artifact_path(model_id, model_type);
        if !path.is_file() {
            return Err(ArtifactError::NotFound(model_id.clone()));
        }
        Ok(path)
    }

    fn exists(&self, model_id: &ModelId, model_type: ModelType) -> Result<bool, ArtifactError> {
        Ok(self.artifact_path(model_id, model_type).is_file())
    }

    fn delete(&self, model_id: &ModelId, model_type: ModelType) -> Result<(), ArtifactError> {
        let path = self.artifact_path(model_id, model_type);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::NotFound(model_id.clone())),
            Err(err) => Err(ArtifactError::Io(err.to_string())),
        }
    }

    fn list(&self, model_type: ModelType) -> Result<Vec<ModelId>, ArtifactError> {
        let dir = self.type_dir(model_type);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|err| ArtifactError::Io(err.to_string()))? {
            let entry = entry.map_err(|err| ArtifactError::Io(err.to_string()))?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(id) = name.strip_suffix(".bin") {
                ids.push(ModelId::new(id));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        reason = "Test-only framing assertions."
    )]
    use super::*;
    use std::io::Write;

    fn write_temp_artifact(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn upload_then_download_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path()).unwrap();
        let source = write_temp_artifact(b"weights-v1");
        let id = ModelId::new("m1");

        store.upload(source.path(), &id, ModelType::PrintTime).unwrap();
        let downloaded = store.download(&id, ModelType::PrintTime).unwrap();
        assert_eq!(fs::read(downloaded).unwrap(), b"weights-v1");
    }

    #[test]
    fn reupload_overwrites_rather_than_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path()).unwrap();
        let id = ModelId::new("m1");

        let first = write_temp_artifact(b"v1");
        store.upload(first.path(), &id, ModelType::PrintTime).unwrap();
        let second = write_temp_artifact(b"v2-longer-payload");
        store.upload(second.path(), &id, ModelType::PrintTime).unwrap();

        let downloaded = store.download(&id, ModelType::PrintTime).unwrap();
        assert_eq!(fs::read(downloaded).unwrap(), b"v2-longer-payload");
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path()).unwrap();
        let err = store.download(&ModelId::new("missing"), ModelType::PrintTime).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn list_returns_uploaded_ids_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path()).unwrap();
        let a = write_temp_artifact(b"a");
        let b = write_temp_artifact(b"b");
        store.upload(a.path(), &ModelId::new("m2"), ModelType::PrintTime).unwrap();
        store.upload(b.path(), &ModelId::new("m1"), ModelType::PrintTime).unwrap();

        let ids = store.list(ModelType::PrintTime).unwrap();
        assert_eq!(ids, vec![ModelId::new("m1"), ModelId::new("m2")]);
    }

    #[test]
    fn list_is_scoped_by_model_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path()).unwrap();
        let a = write_temp_artifact(b"a");
        store.upload(a.path(), &ModelId::new("m1"), ModelType::PrintTime).unwrap();
        assert!(store.list(ModelType::DemandForecast).unwrap().is_empty());
    }
}
