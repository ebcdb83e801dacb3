//! Filesystem blob store
//!
//! Objects are plain files in one directory; public URLs are formed from a
//! configurable base (whatever serves that directory).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared::backend::{BackendError, BackendResult, BlobStore, PutOptions};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

fn io_error(err: std::io::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are flat file names
    fn path_for(&self, key: &str) -> BackendResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(BackendError::Rejected {
                status: 400,
                message: format!("invalid object key: {}", key),
            });
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, content: Vec<u8>, options: PutOptions) -> BackendResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await.map_err(io_error)?;

        if !options.upsert && fs::try_exists(&path).await.map_err(io_error)? {
            return Err(BackendError::Rejected {
                status: 409,
                message: format!("object {} already exists", key),
            });
        }

        // write then rename so readers never see a partial file
        let tmp = self.root.join(format!(".{}.part", key));
        fs::write(&tmp, &content).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), key)
    }

    async fn list(&self) -> BackendResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            if !entry.file_type().await.map_err(io_error)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn remove(&self, keys: &[String]) -> BackendResult<()> {
        for key in keys {
            let path = self.path_for(key)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert() -> PutOptions {
        PutOptions {
            upsert: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("photos"), "http://localhost/photos/");

        assert!(store.list().await.unwrap().is_empty());
        store.put("0812_2.png", vec![1, 2], upsert()).await.unwrap();
        store.put("0812_1.png", vec![3], upsert()).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["0812_1.png", "0812_2.png"]);
        assert_eq!(store.public_url("0812_1.png"), "http://localhost/photos/0812_1.png");

        store
            .remove(&["0812_1.png".to_string(), "missing.png".to_string()])
            .await
            .unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["0812_2.png"]);
    }

    #[tokio::test]
    async fn test_put_conflict_and_bad_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost/photos");

        store.put("a.png", vec![1], PutOptions::default()).await.unwrap();
        let err = store.put("a.png", vec![2], PutOptions::default()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 409, .. }));

        let err = store.put("../evil.png", vec![1], upsert()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 400, .. }));
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), vec![1]);
    }
}
