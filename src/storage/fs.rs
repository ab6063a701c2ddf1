/*
 * This file is part of the Residents backend.
 *
 * Copyright (C) 2025 Kovács Dávid <kapcsolat@kovacsdavid.dev>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use crate::storage::{ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem-backed object store: `<root>/<container>/<key>`.
pub struct FsObjectStorage {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    fn validate_key(key: &str) -> StorageResult<()> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn object_path(&self, container: &str, key: &str) -> StorageResult<PathBuf> {
        Self::validate_key(key)?;
        Self::validate_key(container)?;
        Ok(self.root.join(container).join(key))
    }

    fn url_for(&self, container: &str, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{container}/{key}", base.trim_end_matches('/')),
            None => format!("file://{}", self.root.join(container).join(key).display()),
        }
    }
}

async fn remove_dir_contents(path: &Path) -> StorageResult<u64> {
    let mut removed = 0;
    let mut stack = vec![path.to_path_buf()];
    let mut dirs = Vec::new();
    while let Some(dir) = stack.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        dirs.push(dir);
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?
        {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                stack.push(entry_path);
            } else {
                fs::remove_file(&entry_path)
                    .await
                    .map_err(|e| StorageError::Io(e.to_string()))?;
                removed += 1;
            }
        }
    }
    for dir in dirs.into_iter().rev() {
        let _ = fs::remove_dir(&dir).await;
    }
    Ok(removed)
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn ensure_container(&self, container: &str) -> StorageResult<()> {
        Self::validate_key(container)?;
        fs::create_dir_all(self.root.join(container))
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn upload(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(self.url_for(container, key))
    }

    async fn delete(&self, container: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(container, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn delete_prefix(&self, container: &str, prefix: &str) -> StorageResult<u64> {
        let path = self.object_path(container, prefix.trim_end_matches('/'))?;
        if !path.exists() {
            return Ok(0);
        }
        remove_dir_contents(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;

    fn storage() -> (FsObjectStorage, PathBuf) {
        let root = std::env::temp_dir().join(format!(
            "residents-storage-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        (FsObjectStorage::new(root.clone(), None), root)
    }

    #[tokio::test]
    async fn test_upload_delete_round_trip() {
        let (storage, root) = storage();
        storage.ensure_container("images").await.unwrap();
        let key = keys::event_image_key(1, "ev1", "jpg");
        storage
            .upload("images", &key, b"bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert!(root.join("images").join(&key).exists());
        storage.delete("images", &key).await.unwrap();
        assert!(!root.join("images").join(&key).exists());
        let _ = fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_delete_prefix_removes_tenant_objects_only() {
        let (storage, root) = storage();
        storage.ensure_container("images").await.unwrap();
        storage
            .upload(
                "images",
                &keys::event_image_key(1, "a", "jpg"),
                vec![1],
                "image/jpeg",
            )
            .await
            .unwrap();
        storage
            .upload(
                "images",
                &keys::user_photo_key(1, "u", "jpg"),
                vec![2],
                "image/jpeg",
            )
            .await
            .unwrap();
        storage
            .upload(
                "images",
                &keys::event_image_key(2, "b", "jpg"),
                vec![3],
                "image/jpeg",
            )
            .await
            .unwrap();

        let removed = storage
            .delete_prefix("images", &keys::tenant_prefix(1))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(root.join("images/2/events/images/b.jpg").exists());
        let _ = fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_traversal_keys_are_rejected() {
        let (storage, _) = storage();
        assert!(
            storage
                .upload("images", "../escape.jpg", vec![], "image/jpeg")
                .await
                .is_err()
        );
        assert!(storage.delete("images", "/abs.jpg").await.is_err());
    }
}
