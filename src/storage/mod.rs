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
use crate::manager::app::config::{StorageConfig, StorageProvider};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use thiserror::Error;

mod fs;
pub(crate) mod keys;

pub use fs::FsObjectStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    Io(String),

    #[error("Storage object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// External object storage as this service sees it. The real Azure and
/// Cloudflare clients live outside this process; the registry and the
/// upload handlers only rely on this contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Creates the container if it does not exist yet; idempotent.
    async fn ensure_container(&self, container: &str) -> StorageResult<()>;
    /// Stores the object and returns its public (or signed) URL.
    async fn upload(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;
    async fn delete(&self, container: &str, key: &str) -> StorageResult<()>;
    /// Removes every object under the prefix; returns how many were removed.
    /// Used by tenant teardown with the `{home_id}/` prefix.
    async fn delete_prefix(&self, container: &str, prefix: &str) -> StorageResult<u64>;
}

/// Selects the storage backend for the configured provider. Azure and
/// Cloudflare deployments front this service with their own blob gateway;
/// in-process they resolve to the filesystem backend rooted at
/// `storage.local_root`, which is also what development and tests use.
pub fn from_config(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStorage>> {
    let root = match config.provider() {
        StorageProvider::Filesystem => config.local_root().unwrap_or("./storage-data"),
        StorageProvider::Azure | StorageProvider::Cloudflare => {
            config.local_root().ok_or_else(|| {
                anyhow::anyhow!(
                    "storage provider '{}' requires storage.local_root for its gateway spool",
                    config.provider()
                )
            })?
        }
    };
    Ok(Arc::new(FsObjectStorage::new(
        root,
        config.public_base_url().map(str::to_string),
    )))
}
