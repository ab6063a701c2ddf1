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
use crate::common::error::{RepositoryError, RepositoryResult};
use crate::manager::tenants::model::Home;
use crate::manager::tenants::repository::HomesRepository;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Tenant resolution as the request gate sees it: name → record, hot path
/// of every tenant-prefixed request.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn resolve(&self, name: &str) -> RepositoryResult<Home>;
    /// Drops the cached entry; called by the registry on create and delete
    /// so a stale record never outlives a catalog change by more than a
    /// read.
    fn invalidate(&self, name: &str);
}

/// Read-through cache over the catalog with a short TTL. Only positive
/// results are cached; a miss always goes back to the catalog.
pub struct CachedTenantDirectory {
    repo: Arc<dyn HomesRepository>,
    ttl: Duration,
    cache: RwLock<HashMap<String, (Instant, Home)>>,
}

impl CachedTenantDirectory {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

    pub fn new(repo: Arc<dyn HomesRepository>, ttl: Duration) -> Self {
        Self {
            repo,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TenantDirectory for CachedTenantDirectory {
    async fn resolve(&self, name: &str) -> RepositoryResult<Home> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            if let Some((cached_at, home)) = cache.get(name) {
                if cached_at.elapsed() < self.ttl {
                    return Ok(home.clone());
                }
            }
        }

        let home = self.repo.lookup_by_name(name).await?;
        let mut cache = self
            .cache
            .write()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
        cache.insert(name.to_string(), (Instant::now(), home.clone()));
        Ok(home)
    }

    fn invalidate(&self, name: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tenants::repository::MockHomesRepository;
    use chrono::Utc;

    fn home(id: i32, name: &str) -> Home {
        let now = Utc::now().naive_utc();
        Home {
            id,
            name: name.to_string(),
            database_name: "residents".to_string(),
            database_type: "sqlserver".to_string(),
            database_schema: name.to_string(),
            admin_user_email: format!("admin@{name}.example"),
            admin_user_password: "seed".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_resolve_hits_repo_once_within_ttl() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .times(1)
            .withf(|name| name == "beresheet")
            .returning(|_| Ok(home(1, "beresheet")));

        let directory =
            CachedTenantDirectory::new(Arc::new(repo), Duration::from_secs(60));
        assert_eq!(directory.resolve("beresheet").await.unwrap().id, 1);
        assert_eq!(directory.resolve("beresheet").await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .times(2)
            .returning(|_| Ok(home(1, "beresheet")));

        let directory =
            CachedTenantDirectory::new(Arc::new(repo), Duration::from_secs(60));
        directory.resolve("beresheet").await.unwrap();
        directory.invalidate("beresheet");
        directory.resolve("beresheet").await.unwrap();
    }

    #[tokio::test]
    async fn test_miss_is_not_cached() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .times(2)
            .returning(|_| Err(RepositoryError::NotFound));

        let directory =
            CachedTenantDirectory::new(Arc::new(repo), Duration::from_secs(60));
        assert!(directory.resolve("nonexistent").await.is_err());
        assert!(directory.resolve("nonexistent").await.is_err());
    }

    #[tokio::test]
    async fn test_expired_entry_reloads() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .times(2)
            .returning(|_| Ok(home(1, "beresheet")));

        let directory = CachedTenantDirectory::new(Arc::new(repo), Duration::ZERO);
        directory.resolve("beresheet").await.unwrap();
        directory.resolve("beresheet").await.unwrap();
    }
}
