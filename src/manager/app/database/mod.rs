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
use crate::manager::app::config::{AppConfig, DatabaseEngine};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub(crate) mod dialect;
mod oracle;
mod sqlserver;
pub(crate) mod value;

pub use dialect::Dialect;
pub use value::{SqlRow, SqlValue};

use self::oracle::{OracleManager, OraclePool};
use self::sqlserver::SqlServerPool;

#[derive(Clone)]
enum PoolInner {
    SqlServer(SqlServerPool),
    Oracle(OraclePool),
}

/// A bounded connection pool scoped to one schema and one credential.
///
/// Statements are written with `?` placeholders and engine-neutral SQL;
/// the pool renders them for its engine, runs them under the configured
/// per-operation timeout and decodes rows eagerly into [`SqlRow`].
#[derive(Clone)]
pub struct SchemaPool {
    dialect: Dialect,
    query_timeout: Duration,
    inner: PoolInner,
}

impl SchemaPool {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<Vec<SqlRow>> {
        let rendered = self.dialect.render_placeholders(sql);
        let fut = async {
            match &self.inner {
                PoolInner::SqlServer(pool) => pool.query(&rendered, params).await,
                PoolInner::Oracle(pool) => pool.query(&rendered, params).await,
            }
        };
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| RepositoryError::QueryTimeout)?
    }

    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> RepositoryResult<Option<SqlRow>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    pub async fn query_one(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<SqlRow> {
        self.query_opt(sql, params)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<u64> {
        let rendered = self.dialect.render_placeholders(sql);
        let fut = async {
            match &self.inner {
                PoolInner::SqlServer(pool) => pool.execute(&rendered, params).await,
                PoolInner::Oracle(pool) => pool.execute(&rendered, params).await,
            }
        };
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| RepositoryError::QueryTimeout)?
    }

    /// Runs one DDL statement verbatim (no placeholder rendering).
    pub async fn execute_ddl(&self, sql: &str) -> RepositoryResult<()> {
        let fut = async {
            match &self.inner {
                PoolInner::SqlServer(pool) => pool.execute_ddl(sql).await,
                PoolInner::Oracle(pool) => pool.execute_ddl(sql).await,
            }
        };
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| RepositoryError::QueryTimeout)?
    }

    pub async fn ping(&self) -> RepositoryResult<()> {
        self.query_one(self.dialect.ping_sql(), &[]).await.map(|_| ())
    }
}

/// Trait defining the behavior for managing per-schema connection pools.
///
/// Two pools exist from startup: the admin pool (catalog schema, used for
/// tenant provisioning and registry reads) and the home_index pool (phone
/// directory). Tenant pools are created lazily, one per schema, each with
/// the schema-scoped principal so a pool can only ever reach its own
/// tenant's data.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PoolManager: Send + Sync {
    /// Pool connected with the admin credentials against the catalog schema.
    fn admin_pool(&self) -> SchemaPool;
    /// Pool connected with the home_index credentials.
    fn home_index_pool(&self) -> SchemaPool;
    /// Returns the pool for a tenant schema, creating it on first use.
    ///
    /// Concurrent first calls for the same schema are serialized; exactly
    /// one pool is created. A creation failure is returned as
    /// `PoolUnavailable` and nothing is cached, so the next request retries.
    async fn get_pool_for_schema(&self, schema: &str) -> RepositoryResult<SchemaPool>;
}

/// `SchemaPoolManager` owns every connection pool in the process.
///
/// The tenant map is read-mostly: the fast path is a shared read lock; the
/// cold path (first request for a schema) takes an async creation mutex and
/// re-checks before building, so two concurrent first-requests cannot race
/// two pools into existence.
pub struct SchemaPoolManager {
    config: Arc<AppConfig>,
    dialect: Dialect,
    admin_pool: SchemaPool,
    home_index_pool: SchemaPool,
    tenant_pools: RwLock<HashMap<String, SchemaPool>>,
    creation_lock: Mutex<()>,
}

impl SchemaPoolManager {
    pub fn new(config: Arc<AppConfig>) -> RepositoryResult<Self> {
        let dialect = Dialect::new(config.database().engine());
        let admin_pool = Self::build_pool(
            &config,
            dialect,
            config.database().admin().username.clone(),
            config.database().admin().password.clone(),
        )?;
        let home_index_pool = Self::build_pool(
            &config,
            dialect,
            config.database().home_index().username.clone(),
            config.database().home_index().password.clone(),
        )?;
        Ok(Self {
            config,
            dialect,
            admin_pool,
            home_index_pool,
            tenant_pools: RwLock::new(HashMap::new()),
            creation_lock: Mutex::new(()),
        })
    }

    fn build_pool(
        config: &AppConfig,
        dialect: Dialect,
        username: String,
        password: String,
    ) -> RepositoryResult<SchemaPool> {
        let db = config.database();
        let inner = match db.engine() {
            DatabaseEngine::SqlServer => PoolInner::SqlServer(SqlServerPool::build(
                db.host(),
                db.port(),
                db.database(),
                &username,
                &password,
                db.max_pool_size(),
                db.acquire_timeout().as_secs_f64(),
            )?),
            DatabaseEngine::Oracle => PoolInner::Oracle(OraclePool::build(
                OracleManager::new(db.host(), db.port(), db.database(), &username, &password),
                db.max_pool_size(),
                db.acquire_timeout(),
            )?),
        };
        Ok(SchemaPool {
            dialect,
            query_timeout: db.query_timeout(),
            inner,
        })
    }
}

#[async_trait]
impl PoolManager for SchemaPoolManager {
    fn admin_pool(&self) -> SchemaPool {
        self.admin_pool.clone()
    }
    fn home_index_pool(&self) -> SchemaPool {
        self.home_index_pool.clone()
    }
    async fn get_pool_for_schema(&self, schema: &str) -> RepositoryResult<SchemaPool> {
        {
            let pools = self
                .tenant_pools
                .read()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            if let Some(pool) = pools.get(schema) {
                return Ok(pool.clone());
            }
        }

        let _creating = self.creation_lock.lock().await;
        {
            let pools = self
                .tenant_pools
                .read()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            if let Some(pool) = pools.get(schema) {
                return Ok(pool.clone());
            }
        }

        debug!("Creating connection pool for schema '{schema}'");
        let pool = Self::build_pool(
            &self.config,
            self.dialect,
            schema.to_string(),
            self.config.tenants().schema_password(schema),
        )?;
        let mut pools = self
            .tenant_pools
            .write()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
        pools.insert(schema.to_string(), pool.clone());
        Ok(pool)
    }
}
