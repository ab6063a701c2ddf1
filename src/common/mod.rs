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

use std::sync::Arc;

use crate::{
    common::repository::PoolManagerWrapper,
    manager::{
        app::{
            config::AppConfig,
            database::{PoolManager, SchemaPoolManager},
            reflection::TableReflector,
        },
        tenants::{
            bootstrap::{DdlSchemaBootstrap, SchemaBootstrap},
            directory::{CachedTenantDirectory, TenantDirectory},
            repository::HomesRepository,
        },
    },
    storage::ObjectStorage,
};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::{Error, authentication::Credentials, response::Response},
};
use tracing::{error, info};

pub(crate) mod dto;
pub(crate) mod error;
pub(crate) mod extractors;
pub(crate) mod repository;
pub(crate) mod services;

pub trait ConfigProvider: Send + Sync {
    fn config(&self) -> Arc<AppConfig>;
}

#[async_trait]
pub trait MailTransporter: ConfigProvider + Send + Sync {
    async fn send(&self, message: Message) -> Result<Response, Error>;
}

/// The application root. Owns every process-wide resource - configuration,
/// the pool registry, the reflection cache, the tenant directory, storage
/// and the mail transport - and hands them to the per-module traits as
/// read-only handles. Nothing else owns a pool or a tenant record.
pub struct AppState<P, T>
where
    P: Send + Sync,
    T: Send + Sync,
{
    pub config: Arc<AppConfig>,
    pub default_smtp_transport: Arc<T>,
    pub pool_manager: Arc<P>,
    pub pool_wrapper: Arc<PoolManagerWrapper>,
    pub reflector: Arc<TableReflector>,
    pub directory: Arc<dyn TenantDirectory>,
    pub bootstrap: Arc<dyn SchemaBootstrap>,
    pub storage: Arc<dyn ObjectStorage>,
}

pub type DefaultSmtpTransport = AsyncSmtpTransport<Tokio1Executor>;
pub type DefaultAppState = AppState<SchemaPoolManager, DefaultSmtpTransport>;

impl DefaultAppState {
    fn init_config() -> anyhow::Result<AppConfig> {
        Ok(AppConfig::from_env()?)
    }

    fn init_smtp_transport(config: Arc<AppConfig>) -> anyhow::Result<DefaultSmtpTransport> {
        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.mail().smtp_host())?
                .credentials(Credentials::new(
                    config.mail().smtp_user().to_owned(),
                    config.mail().smtp_passwd().to_owned(),
                ))
                .build(),
        )
    }

    /// Tenant table DDL shipped by the deployment; absent in development,
    /// where provisioning creates empty schemas.
    fn init_bootstrap_statements() -> Vec<String> {
        let dir = std::path::Path::new("config/tenant-ddl");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        paths.sort();
        paths
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .collect()
    }

    pub async fn new() -> anyhow::Result<DefaultAppState> {
        let config = Arc::new(Self::init_config()?);
        let pool_manager = Arc::new(SchemaPoolManager::new(config.clone())?);
        let reflector = Arc::new(TableReflector::new(pool_manager.clone()));
        let pool_wrapper = Arc::new(PoolManagerWrapper::new(
            pool_manager.clone(),
            reflector.clone(),
        ));
        let directory = Arc::new(CachedTenantDirectory::new(
            pool_wrapper.clone(),
            CachedTenantDirectory::DEFAULT_TTL,
        ));
        let bootstrap = Arc::new(DdlSchemaBootstrap::new(
            pool_manager.clone(),
            Self::init_bootstrap_statements(),
        ));
        let storage = crate::storage::from_config(config.storage())?;
        Ok(Self {
            config: config.clone(),
            default_smtp_transport: Arc::new(Self::init_smtp_transport(config.clone())?),
            pool_manager,
            pool_wrapper,
            reflector,
            directory,
            bootstrap,
            storage,
        })
    }

    /// Verifies the admin and home_index pools actually reach the engine;
    /// startup aborts on failure rather than limping without a catalog.
    pub async fn ping_control_pools(&self) -> anyhow::Result<()> {
        self.pool_manager.admin_pool().ping().await?;
        self.pool_manager.home_index_pool().ping().await?;
        Ok(())
    }

    /// Pre-creates a pool for every known tenant so the first request after
    /// startup does not pay the cold path. Failures are logged, not fatal:
    /// the lazy path retries per request.
    pub async fn warm_tenant_pools(&self) -> anyhow::Result<()> {
        let repo: Arc<dyn HomesRepository> = self.pool_wrapper.clone();
        for home in repo.list_all().await? {
            match self
                .pool_manager
                .get_pool_for_schema(&home.database_schema)
                .await
            {
                Ok(_) => info!("Tenant pool initialization is successful: {}", home.name),
                Err(e) => error!("Tenant pool initialization failed for {}: {e}", home.name),
            }
        }
        Ok(())
    }
}

impl<P, T> ConfigProvider for AppState<P, T>
where
    P: Send + Sync,
    T: Send + Sync,
{
    fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }
}

#[async_trait]
impl<P> MailTransporter for AppState<P, DefaultSmtpTransport>
where
    P: Send + Sync,
{
    async fn send(&self, message: Message) -> Result<Response, Error> {
        self.default_smtp_transport.send(message).await
    }
}
