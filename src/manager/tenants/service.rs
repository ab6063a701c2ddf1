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
use crate::common::MailTransporter;
use crate::common::dto::GeneralError;
use crate::common::error::{FriendlyError, IntoFriendlyError, RepositoryError};
use crate::manager::tenants::TenantsModule;
use crate::manager::tenants::dto::CreateHomeRequest;
use crate::manager::tenants::model::{Home, NewHome};
use crate::manager::tenants::types::TenantName;
use crate::storage::keys;
use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Level, error, info};

#[derive(Debug, Error)]
pub enum TenantsServiceError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Validation(String),

    #[error("Tenant not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Teardown incomplete: {0}")]
    TeardownIncomplete(String),
}

#[async_trait]
impl IntoFriendlyError<GeneralError> for TenantsServiceError {
    async fn into_friendly_error(
        self,
        module: Arc<dyn MailTransporter>,
    ) -> FriendlyError<GeneralError> {
        match self {
            TenantsServiceError::Validation(_) => FriendlyError::user_facing(
                Level::DEBUG,
                StatusCode::BAD_REQUEST,
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            TenantsServiceError::NotFound => FriendlyError::user_facing(
                Level::DEBUG,
                StatusCode::NOT_FOUND,
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            TenantsServiceError::TeardownIncomplete(_) => FriendlyError::user_facing(
                Level::ERROR,
                StatusCode::INTERNAL_SERVER_ERROR,
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            TenantsServiceError::Storage(_) => FriendlyError::user_facing(
                Level::WARN,
                StatusCode::BAD_GATEWAY,
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            TenantsServiceError::Repository(ref e)
                if e.is_retryable() || e.is_unique_violation() || e.is_not_found() =>
            {
                let status = match e {
                    RepositoryError::NotFound => StatusCode::NOT_FOUND,
                    other => other.status_code(),
                };
                FriendlyError::user_facing(
                    Level::WARN,
                    status,
                    file!(),
                    GeneralError {
                        message: self.to_string(),
                    },
                )
            }
            e => {
                FriendlyError::internal_with_admin_notify(
                    file!(),
                    GeneralError {
                        message: e.to_string(),
                    },
                    module,
                )
                .await
            }
        }
    }
}

pub struct TenantsService;

type TenantsServiceResult<T> = Result<T, TenantsServiceError>;

impl TenantsService {
    /// Provisions a tenant end to end. The catalog record is written last:
    /// its presence is the commit marker, so a crash mid-way leaves at most
    /// idempotent artifacts that the next attempt re-uses and no routable
    /// tenant. Any step failure triggers a best-effort rollback of what was
    /// created.
    pub async fn create(
        payload: &CreateHomeRequest,
        module: Arc<dyn TenantsModule>,
    ) -> TenantsServiceResult<Home> {
        let name = TenantName::new(&payload.name).map_err(TenantsServiceError::Validation)?;
        let schema = name.as_str().to_string();

        if module.homes_repo().lookup_by_name(&schema).await.is_ok() {
            return Err(TenantsServiceError::Validation(format!(
                "Tenant '{schema}' already exists"
            )));
        }

        let engine = module.config().database().engine();
        if let Some(requested) = payload.database_type.as_deref() {
            if requested != engine.as_str() {
                return Err(TenantsServiceError::Validation(format!(
                    "database_type '{requested}' does not match the configured engine '{engine}'"
                )));
            }
        }

        let id = module.homes_repo().next_home_id().await?;
        let password = module.config().tenants().schema_password(&schema);
        let container = module.config().storage().container().to_string();

        let provisioned = async {
            module
                .provisioner()
                .create_schema_and_user(&schema, &password)
                .await?;
            module.bootstrap().create_tenant_tables(&schema).await?;
            module
                .storage()
                .ensure_container(&container)
                .await
                .map_err(|e| TenantsServiceError::Storage(e.to_string()))?;
            Ok::<(), TenantsServiceError>(())
        }
        .await;

        if let Err(e) = provisioned {
            Self::rollback(&module, &schema, id, &container).await;
            return Err(e);
        }

        let inserted = module
            .homes_repo()
            .insert(&NewHome {
                id,
                name: schema.clone(),
                database_name: module.config().database().database().to_string(),
                database_type: engine.as_str().to_string(),
                database_schema: schema.clone(),
                admin_user_email: payload.admin_user_email.clone(),
                admin_user_password: payload.admin_user_password.clone(),
            })
            .await;

        match inserted {
            Ok(home) => {
                module.directory().invalidate(&schema);
                info!("Created tenant '{}' (ID: {})", home.name, home.id);
                Ok(home)
            }
            Err(e) => {
                Self::rollback(&module, &schema, id, &container).await;
                Err(e.into())
            }
        }
    }

    /// Tears a tenant down in reverse order of creation: record, storage,
    /// schema objects, principal. Each step skips cleanly when its artifact
    /// is already gone, so a partial teardown can be re-run.
    pub async fn delete(
        name: &str,
        module: Arc<dyn TenantsModule>,
    ) -> TenantsServiceResult<()> {
        let name = TenantName::new(name).map_err(TenantsServiceError::Validation)?;
        let schema = name.as_str();

        let home = match module.homes_repo().lookup_by_name(schema).await {
            Ok(home) => Some(home),
            Err(RepositoryError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        module.homes_repo().delete_by_name(schema).await?;
        module.directory().invalidate(schema);

        if let Some(home) = &home {
            module
                .storage()
                .delete_prefix(
                    module.config().storage().container(),
                    &keys::tenant_prefix(home.id),
                )
                .await
                .map_err(|e| TenantsServiceError::Storage(e.to_string()))?;
        }

        module.provisioner().drop_schema_and_user(schema).await?;
        match module.provisioner().verify_teardown(schema).await {
            Ok(()) => {}
            Err(RepositoryError::TeardownIncomplete(detail)) => {
                return Err(TenantsServiceError::TeardownIncomplete(detail));
            }
            Err(e) => return Err(e.into()),
        }

        if home.is_none() {
            // idempotent re-run of a partial teardown
            info!("Tenant '{schema}' had no catalog record; cleaned residual artifacts");
        } else {
            info!("Deleted tenant '{schema}'");
        }
        Ok(())
    }

    pub async fn get(name: &str, module: Arc<dyn TenantsModule>) -> TenantsServiceResult<Home> {
        match module.homes_repo().lookup_by_name(name).await {
            Ok(home) => Ok(home),
            Err(RepositoryError::NotFound) => Err(TenantsServiceError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(module: Arc<dyn TenantsModule>) -> TenantsServiceResult<Vec<Home>> {
        Ok(module.homes_repo().list_all().await?)
    }

    async fn rollback(
        module: &Arc<dyn TenantsModule>,
        schema: &str,
        home_id: i32,
        container: &str,
    ) {
        error!("Provisioning of tenant '{schema}' failed, rolling back created artifacts");
        if let Err(e) = module
            .storage()
            .delete_prefix(container, &keys::tenant_prefix(home_id))
            .await
        {
            error!("Rollback: could not remove storage prefix for '{schema}': {e}");
        }
        if let Err(e) = module.provisioner().drop_schema_and_user(schema).await {
            error!("Rollback: could not drop schema/user for '{schema}': {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::app::config::AppConfigBuilder;
    use crate::manager::tenants::bootstrap::MockSchemaBootstrap;
    use crate::manager::tenants::directory::MockTenantDirectory;
    use crate::manager::tenants::provisioner::MockSchemaProvisioner;
    use crate::manager::tenants::repository::MockHomesRepository;
    use crate::manager::tenants::tests::MockTenantsModule;
    use crate::storage::MockObjectStorage;
    use chrono::Utc;
    use std::sync::Arc;

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

    fn request(name: &str) -> CreateHomeRequest {
        CreateHomeRequest {
            name: name.to_string(),
            database_type: None,
            admin_user_email: "admin@acme.example".to_string(),
            admin_user_password: "seed".to_string(),
        }
    }

    fn module_with(
        repo: MockHomesRepository,
        provisioner: MockSchemaProvisioner,
        bootstrap: MockSchemaBootstrap,
        storage: MockObjectStorage,
        directory: MockTenantDirectory,
    ) -> Arc<MockTenantsModule> {
        let mut module = MockTenantsModule::new();
        let config = Arc::new(AppConfigBuilder::default().build().unwrap());
        let repo = Arc::new(repo);
        let provisioner = Arc::new(provisioner);
        let bootstrap = Arc::new(bootstrap);
        let storage = Arc::new(storage);
        let directory = Arc::new(directory);
        module.expect_config().returning(move || config.clone());
        module.expect_homes_repo().returning(move || repo.clone());
        module
            .expect_provisioner()
            .returning(move || provisioner.clone());
        module
            .expect_bootstrap()
            .returning(move || bootstrap.clone());
        module.expect_storage().returning(move || storage.clone());
        module
            .expect_directory()
            .returning(move || directory.clone());
        Arc::new(module)
    }

    #[tokio::test]
    async fn test_create_provisions_then_inserts_record_last() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .returning(|_| Err(RepositoryError::NotFound));
        repo.expect_next_home_id().returning(|| Ok(4));
        repo.expect_insert()
            .times(1)
            .withf(|new_home| {
                new_home.id == 4 && new_home.name == "acme" && new_home.database_schema == "acme"
            })
            .returning(|_| Ok(home(4, "acme")));

        let mut provisioner = MockSchemaProvisioner::new();
        provisioner
            .expect_create_schema_and_user()
            .times(1)
            .withf(|schema, password| schema == "acme" && password == "acme2025!")
            .returning(|_, _| Ok(()));

        let mut bootstrap = MockSchemaBootstrap::new();
        bootstrap
            .expect_create_tenant_tables()
            .times(1)
            .returning(|_| Ok(()));

        let mut storage = MockObjectStorage::new();
        storage.expect_ensure_container().returning(|_| Ok(()));

        let mut directory = MockTenantDirectory::new();
        directory.expect_invalidate().times(1).return_const(());

        let module = module_with(repo, provisioner, bootstrap, storage, directory);
        let created = TenantsService::create(&request("acme"), module).await.unwrap();
        assert_eq!(created.id, 4);
    }

    #[tokio::test]
    async fn test_create_rejects_reserved_name_without_touching_anything() {
        let module = module_with(
            MockHomesRepository::new(),
            MockSchemaProvisioner::new(),
            MockSchemaBootstrap::new(),
            MockObjectStorage::new(),
            MockTenantDirectory::new(),
        );
        for reserved in ["admin", "api", "home", "debug"] {
            let err = TenantsService::create(&request(reserved), module.clone())
                .await
                .unwrap_err();
            assert!(matches!(err, TenantsServiceError::Validation(_)), "{reserved}");
        }
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_bootstrap_fails() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .returning(|_| Err(RepositoryError::NotFound));
        repo.expect_next_home_id().returning(|| Ok(9));
        repo.expect_insert().times(0);

        let mut provisioner = MockSchemaProvisioner::new();
        provisioner
            .expect_create_schema_and_user()
            .returning(|_, _| Ok(()));
        provisioner
            .expect_drop_schema_and_user()
            .times(1)
            .returning(|_| Ok(()));

        let mut bootstrap = MockSchemaBootstrap::new();
        bootstrap
            .expect_create_tenant_tables()
            .returning(|_| Err(RepositoryError::Query("DDL failed".to_string())));

        let mut storage = MockObjectStorage::new();
        storage
            .expect_delete_prefix()
            .times(1)
            .returning(|_, _| Ok(0));

        let module = module_with(repo, provisioner, bootstrap, storage, MockTenantDirectory::new());
        assert!(TenantsService::create(&request("acme"), module).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_runs_teardown_in_reverse_order() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .returning(|_| Ok(home(4, "acme")));
        repo.expect_delete_by_name()
            .times(1)
            .returning(|_| Ok(true));

        let mut storage = MockObjectStorage::new();
        storage
            .expect_delete_prefix()
            .times(1)
            .withf(|_, prefix| prefix == "4/")
            .returning(|_, _| Ok(2));

        let mut provisioner = MockSchemaProvisioner::new();
        provisioner
            .expect_drop_schema_and_user()
            .times(1)
            .returning(|_| Ok(()));
        provisioner
            .expect_verify_teardown()
            .times(1)
            .returning(|_| Ok(()));

        let mut directory = MockTenantDirectory::new();
        directory.expect_invalidate().times(1).return_const(());

        let module = module_with(
            repo,
            provisioner,
            MockSchemaBootstrap::new(),
            storage,
            directory,
        );
        TenantsService::delete("acme", module).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_surfaces_teardown_incomplete() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .returning(|_| Ok(home(4, "acme")));
        repo.expect_delete_by_name().returning(|_| Ok(true));

        let mut storage = MockObjectStorage::new();
        storage.expect_delete_prefix().returning(|_, _| Ok(0));

        let mut provisioner = MockSchemaProvisioner::new();
        provisioner
            .expect_drop_schema_and_user()
            .returning(|_| Ok(()));
        provisioner.expect_verify_teardown().returning(|_| {
            Err(RepositoryError::TeardownIncomplete(
                "residual artifacts for 'acme': login".to_string(),
            ))
        });

        let mut directory = MockTenantDirectory::new();
        directory.expect_invalidate().return_const(());

        let module = module_with(
            repo,
            provisioner,
            MockSchemaBootstrap::new(),
            storage,
            directory,
        );
        let err = TenantsService::delete("acme", module).await.unwrap_err();
        assert!(matches!(err, TenantsServiceError::TeardownIncomplete(_)));
    }

    #[tokio::test]
    async fn test_delete_of_absent_tenant_still_sweeps_artifacts() {
        let mut repo = MockHomesRepository::new();
        repo.expect_lookup_by_name()
            .returning(|_| Err(RepositoryError::NotFound));
        repo.expect_delete_by_name().returning(|_| Ok(false));

        let mut provisioner = MockSchemaProvisioner::new();
        provisioner
            .expect_drop_schema_and_user()
            .times(1)
            .returning(|_| Ok(()));
        provisioner
            .expect_verify_teardown()
            .times(1)
            .returning(|_| Ok(()));

        let mut directory = MockTenantDirectory::new();
        directory.expect_invalidate().return_const(());

        let module = module_with(
            repo,
            provisioner,
            MockSchemaBootstrap::new(),
            MockObjectStorage::new(),
            directory,
        );
        TenantsService::delete("acme", module).await.unwrap();
    }
}
