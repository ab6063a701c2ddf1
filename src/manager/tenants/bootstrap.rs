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
use crate::common::error::RepositoryResult;
use crate::manager::app::database::PoolManager;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use tracing::info;

/// Contract the registry invokes after the schema principal exists: once
/// this returns, every tenant table enumerated by the deployment exists in
/// the schema. The DDL content itself is owned by the deployment, not by
/// this service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SchemaBootstrap: Send + Sync {
    async fn create_tenant_tables(&self, schema: &str) -> RepositoryResult<()>;
}

/// Executes deployment-supplied DDL statements through the tenant's own
/// pool, so objects land in (and are owned by) the tenant schema on both
/// engines. `{schema}` placeholders in the statements are substituted.
pub struct DdlSchemaBootstrap {
    pool_manager: Arc<dyn PoolManager>,
    statements: Vec<String>,
}

impl DdlSchemaBootstrap {
    pub fn new(pool_manager: Arc<dyn PoolManager>, statements: Vec<String>) -> Self {
        Self {
            pool_manager,
            statements,
        }
    }
}

#[async_trait]
impl SchemaBootstrap for DdlSchemaBootstrap {
    async fn create_tenant_tables(&self, schema: &str) -> RepositoryResult<()> {
        let pool = self.pool_manager.get_pool_for_schema(schema).await?;
        for statement in &self.statements {
            pool.execute_ddl(&statement.replace("{schema}", schema))
                .await?;
        }
        info!(
            "Bootstrapped schema '{schema}' with {} statements",
            self.statements.len()
        );
        Ok(())
    }
}
