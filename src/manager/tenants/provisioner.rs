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
use crate::common::repository::PoolManagerWrapper;
use crate::manager::app::config::DatabaseEngine;
use crate::manager::app::database::{SchemaPool, SqlValue};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

/// Schema and principal lifecycle, executed with the admin connection.
///
/// Every operation is idempotent (check-then-create, skip-if-absent) so a
/// partially failed provisioning or teardown can simply be re-run.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SchemaProvisioner: Send + Sync {
    /// Creates the schema-scoped principal (and on SQL Server the schema and
    /// login) with rights limited to that schema.
    async fn create_schema_and_user(&self, schema: &str, password: &str) -> RepositoryResult<()>;
    /// Drops every schema object, then the principal. Skips cleanly when an
    /// artifact is already gone.
    async fn drop_schema_and_user(&self, schema: &str) -> RepositoryResult<()>;
    /// Runs the engine's verification queries; any residual object turns
    /// into `TeardownIncomplete`.
    async fn verify_teardown(&self, schema: &str) -> RepositoryResult<()>;
}

async fn count(pool: &SchemaPool, sql: &str, schema: &str) -> RepositoryResult<i64> {
    pool.query_one(sql, &[SqlValue::from(schema)])
        .await?
        .get_i64("cnt")
}

#[async_trait]
impl SchemaProvisioner for PoolManagerWrapper {
    async fn create_schema_and_user(&self, schema: &str, password: &str) -> RepositoryResult<()> {
        let pool = self.pool_manager.admin_pool();
        let dialect = pool.dialect();

        match dialect.engine() {
            DatabaseEngine::SqlServer => {
                // login, user, schema, in dependency order
                let statements = dialect.create_principal_ddl(schema, password);
                let checks = [
                    dialect.login_exists_sql(),
                    Some(dialect.principal_exists_sql()),
                    dialect.schema_exists_sql(),
                ];
                for (check, ddl) in checks.into_iter().zip(statements) {
                    let exists = match check {
                        Some(sql) => count(&pool, &sql, schema).await? > 0,
                        None => false,
                    };
                    if exists {
                        info!("Schema artifact for '{schema}' already exists, skipping creation");
                    } else {
                        pool.execute_ddl(&ddl).await?;
                    }
                }
            }
            DatabaseEngine::Oracle => {
                // user == schema
                if count(&pool, &dialect.principal_exists_sql(), schema).await? > 0 {
                    info!("User/schema '{schema}' already exists, skipping creation");
                } else {
                    for ddl in dialect.create_principal_ddl(schema, password) {
                        pool.execute_ddl(&ddl).await?;
                    }
                }
            }
        }

        for grant in dialect.grant_ddl(schema) {
            pool.execute_ddl(&grant).await?;
        }

        if count(&pool, &dialect.principal_exists_sql(), schema).await? == 0 {
            return Err(RepositoryError::Query(format!(
                "principal '{schema}' verification failed after creation"
            )));
        }
        info!("Provisioned schema '{schema}'");
        Ok(())
    }

    async fn drop_schema_and_user(&self, schema: &str) -> RepositoryResult<()> {
        let pool = self.pool_manager.admin_pool();
        let dialect = pool.dialect();

        match dialect.engine() {
            DatabaseEngine::SqlServer => {
                if let Some(sql) = dialect.schema_exists_sql() {
                    if count(&pool, &sql, schema).await? > 0 {
                        let tables = pool
                            .query(&dialect.list_tables_sql(), &[SqlValue::from(schema)])
                            .await?;
                        for row in &tables {
                            let table = row.get_string("table_name")?;
                            pool.execute_ddl(&dialect.drop_table_ddl(schema, &table))
                                .await?;
                        }
                        info!("Dropped {} tables in schema '{schema}'", tables.len());
                    }
                }
                let drops = dialect.drop_principal_ddl(schema);
                let checks = [
                    dialect.schema_exists_sql(),
                    Some(dialect.principal_exists_sql()),
                    dialect.login_exists_sql(),
                ];
                for (check, ddl) in checks.into_iter().zip(drops) {
                    let exists = match check {
                        Some(sql) => count(&pool, &sql, schema).await? > 0,
                        None => false,
                    };
                    if exists {
                        pool.execute_ddl(&ddl).await?;
                    }
                }
            }
            DatabaseEngine::Oracle => {
                if count(&pool, &dialect.principal_exists_sql(), schema).await? > 0 {
                    let objects =
                        count(&pool, &dialect.count_schema_objects_sql(), schema).await?;
                    info!("Dropping user/schema '{schema}' with {objects} objects");
                    for ddl in dialect.drop_principal_ddl(schema) {
                        pool.execute_ddl(&ddl).await?;
                    }
                } else {
                    info!("User/schema '{schema}' does not exist");
                }
            }
        }
        Ok(())
    }

    async fn verify_teardown(&self, schema: &str) -> RepositoryResult<()> {
        let pool = self.pool_manager.admin_pool();
        let dialect = pool.dialect();

        let mut residual = Vec::new();
        for (label, sql) in dialect.teardown_verification_sql() {
            if count(&pool, &sql, schema).await? > 0 {
                residual.push(label);
            }
        }
        if residual.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::TeardownIncomplete(format!(
                "residual artifacts for '{schema}': {}",
                residual.join(", ")
            )))
        }
    }
}
