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
use crate::common::repository::PoolManagerWrapper;
use crate::manager::app::database::SqlValue;
use crate::manager::tenants::model::{Home, NewHome};
use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;

/// Catalog access for tenant records. The admin pool's principal owns the
/// catalog schema, so the `home` table is addressed unqualified.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HomesRepository: Send + Sync {
    async fn lookup_by_name(&self, name: &str) -> RepositoryResult<Home>;
    async fn lookup_by_id(&self, id: i32) -> RepositoryResult<Home>;
    /// Every tenant, in insertion order.
    async fn list_all(&self) -> RepositoryResult<Vec<Home>>;
    async fn insert(&self, new_home: &NewHome) -> RepositoryResult<Home>;
    /// Returns whether a record was removed.
    async fn delete_by_name(&self, name: &str) -> RepositoryResult<bool>;
    /// Next free catalog id. Ids are assigned by the registry, not the
    /// engine, because the catalog must work identically on both engines.
    async fn next_home_id(&self) -> RepositoryResult<i32>;
}

const HOME_COLUMNS: &str = "id, name, database_name, database_type, database_schema, \
     admin_user_email, admin_user_password, created_at, updated_at";

#[async_trait]
impl HomesRepository for PoolManagerWrapper {
    async fn lookup_by_name(&self, name: &str) -> RepositoryResult<Home> {
        let row = self
            .pool_manager
            .admin_pool()
            .query_one(
                &format!("SELECT {HOME_COLUMNS} FROM home WHERE name = ?"),
                &[SqlValue::from(name)],
            )
            .await?;
        Home::from_row(&row)
    }

    async fn lookup_by_id(&self, id: i32) -> RepositoryResult<Home> {
        let row = self
            .pool_manager
            .admin_pool()
            .query_one(
                &format!("SELECT {HOME_COLUMNS} FROM home WHERE id = ?"),
                &[SqlValue::from(id)],
            )
            .await?;
        Home::from_row(&row)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Home>> {
        let rows = self
            .pool_manager
            .admin_pool()
            .query(
                &format!("SELECT {HOME_COLUMNS} FROM home ORDER BY id"),
                &[],
            )
            .await?;
        rows.iter().map(Home::from_row).collect()
    }

    async fn insert(&self, new_home: &NewHome) -> RepositoryResult<Home> {
        let now = Utc::now().naive_utc();
        self.pool_manager
            .admin_pool()
            .execute(
                "INSERT INTO home (id, name, database_name, database_type, database_schema, \
                 admin_user_email, admin_user_password, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                &[
                    SqlValue::from(new_home.id),
                    SqlValue::from(new_home.name.as_str()),
                    SqlValue::from(new_home.database_name.as_str()),
                    SqlValue::from(new_home.database_type.as_str()),
                    SqlValue::from(new_home.database_schema.as_str()),
                    SqlValue::from(new_home.admin_user_email.as_str()),
                    SqlValue::from(new_home.admin_user_password.as_str()),
                    SqlValue::from(now),
                    SqlValue::from(now),
                ],
            )
            .await?;
        self.lookup_by_id(new_home.id).await
    }

    async fn delete_by_name(&self, name: &str) -> RepositoryResult<bool> {
        let affected = self
            .pool_manager
            .admin_pool()
            .execute("DELETE FROM home WHERE name = ?", &[SqlValue::from(name)])
            .await?;
        Ok(affected > 0)
    }

    async fn next_home_id(&self) -> RepositoryResult<i32> {
        let row = self
            .pool_manager
            .admin_pool()
            .query_one("SELECT COALESCE(MAX(id), 0) + 1 AS next_id FROM home", &[])
            .await?;
        row.get_i32("next_id")
    }
}
