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
use crate::manager::home_index::phone::normalize_phone;
use crate::tenant::users::model::UserProfile;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

const USER_COLUMNS: &str = "id, home_id, password, full_name, phone_number, role, \
     apartment_number, photo, firebase_fcm_token, created_at, updated_at";

/// Profile access inside one tenant schema. Every method takes the schema
/// resolved by the gate and goes through that schema's own pool.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get_profile(&self, schema: &str, user_id: &str) -> RepositoryResult<UserProfile>;
    async fn get_by_phone(
        &self,
        schema: &str,
        phone_number: &str,
    ) -> RepositoryResult<Option<UserProfile>>;
    async fn list(&self, schema: &str) -> RepositoryResult<Vec<UserProfile>>;
    async fn set_fcm_token(
        &self,
        schema: &str,
        user_id: &str,
        token: &str,
    ) -> RepositoryResult<()>;
}

#[async_trait]
impl UsersRepository for PoolManagerWrapper {
    async fn get_profile(&self, schema: &str, user_id: &str) -> RepositoryResult<UserProfile> {
        let pool = self.tenant_table(schema, "users").await?;
        let row = pool
            .query_one(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                &[SqlValue::from(user_id)],
            )
            .await?;
        UserProfile::from_row(&row)
    }

    async fn get_by_phone(
        &self,
        schema: &str,
        phone_number: &str,
    ) -> RepositoryResult<Option<UserProfile>> {
        let pool = self.tenant_table(schema, "users").await?;
        let row = pool
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = ?"),
                &[SqlValue::from(normalize_phone(phone_number))],
            )
            .await?;
        row.as_ref().map(UserProfile::from_row).transpose()
    }

    async fn list(&self, schema: &str) -> RepositoryResult<Vec<UserProfile>> {
        let pool = self.tenant_table(schema, "users").await?;
        let rows = pool
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY full_name"),
                &[],
            )
            .await?;
        rows.iter().map(UserProfile::from_row).collect()
    }

    async fn set_fcm_token(
        &self,
        schema: &str,
        user_id: &str,
        token: &str,
    ) -> RepositoryResult<()> {
        let pool = self.tenant_table(schema, "users").await?;
        pool.execute(
            "UPDATE users SET firebase_fcm_token = ? WHERE id = ?",
            &[SqlValue::from(token), SqlValue::from(user_id)],
        )
        .await?;
        Ok(())
    }
}
