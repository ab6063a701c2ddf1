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
use crate::manager::home_index::model::HomeIndexEntry;
use crate::manager::home_index::phone::normalize_phone;
use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;

const ENTRY_COLUMNS: &str = "phone_number, home_id, home_name, created_at, updated_at";

/// Directory access. Phone numbers are normalized here, on both the write
/// and the read side, so callers can pass whatever the client typed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HomeIndexRepository: Send + Sync {
    /// Insert, or update `home_id`/`home_name` when the phone already has an
    /// entry.
    async fn upsert(
        &self,
        phone_number: &str,
        home_id: i32,
        home_name: &str,
    ) -> RepositoryResult<HomeIndexEntry>;
    async fn get(&self, phone_number: &str) -> RepositoryResult<Option<HomeIndexEntry>>;
    async fn delete(&self, phone_number: &str) -> RepositoryResult<bool>;
    async fn list_all(&self) -> RepositoryResult<Vec<HomeIndexEntry>>;
}

#[async_trait]
impl HomeIndexRepository for PoolManagerWrapper {
    async fn upsert(
        &self,
        phone_number: &str,
        home_id: i32,
        home_name: &str,
    ) -> RepositoryResult<HomeIndexEntry> {
        let phone = normalize_phone(phone_number);
        let pool = self.pool_manager.home_index_pool();
        let now = Utc::now().naive_utc();

        let updated = pool
            .execute(
                "UPDATE home_index SET home_id = ?, home_name = ?, updated_at = ? \
                 WHERE phone_number = ?",
                &[
                    SqlValue::from(home_id),
                    SqlValue::from(home_name),
                    SqlValue::from(now),
                    SqlValue::from(phone.as_str()),
                ],
            )
            .await?;
        if updated == 0 {
            pool.execute(
                "INSERT INTO home_index (phone_number, home_id, home_name, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?)",
                &[
                    SqlValue::from(phone.as_str()),
                    SqlValue::from(home_id),
                    SqlValue::from(home_name),
                    SqlValue::from(now),
                    SqlValue::from(now),
                ],
            )
            .await?;
        }

        let row = pool
            .query_one(
                &format!("SELECT {ENTRY_COLUMNS} FROM home_index WHERE phone_number = ?"),
                &[SqlValue::from(phone.as_str())],
            )
            .await?;
        HomeIndexEntry::from_row(&row)
    }

    async fn get(&self, phone_number: &str) -> RepositoryResult<Option<HomeIndexEntry>> {
        let phone = normalize_phone(phone_number);
        let row = self
            .pool_manager
            .home_index_pool()
            .query_opt(
                &format!("SELECT {ENTRY_COLUMNS} FROM home_index WHERE phone_number = ?"),
                &[SqlValue::from(phone.as_str())],
            )
            .await?;
        row.as_ref().map(HomeIndexEntry::from_row).transpose()
    }

    async fn delete(&self, phone_number: &str) -> RepositoryResult<bool> {
        let phone = normalize_phone(phone_number);
        let affected = self
            .pool_manager
            .home_index_pool()
            .execute(
                "DELETE FROM home_index WHERE phone_number = ?",
                &[SqlValue::from(phone.as_str())],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<HomeIndexEntry>> {
        let rows = self
            .pool_manager
            .home_index_pool()
            .query(
                &format!("SELECT {ENTRY_COLUMNS} FROM home_index ORDER BY phone_number"),
                &[],
            )
            .await?;
        rows.iter().map(HomeIndexEntry::from_row).collect()
    }
}
