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
use crate::manager::app::database::{PoolManager, SchemaPool};
use crate::manager::app::reflection::TableReflector;
use std::sync::Arc;

/// Carrier the repository traits are implemented on, so repositories can
/// reach the pool registry and the reflection cache without either knowing
/// about any repository.
pub struct PoolManagerWrapper {
    pub pool_manager: Arc<dyn PoolManager>,
    pub reflector: Arc<TableReflector>,
}

impl PoolManagerWrapper {
    pub fn new(pool_manager: Arc<dyn PoolManager>, reflector: Arc<TableReflector>) -> Self {
        Self {
            pool_manager,
            reflector,
        }
    }

    /// The per-request recipe of every tenant-schema repository: resolve the
    /// schema's pool, then make sure the table is actually there. A missing
    /// table surfaces as `TableMissing` (incomplete provisioning) instead of
    /// an opaque engine error.
    pub async fn tenant_table(&self, schema: &str, table: &str) -> RepositoryResult<SchemaPool> {
        let pool = self.pool_manager.get_pool_for_schema(schema).await?;
        self.reflector.table(schema, table).await?;
        Ok(pool)
    }
}
