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
use crate::manager::app::database::SqlRow;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One phone→home mapping of the global directory (`home_index` table).
/// `home_name` is a denormalized copy for display; `home_id` is not
/// FK-enforced because the tenant catalog lives in another schema.
#[derive(Debug, Clone, Serialize)]
pub struct HomeIndexEntry {
    pub phone_number: String,
    pub home_id: i32,
    pub home_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl HomeIndexEntry {
    pub fn from_row(row: &SqlRow) -> RepositoryResult<Self> {
        Ok(Self {
            phone_number: row.get_string("phone_number")?,
            home_id: row.get_i32("home_id")?,
            home_name: row.get_string("home_name")?,
            created_at: row.get_timestamp("created_at")?,
            updated_at: row.get_timestamp("updated_at")?,
        })
    }
}
