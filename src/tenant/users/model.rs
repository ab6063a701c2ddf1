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

/// Resident profile row of a tenant's `users` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub home_id: i32,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub apartment_number: Option<String>,
    pub photo: Option<String>,
    pub firebase_fcm_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserProfile {
    pub fn from_row(row: &SqlRow) -> RepositoryResult<Self> {
        Ok(Self {
            id: row.get_string("id")?,
            home_id: row.get_i32("home_id")?,
            password: row.get_string("password")?,
            full_name: row.get_opt_string("full_name")?,
            phone_number: row.get_opt_string("phone_number")?,
            role: row.get_string("role")?,
            apartment_number: row.get_opt_string("apartment_number")?,
            photo: row.get_opt_string("photo")?,
            firebase_fcm_token: row.get_opt_string("firebase_fcm_token")?,
            created_at: row.get_timestamp("created_at")?,
            updated_at: row.get_timestamp("updated_at")?,
        })
    }
}
