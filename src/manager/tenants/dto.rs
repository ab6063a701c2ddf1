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
use crate::manager::tenants::model::Home;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHomeRequest {
    pub name: String,
    /// Defaults to the process engine when omitted.
    pub database_type: Option<String>,
    pub admin_user_email: String,
    pub admin_user_password: String,
}

/// Tenant record as the admin API returns it. Includes the seed admin
/// credentials once, at creation time, for handoff to the tenant operator.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedHome {
    pub id: i32,
    pub name: String,
    pub database_name: String,
    pub database_type: String,
    pub database_schema: String,
    pub admin_user_email: String,
    pub admin_user_password: String,
    pub created_at: NaiveDateTime,
}

impl From<Home> for CreatedHome {
    fn from(home: Home) -> Self {
        Self {
            id: home.id,
            name: home.name,
            database_name: home.database_name,
            database_type: home.database_type,
            database_schema: home.database_schema,
            admin_user_email: home.admin_user_email,
            admin_user_password: home.admin_user_password,
            created_at: home.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicHome {
    pub id: i32,
    pub name: String,
    pub database_type: String,
    pub database_schema: String,
    pub admin_user_email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Home> for PublicHome {
    fn from(home: Home) -> Self {
        Self {
            id: home.id,
            name: home.name,
            database_type: home.database_type,
            database_schema: home.database_schema,
            admin_user_email: home.admin_user_email,
            created_at: home.created_at,
            updated_at: home.updated_at,
        }
    }
}
