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

/// One tenant record of the admin catalog (`home` table).
///
/// `name` and `database_schema` are equal for every non-legacy tenant; the
/// request gate and the pool registry both rely on the record rather than on
/// that convention.
#[derive(Debug, Clone, Serialize)]
pub struct Home {
    pub id: i32,
    pub name: String,
    pub database_name: String,
    pub database_type: String,
    pub database_schema: String,
    pub admin_user_email: String,
    /// Seed credential for the tenant's first admin login. Stored as-is and
    /// treated as opaque: never interpreted, never logged.
    #[serde(skip_serializing)]
    pub admin_user_password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Home {
    pub fn from_row(row: &SqlRow) -> RepositoryResult<Self> {
        Ok(Self {
            id: row.get_i32("id")?,
            name: row.get_string("name")?,
            database_name: row.get_string("database_name")?,
            database_type: row.get_string("database_type")?,
            database_schema: row.get_string("database_schema")?,
            admin_user_email: row.get_string("admin_user_email")?,
            admin_user_password: row.get_string("admin_user_password")?,
            created_at: row.get_timestamp("created_at")?,
            updated_at: row.get_timestamp("updated_at")?,
        })
    }
}

/// Insert payload; `id` is assigned by the registry before the record is
/// written (the record itself is the commit marker of provisioning).
#[derive(Debug, Clone)]
pub struct NewHome {
    pub id: i32,
    pub name: String,
    pub database_name: String,
    pub database_type: String,
    pub database_schema: String,
    pub admin_user_email: String,
    pub admin_user_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::app::database::SqlValue;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_home_from_row() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let row = SqlRow::new(
            vec![
                "id".into(),
                "name".into(),
                "database_name".into(),
                "database_type".into(),
                "database_schema".into(),
                "admin_user_email".into(),
                "admin_user_password".into(),
                "created_at".into(),
                "updated_at".into(),
            ],
            vec![
                SqlValue::Int(1),
                SqlValue::Text("beresheet".into()),
                SqlValue::Text("residents".into()),
                SqlValue::Text("sqlserver".into()),
                SqlValue::Text("beresheet".into()),
                SqlValue::Text("admin@beresheet.example".into()),
                SqlValue::Text("seed".into()),
                SqlValue::Timestamp(now),
                SqlValue::Timestamp(now),
            ],
        );
        let home = Home::from_row(&row).unwrap();
        assert_eq!(home.id, 1);
        assert_eq!(home.name, "beresheet");
        assert_eq!(home.database_schema, "beresheet");
    }

    #[test]
    fn test_seed_password_is_not_serialized() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let home = Home {
            id: 1,
            name: "beresheet".into(),
            database_name: "residents".into(),
            database_type: "sqlserver".into(),
            database_schema: "beresheet".into(),
            admin_user_email: "admin@beresheet.example".into(),
            admin_user_password: "seed".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&home).unwrap();
        assert!(!json.contains("seed"));
    }
}
