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

/// Community event row of a tenant's `events` table. `current_participants`
/// never exceeds `max_participants`; the registration path enforces that at
/// the database, not here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub description: Option<String>,
    pub date_time: NaiveDateTime,
    pub location: Option<String>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    pub fn from_row(row: &SqlRow) -> RepositoryResult<Self> {
        Ok(Self {
            id: row.get_string("id")?,
            name: row.get_string("name")?,
            event_type: row.get_string("event_type")?,
            description: row.get_opt_string("description")?,
            date_time: row.get_timestamp("date_time")?,
            location: row.get_opt_string("location")?,
            max_participants: row.get_i32("max_participants")?,
            current_participants: row.get_i32("current_participants")?,
            image_url: row.get_opt_string("image_url")?,
            status: row.get_string("status")?,
            created_at: row.get_timestamp("created_at")?,
            updated_at: row.get_timestamp("updated_at")?,
        })
    }
}

/// Outcome of a registration attempt; the repository turns row counts into
/// this so the service layer never sees SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    EventFull,
    AlreadyRegistered,
}
