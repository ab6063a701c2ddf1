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
use crate::manager::home_index::model::HomeIndexEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HomeByPhoneQuery {
    pub phone_number: String,
}

/// Discovery response; the phone comes back normalized.
#[derive(Debug, Serialize)]
pub struct HomeByPhoneResponse {
    pub home_id: i32,
    pub home_name: String,
    pub phone_number: String,
}

impl From<HomeIndexEntry> for HomeByPhoneResponse {
    fn from(entry: HomeIndexEntry) -> Self {
        Self {
            home_id: entry.home_id,
            home_name: entry.home_name,
            phone_number: entry.phone_number,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertEntryRequest {
    pub phone_number: String,
    pub home_id: i32,
    pub home_name: String,
}
