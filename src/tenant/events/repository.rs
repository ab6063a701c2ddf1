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
use crate::common::error::{RepositoryError, RepositoryResult};
use crate::common::repository::PoolManagerWrapper;
use crate::manager::app::database::SqlValue;
use crate::tenant::events::dto::CreateEventRequest;
use crate::tenant::events::model::{Event, RegistrationOutcome};
use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;

const EVENT_COLUMNS: &str = "id, name, event_type, description, date_time, location, \
     max_participants, current_participants, image_url, status, created_at, updated_at";

#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventsRepository: Send + Sync {
    async fn list(&self, schema: &str) -> RepositoryResult<Vec<Event>>;
    async fn get(&self, schema: &str, event_id: &str) -> RepositoryResult<Event>;
    async fn insert(
        &self,
        schema: &str,
        event_id: &str,
        payload: &CreateEventRequest,
    ) -> RepositoryResult<Event>;
    async fn set_image_url(
        &self,
        schema: &str,
        event_id: &str,
        image_url: &str,
    ) -> RepositoryResult<()>;
    /// Serializes concurrent registrations at the database: the capacity
    /// check and the increment are one guarded UPDATE.
    async fn register(
        &self,
        schema: &str,
        event_id: &str,
        user_id: &str,
    ) -> RepositoryResult<RegistrationOutcome>;
    /// Removes the registration and decrements the count, clamped at zero.
    async fn unregister(&self, schema: &str, event_id: &str, user_id: &str)
    -> RepositoryResult<()>;
}

#[async_trait]
impl EventsRepository for PoolManagerWrapper {
    async fn list(&self, schema: &str) -> RepositoryResult<Vec<Event>> {
        let pool = self.tenant_table(schema, "events").await?;
        let rows = pool
            .query(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events \
                     WHERE status = 'active' ORDER BY date_time"
                ),
                &[],
            )
            .await?;
        rows.iter().map(Event::from_row).collect()
    }

    async fn get(&self, schema: &str, event_id: &str) -> RepositoryResult<Event> {
        let pool = self.tenant_table(schema, "events").await?;
        let row = pool
            .query_one(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"),
                &[SqlValue::from(event_id)],
            )
            .await?;
        Event::from_row(&row)
    }

    async fn insert(
        &self,
        schema: &str,
        event_id: &str,
        payload: &CreateEventRequest,
    ) -> RepositoryResult<Event> {
        let pool = self.tenant_table(schema, "events").await?;
        let now = Utc::now().naive_utc();
        pool.execute(
            "INSERT INTO events (id, name, event_type, description, date_time, location, \
             max_participants, current_participants, image_url, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, 'active', ?, ?)",
            &[
                SqlValue::from(event_id),
                SqlValue::from(payload.name.as_str()),
                SqlValue::from(payload.event_type.as_str()),
                SqlValue::from(payload.description.clone()),
                SqlValue::from(payload.date_time),
                SqlValue::from(payload.location.clone()),
                SqlValue::from(payload.max_participants),
                SqlValue::from(payload.image_url.clone()),
                SqlValue::from(now),
                SqlValue::from(now),
            ],
        )
        .await?;
        self.get(schema, event_id).await
    }

    async fn set_image_url(
        &self,
        schema: &str,
        event_id: &str,
        image_url: &str,
    ) -> RepositoryResult<()> {
        let pool = self.tenant_table(schema, "events").await?;
        pool.execute(
            "UPDATE events SET image_url = ?, updated_at = ? WHERE id = ?",
            &[
                SqlValue::from(image_url),
                SqlValue::from(Utc::now().naive_utc()),
                SqlValue::from(event_id),
            ],
        )
        .await?;
        Ok(())
    }

    async fn register(
        &self,
        schema: &str,
        event_id: &str,
        user_id: &str,
    ) -> RepositoryResult<RegistrationOutcome> {
        let pool = self.tenant_table(schema, "events").await?;
        let now = Utc::now().naive_utc();

        // the registration row first: its unique key rejects duplicates
        let inserted = pool
            .execute(
                "INSERT INTO events_registration (event_id, user_id, created_at) \
                 VALUES (?, ?, ?)",
                &[
                    SqlValue::from(event_id),
                    SqlValue::from(user_id),
                    SqlValue::from(now),
                ],
            )
            .await;
        match inserted {
            Ok(_) => {}
            Err(RepositoryError::UniqueViolation(_)) => {
                return Ok(RegistrationOutcome::AlreadyRegistered);
            }
            Err(e) => return Err(e),
        }

        let updated = pool
            .execute(
                "UPDATE events SET current_participants = current_participants + 1, \
                 updated_at = ? \
                 WHERE id = ? AND current_participants < max_participants",
                &[
                    SqlValue::from(now),
                    SqlValue::from(event_id),
                ],
            )
            .await?;
        if updated == 0 {
            // full (or gone); take the registration row back out
            pool.execute(
                "DELETE FROM events_registration WHERE event_id = ? AND user_id = ?",
                &[SqlValue::from(event_id), SqlValue::from(user_id)],
            )
            .await?;
            // distinguish a missing event from a full one
            self.get(schema, event_id).await?;
            return Ok(RegistrationOutcome::EventFull);
        }
        Ok(RegistrationOutcome::Registered)
    }

    async fn unregister(
        &self,
        schema: &str,
        event_id: &str,
        user_id: &str,
    ) -> RepositoryResult<()> {
        let pool = self.tenant_table(schema, "events").await?;
        let deleted = pool
            .execute(
                "DELETE FROM events_registration WHERE event_id = ? AND user_id = ?",
                &[SqlValue::from(event_id), SqlValue::from(user_id)],
            )
            .await?;
        if deleted > 0 {
            // clamped at zero by the guard
            pool.execute(
                "UPDATE events SET current_participants = current_participants - 1, \
                 updated_at = ? \
                 WHERE id = ? AND current_participants > 0",
                &[
                    SqlValue::from(Utc::now().naive_utc()),
                    SqlValue::from(event_id),
                ],
            )
            .await?;
        }
        Ok(())
    }
}
