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
use crate::common::MailTransporter;
use crate::common::dto::GeneralError;
use crate::common::error::{FriendlyError, IntoFriendlyError, RepositoryError};
use crate::common::services::generate_string_csprng;
use crate::tenant::context::TenantContext;
use crate::tenant::events::EventsModule;
use crate::tenant::events::dto::CreateEventRequest;
use crate::tenant::events::model::{Event, RegistrationOutcome};
use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum EventsServiceError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Event not found")]
    NotFound,

    #[error("Event is full")]
    EventFull,

    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[async_trait]
impl IntoFriendlyError<GeneralError> for EventsServiceError {
    async fn into_friendly_error(
        self,
        mailer: Arc<dyn MailTransporter>,
    ) -> FriendlyError<GeneralError> {
        let status = match &self {
            EventsServiceError::NotFound => Some(StatusCode::NOT_FOUND),
            EventsServiceError::EventFull | EventsServiceError::AlreadyRegistered => {
                Some(StatusCode::CONFLICT)
            }
            EventsServiceError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            EventsServiceError::Storage(_) => Some(StatusCode::BAD_GATEWAY),
            EventsServiceError::Repository(e) if e.is_retryable() => Some(e.status_code()),
            EventsServiceError::Repository(_) => None,
        };
        match status {
            Some(status) => FriendlyError::user_facing(
                Level::DEBUG,
                status,
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            None => {
                FriendlyError::internal_with_admin_notify(
                    file!(),
                    GeneralError {
                        message: self.to_string(),
                    },
                    mailer,
                )
                .await
            }
        }
    }
}

pub struct EventsService;

type EventsServiceResult<T> = Result<T, EventsServiceError>;

impl EventsService {
    pub async fn list(
        ctx: &TenantContext,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Vec<Event>> {
        Ok(module.events_repo().list(ctx.schema()).await?)
    }

    pub async fn get(
        ctx: &TenantContext,
        event_id: &str,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Event> {
        match module.events_repo().get(ctx.schema(), event_id).await {
            Ok(event) => Ok(event),
            Err(RepositoryError::NotFound) => Err(EventsServiceError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create(
        ctx: &TenantContext,
        payload: &CreateEventRequest,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Event> {
        if payload.max_participants < 0 {
            return Err(EventsServiceError::Validation(
                "maxParticipants must not be negative".to_string(),
            ));
        }
        let event_id = generate_string_csprng(24);
        Ok(module
            .events_repo()
            .insert(ctx.schema(), &event_id, payload)
            .await?)
    }

    pub async fn register(
        ctx: &TenantContext,
        event_id: &str,
        user_id: &str,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Event> {
        let outcome = match module
            .events_repo()
            .register(ctx.schema(), event_id, user_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(RepositoryError::NotFound) => return Err(EventsServiceError::NotFound),
            Err(e) => return Err(e.into()),
        };
        match outcome {
            RegistrationOutcome::Registered => Self::get(ctx, event_id, module).await,
            RegistrationOutcome::EventFull => Err(EventsServiceError::EventFull),
            RegistrationOutcome::AlreadyRegistered => Err(EventsServiceError::AlreadyRegistered),
        }
    }

    pub async fn unregister(
        ctx: &TenantContext,
        event_id: &str,
        user_id: &str,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Event> {
        module
            .events_repo()
            .unregister(ctx.schema(), event_id, user_id)
            .await?;
        Self::get(ctx, event_id, module).await
    }

    /// Stores an event image under the tenant's storage prefix and records
    /// the returned URL on the event.
    pub async fn upload_image(
        ctx: &TenantContext,
        event_id: &str,
        content_type: &str,
        bytes: Vec<u8>,
        module: Arc<dyn EventsModule>,
    ) -> EventsServiceResult<Event> {
        let ext = match content_type {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            other => {
                return Err(EventsServiceError::Validation(format!(
                    "Unsupported image content type: {other}"
                )));
            }
        };
        // fail before touching storage when the event is gone
        Self::get(ctx, event_id, module.clone()).await?;

        let key = crate::storage::keys::event_image_key(ctx.home_id, event_id, ext);
        let url = module
            .storage()
            .upload(
                module.config().storage().container(),
                &key,
                bytes,
                content_type,
            )
            .await
            .map_err(|e| EventsServiceError::Storage(e.to_string()))?;

        module
            .events_repo()
            .set_image_url(ctx.schema(), event_id, &url)
            .await?;
        Self::get(ctx, event_id, module).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tenants::model::Home;
    use crate::tenant::events::repository::MockEventsRepository;
    use crate::tenant::events::tests::MockEventsModule;
    use chrono::Utc;

    fn ctx() -> TenantContext {
        let now = Utc::now().naive_utc();
        TenantContext::new(Home {
            id: 1,
            name: "beresheet".to_string(),
            database_name: "residents".to_string(),
            database_type: "sqlserver".to_string(),
            database_schema: "beresheet".to_string(),
            admin_user_email: "admin@beresheet.example".to_string(),
            admin_user_password: "seed".to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn event(current: i32, max: i32) -> Event {
        let now = Utc::now().naive_utc();
        Event {
            id: "ev1".to_string(),
            name: "Yoga".to_string(),
            event_type: "class".to_string(),
            description: None,
            date_time: now,
            location: Some("Studio".to_string()),
            max_participants: max,
            current_participants: current,
            image_url: None,
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn module_with(repo: MockEventsRepository) -> Arc<dyn EventsModule> {
        let mut module = MockEventsModule::new();
        let repo = Arc::new(repo);
        module.expect_events_repo().returning(move || repo.clone());
        Arc::new(module)
    }

    #[tokio::test]
    async fn test_register_success_returns_updated_event() {
        let mut repo = MockEventsRepository::new();
        repo.expect_register()
            .withf(|schema, event_id, user_id| {
                schema == "beresheet" && event_id == "ev1" && user_id == "user-1"
            })
            .returning(|_, _, _| Ok(RegistrationOutcome::Registered));
        repo.expect_get().returning(|_, _| Ok(event(1, 1)));

        let updated = EventsService::register(&ctx(), "ev1", "user-1", module_with(repo))
            .await
            .unwrap();
        assert_eq!(updated.current_participants, 1);
    }

    #[tokio::test]
    async fn test_register_full_event_is_a_conflict() {
        let mut repo = MockEventsRepository::new();
        repo.expect_register()
            .returning(|_, _, _| Ok(RegistrationOutcome::EventFull));

        let err = EventsService::register(&ctx(), "ev1", "user-2", module_with(repo))
            .await
            .unwrap_err();
        assert!(matches!(err, EventsServiceError::EventFull));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_a_conflict() {
        let mut repo = MockEventsRepository::new();
        repo.expect_register()
            .returning(|_, _, _| Ok(RegistrationOutcome::AlreadyRegistered));

        let err = EventsService::register(&ctx(), "ev1", "user-1", module_with(repo))
            .await
            .unwrap_err();
        assert!(matches!(err, EventsServiceError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn test_register_on_missing_event_is_not_found() {
        let mut repo = MockEventsRepository::new();
        repo.expect_register()
            .returning(|_, _, _| Err(RepositoryError::NotFound));

        let err = EventsService::register(&ctx(), "missing", "user-1", module_with(repo))
            .await
            .unwrap_err();
        assert!(matches!(err, EventsServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_capacity() {
        let payload = CreateEventRequest {
            name: "Yoga".to_string(),
            event_type: "class".to_string(),
            description: None,
            date_time: Utc::now().naive_utc(),
            location: None,
            max_participants: -1,
            image_url: None,
        };
        let err = EventsService::create(&ctx(), &payload, module_with(MockEventsRepository::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EventsServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_image_upload_uses_the_tenant_key_layout() {
        use crate::storage::MockObjectStorage;

        let mut repo = MockEventsRepository::new();
        repo.expect_get().returning(|_, _| Ok(event(0, 10)));
        repo.expect_set_image_url()
            .times(1)
            .withf(|_, _, url| url.ends_with("/1/events/images/ev1.jpg"))
            .returning(|_, _, _| Ok(()));

        let mut storage = MockObjectStorage::new();
        storage
            .expect_upload()
            .times(1)
            .withf(|container, key, _, content_type| {
                container == "residents-images"
                    && key == "1/events/images/ev1.jpg"
                    && content_type == "image/jpeg"
            })
            .returning(|container, key, _, _| Ok(format!("http://storage/{container}/{key}")));

        let mut module = MockEventsModule::new();
        let config = Arc::new(
            crate::manager::app::config::AppConfigBuilder::default()
                .build()
                .unwrap(),
        );
        let repo = Arc::new(repo);
        let storage = Arc::new(storage);
        module.expect_config().returning(move || config.clone());
        module.expect_events_repo().returning(move || repo.clone());
        module.expect_storage().returning(move || storage.clone());

        EventsService::upload_image(
            &ctx(),
            "ev1",
            "image/jpeg",
            vec![0xFF, 0xD8],
            Arc::new(module),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_image_upload_rejects_non_image_content() {
        let err = EventsService::upload_image(
            &ctx(),
            "ev1",
            "text/plain",
            vec![],
            module_with(MockEventsRepository::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EventsServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_queries_run_against_the_tenant_schema() {
        let mut repo = MockEventsRepository::new();
        repo.expect_list()
            .withf(|schema| schema == "beresheet")
            .returning(|_| Ok(vec![event(0, 10)]));

        let events = EventsService::list(&ctx(), module_with(repo)).await.unwrap();
        assert_eq!(events.len(), 1);
    }
}
