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
use crate::common::dto::{GeneralError, HandlerResult};
use crate::common::error::{FriendlyError, IntoFriendlyError};
use crate::common::extractors::ValidJson;
use crate::tenant::context::TenantCtx;
use crate::tenant::events::EventsModule;
use crate::tenant::events::dto::CreateEventRequest;
use crate::tenant::events::service::EventsService;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::Level;

fn caller_user_id(headers: &HeaderMap) -> Result<String, axum::response::Response> {
    headers
        .get("userId")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            FriendlyError::user_facing(
                Level::DEBUG,
                StatusCode::BAD_REQUEST,
                file!(),
                GeneralError {
                    message: "userId header is required".to_string(),
                },
            )
            .into_response()
        })
}

pub async fn list(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
) -> HandlerResult {
    match EventsService::list(&ctx, events_module.clone()).await {
        Ok(events) => Ok(axum::Json(events).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}

pub async fn get(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
    Path(event_id): Path<String>,
) -> HandlerResult {
    match EventsService::get(&ctx, &event_id, events_module.clone()).await {
        Ok(event) => Ok(axum::Json(event).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}

pub async fn create(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
    ValidJson(payload): ValidJson<CreateEventRequest>,
) -> HandlerResult {
    match EventsService::create(&ctx, &payload, events_module.clone()).await {
        Ok(event) => Ok((StatusCode::CREATED, axum::Json(event)).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}

pub async fn register(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    let user_id = caller_user_id(&headers)?;
    match EventsService::register(&ctx, &event_id, &user_id, events_module.clone()).await {
        Ok(event) => Ok((StatusCode::CREATED, axum::Json(event)).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}

pub async fn upload_image(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> HandlerResult {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    match EventsService::upload_image(
        &ctx,
        &event_id,
        &content_type,
        body.to_vec(),
        events_module.clone(),
    )
    .await
    {
        Ok(event) => Ok(axum::Json(event).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}

pub async fn unregister(
    TenantCtx(ctx): TenantCtx,
    State(events_module): State<Arc<dyn EventsModule>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    let user_id = caller_user_id(&headers)?;
    match EventsService::unregister(&ctx, &event_id, &user_id, events_module.clone()).await {
        Ok(event) => Ok(axum::Json(event).into_response()),
        Err(e) => Err(e.into_friendly_error(events_module).await.into_response()),
    }
}
