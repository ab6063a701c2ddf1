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
use crate::common::dto::{EmptyType, GeneralError, HandlerResult, SuccessResponseBuilder};
use crate::common::error::{FriendlyError, IntoFriendlyError};
use crate::common::extractors::ValidJson;
use crate::manager::auth::middleware::AdminUser;
use crate::manager::home_index::HomeIndexModule;
use crate::manager::home_index::dto::{HomeByPhoneQuery, HomeByPhoneResponse, UpsertEntryRequest};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use tracing::Level;

/// Tenant discovery: the one lookup a client can make before it knows its
/// tenant. Served unprefixed and without the gate.
pub async fn get_home_by_phone(
    State(home_index_module): State<Arc<dyn HomeIndexModule>>,
    Query(query): Query<HomeByPhoneQuery>,
) -> HandlerResult {
    let entry = match home_index_module
        .home_index_repo()
        .get(&query.phone_number)
        .await
    {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            return Err(FriendlyError::user_facing(
                Level::DEBUG,
                StatusCode::NOT_FOUND,
                file!(),
                GeneralError {
                    message: "User not found. Please contact support to set up your account."
                        .to_string(),
                },
            )
            .into_response());
        }
        Err(e) => {
            return Err(
                FriendlyError::user_facing(
                    Level::WARN,
                    e.status_code(),
                    file!(),
                    GeneralError {
                        message: e.to_string(),
                    },
                )
                .into_response(),
            );
        }
    };

    Ok(axum::Json(HomeByPhoneResponse::from(entry)).into_response())
}

pub async fn upsert(
    AdminUser(_claims): AdminUser,
    State(home_index_module): State<Arc<dyn HomeIndexModule>>,
    ValidJson(payload): ValidJson<UpsertEntryRequest>,
) -> HandlerResult {
    if !crate::manager::home_index::phone::is_valid_phone(&payload.phone_number) {
        return Err(FriendlyError::user_facing(
            Level::DEBUG,
            StatusCode::BAD_REQUEST,
            file!(),
            GeneralError {
                message: "Phone number must be digits with an optional + prefix".to_string(),
            },
        )
        .into_response());
    }

    let entry = match home_index_module
        .home_index_repo()
        .upsert(&payload.phone_number, payload.home_id, &payload.home_name)
        .await
    {
        Ok(entry) => entry,
        Err(e) => {
            return Err(e.into_friendly_error(home_index_module).await.into_response());
        }
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(entry)
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(home_index_module).await.into_response()),
    }
}

pub async fn list(
    AdminUser(_claims): AdminUser,
    State(home_index_module): State<Arc<dyn HomeIndexModule>>,
) -> HandlerResult {
    let entries = match home_index_module.home_index_repo().list_all().await {
        Ok(entries) => entries,
        Err(e) => {
            return Err(e.into_friendly_error(home_index_module).await.into_response());
        }
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(entries)
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(home_index_module).await.into_response()),
    }
}

pub async fn delete(
    AdminUser(_claims): AdminUser,
    State(home_index_module): State<Arc<dyn HomeIndexModule>>,
    Path(phone_number): Path<String>,
) -> HandlerResult {
    let removed = match home_index_module
        .home_index_repo()
        .delete(&phone_number)
        .await
    {
        Ok(removed) => removed,
        Err(e) => {
            return Err(e.into_friendly_error(home_index_module).await.into_response());
        }
    };

    if !removed {
        return Err(FriendlyError::user_facing(
            Level::DEBUG,
            StatusCode::NOT_FOUND,
            file!(),
            GeneralError {
                message: format!("No home index entry found for phone {phone_number}"),
            },
        )
        .into_response());
    }

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(json!({ "deleted": phone_number }))
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(home_index_module).await.into_response()),
    }
}
