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
use crate::common::error::{FriendlyError, IntoFriendlyError, RepositoryError};
use crate::tenant::context::TenantCtx;
use crate::tenant::users::UsersModule;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::Level;

pub async fn list(
    TenantCtx(ctx): TenantCtx,
    State(users_module): State<Arc<dyn UsersModule>>,
) -> HandlerResult {
    match users_module.users_repo().list(ctx.schema()).await {
        Ok(users) => Ok(axum::Json(users).into_response()),
        Err(e) => Err(e.into_friendly_error(users_module).await.into_response()),
    }
}

pub async fn get(
    TenantCtx(ctx): TenantCtx,
    State(users_module): State<Arc<dyn UsersModule>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    // push token registration piggy-backs on profile reads
    if let Some(token) = headers.get("firebaseToken").and_then(|v| v.to_str().ok()) {
        if let Err(e) = users_module
            .users_repo()
            .set_fcm_token(ctx.schema(), &user_id, token)
            .await
        {
            return Err(e.into_friendly_error(users_module).await.into_response());
        }
    }

    match users_module
        .users_repo()
        .get_profile(ctx.schema(), &user_id)
        .await
    {
        Ok(user) => Ok(axum::Json(user).into_response()),
        Err(RepositoryError::NotFound) => Err(FriendlyError::user_facing(
            Level::DEBUG,
            StatusCode::NOT_FOUND,
            file!(),
            GeneralError {
                message: "User profile not found".to_string(),
            },
        )
        .into_response()),
        Err(e) => Err(e.into_friendly_error(users_module).await.into_response()),
    }
}
