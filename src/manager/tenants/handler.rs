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
use crate::common::dto::{EmptyType, HandlerResult, SuccessResponseBuilder};
use crate::common::error::IntoFriendlyError;
use crate::common::extractors::ValidJson;
use crate::manager::auth::middleware::AdminUser;
use crate::manager::tenants::TenantsModule;
use crate::manager::tenants::dto::{CreateHomeRequest, CreatedHome, PublicHome};
use crate::manager::tenants::service::TenantsService;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;

pub async fn create(
    AdminUser(_claims): AdminUser,
    State(tenants_module): State<Arc<dyn TenantsModule>>,
    ValidJson(payload): ValidJson<CreateHomeRequest>,
) -> HandlerResult {
    let result = match TenantsService::create(&payload, tenants_module.clone()).await {
        Ok(r) => r,
        Err(e) => return Err(e.into_friendly_error(tenants_module).await.into_response()),
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::CREATED)
        .data(CreatedHome::from(result))
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(tenants_module).await.into_response()),
    }
}

pub async fn list(
    AdminUser(_claims): AdminUser,
    State(tenants_module): State<Arc<dyn TenantsModule>>,
) -> HandlerResult {
    let result = match TenantsService::list(tenants_module.clone()).await {
        Ok(r) => r,
        Err(e) => return Err(e.into_friendly_error(tenants_module).await.into_response()),
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(result.into_iter().map(PublicHome::from).collect::<Vec<_>>())
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(tenants_module).await.into_response()),
    }
}

pub async fn get(
    AdminUser(_claims): AdminUser,
    State(tenants_module): State<Arc<dyn TenantsModule>>,
    Path(name): Path<String>,
) -> HandlerResult {
    let result = match TenantsService::get(&name, tenants_module.clone()).await {
        Ok(r) => r,
        Err(e) => return Err(e.into_friendly_error(tenants_module).await.into_response()),
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(PublicHome::from(result))
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(tenants_module).await.into_response()),
    }
}

pub async fn delete(
    AdminUser(_claims): AdminUser,
    State(tenants_module): State<Arc<dyn TenantsModule>>,
    Path(name): Path<String>,
) -> HandlerResult {
    match TenantsService::delete(&name, tenants_module.clone()).await {
        Ok(()) => {}
        Err(e) => return Err(e.into_friendly_error(tenants_module).await.into_response()),
    };

    match SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(json!({ "deleted": name }))
        .build()
    {
        Ok(r) => Ok(r.into_response()),
        Err(e) => Err(e.into_friendly_error(tenants_module).await.into_response()),
    }
}
