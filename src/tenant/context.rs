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
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

/// What the gate resolved for this request: the tenant record and the
/// canonical `home_id` every handler keys on. Handlers receive this instead
/// of reading the `homeID` header themselves, so handler code is identical
/// for every tenant.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub home: Home,
    pub home_id: i32,
}

impl TenantContext {
    pub fn new(home: Home) -> Self {
        let home_id = home.id;
        Self { home, home_id }
    }

    pub fn schema(&self) -> &str {
        &self.home.database_schema
    }
}

/// Extractor over the gate-populated request extension. Rejects with 500,
/// not 401: a handler reachable without the gate is a wiring bug, never a
/// caller problem.
pub struct TenantCtx(pub TenantContext);

impl<S> FromRequestParts<S> for TenantCtx
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(TenantCtx)
            .ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Missing tenant context; route registered outside the tenant projection",
                )
                    .into_response()
            })
    }
}
