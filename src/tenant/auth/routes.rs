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

use super::handler::{login, logout, refresh, validate};
use crate::tenant::RouteMeta;
use crate::tenant::auth::WebAuthModule;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Canonical web-session routes. They live under `/api/auth/`, which is
/// what makes the gate run them in auth mode.
pub fn canonical_routes(auth_module: Arc<dyn WebAuthModule>) -> (Router, Vec<RouteMeta>) {
    let router = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/validate", get(validate))
        .route("/api/auth/logout", post(logout))
        .with_state(auth_module);
    let meta = vec![
        RouteMeta {
            method: "POST",
            path: "/api/auth/login",
            operation_id: "web_login",
            tag: "auth",
        },
        RouteMeta {
            method: "POST",
            path: "/api/auth/refresh",
            operation_id: "web_refresh",
            tag: "auth",
        },
        RouteMeta {
            method: "GET",
            path: "/api/auth/validate",
            operation_id: "web_validate",
            tag: "auth",
        },
        RouteMeta {
            method: "POST",
            path: "/api/auth/logout",
            operation_id: "web_logout",
            tag: "auth",
        },
    ];
    (router, meta)
}
