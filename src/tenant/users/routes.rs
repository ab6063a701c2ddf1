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

use crate::tenant::RouteMeta;
use crate::tenant::users::UsersModule;
use crate::tenant::users::handler::{get as users_get, list as users_list};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

/// Canonical user routes; only reachable through the tenant projection.
pub fn canonical_routes(users_module: Arc<dyn UsersModule>) -> (Router, Vec<RouteMeta>) {
    let router = Router::new()
        .route("/api/users", get(users_list))
        .route("/api/users/{user_id}", get(users_get))
        .with_state(users_module);
    let meta = vec![
        RouteMeta {
            method: "GET",
            path: "/api/users",
            operation_id: "list_users",
            tag: "users",
        },
        RouteMeta {
            method: "GET",
            path: "/api/users/{user_id}",
            operation_id: "get_user_profile",
            tag: "users",
        },
    ];
    (router, meta)
}
