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
use crate::manager::auth::middleware::require_admin;
use crate::manager::home_index::HomeIndexModule;
use crate::manager::home_index::handler::{
    delete as entries_delete, get_home_by_phone, list as entries_list, upsert as entries_upsert,
};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use std::sync::Arc;

/// Unprefixed discovery endpoints; the only API surface that precedes
/// tenant resolution. `/api/users/get_user_home` is a legacy alias of the
/// home_index lookup.
pub fn discovery_routes(home_index_module: Arc<dyn HomeIndexModule>) -> Router {
    Router::new()
        .route(
            "/api/home_index/get_home_by_phone",
            get(get_home_by_phone),
        )
        .route("/api/users/get_user_home", get(get_home_by_phone))
        .with_state(home_index_module)
}

/// Directory management, admin-only.
pub fn admin_routes(home_index_module: Arc<dyn HomeIndexModule>) -> Router {
    Router::new().nest(
        "/home_index",
        Router::new()
            .route("/", get(entries_list).post(entries_upsert))
            .route("/{phone_number}", axum::routing::delete(entries_delete))
            .layer(from_fn_with_state(home_index_module.config(), require_admin))
            .with_state(home_index_module),
    )
}
