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
use crate::tenant::events::EventsModule;
use crate::tenant::events::handler::{
    create as events_create, get as events_get, list as events_list,
    register as events_register, unregister as events_unregister,
    upload_image as events_upload_image,
};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub fn canonical_routes(events_module: Arc<dyn EventsModule>) -> (Router, Vec<RouteMeta>) {
    let router = Router::new()
        .route("/api/events", get(events_list).post(events_create))
        .route("/api/events/{event_id}", get(events_get))
        .route("/api/events/{event_id}/register", post(events_register))
        .route("/api/events/{event_id}/unregister", post(events_unregister))
        .route("/api/events/{event_id}/image", post(events_upload_image))
        .with_state(events_module);
    let meta = vec![
        RouteMeta {
            method: "GET",
            path: "/api/events",
            operation_id: "list_events",
            tag: "events",
        },
        RouteMeta {
            method: "POST",
            path: "/api/events",
            operation_id: "create_event",
            tag: "events",
        },
        RouteMeta {
            method: "GET",
            path: "/api/events/{event_id}",
            operation_id: "get_event",
            tag: "events",
        },
        RouteMeta {
            method: "POST",
            path: "/api/events/{event_id}/register",
            operation_id: "register_for_event",
            tag: "events",
        },
        RouteMeta {
            method: "POST",
            path: "/api/events/{event_id}/unregister",
            operation_id: "unregister_from_event",
            tag: "events",
        },
        RouteMeta {
            method: "POST",
            path: "/api/events/{event_id}/image",
            operation_id: "upload_event_image",
            tag: "events",
        },
    ];
    (router, meta)
}
