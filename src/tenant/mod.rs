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
use crate::tenant::gate::{GateModule, tenant_gate};
use axum::Router;
use axum::middleware::from_fn_with_state;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub(crate) mod auth;
pub(crate) mod context;
pub(crate) mod events;
pub(crate) mod gate;
pub(crate) mod users;
pub(crate) mod web;

/// Registration-time metadata of one canonical route. The projector keeps
/// it so the tenant-prefixed surface stays introspectable.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: &'static str,
    pub path: &'static str,
    pub operation_id: &'static str,
    pub tag: &'static str,
}

/// The canonical API: every domain handler registered against `/api/...`,
/// together with its metadata. This is the input of the projection; nothing
/// serves these paths directly.
#[derive(Default)]
pub struct CanonicalApi {
    router: Router,
    routes: Vec<RouteMeta>,
}

impl CanonicalApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(mut self, router: Router, mut routes: Vec<RouteMeta>) -> Self {
        self.router = self.router.merge(router);
        self.routes.append(&mut routes);
        self
    }

    /// Projects the canonical surface to `/{tenant_name}/api/...`.
    ///
    /// The projection is a pure prefix: the canonical router is nested under
    /// the tenant path parameter and the validation gate is layered in front
    /// of every route, so each handler runs with a resolved tenant in its
    /// request extensions and none can be reached without passing the gate.
    /// New canonical routes inherit tenant isolation at registration time.
    pub fn project(self, gate_module: Arc<dyn GateModule>) -> (Router, ProjectionSummary) {
        let summary = ProjectionSummary::from_routes(&self.routes);
        info!(
            "Projected {} canonical routes to the tenant surface",
            summary.total_routes
        );
        let router = Router::new().nest(
            "/{tenant_name}",
            self.router
                .layer(from_fn_with_state(gate_module, tenant_gate)),
        );
        (router, summary)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedRoute {
    pub method: &'static str,
    pub canonical_path: &'static str,
    pub tenant_path: String,
    pub operation_id: String,
    pub tag: &'static str,
    pub auth_mode: bool,
}

/// What the projection produced; served by `/debug/routes`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionSummary {
    pub total_routes: usize,
    pub routes: Vec<ProjectedRoute>,
}

impl ProjectionSummary {
    fn from_routes(routes: &[RouteMeta]) -> Self {
        let routes: Vec<ProjectedRoute> = routes
            .iter()
            .map(|meta| ProjectedRoute {
                method: meta.method,
                canonical_path: meta.path,
                tenant_path: format!("/{{tenant_name}}{}", meta.path),
                // prefixed to avoid colliding with the canonical id
                operation_id: format!("tenant_{}", meta.operation_id),
                tag: meta.tag,
                auth_mode: meta.path.starts_with("/api/auth/"),
            })
            .collect();
        Self {
            total_routes: routes.len(),
            routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(method: &'static str, path: &'static str, operation_id: &'static str) -> RouteMeta {
        RouteMeta {
            method,
            path,
            operation_id,
            tag: "events",
        }
    }

    #[test]
    fn test_projection_prefixes_paths_and_operation_ids() {
        let summary = ProjectionSummary::from_routes(&[
            meta("GET", "/api/events", "list_events"),
            meta("POST", "/api/events/{event_id}/register", "register_for_event"),
        ]);

        assert_eq!(summary.total_routes, 2);
        assert_eq!(summary.routes[0].tenant_path, "/{tenant_name}/api/events");
        assert_eq!(summary.routes[0].operation_id, "tenant_list_events");
        assert_eq!(
            summary.routes[1].tenant_path,
            "/{tenant_name}/api/events/{event_id}/register"
        );
        // downstream path parameters keep their names and positions
        assert!(summary.routes[1].tenant_path.contains("{event_id}"));
    }

    #[test]
    fn test_auth_routes_are_classified() {
        let summary = ProjectionSummary::from_routes(&[
            meta("POST", "/api/auth/login", "web_login"),
            meta("GET", "/api/events", "list_events"),
        ]);
        assert!(summary.routes[0].auth_mode);
        assert!(!summary.routes[1].auth_mode);
    }

    #[test]
    fn test_tags_are_preserved() {
        let summary = ProjectionSummary::from_routes(&[meta("GET", "/api/events", "list_events")]);
        assert_eq!(summary.routes[0].tag, "events");
    }
}
