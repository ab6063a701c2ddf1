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

use crate::common::DefaultAppState;
use crate::manager::app::config::AppConfig;
use crate::manager::tenants::TenantsModule;
use crate::tenant::{CanonicalApi, ProjectionSummary, RouteMeta};
use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_subscriber() {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(Level::TRACE) //TODO: make configurable
            .finish(),
    )
    .expect("setting default subscriber failed");
}

/// `/` - tenant inventory with entry links, the one page a human hits first.
async fn root_index(
    State(tenants_module): State<Arc<dyn TenantsModule>>,
) -> axum::Json<serde_json::Value> {
    match tenants_module.homes_repo().list_all().await {
        Ok(homes) => {
            let mut tenant_links = serde_json::Map::new();
            for home in homes {
                tenant_links.insert(
                    home.name.clone(),
                    json!({
                        "web": format!("/{}/web", home.name),
                        "api": format!("/{}/api", home.name),
                        "login": format!("/{}/login", home.name),
                    }),
                );
            }
            axum::Json(json!({
                "message": "Residents multi-tenant API",
                "available_tenants": tenant_links,
                "admin": "/home/admin",
            }))
        }
        Err(e) => axum::Json(json!({
            "message": "Residents multi-tenant API",
            "error": format!("Could not load tenants: {e}"),
            "admin": "/home/admin",
        })),
    }
}

/// Liveness only; touches no tenant and no pool.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "healthy" }))
}

async fn api_health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "healthy", "service": "residents-api" }))
}

async fn debug_routes(
    State(summary): State<Arc<ProjectionSummary>>,
) -> axum::Json<ProjectionSummary> {
    axum::Json(summary.as_ref().clone())
}

pub async fn init_default_app() -> Result<(Arc<AppConfig>, Router)> {
    let app_state = Arc::new(DefaultAppState::new().await?);
    app_state.ping_control_pools().await?;
    app_state.warm_tenant_pools().await?;

    let canonical = {
        let (auth_router, auth_meta) =
            crate::tenant::auth::routes::canonical_routes(app_state.clone());
        let (events_router, events_meta) =
            crate::tenant::events::routes::canonical_routes(app_state.clone());
        let (users_router, users_meta) =
            crate::tenant::users::routes::canonical_routes(app_state.clone());
        CanonicalApi::new()
            .merge(
                // per-tenant liveness, gated like any other domain route
                Router::new().route("/api/health", get(api_health)),
                vec![RouteMeta {
                    method: "GET",
                    path: "/api/health",
                    operation_id: "health_check",
                    tag: "health",
                }],
            )
            .merge(auth_router, auth_meta)
            .merge(events_router, events_meta)
            .merge(users_router, users_meta)
    };
    let (tenant_router, summary) = canonical.project(app_state.clone());

    let admin_router = Router::new().nest(
        "/home/admin/api",
        Router::new()
            .merge(crate::manager::auth::routes::routes(app_state.clone()))
            .merge(crate::manager::tenants::routes::routes(app_state.clone()))
            .merge(crate::manager::home_index::routes::admin_routes(
                app_state.clone(),
            )),
    );

    let router = Router::new()
        .merge(
            Router::new()
                .route("/", get(root_index))
                .with_state(app_state.clone() as Arc<dyn TenantsModule>),
        )
        .route("/health", get(health))
        .route("/api/health", get(api_health))
        .merge(
            Router::new()
                .route("/debug/routes", get(debug_routes))
                .with_state(Arc::new(summary)),
        )
        .merge(crate::manager::home_index::routes::discovery_routes(
            app_state.clone(),
        ))
        .merge(admin_router)
        .merge(crate::tenant::web::routes::routes(app_state.clone()))
        .merge(tenant_router)
        .layer(TraceLayer::new_for_http());

    Ok((app_state.config.clone(), router))
}
