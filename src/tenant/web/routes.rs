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

use crate::tenant::gate::GateModule;
use crate::tenant::web::handler::{
    serve_login_asset, serve_login_page, serve_web_asset, serve_web_index,
};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

/// The tenant web surface. These routes sit outside the API projection:
/// the login side only proves the tenant exists, the web side runs the
/// redirecting web variant of the gate inside its handlers.
pub fn routes(gate_module: Arc<dyn GateModule>) -> Router {
    Router::new()
        .route("/{tenant_name}/login", get(serve_login_page))
        .route("/{tenant_name}/login/{*path}", get(serve_login_asset))
        .route("/{tenant_name}/web", get(serve_web_index))
        .route("/{tenant_name}/web/{*path}", get(serve_web_asset))
        .with_state(gate_module)
}

#[cfg(test)]
mod tests {
    use crate::tenant::gate::tests::gate_module_with_tenant;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_web_without_session_redirects_to_login() {
        let app = super::routes(gate_module_with_tenant(1, "beresheet"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/beresheet/web")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/beresheet/login"
        );
    }

    #[tokio::test]
    async fn test_login_page_for_unknown_tenant_is_not_found() {
        let app = super::routes(gate_module_with_tenant(1, "beresheet"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_page_without_web_build_returns_fallback() {
        let app = super::routes(gate_module_with_tenant(1, "beresheet"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/beresheet/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // no build directory configured in the test fixture
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .contains("not available")
        );
    }

    #[tokio::test]
    async fn test_login_asset_traversal_is_rejected() {
        let app = super::routes(gate_module_with_tenant(1, "beresheet"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/beresheet/login/..%2Fsecrets.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
