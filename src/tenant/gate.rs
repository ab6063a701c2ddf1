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
use crate::common::dto::GeneralError;
use crate::common::error::{FriendlyError, RepositoryError};
use crate::common::{ConfigProvider, DefaultAppState};
use crate::manager::tenants::directory::TenantDirectory;
use crate::manager::tenants::model::Home;
use crate::tenant::auth::claims::WebClaims;
use crate::tenant::context::TenantContext;
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub trait GateModule: ConfigProvider + Send + Sync {
    fn directory(&self) -> Arc<dyn TenantDirectory>;
}

impl GateModule for DefaultAppState {
    fn directory(&self) -> Arc<dyn TenantDirectory> {
        self.directory.clone()
    }
}

/// The canonical path of a tenant-prefixed request, used to classify the
/// gate mode.
fn canonical_path<'a>(path: &'a str, tenant_name: &str) -> &'a str {
    path.strip_prefix('/')
        .and_then(|rest| rest.strip_prefix(tenant_name))
        .unwrap_or(path)
}

fn gate_error(status: StatusCode, message: String) -> Response {
    FriendlyError::user_facing(
        tracing::Level::DEBUG,
        status,
        file!(),
        GeneralError { message },
    )
    .into_response()
}

fn login_redirect(tenant_name: &str) -> Response {
    // 302, deliberately not axum's 303/307 helpers: browsers follow it with
    // a GET and the original contract fixes the status
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, format!("/{tenant_name}/login"))
        .body(axum::body::Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn resolve_tenant(
    module: &Arc<dyn GateModule>,
    tenant_name: &str,
) -> Result<Home, Response> {
    match module.directory().resolve(tenant_name).await {
        Ok(home) => Ok(home),
        Err(RepositoryError::NotFound) => Err(gate_error(
            StatusCode::NOT_FOUND,
            format!("Tenant '{tenant_name}' not found"),
        )),
        Err(e) => {
            warn!("Tenant resolution for '{tenant_name}' failed: {e}");
            Err(gate_error(e.status_code(), e.to_string()))
        }
    }
}

fn parse_home_id_header(headers: &HeaderMap) -> Result<Option<i32>, Response> {
    let Some(raw) = headers.get("homeID") else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .map(Some)
        .ok_or_else(|| {
            gate_error(
                StatusCode::BAD_REQUEST,
                "homeID must be a valid integer".to_string(),
            )
        })
}

/// The validation gate in front of every projected API route.
///
/// Auth mode (canonical path under `/api/auth/`) only proves the tenant
/// exists; the caller has no identity yet. Standard mode additionally
/// requires the `homeID` header to equal the resolved tenant's id. On
/// success the tenant context is attached to the request; on any failure
/// the handler is never invoked.
pub async fn tenant_gate(
    State(module): State<Arc<dyn GateModule>>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(tenant_name) = params.get("tenant_name").cloned() else {
        return Err(gate_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "gate mounted on a route without {tenant_name}".to_string(),
        ));
    };

    let auth_mode = canonical_path(req.uri().path(), &tenant_name).starts_with("/api/auth/");
    let home = resolve_tenant(&module, &tenant_name).await?;

    if auth_mode {
        info!(
            "Tenant validated (auth) - '{}' (ID: {})",
            tenant_name, home.id
        );
    } else {
        match parse_home_id_header(req.headers())? {
            Some(header_home_id) if header_home_id == home.id => {}
            Some(header_home_id) => {
                return Err(gate_error(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "HomeID header ({header_home_id}) doesn't match tenant \
                         '{tenant_name}' (expected {})",
                        home.id
                    ),
                ));
            }
            None => {
                return Err(gate_error(
                    StatusCode::UNAUTHORIZED,
                    "homeID header is required".to_string(),
                ));
            }
        }
        info!("Tenant validated - '{}' (ID: {})", tenant_name, home.id);
    }

    req.extensions_mut().insert(TenantContext::new(home));
    Ok(next.run(req).await)
}

/// The web variant of the gate, used by the handlers serving the tenant web
/// app. Tries the `homeID` header first (mobile shells), then the
/// `web_jwt_token` cookie; an unauthenticated browser is redirected to the
/// tenant login page instead of receiving an error.
pub async fn authorize_web(
    module: &Arc<dyn GateModule>,
    headers: &HeaderMap,
    jar: &CookieJar,
    tenant_name: &str,
) -> Result<Home, Response> {
    let home = resolve_tenant(module, tenant_name).await?;

    if let Ok(Some(header_home_id)) = parse_home_id_header(headers) {
        if header_home_id == home.id {
            info!(
                "Validated tenant '{}' (ID: {}) via homeID header",
                tenant_name, home.id
            );
            return Ok(home);
        }
    }

    if let Some(cookie) = jar.get("web_jwt_token") {
        match WebClaims::from_token(
            cookie.value(),
            module.config().auth().web_jwt_secret().as_bytes(),
        ) {
            Ok(claims) if claims.home_id() == home.id && claims.is_access() => {
                info!(
                    "Validated tenant '{}' (ID: {}) via web session cookie",
                    tenant_name, home.id
                );
                return Ok(home);
            }
            Ok(_) => warn!("Web session cookie for another tenant on '{tenant_name}'"),
            Err(e) => info!("Invalid or expired web session on '{tenant_name}': {e}"),
        }
    }

    info!("No valid authentication for tenant '{tenant_name}', redirecting to login");
    Err(login_redirect(tenant_name))
}

/// Tenant-only check for routes that are public besides the tenant having
/// to exist (the login page and its assets).
pub async fn require_tenant(
    module: &Arc<dyn GateModule>,
    tenant_name: &str,
) -> Result<Home, Response> {
    resolve_tenant(module, tenant_name).await
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::manager::app::config::{AppConfig, AppConfigBuilder};
    use crate::manager::tenants::directory::MockTenantDirectory;
    use crate::tenant::context::TenantCtx;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::middleware::from_fn_with_state;
    use axum::routing::{get, post};
    use axum_extra::extract::cookie::Cookie;
    use chrono::Utc;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    mock!(
        pub GateModule {}
        impl ConfigProvider for GateModule {
            fn config(&self) -> Arc<AppConfig>;
        }
        impl GateModule for GateModule {
            fn directory(&self) -> Arc<dyn TenantDirectory>;
        }
    );

    pub fn home(id: i32, name: &str) -> Home {
        let now = Utc::now().naive_utc();
        Home {
            id,
            name: name.to_string(),
            database_name: "residents".to_string(),
            database_type: "sqlserver".to_string(),
            database_schema: name.to_string(),
            admin_user_email: format!("admin@{name}.example"),
            admin_user_password: "seed".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn gate_module_with_tenant(id: i32, name: &'static str) -> Arc<dyn GateModule> {
        let mut directory = MockTenantDirectory::new();
        directory.expect_resolve().returning(move |requested| {
            if requested == name {
                Ok(home(id, name))
            } else {
                Err(RepositoryError::NotFound)
            }
        });
        let directory: Arc<dyn TenantDirectory> = Arc::new(directory);
        let config = Arc::new(AppConfigBuilder::default().build().unwrap());

        let mut module = MockGateModule::new();
        module.expect_config().returning(move || config.clone());
        module.expect_directory().returning(move || directory.clone());
        Arc::new(module)
    }

    async fn observed_home_id(TenantCtx(ctx): TenantCtx) -> String {
        ctx.home_id.to_string()
    }

    async fn auth_probe() -> &'static str {
        "auth reachable"
    }

    fn app(module: Arc<dyn GateModule>) -> Router {
        Router::new().nest(
            "/{tenant_name}",
            Router::new()
                .route("/api/events", get(observed_home_id))
                .route("/api/auth/login", post(auth_probe))
                .layer(from_fn_with_state(module, tenant_gate)),
        )
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_matching_header_reaches_handler_with_context() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/beresheet/api/events")
                    .header("homeID", "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1");
    }

    #[tokio::test]
    async fn test_header_mismatch_is_rejected_before_the_handler() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/beresheet/api/events")
                    .header("homeID", "2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("doesn't match"), "{body}");
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_not_found() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/nonexistent/api/events")
                    .header("homeID", "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_header_on_api_route_is_unauthorized() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/beresheet/api/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_numeric_header_is_bad_request() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/beresheet/api/events")
                    .header("homeID", "abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auth_mode_skips_the_home_id_header() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/beresheet/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_mode_still_requires_a_known_tenant() {
        let response = app(gate_module_with_tenant(1, "beresheet"))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/nonexistent/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_authorize_web_without_credentials_redirects_to_login() {
        let module = gate_module_with_tenant(1, "beresheet");
        let err = authorize_web(&module, &HeaderMap::new(), &CookieJar::new(), "beresheet")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FOUND);
        assert_eq!(
            err.headers().get(header::LOCATION).unwrap(),
            "/beresheet/login"
        );
    }

    #[tokio::test]
    async fn test_authorize_web_accepts_matching_session_cookie() {
        let module = gate_module_with_tenant(1, "beresheet");
        let config = module.config();
        let claims = WebClaims::access(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            1,
            Some("beresheet".to_string()),
            3600,
        );
        let token = claims
            .to_token(config.auth().web_jwt_secret().as_bytes())
            .unwrap();
        let jar = CookieJar::new().add(Cookie::new("web_jwt_token", token));

        let home = authorize_web(&module, &HeaderMap::new(), &jar, "beresheet")
            .await
            .unwrap();
        assert_eq!(home.id, 1);
    }

    #[tokio::test]
    async fn test_authorize_web_rejects_cookie_of_another_tenant() {
        let module = gate_module_with_tenant(1, "beresheet");
        let config = module.config();
        let claims = WebClaims::access(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            2,
            Some("other".to_string()),
            3600,
        );
        let token = claims
            .to_token(config.auth().web_jwt_secret().as_bytes())
            .unwrap();
        let jar = CookieJar::new().add(Cookie::new("web_jwt_token", token));

        let err = authorize_web(&module, &HeaderMap::new(), &jar, "beresheet")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_authorize_web_accepts_matching_header() {
        let module = gate_module_with_tenant(1, "beresheet");
        let mut headers = HeaderMap::new();
        headers.insert("homeID", "1".parse().unwrap());
        let home = authorize_web(&module, &headers, &CookieJar::new(), "beresheet")
            .await
            .unwrap();
        assert_eq!(home.id, 1);
    }
}
