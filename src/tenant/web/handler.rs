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
use crate::common::dto::{GeneralError, HandlerResult};
use crate::common::error::FriendlyError;
use crate::tenant::auth::service::TENANT_INFO_COOKIE_LIFETIME_SECS;
use crate::tenant::gate::{GateModule, authorize_web, require_tenant};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::path::PathBuf;
use std::sync::Arc;
use time::Duration as CookieDuration;
use tracing::Level;

fn not_found(message: &str) -> Response {
    FriendlyError::user_facing(
        Level::DEBUG,
        StatusCode::NOT_FOUND,
        file!(),
        GeneralError {
            message: message.to_string(),
        },
    )
    .into_response()
}

fn web_build_fallback(tenant_name: &str) -> Response {
    axum::Json(serde_json::json!({
        "message": format!("Web interface for tenant '{tenant_name}' is not available"),
        "note": "Web build not found; configure tenants.web_build_path to serve it.",
    }))
    .into_response()
}

/// Rewrites (or injects) the document base so the web app resolves its
/// assets under the tenant prefix.
fn rewrite_base_href(content: &str, base: &str) -> String {
    let replaced = content
        .replace("<base href=\"/\">", &format!("<base href=\"{base}\">"))
        .replace("<base href=\"/web/\">", &format!("<base href=\"{base}\">"));
    if !replaced.contains("<base href=") && replaced.contains("<head>") {
        return replaced.replace("<head>", &format!("<head>\n  <base href=\"{base}\">"));
    }
    replaced
}

fn asset_path_is_safe(path: &str) -> bool {
    !path.is_empty() && !path.starts_with('/') && !path.split('/').any(|part| part == "..")
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

async fn serve_index(
    module: &Arc<dyn GateModule>,
    tenant_name: &str,
    base: &str,
) -> Result<Html<String>, Response> {
    let Some(build_path) = module
        .config()
        .tenants()
        .web_build_path()
        .map(PathBuf::from)
    else {
        return Err(web_build_fallback(tenant_name));
    };
    let index = build_path.join("index.html");
    let content = tokio::fs::read_to_string(&index)
        .await
        .map_err(|_| not_found("Web interface not found"))?;
    Ok(Html(rewrite_base_href(&content, base)))
}

async fn serve_asset(
    module: &Arc<dyn GateModule>,
    path: &str,
) -> Result<Response, Response> {
    if !asset_path_is_safe(path) {
        return Err(FriendlyError::user_facing(
            Level::DEBUG,
            StatusCode::BAD_REQUEST,
            file!(),
            GeneralError {
                message: "Invalid path".to_string(),
            },
        )
        .into_response());
    }
    let Some(build_path) = module
        .config()
        .tenants()
        .web_build_path()
        .map(PathBuf::from)
    else {
        return Err(not_found("Asset not found"));
    };
    let asset = build_path.join(path);
    let bytes = tokio::fs::read(&asset)
        .await
        .map_err(|_| not_found("Asset not found"))?;
    Ok((
        [(header::CONTENT_TYPE, content_type_for(path))],
        bytes,
    )
        .into_response())
}

/// `/{tenant}/login` - public besides the tenant having to exist. Sets the
/// `tenant_info` cookie the login page's JavaScript reads.
pub async fn serve_login_page(
    State(module): State<Arc<dyn GateModule>>,
    Path(tenant_name): Path<String>,
    jar: CookieJar,
) -> HandlerResult {
    let home = require_tenant(&module, &tenant_name).await?;

    let html = serve_index(&module, &tenant_name, &format!("/{tenant_name}/login/")).await?;

    let mut cookie = Cookie::new("tenant_info", format!("{}:{}", home.name, home.id));
    cookie.set_path("/");
    cookie.set_http_only(false);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::seconds(TENANT_INFO_COOKIE_LIFETIME_SECS));

    Ok((jar.add(cookie), html).into_response())
}

pub async fn serve_login_asset(
    State(module): State<Arc<dyn GateModule>>,
    Path((tenant_name, path)): Path<(String, String)>,
) -> HandlerResult {
    require_tenant(&module, &tenant_name).await?;
    serve_asset(&module, &path).await
}

/// `/{tenant}/web` - the authenticated web app shell; unauthenticated
/// browsers are redirected to the tenant login page.
pub async fn serve_web_index(
    State(module): State<Arc<dyn GateModule>>,
    Path(tenant_name): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
) -> HandlerResult {
    authorize_web(&module, &headers, &jar, &tenant_name).await?;
    let html = serve_index(&module, &tenant_name, &format!("/{tenant_name}/web/")).await?;
    Ok(html.into_response())
}

pub async fn serve_web_asset(
    State(module): State<Arc<dyn GateModule>>,
    Path((tenant_name, path)): Path<(String, String)>,
    headers: HeaderMap,
    jar: CookieJar,
) -> HandlerResult {
    authorize_web(&module, &headers, &jar, &tenant_name).await?;
    serve_asset(&module, &path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_href_rewrite() {
        let html = "<html><head><base href=\"/\"></head></html>";
        assert_eq!(
            rewrite_base_href(html, "/beresheet/web/"),
            "<html><head><base href=\"/beresheet/web/\"></head></html>"
        );
    }

    #[test]
    fn test_base_href_injected_when_absent() {
        let html = "<html><head><title>x</title></head></html>";
        let rewritten = rewrite_base_href(html, "/beresheet/login/");
        assert!(rewritten.contains("<base href=\"/beresheet/login/\">"));
    }

    #[test]
    fn test_asset_path_safety() {
        assert!(asset_path_is_safe("main.dart.js"));
        assert!(asset_path_is_safe("assets/fonts/a.woff2"));
        assert!(!asset_path_is_safe("../secrets.txt"));
        assert!(!asset_path_is_safe("/etc/passwd"));
        assert!(!asset_path_is_safe("a/../../b"));
        assert!(!asset_path_is_safe(""));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("main.dart.js"), "application/javascript");
        assert_eq!(content_type_for("x.png"), "image/png");
        assert_eq!(content_type_for("x.unknown"), "application/octet-stream");
    }
}
