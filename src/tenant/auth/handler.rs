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
use crate::common::dto::HandlerResult;
use crate::common::error::IntoFriendlyError;
use crate::common::extractors::ValidJson;
use crate::tenant::auth::WebAuthModule;
use crate::tenant::auth::dto::{
    WebLoginRequest, WebLoginResponse, WebRefreshRequest, WebSession, WebSessionUser,
    WebValidateResponse,
};
use crate::tenant::auth::service::{
    ACCESS_TOKEN_LIFETIME_SECS, REFRESH_TOKEN_LIFETIME_SECS, TENANT_INFO_COOKIE_LIFETIME_SECS,
    WebAuthError, WebAuthService,
};
use crate::tenant::context::TenantCtx;
use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Local, Utc};
use std::sync::Arc;
use time::Duration as CookieDuration;
use tracing::info;

fn session_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::seconds(max_age_secs));
    cookie
}

/// `{name}:{id}`, readable by the web client's JavaScript.
fn tenant_info_cookie(name: &str, id: i32) -> Cookie<'static> {
    let mut cookie = Cookie::new("tenant_info", format!("{name}:{id}"));
    cookie.set_path("/");
    cookie.set_http_only(false);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::seconds(TENANT_INFO_COOKIE_LIFETIME_SECS));
    cookie
}

fn session_payload(
    user: WebSessionUser,
    access_token: String,
    refresh_token: String,
) -> WebSession {
    let now = Local::now();
    WebSession {
        token: access_token,
        refresh_token,
        user,
        expires_at: (now + Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS)).naive_local(),
        refresh_expires_at: (now + Duration::seconds(REFRESH_TOKEN_LIFETIME_SECS)).naive_local(),
        created_at: now.naive_local(),
    }
}

pub async fn login(
    TenantCtx(ctx): TenantCtx,
    State(auth_module): State<Arc<dyn WebAuthModule>>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<WebLoginRequest>,
) -> HandlerResult {
    let (user, access, refresh) = match WebAuthService::login(
        &ctx.home,
        &payload.phone_number,
        &payload.password,
        auth_module.clone(),
    )
    .await
    {
        Ok(result) => result,
        Err(WebAuthError::InvalidCredentials) => {
            return Ok(axum::Json(WebLoginResponse {
                success: false,
                message: "Invalid phone number or password".to_string(),
                session: None,
                error: Some("invalid_credentials".to_string()),
            })
            .into_response());
        }
        Err(e) => return Err(e.into_friendly_error(auth_module).await.into_response()),
    };

    let secret_config = auth_module.config();
    let secret = secret_config.auth().web_jwt_secret().as_bytes();
    let access_token = match access.to_token(secret) {
        Ok(token) => token,
        Err(e) => {
            return Err(WebAuthError::Token(e)
                .into_friendly_error(auth_module)
                .await
                .into_response());
        }
    };
    let refresh_token = match refresh.to_token(secret) {
        Ok(token) => token,
        Err(e) => {
            return Err(WebAuthError::Token(e)
                .into_friendly_error(auth_module)
                .await
                .into_response());
        }
    };

    info!(
        "Web login successful for user '{}' on tenant '{}'",
        user.id, ctx.home.name
    );

    let jar = jar
        .add(session_cookie(
            "web_jwt_token",
            access_token.clone(),
            ACCESS_TOKEN_LIFETIME_SECS,
        ))
        .add(session_cookie(
            "web_refresh_token",
            refresh_token.clone(),
            REFRESH_TOKEN_LIFETIME_SECS,
        ))
        .add(tenant_info_cookie(&ctx.home.name, ctx.home.id));

    let session_user = WebSessionUser {
        id: user.id,
        phone_number: user.phone_number,
        full_name: user.full_name,
        role: user.role,
        home_id: ctx.home.id,
        home_name: Some(ctx.home.name.clone()),
        photo: user.photo,
        apartment_number: user.apartment_number,
        created_at: user.created_at,
        updated_at: user.updated_at,
    };

    Ok((
        jar,
        axum::Json(WebLoginResponse {
            success: true,
            message: "Login successful".to_string(),
            session: Some(session_payload(session_user, access_token, refresh_token)),
            error: None,
        }),
    )
        .into_response())
}

pub async fn refresh(
    TenantCtx(ctx): TenantCtx,
    State(auth_module): State<Arc<dyn WebAuthModule>>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<WebRefreshRequest>,
) -> HandlerResult {
    let token = payload
        .refresh_token
        .or_else(|| jar.get("web_refresh_token").map(|c| c.value().to_string()));
    let Some(token) = token else {
        return Err(WebAuthError::InvalidToken
            .into_friendly_error(auth_module)
            .await
            .into_response());
    };

    let (access, refresh) = match WebAuthService::refresh(&ctx.home, &token, &auth_module) {
        Ok(pair) => pair,
        Err(e) => return Err(e.into_friendly_error(auth_module).await.into_response()),
    };

    let secret_config = auth_module.config();
    let secret = secret_config.auth().web_jwt_secret().as_bytes();
    let (access_token, refresh_token) = match (access.to_token(secret), refresh.to_token(secret)) {
        (Ok(a), Ok(r)) => (a, r),
        _ => {
            return Err(WebAuthError::Token("encode".to_string())
                .into_friendly_error(auth_module)
                .await
                .into_response());
        }
    };

    let jar = jar
        .add(session_cookie(
            "web_jwt_token",
            access_token.clone(),
            ACCESS_TOKEN_LIFETIME_SECS,
        ))
        .add(session_cookie(
            "web_refresh_token",
            refresh_token.clone(),
            REFRESH_TOKEN_LIFETIME_SECS,
        ));

    Ok((
        jar,
        axum::Json(serde_json::json!({
            "success": true,
            "token": access_token,
            "refresh_token": refresh_token,
            "expires_at": (Utc::now() + Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS)).to_rfc3339(),
            "refresh_expires_at": (Utc::now() + Duration::seconds(REFRESH_TOKEN_LIFETIME_SECS)).to_rfc3339(),
            "message": "Token refreshed"
        })),
    )
        .into_response())
}

pub async fn validate(
    TenantCtx(ctx): TenantCtx,
    State(auth_module): State<Arc<dyn WebAuthModule>>,
    jar: CookieJar,
) -> HandlerResult {
    let Some(cookie) = jar.get("web_jwt_token") else {
        return Ok(axum::Json(WebValidateResponse {
            valid: false,
            message: "No session".to_string(),
            user: None,
        })
        .into_response());
    };

    match WebAuthService::validate(&ctx.home, cookie.value(), &auth_module) {
        Ok(claims) => Ok(axum::Json(WebValidateResponse {
            valid: true,
            message: "Session valid".to_string(),
            user: Some(WebSessionUser {
                id: claims.user_id().to_string(),
                phone_number: Some(claims.phone_number().to_string()),
                full_name: Some(claims.full_name().to_string()),
                role: claims.role().to_string(),
                home_id: claims.home_id(),
                home_name: claims.home_name().map(str::to_string),
                photo: None,
                apartment_number: None,
                created_at: Utc::now().naive_utc(),
                updated_at: Utc::now().naive_utc(),
            }),
        })
        .into_response()),
        Err(_) => Ok(axum::Json(WebValidateResponse {
            valid: false,
            message: "Invalid or expired session".to_string(),
            user: None,
        })
        .into_response()),
    }
}

pub async fn logout(TenantCtx(ctx): TenantCtx, jar: CookieJar) -> HandlerResult {
    info!("Web logout on tenant '{}'", ctx.home.name);
    let jar = jar
        .remove(Cookie::from("web_jwt_token"))
        .remove(Cookie::from("web_refresh_token"))
        .remove(Cookie::from("tenant_info"));
    Ok((
        jar,
        axum::Json(serde_json::json!({ "success": true, "message": "Logged out" })),
    )
        .into_response())
}
