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
use crate::common::extractors::ValidJson;
use crate::manager::auth::AuthModule;
use crate::manager::auth::claims::AdminClaims;
use crate::manager::auth::dto::{AdminLoginRequest, AdminLoginResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, Local};
use std::sync::Arc;
use tracing::Level;

/// Master admin login. The credential comes from configuration; no catalog
/// access happens before the caller is authenticated.
pub async fn login(
    State(auth_module): State<Arc<dyn AuthModule>>,
    ValidJson(payload): ValidJson<AdminLoginRequest>,
) -> HandlerResult {
    let config = auth_module.config();
    if payload.email != config.auth().master_admin_email()
        || payload.password != config.auth().master_admin_password()
    {
        return Err(FriendlyError::user_facing(
            Level::DEBUG,
            StatusCode::UNAUTHORIZED,
            file!(),
            GeneralError {
                message: "Invalid email or password".to_string(),
            },
        )
        .into_response());
    }

    let lifetime = Duration::minutes(config.auth().admin_token_expiration_mins() as i64);
    let now = Local::now();
    let expires_at = now + lifetime;
    let claims = AdminClaims::new(
        payload.email,
        usize::try_from(expires_at.timestamp()).unwrap_or(usize::MAX),
        usize::try_from(now.timestamp()).unwrap_or(0),
    );
    let token = match claims.to_token(config.auth().admin_jwt_secret().as_bytes()) {
        Ok(token) => token,
        Err(e) => {
            return Err(FriendlyError::internal(
                file!(),
                GeneralError { message: e },
            )
            .into_response());
        }
    };

    Ok(axum::Json(AdminLoginResponse {
        token,
        expires_at: expires_at.naive_local(),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use crate::manager::app::config::AppConfigBuilder;
    use crate::manager::auth::claims::AdminClaims;
    use crate::manager::auth::tests::MockAuthModule;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let mut module = MockAuthModule::new();
        let config = Arc::new(AppConfigBuilder::default().build().unwrap());
        module.expect_config().returning(move || config.clone());
        crate::manager::auth::routes::routes(Arc::new(module))
    }

    #[tokio::test]
    async fn test_master_admin_login_issues_a_token() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@localhost","password":"admin"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let token = json["token"].as_str().unwrap();
        let config = AppConfigBuilder::default().build().unwrap();
        let claims =
            AdminClaims::from_token(token, config.auth().admin_jwt_secret().as_bytes()).unwrap();
        assert_eq!(claims.sub(), "admin@localhost");
    }

    #[tokio::test]
    async fn test_wrong_master_credentials_are_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@localhost","password":"nope"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
