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
use crate::common::MailTransporter;
use crate::common::dto::GeneralError;
use crate::common::error::{FriendlyError, IntoFriendlyError, RepositoryError};
use crate::manager::tenants::model::Home;
use crate::tenant::auth::WebAuthModule;
use crate::tenant::auth::claims::WebClaims;
use crate::tenant::users::model::UserProfile;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::Level;

pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;
pub const TENANT_INFO_COOKIE_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum WebAuthError {
    #[error("Invalid phone number or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Token error: {0}")]
    Token(String),
}

#[async_trait]
impl IntoFriendlyError<GeneralError> for WebAuthError {
    async fn into_friendly_error(
        self,
        mailer: Arc<dyn MailTransporter>,
    ) -> FriendlyError<GeneralError> {
        match self {
            WebAuthError::InvalidCredentials | WebAuthError::InvalidToken => {
                FriendlyError::user_facing(
                    Level::DEBUG,
                    StatusCode::UNAUTHORIZED,
                    file!(),
                    GeneralError {
                        message: self.to_string(),
                    },
                )
            }
            e => {
                FriendlyError::internal_with_admin_notify(
                    file!(),
                    GeneralError {
                        message: e.to_string(),
                    },
                    mailer,
                )
                .await
            }
        }
    }
}

/// Password check: argon2 for provisioned accounts, byte equality for seed
/// rows that still carry the cleartext seed credential.
fn password_matches(user: &UserProfile, password: &str) -> bool {
    match PasswordHash::new(&user.password) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => user.password == password,
    }
}

pub struct WebAuthService;

type WebAuthResult<T> = Result<T, WebAuthError>;

impl WebAuthService {
    /// Authenticates against the tenant's `users` table and issues the
    /// access/refresh token pair bound to the gate-resolved tenant.
    pub async fn login(
        home: &Home,
        phone_number: &str,
        password: &str,
        module: Arc<dyn WebAuthModule>,
    ) -> WebAuthResult<(UserProfile, WebClaims, WebClaims)> {
        let user = module
            .users_repo()
            .get_by_phone(&home.database_schema, phone_number)
            .await?
            .ok_or(WebAuthError::InvalidCredentials)?;

        if !password_matches(&user, password) {
            return Err(WebAuthError::InvalidCredentials);
        }

        let access = WebClaims::access(
            user.id.clone(),
            user.phone_number.clone().unwrap_or_default(),
            user.full_name.clone().unwrap_or_default(),
            user.role.clone(),
            home.id,
            Some(home.name.clone()),
            ACCESS_TOKEN_LIFETIME_SECS,
        );
        let refresh = WebClaims::refresh(
            user.id.clone(),
            user.phone_number.clone().unwrap_or_default(),
            user.full_name.clone().unwrap_or_default(),
            user.role.clone(),
            home.id,
            Some(home.name.clone()),
            REFRESH_TOKEN_LIFETIME_SECS,
        );
        Ok((user, access, refresh))
    }

    /// Exchanges a refresh token for a fresh access/refresh pair. The
    /// refresh token must be of refresh type and bound to this tenant.
    pub fn refresh(
        home: &Home,
        refresh_token: &str,
        module: &Arc<dyn WebAuthModule>,
    ) -> WebAuthResult<(WebClaims, WebClaims)> {
        let claims = WebClaims::from_token(
            refresh_token,
            module.config().auth().web_jwt_secret().as_bytes(),
        )
        .map_err(|_| WebAuthError::InvalidToken)?;

        if !claims.is_refresh() || claims.home_id() != home.id {
            return Err(WebAuthError::InvalidToken);
        }

        let access = claims.access_from(ACCESS_TOKEN_LIFETIME_SECS);
        let refresh = WebClaims::refresh(
            claims.user_id().to_string(),
            claims.phone_number().to_string(),
            claims.full_name().to_string(),
            claims.role().to_string(),
            claims.home_id(),
            claims.home_name().map(str::to_string),
            REFRESH_TOKEN_LIFETIME_SECS,
        );
        Ok((access, refresh))
    }

    /// Validates an access token for this tenant.
    pub fn validate(
        home: &Home,
        token: &str,
        module: &Arc<dyn WebAuthModule>,
    ) -> WebAuthResult<WebClaims> {
        let claims =
            WebClaims::from_token(token, module.config().auth().web_jwt_secret().as_bytes())
                .map_err(|_| WebAuthError::InvalidToken)?;
        if !claims.is_access() || claims.home_id() != home.id {
            return Err(WebAuthError::InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::app::config::AppConfigBuilder;
    use crate::tenant::auth::tests::MockWebAuthModule;
    use crate::tenant::users::repository::MockUsersRepository;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
    use chrono::Utc;

    fn home(id: i32, name: &str) -> Home {
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

    fn user(password: &str) -> UserProfile {
        let now = Utc::now().naive_utc();
        UserProfile {
            id: "user-1".to_string(),
            home_id: 1,
            password: password.to_string(),
            full_name: Some("Test User".to_string()),
            phone_number: Some("541111666".to_string()),
            role: "resident".to_string(),
            apartment_number: None,
            photo: None,
            firebase_fcm_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn hashed(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn module_with(repo: MockUsersRepository) -> Arc<dyn WebAuthModule> {
        let mut module = MockWebAuthModule::new();
        let config = Arc::new(AppConfigBuilder::default().build().unwrap());
        let repo = Arc::new(repo);
        module.expect_config().returning(move || config.clone());
        module.expect_users_repo().returning(move || repo.clone());
        Arc::new(module)
    }

    #[tokio::test]
    async fn test_login_with_hashed_password() {
        let stored = hashed("secret99");
        let mut repo = MockUsersRepository::new();
        repo.expect_get_by_phone()
            .withf(|schema, phone| schema == "beresheet" && phone == "541111666")
            .returning(move |_, _| Ok(Some(user(&stored))));

        let (profile, access, refresh) = WebAuthService::login(
            &home(1, "beresheet"),
            "541111666",
            "secret99",
            module_with(repo),
        )
        .await
        .unwrap();

        assert_eq!(profile.id, "user-1");
        assert!(access.is_access());
        assert!(refresh.is_refresh());
        assert_eq!(access.home_id(), 1);
        assert_eq!(access.home_name(), Some("beresheet"));
    }

    #[tokio::test]
    async fn test_login_with_seed_cleartext_password() {
        let mut repo = MockUsersRepository::new();
        repo.expect_get_by_phone()
            .returning(|_, _| Ok(Some(user("seed-password"))));

        assert!(
            WebAuthService::login(
                &home(1, "beresheet"),
                "541111666",
                "seed-password",
                module_with(repo),
            )
            .await
            .is_ok()
        );
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let stored = hashed("secret99");
        let mut repo = MockUsersRepository::new();
        repo.expect_get_by_phone()
            .returning(move |_, _| Ok(Some(user(&stored))));

        let err = WebAuthService::login(
            &home(1, "beresheet"),
            "541111666",
            "wrong",
            module_with(repo),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WebAuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_with_unknown_phone_fails() {
        let mut repo = MockUsersRepository::new();
        repo.expect_get_by_phone().returning(|_, _| Ok(None));

        let err = WebAuthService::login(
            &home(1, "beresheet"),
            "541111666",
            "whatever",
            module_with(repo),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WebAuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_requires_a_refresh_token() {
        let module = module_with(MockUsersRepository::new());
        let secret_config = module.config();
        let secret = secret_config.auth().web_jwt_secret().as_bytes();

        let access = WebClaims::access(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            1,
            None,
            3600,
        );
        let err = WebAuthService::refresh(
            &home(1, "beresheet"),
            &access.to_token(secret).unwrap(),
            &module,
        )
        .unwrap_err();
        assert!(matches!(err, WebAuthError::InvalidToken));

        let refresh = WebClaims::refresh(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            1,
            None,
            3600,
        );
        let (new_access, new_refresh) = WebAuthService::refresh(
            &home(1, "beresheet"),
            &refresh.to_token(secret).unwrap(),
            &module,
        )
        .unwrap();
        assert!(new_access.is_access());
        assert!(new_refresh.is_refresh());
    }

    #[tokio::test]
    async fn test_refresh_bound_to_another_tenant_fails() {
        let module = module_with(MockUsersRepository::new());
        let secret_config = module.config();
        let secret = secret_config.auth().web_jwt_secret().as_bytes();

        let refresh = WebClaims::refresh(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            2,
            None,
            3600,
        );
        let err = WebAuthService::refresh(
            &home(1, "beresheet"),
            &refresh.to_token(secret).unwrap(),
            &module,
        )
        .unwrap_err();
        assert!(matches!(err, WebAuthError::InvalidToken));
    }
}
