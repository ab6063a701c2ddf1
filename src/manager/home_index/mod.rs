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

use crate::common::{ConfigProvider, DefaultAppState, MailTransporter};
use crate::manager::home_index::repository::HomeIndexRepository;
use std::sync::Arc;

pub(crate) mod dto;
mod handler;
pub(crate) mod model;
pub(crate) mod phone;
pub(crate) mod repository;
pub(crate) mod routes;

pub trait HomeIndexModule: ConfigProvider + MailTransporter + Send + Sync {
    fn home_index_repo(&self) -> Arc<dyn HomeIndexRepository>;
}

impl HomeIndexModule for DefaultAppState {
    fn home_index_repo(&self) -> Arc<dyn HomeIndexRepository> {
        self.pool_wrapper.clone()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::manager::app::config::AppConfig;
    use async_trait::async_trait;
    use lettre::{
        Message,
        transport::smtp::{Error, response::Response},
    };
    use mockall::mock;

    mock!(
        pub HomeIndexModule {}
        impl ConfigProvider for HomeIndexModule {
            fn config(&self) -> Arc<AppConfig>;
        }
        #[async_trait]
        impl MailTransporter for HomeIndexModule {
            async fn send(&self, message: Message) -> Result<Response, Error>;
        }
        impl HomeIndexModule for HomeIndexModule {
            fn home_index_repo(&self) -> Arc<dyn HomeIndexRepository>;
        }
    );

    use crate::manager::home_index::repository::MockHomeIndexRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use super::model::HomeIndexEntry;
    use chrono::Utc;
    use tower::ServiceExt;

    fn entry(phone: &str) -> HomeIndexEntry {
        let now = Utc::now().naive_utc();
        HomeIndexEntry {
            phone_number: phone.to_string(),
            home_id: 1,
            home_name: "beresheet".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_discovery_returns_normalized_entry() {
        let mut repo = MockHomeIndexRepository::new();
        repo.expect_get()
            .withf(|phone| phone == "0541111666")
            .returning(|_| Ok(Some(entry("541111666"))));
        let repo = Arc::new(repo);

        let mut module = MockHomeIndexModule::new();
        module
            .expect_home_index_repo()
            .returning(move || repo.clone());

        let app = routes::discovery_routes(Arc::new(module));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/home_index/get_home_by_phone?phone_number=0541111666")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["home_id"], 1);
        assert_eq!(json["home_name"], "beresheet");
        assert_eq!(json["phone_number"], "541111666");
    }

    #[tokio::test]
    async fn test_discovery_alias_serves_the_same_lookup() {
        let mut repo = MockHomeIndexRepository::new();
        repo.expect_get().returning(|_| Ok(Some(entry("541111666"))));
        let repo = Arc::new(repo);

        let mut module = MockHomeIndexModule::new();
        module
            .expect_home_index_repo()
            .returning(move || repo.clone());

        let app = routes::discovery_routes(Arc::new(module));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users/get_user_home?phone_number=541111666")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_discovery_miss_is_not_found() {
        let mut repo = MockHomeIndexRepository::new();
        repo.expect_get().returning(|_| Ok(None));
        let repo = Arc::new(repo);

        let mut module = MockHomeIndexModule::new();
        module
            .expect_home_index_repo()
            .returning(move || repo.clone());

        let app = routes::discovery_routes(Arc::new(module));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/home_index/get_home_by_phone?phone_number=0000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
