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
use std::fmt::Display;
use thiserror::Error;

use crate::common::{
    MailTransporter,
    dto::{ErrorResponse, GeneralError},
};
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use handlebars::Handlebars;
use lettre::Message;
use lettre::{
    address::AddressError,
    message::{Mailbox, header::ContentType},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::Level;
use tracing::event;

/// An error that is safe to show to a caller, as opposed to one that is not.
///
/// `UserFacing` carries the HTTP status, the source location that raised it
/// and a serializable body. `Internal` carries the source location and a body
/// that is logged and mailed to the administrator but never serialized into
/// the response; the caller only ever sees a generic message.
#[derive(Debug, Error, Clone)]
pub enum FriendlyError<T>
where
    T: Serialize + Display,
{
    #[error("{0}")]
    UserFacing(StatusCode, String, T),
    #[error("An unexpected error occurred while processing the request")]
    Internal(String, T),
}

impl<T> FriendlyError<T>
where
    T: Serialize + Display,
{
    pub fn user_facing(severity: Level, status: StatusCode, loc: &str, body: T) -> Self {
        Self::UserFacing(status, loc.to_string(), body).trace(severity)
    }
    pub fn internal(loc: &str, body: T) -> Self {
        Self::Internal(loc.to_string(), body).trace(Level::ERROR)
    }
    pub async fn internal_with_admin_notify(
        loc: &str,
        body: T,
        mailer: Arc<dyn MailTransporter>,
    ) -> Self {
        let fe = Self::Internal(loc.to_string(), body).trace(Level::ERROR);

        if let Err(e) = fe.notify_admin(mailer).await {
            event!(Level::ERROR, "Could not notify admin: {e}")
        }

        fe
    }

    fn trace(self, severity: Level) -> Self {
        match &self {
            FriendlyError::UserFacing(status, loc, body) => match severity {
                Level::ERROR => {
                    event!(
                        Level::ERROR,
                        "User-facing error: http-status={status} location={loc}, message={body}",
                    );
                }
                Level::WARN => {
                    event!(
                        Level::WARN,
                        "User-facing error: http-status={status} location={loc}, message={body}",
                    );
                }
                Level::INFO => {
                    event!(
                        Level::INFO,
                        "User-facing error: http-status={status} location={loc}, message={body}",
                    );
                }
                Level::DEBUG => {
                    event!(
                        Level::DEBUG,
                        "User-facing error: http-status={status} location={loc}, message={body}",
                    );
                }
                Level::TRACE => {
                    event!(
                        Level::TRACE,
                        "User-facing error: http-status={status} location={loc}, message={body}",
                    );
                }
            },
            FriendlyError::Internal(loc, body) => match severity {
                Level::ERROR => {
                    event!(Level::ERROR, "Internal error: location={loc} message={body}");
                }
                Level::WARN => {
                    event!(Level::WARN, "Internal error: location={loc} message={body}");
                }
                Level::INFO => {
                    event!(Level::INFO, "Internal error: location={loc} message={body}");
                }
                Level::DEBUG => {
                    event!(Level::DEBUG, "Internal error: location={loc} message={body}");
                }
                Level::TRACE => {
                    event!(Level::TRACE, "Internal error: location={loc} message={body}");
                }
            },
        }
        self
    }
    async fn notify_admin(&self, module: Arc<dyn MailTransporter>) -> Result<(), String> {
        if let FriendlyError::Internal(loc, body) = &self {
            let handlebars = Handlebars::new();
            let email = Message::builder()
                .from(Mailbox::new(
                    Some(module.config().mail().default_from_name().to_owned()),
                    module
                        .config()
                        .mail()
                        .default_from()
                        .parse()
                        .map_err(|e: AddressError| e.to_string())?,
                ))
                .to(Mailbox::new(
                    None,
                    module
                        .config()
                        .mail()
                        .default_notification_email()
                        .parse()
                        .map_err(|e: AddressError| e.to_string())?,
                ))
                .subject("Unexpected error")
                .header(ContentType::TEXT_PLAIN)
                .body(
                    handlebars
                        .render_template(
                            "Dear Admin!\n\n Check this error!\n Internal error: location={{loc}} message={{body}}",
                            &json!({"body": body.to_string(), "loc": loc}),
                        )
                        .map_err(|e| e.to_string())?,
                )
                .map_err(|e| e.to_string())?;

            match module.send(email).await {
                Ok(_) => Ok(()),
                Err(e) => Err(e.to_string()),
            }
        } else {
            Err("".to_string())
        }
    }
}

impl<T> IntoResponse for FriendlyError<T>
where
    T: Serialize + Display,
{
    fn into_response(self) -> Response {
        match self {
            FriendlyError::UserFacing(status, _, body) => ErrorResponse {
                status_code: status,
                error: body,
            }
            .into_response(),
            FriendlyError::Internal(_, _) => ErrorResponse {
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                error: GeneralError {
                    message: String::from(
                        "An unexpected error occurred while processing the request",
                    ),
                },
            }
            .into_response(),
        }
    }
}

#[async_trait]
pub trait IntoFriendlyError<T>
where
    T: Serialize + Display,
{
    async fn into_friendly_error(self, mailer: Arc<dyn MailTransporter>) -> FriendlyError<T>;
}

/// Errors raised by the database layer and the repositories built on it.
///
/// The pool variants distinguish a cold-start connection failure
/// (`PoolUnavailable`, retryable, never cached) from acquire-wait exhaustion
/// (`PoolSaturated`). `QueryTimeout` is the bounded per-operation timeout.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Pool unavailable: {0}")]
    PoolUnavailable(String),

    #[error("Pool saturated")]
    PoolSaturated,

    #[error("Query timed out")]
    QueryTimeout,

    #[error("Table {schema}.{table} is missing")]
    TableMissing { schema: String, table: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Could not decode row: {0}")]
    Decode(String),

    #[error("InvalidInput error: {0}")]
    InvalidInput(String),

    #[error("Record not found")]
    NotFound,

    #[error("Teardown incomplete: {0}")]
    TeardownIncomplete(String),

    #[error("RwLock error: {0}")]
    LockPoisoned(String),
}

impl RepositoryError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepositoryError::UniqueViolation(_))
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound)
    }

    /// HTTP status an error of this kind surfaces as when no service-level
    /// mapping applies.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RepositoryError::PoolUnavailable(_) | RepositoryError::PoolSaturated => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RepositoryError::QueryTimeout => StatusCode::GATEWAY_TIMEOUT,
            RepositoryError::UniqueViolation(_) => StatusCode::CONFLICT,
            RepositoryError::NotFound => StatusCode::NOT_FOUND,
            RepositoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the kinds a caller may reasonably retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RepositoryError::PoolUnavailable(_)
                | RepositoryError::PoolSaturated
                | RepositoryError::TeardownIncomplete(_)
        )
    }
}

impl From<tiberius::error::Error> for RepositoryError {
    fn from(value: tiberius::error::Error) -> Self {
        if let tiberius::error::Error::Server(token) = &value {
            // 2627: unique constraint, 2601: unique index
            if token.code() == 2627 || token.code() == 2601 {
                return RepositoryError::UniqueViolation(token.message().to_string());
            }
        }
        RepositoryError::Query(value.to_string())
    }
}

impl From<oracle::Error> for RepositoryError {
    fn from(value: oracle::Error) -> Self {
        if let Some(db_error) = value.db_error() {
            // ORA-00001
            if db_error.code() == 1 {
                return RepositoryError::UniqueViolation(db_error.message().to_string());
            }
        }
        RepositoryError::Query(value.to_string())
    }
}

#[async_trait]
impl IntoFriendlyError<GeneralError> for RepositoryError {
    async fn into_friendly_error(
        self,
        mailer: Arc<dyn MailTransporter>,
    ) -> FriendlyError<GeneralError> {
        match &self {
            RepositoryError::PoolUnavailable(_)
            | RepositoryError::PoolSaturated
            | RepositoryError::QueryTimeout
            | RepositoryError::UniqueViolation(_)
            | RepositoryError::NotFound
            | RepositoryError::InvalidInput(_) => FriendlyError::user_facing(
                Level::WARN,
                self.status_code(),
                file!(),
                GeneralError {
                    message: self.to_string(),
                },
            ),
            _ => {
                FriendlyError::internal_with_admin_notify(
                    file!(),
                    GeneralError {
                        message: self.to_string(),
                    },
                    mailer,
                )
                .await
            }
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error, Serialize)]
pub enum BuilderError {
    #[error("{0} is required")]
    MissingRequired(&'static str),
}

#[async_trait]
impl IntoFriendlyError<BuilderError> for BuilderError {
    async fn into_friendly_error(
        self,
        mailer: Arc<dyn MailTransporter>,
    ) -> FriendlyError<BuilderError> {
        FriendlyError::internal_with_admin_notify(file!(), self, mailer).await
    }
}

pub type BuilderResult<T> = Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repository_error_status_mapping() {
        assert_eq!(
            RepositoryError::PoolUnavailable("connect refused".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RepositoryError::PoolSaturated.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RepositoryError::QueryTimeout.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            RepositoryError::UniqueViolation("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RepositoryError::TableMissing {
                schema: "beresheet".into(),
                table: "events".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RepositoryError::PoolSaturated.is_retryable());
        assert!(RepositoryError::PoolUnavailable("x".into()).is_retryable());
        assert!(!RepositoryError::NotFound.is_retryable());
        assert!(!RepositoryError::UniqueViolation("x".into()).is_retryable());
    }
}
