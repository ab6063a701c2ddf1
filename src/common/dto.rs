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
use crate::common::error::{BuilderError, BuilderResult};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;

/// Generic user-facing error body with a single message.
#[derive(Debug, Clone, Serialize)]
pub struct GeneralError {
    pub message: String,
}

impl Display for GeneralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug)]
pub struct ErrorResponse<T>
where
    T: Serialize,
{
    pub status_code: StatusCode,
    pub error: T,
}

impl<T> IntoResponse for ErrorResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.status_code, Json(json!({ "error": self.error }))).into_response()
    }
}

/// Marker for responses without a `meta` object.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyType;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<M, D>
where
    M: Serialize,
    D: Serialize,
{
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<M>,
    data: D,
}

impl<M, D> IntoResponse for SuccessResponse<M, D>
where
    M: Serialize,
    D: Serialize,
{
    fn into_response(self) -> Response {
        let status = self.status_code;
        (status, Json(self)).into_response()
    }
}

/// Builder so handlers cannot accidentally ship a response without data.
pub struct SuccessResponseBuilder<M, D>
where
    M: Serialize,
    D: Serialize,
{
    status_code: Option<StatusCode>,
    meta: Option<M>,
    data: Option<D>,
}

impl<M, D> Default for SuccessResponseBuilder<M, D>
where
    M: Serialize,
    D: Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, D> SuccessResponseBuilder<M, D>
where
    M: Serialize,
    D: Serialize,
{
    pub fn new() -> Self {
        Self {
            status_code: None,
            meta: None,
            data: None,
        }
    }
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }
    pub fn meta(mut self, meta: M) -> Self {
        self.meta = Some(meta);
        self
    }
    pub fn data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }
    pub fn build(self) -> BuilderResult<SuccessResponse<M, D>> {
        Ok(SuccessResponse {
            status_code: self.status_code.unwrap_or(StatusCode::OK),
            meta: self.meta,
            data: self.data.ok_or(BuilderError::MissingRequired("data"))?,
        })
    }
}

pub type HandlerResult = Result<Response, Response>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_data() {
        let built = SuccessResponseBuilder::<EmptyType, String>::new()
            .status_code(StatusCode::CREATED)
            .build();
        assert!(built.is_err());
    }

    #[test]
    fn test_builder_defaults_to_ok() {
        let built = SuccessResponseBuilder::<EmptyType, _>::new()
            .data("ready")
            .build()
            .unwrap();
        assert_eq!(built.status_code, StatusCode::OK);
    }
}
