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
use crate::common::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;

/// Engine-independent SQL value. Rows coming back from either driver are
/// decoded into these eagerly so everything above the pool layer is
/// driver-agnostic (and constructible in tests).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}
impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}
impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}
impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}
impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}
impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}
impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}
impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// One decoded result row: column names in result order plus the values.
#[derive(Debug, Clone)]
pub struct SqlRow {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl SqlRow {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn value(&self, column: &str) -> RepositoryResult<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
            .ok_or_else(|| RepositoryError::Decode(format!("no column '{column}' in result")))
    }

    pub fn get_opt_i64(&self, column: &str) -> RepositoryResult<Option<i64>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            // Oracle reports every numeric column as NUMBER
            SqlValue::Double(v) if v.fract() == 0.0 => Ok(Some(*v as i64)),
            other => Err(RepositoryError::Decode(format!(
                "column '{column}' is not an integer: {other:?}"
            ))),
        }
    }

    pub fn get_i64(&self, column: &str) -> RepositoryResult<i64> {
        self.get_opt_i64(column)?
            .ok_or_else(|| RepositoryError::Decode(format!("column '{column}' is NULL")))
    }

    pub fn get_i32(&self, column: &str) -> RepositoryResult<i32> {
        i32::try_from(self.get_i64(column)?)
            .map_err(|_| RepositoryError::Decode(format!("column '{column}' exceeds i32")))
    }

    pub fn get_opt_f64(&self, column: &str) -> RepositoryResult<Option<f64>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Double(v) => Ok(Some(*v)),
            SqlValue::Int(v) => Ok(Some(*v as f64)),
            other => Err(RepositoryError::Decode(format!(
                "column '{column}' is not a double: {other:?}"
            ))),
        }
    }

    pub fn get_opt_bool(&self, column: &str) -> RepositoryResult<Option<bool>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(v) => Ok(Some(*v)),
            // BIT-less engines store flags as 0/1
            SqlValue::Int(v) => Ok(Some(*v != 0)),
            other => Err(RepositoryError::Decode(format!(
                "column '{column}' is not a bool: {other:?}"
            ))),
        }
    }

    pub fn get_bool(&self, column: &str) -> RepositoryResult<bool> {
        self.get_opt_bool(column)?
            .ok_or_else(|| RepositoryError::Decode(format!("column '{column}' is NULL")))
    }

    pub fn get_opt_string(&self, column: &str) -> RepositoryResult<Option<String>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            SqlValue::Int(v) => Ok(Some(v.to_string())),
            SqlValue::Double(v) => Ok(Some(v.to_string())),
            other => Err(RepositoryError::Decode(format!(
                "column '{column}' is not text: {other:?}"
            ))),
        }
    }

    pub fn get_string(&self, column: &str) -> RepositoryResult<String> {
        self.get_opt_string(column)?
            .ok_or_else(|| RepositoryError::Decode(format!("column '{column}' is NULL")))
    }

    pub fn get_opt_timestamp(&self, column: &str) -> RepositoryResult<Option<NaiveDateTime>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Timestamp(v) => Ok(Some(*v)),
            other => Err(RepositoryError::Decode(format!(
                "column '{column}' is not a timestamp: {other:?}"
            ))),
        }
    }

    pub fn get_timestamp(&self, column: &str) -> RepositoryResult<NaiveDateTime> {
        self.get_opt_timestamp(column)?
            .ok_or_else(|| RepositoryError::Decode(format!("column '{column}' is NULL")))
    }
}
