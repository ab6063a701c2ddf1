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
use crate::manager::app::database::value::{SqlRow, SqlValue};
use deadpool::managed::{Metrics, Object, PoolError, RecycleError, RecycleResult};
use oracle::sql_type::{OracleType, ToSql};
use std::sync::Mutex;
use std::time::Duration;

/// Oracle side of the pool abstraction. The `oracle` client is synchronous,
/// so every call crosses into `spawn_blocking`; the pool itself is a
/// `deadpool` managed pool of mutex-wrapped connections.
pub struct OracleManager {
    username: String,
    password: String,
    connect_string: String,
}

impl OracleManager {
    pub fn new(host: &str, port: u16, service: &str, username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            // EZConnect
            connect_string: format!("//{host}:{port}/{service}"),
        }
    }
}

impl deadpool::managed::Manager for OracleManager {
    type Type = Mutex<oracle::Connection>;
    type Error = RepositoryError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let username = self.username.clone();
        let password = self.password.clone();
        let connect_string = self.connect_string.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let mut conn = oracle::Connection::connect(&username, &password, &connect_string)
                .map_err(|e| RepositoryError::PoolUnavailable(e.to_string()))?;
            conn.set_autocommit(true);
            Ok::<_, RepositoryError>(conn)
        })
        .await
        .map_err(|e| RepositoryError::PoolUnavailable(e.to_string()))??;
        Ok(Mutex::new(conn))
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        let alive = conn
            .get_mut()
            .map(|c| c.ping().is_ok())
            .unwrap_or(false);
        if alive {
            Ok(())
        } else {
            Err(RecycleError::Message("connection lost".into()))
        }
    }
}

#[derive(Clone)]
pub struct OraclePool {
    pool: deadpool::managed::Pool<OracleManager>,
}

impl OraclePool {
    pub fn build(
        manager: OracleManager,
        max_size: u32,
        wait_timeout: Duration,
    ) -> RepositoryResult<Self> {
        let pool = deadpool::managed::Pool::builder(manager)
            .max_size(max_size as usize)
            .wait_timeout(Some(wait_timeout))
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| RepositoryError::PoolUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> RepositoryResult<Object<OracleManager>> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => RepositoryError::PoolSaturated,
            PoolError::Backend(e) => e,
            other => RepositoryError::PoolUnavailable(other.to_string()),
        })
    }

    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<Vec<SqlRow>> {
        let conn = self.connection().await?;
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            let boxed = to_params(&params)?;
            let refs: Vec<&dyn ToSql> = boxed.iter().map(|b| b.as_ref()).collect();
            let result_set = guard.query(&sql, &refs).map_err(RepositoryError::from)?;
            let columns: Vec<(String, OracleType)> = result_set
                .column_info()
                .iter()
                .map(|ci| (ci.name().to_string(), ci.oracle_type().clone()))
                .collect();
            let mut rows = Vec::new();
            for row in result_set {
                let row = row.map_err(RepositoryError::from)?;
                rows.push(decode_row(&columns, &row)?);
            }
            Ok(rows)
        })
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<u64> {
        let conn = self.connection().await?;
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            let boxed = to_params(&params)?;
            let refs: Vec<&dyn ToSql> = boxed.iter().map(|b| b.as_ref()).collect();
            let statement = guard.execute(&sql, &refs).map_err(RepositoryError::from)?;
            statement.row_count().map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?
    }

    pub async fn execute_ddl(&self, sql: &str) -> RepositoryResult<()> {
        self.execute(sql, &[]).await.map(|_| ())
    }
}

fn to_params(params: &[SqlValue]) -> RepositoryResult<Vec<Box<dyn ToSql>>> {
    params
        .iter()
        .map(|value| {
            Ok(match value {
                SqlValue::Null => Box::new(None::<String>) as Box<dyn ToSql>,
                // Oracle has no SQL boolean; flags are NUMBER(1)
                SqlValue::Bool(v) => Box::new(if *v { 1i64 } else { 0i64 }),
                SqlValue::Int(v) => Box::new(*v),
                SqlValue::Double(v) => Box::new(*v),
                SqlValue::Text(v) => Box::new(v.clone()),
                SqlValue::Timestamp(v) => Box::new(*v),
                SqlValue::Bytes(_) => {
                    return Err(RepositoryError::InvalidInput(
                        "binary parameters are not supported".to_string(),
                    ));
                }
            })
        })
        .collect()
}

fn decode_row(columns: &[(String, OracleType)], row: &oracle::Row) -> RepositoryResult<SqlRow> {
    let mut values = Vec::with_capacity(columns.len());
    for (i, (_, oracle_type)) in columns.iter().enumerate() {
        let value = match oracle_type {
            OracleType::Date
            | OracleType::Timestamp(_)
            | OracleType::TimestampTZ(_)
            | OracleType::TimestampLTZ(_) => row
                .get::<usize, Option<chrono::NaiveDateTime>>(i)
                .map_err(RepositoryError::from)?
                .map(SqlValue::Timestamp)
                .unwrap_or(SqlValue::Null),
            OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => row
                .get::<usize, Option<Vec<u8>>>(i)
                .map_err(RepositoryError::from)?
                .map(SqlValue::Bytes)
                .unwrap_or(SqlValue::Null),
            OracleType::Int64 | OracleType::UInt64 => row
                .get::<usize, Option<i64>>(i)
                .map_err(RepositoryError::from)?
                .map(SqlValue::Int)
                .unwrap_or(SqlValue::Null),
            OracleType::Number(_, scale) if *scale <= 0 => {
                // generic NUMBER reports scale -127; try integral first
                match row.get::<usize, Option<i64>>(i) {
                    Ok(v) => v.map(SqlValue::Int).unwrap_or(SqlValue::Null),
                    Err(_) => row
                        .get::<usize, Option<f64>>(i)
                        .map_err(RepositoryError::from)?
                        .map(SqlValue::Double)
                        .unwrap_or(SqlValue::Null),
                }
            }
            OracleType::Number(_, _)
            | OracleType::Float(_)
            | OracleType::BinaryFloat
            | OracleType::BinaryDouble => row
                .get::<usize, Option<f64>>(i)
                .map_err(RepositoryError::from)?
                .map(SqlValue::Double)
                .unwrap_or(SqlValue::Null),
            _ => row
                .get::<usize, Option<String>>(i)
                .map_err(RepositoryError::from)?
                .map(SqlValue::Text)
                .unwrap_or(SqlValue::Null),
        };
        values.push(value);
    }
    Ok(SqlRow::new(
        columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    ))
}
