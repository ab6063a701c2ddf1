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
use deadpool_tiberius::deadpool::managed::{Object, PoolError};
use tiberius::{ColumnData, FromSql};

/// SQL Server side of the pool abstraction: a `deadpool`-managed `tiberius`
/// client pool plus row decoding into [`SqlRow`].
#[derive(Clone)]
pub struct SqlServerPool {
    pool: deadpool_tiberius::Pool,
}

static NULL_TEXT: Option<&str> = None;

impl SqlServerPool {
    /// Builds the pool lazily; connections are only opened on first use, so
    /// an unreachable server surfaces per-request as `PoolUnavailable`
    /// instead of failing construction.
    pub fn build(
        host: &str,
        port: u16,
        database: &str,
        username: &str,
        password: &str,
        max_size: u32,
        wait_timeout_secs: f64,
    ) -> RepositoryResult<Self> {
        let pool = deadpool_tiberius::Manager::new()
            .host(host)
            .port(port)
            .database(database)
            .basic_authentication(username, password)
            .trust_cert()
            .max_size(max_size as usize)
            .wait_timeout(std::time::Duration::from_secs_f64(wait_timeout_secs))
            .create_pool()
            .map_err(|e| RepositoryError::PoolUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn client(
        &self,
    ) -> RepositoryResult<Object<deadpool_tiberius::Manager>> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => RepositoryError::PoolSaturated,
            other => RepositoryError::PoolUnavailable(other.to_string()),
        })
    }

    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<Vec<SqlRow>> {
        let mut client = self.client().await?;
        let params = to_params(params)?;
        let rows = client
            .query(sql, &params)
            .await
            .map_err(RepositoryError::from)?
            .into_first_result()
            .await
            .map_err(RepositoryError::from)?;
        rows.into_iter().map(decode_row).collect()
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> RepositoryResult<u64> {
        let mut client = self.client().await?;
        let params = to_params(params)?;
        let result = client
            .execute(sql, &params)
            .await
            .map_err(RepositoryError::from)?;
        Ok(result.rows_affected().iter().sum())
    }

    /// DDL and other parameterless statements, outside the placeholder
    /// machinery.
    pub async fn execute_ddl(&self, sql: &str) -> RepositoryResult<()> {
        let mut client = self.client().await?;
        client
            .simple_query(sql)
            .await
            .map_err(RepositoryError::from)?
            .into_results()
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

fn to_params<'a>(params: &'a [SqlValue]) -> RepositoryResult<Vec<&'a dyn tiberius::ToSql>> {
    params
        .iter()
        .map(|value| match value {
            SqlValue::Null => Ok(&NULL_TEXT as &dyn tiberius::ToSql),
            SqlValue::Bool(v) => Ok(v as &dyn tiberius::ToSql),
            SqlValue::Int(v) => Ok(v as &dyn tiberius::ToSql),
            SqlValue::Double(v) => Ok(v as &dyn tiberius::ToSql),
            SqlValue::Text(v) => Ok(v as &dyn tiberius::ToSql),
            SqlValue::Timestamp(v) => Ok(v as &dyn tiberius::ToSql),
            SqlValue::Bytes(_) => Err(RepositoryError::InvalidInput(
                "binary parameters are not supported".to_string(),
            )),
        })
        .collect()
}

fn decode_row(row: tiberius::Row) -> RepositoryResult<SqlRow> {
    let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(columns.len());
    for data in row.into_iter() {
        values.push(decode_column(data)?);
    }
    Ok(SqlRow::new(columns, values))
}

fn decode_column(data: ColumnData<'static>) -> RepositoryResult<SqlValue> {
    Ok(match data {
        ColumnData::Bit(v) => v.map(SqlValue::Bool).unwrap_or(SqlValue::Null),
        ColumnData::U8(v) => v.map(|x| SqlValue::Int(x as i64)).unwrap_or(SqlValue::Null),
        ColumnData::I16(v) => v.map(|x| SqlValue::Int(x as i64)).unwrap_or(SqlValue::Null),
        ColumnData::I32(v) => v.map(|x| SqlValue::Int(x as i64)).unwrap_or(SqlValue::Null),
        ColumnData::I64(v) => v.map(SqlValue::Int).unwrap_or(SqlValue::Null),
        ColumnData::F32(v) => v
            .map(|x| SqlValue::Double(x as f64))
            .unwrap_or(SqlValue::Null),
        ColumnData::F64(v) => v.map(SqlValue::Double).unwrap_or(SqlValue::Null),
        ColumnData::String(v) => v
            .map(|s| SqlValue::Text(s.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Guid(v) => v
            .map(|g| SqlValue::Text(g.to_string()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Binary(v) => v
            .map(|b| SqlValue::Bytes(b.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Numeric(v) => v
            .map(|n| SqlValue::Double(n.value() as f64 / 10f64.powi(n.scale() as i32)))
            .unwrap_or(SqlValue::Null),
        data @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => chrono::NaiveDateTime::from_sql(&data)
            .map_err(RepositoryError::from)?
            .map(SqlValue::Timestamp)
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::Date(_) => chrono::NaiveDate::from_sql(&data)
            .map_err(RepositoryError::from)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(SqlValue::Timestamp)
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::Time(_) => chrono::NaiveTime::from_sql(&data)
            .map_err(RepositoryError::from)?
            .map(|t| SqlValue::Text(t.to_string()))
            .unwrap_or(SqlValue::Null),
        data @ ColumnData::DateTimeOffset(_) => {
            chrono::DateTime::<chrono::Utc>::from_sql(&data)
                .map_err(RepositoryError::from)?
                .map(|ts| SqlValue::Timestamp(ts.naive_utc()))
                .unwrap_or(SqlValue::Null)
        }
        other => {
            return Err(RepositoryError::Decode(format!(
                "unsupported SQL Server column type: {other:?}"
            )));
        }
    })
}
