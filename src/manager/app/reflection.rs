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
use crate::manager::app::database::{PoolManager, SqlRow, SqlValue};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Column, key and index metadata for one tenant table, reflected from the
/// engine's information schema through that tenant's own pool.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<String>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Builds a descriptor from the three reflection result sets. Pure so it
    /// can be exercised without an engine.
    pub fn from_rows(
        schema: &str,
        name: &str,
        column_rows: &[SqlRow],
        primary_key_rows: &[SqlRow],
        index_rows: &[SqlRow],
    ) -> RepositoryResult<Self> {
        if column_rows.is_empty() {
            return Err(RepositoryError::TableMissing {
                schema: schema.to_string(),
                table: name.to_string(),
            });
        }
        let mut columns = Vec::with_capacity(column_rows.len());
        for row in column_rows {
            columns.push(ColumnDescriptor {
                name: row.get_string("column_name")?,
                data_type: row.get_string("data_type")?,
                nullable: row.get_bool("is_nullable")?,
            });
        }
        let primary_key = primary_key_rows
            .iter()
            .map(|row| row.get_string("column_name"))
            .collect::<RepositoryResult<Vec<_>>>()?;
        let indexes = index_rows
            .iter()
            .map(|row| row.get_string("index_name"))
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Self {
            schema: schema.to_string(),
            name: name.to_string(),
            columns,
            primary_key,
            indexes,
        })
    }
}

/// Process-lifetime cache of reflected table metadata.
///
/// Entries are insert-only and never invalidated: tenant DDL changes happen
/// out of band and rarely, and a stale descriptor is corrected by a restart.
pub struct TableReflector {
    pool_manager: Arc<dyn PoolManager>,
    cache: RwLock<HashMap<(String, String), Arc<TableDescriptor>>>,
}

impl TableReflector {
    pub fn new(pool_manager: Arc<dyn PoolManager>) -> Self {
        Self {
            pool_manager,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the descriptor for `schema.table`, reflecting it on first
    /// use. A table absent from the schema is `TableMissing`, which points
    /// at incomplete provisioning rather than a caller mistake.
    pub async fn table(&self, schema: &str, table: &str) -> RepositoryResult<Arc<TableDescriptor>> {
        let key = (schema.to_string(), table.to_string());
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            if let Some(descriptor) = cache.get(&key) {
                return Ok(descriptor.clone());
            }
        }

        let pool = self.pool_manager.get_pool_for_schema(schema).await?;
        let dialect = pool.dialect();
        let params = [SqlValue::from(schema), SqlValue::from(table)];

        let exists = pool
            .query_one(&dialect.table_exists_sql(), &params)
            .await?
            .get_i64("cnt")?;
        if exists == 0 {
            return Err(RepositoryError::TableMissing {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }

        let column_rows = pool.query(&dialect.reflect_columns_sql(), &params).await?;
        let primary_key_rows = pool
            .query(&dialect.reflect_primary_key_sql(), &params)
            .await?;
        let index_rows = pool.query(&dialect.reflect_indexes_sql(), &params).await?;

        let descriptor = Arc::new(TableDescriptor::from_rows(
            schema,
            table,
            &column_rows,
            &primary_key_rows,
            &index_rows,
        )?);
        debug!(
            "Reflected table {}.{} ({} columns)",
            schema,
            table,
            descriptor.columns.len()
        );

        let mut cache = self
            .cache
            .write()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
        Ok(cache.entry(key).or_insert(descriptor).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column_row(name: &str, data_type: &str, nullable: i64) -> SqlRow {
        SqlRow::new(
            vec![
                "column_name".to_string(),
                "data_type".to_string(),
                "is_nullable".to_string(),
            ],
            vec![
                SqlValue::Text(name.to_string()),
                SqlValue::Text(data_type.to_string()),
                SqlValue::Int(nullable),
            ],
        )
    }

    fn name_row(column: &str, value: &str) -> SqlRow {
        SqlRow::new(
            vec![column.to_string()],
            vec![SqlValue::Text(value.to_string())],
        )
    }

    #[test]
    fn test_descriptor_from_rows() {
        let descriptor = TableDescriptor::from_rows(
            "beresheet",
            "events",
            &[
                column_row("id", "nvarchar", 0),
                column_row("name", "nvarchar", 0),
                column_row("description", "ntext", 1),
            ],
            &[name_row("column_name", "id")],
            &[name_row("index_name", "ix_events_type")],
        )
        .unwrap();

        assert_eq!(descriptor.columns.len(), 3);
        assert_eq!(descriptor.primary_key, vec!["id".to_string()]);
        assert_eq!(descriptor.indexes, vec!["ix_events_type".to_string()]);
        assert!(descriptor.has_column("description"));
        assert!(descriptor.column("description").unwrap().nullable);
        assert!(!descriptor.column("id").unwrap().nullable);
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let descriptor = TableDescriptor::from_rows(
            "beresheet",
            "events",
            &[column_row("ID", "NUMBER", 0)],
            &[],
            &[],
        )
        .unwrap();
        assert!(descriptor.has_column("id"));
    }

    #[test]
    fn test_empty_columns_mean_missing_table() {
        let err =
            TableDescriptor::from_rows("beresheet", "missing", &[], &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::TableMissing { schema, table }
                if schema == "beresheet" && table == "missing"
        ));
    }
}
