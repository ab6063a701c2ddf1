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
use crate::manager::app::config::DatabaseEngine;

/// SQL text generation for the two catalog engines.
///
/// Repositories write statements with `?` placeholders and engine-neutral
/// identifiers; everything engine-specific - placeholder markers,
/// identifier quoting, provisioning and teardown DDL, information-schema
/// queries - is produced here. Schema names reaching the DDL functions have
/// already passed tenant-name validation.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    engine: DatabaseEngine,
}

impl Dialect {
    pub fn new(engine: DatabaseEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> DatabaseEngine {
        self.engine
    }

    /// Rewrites `?` placeholders to the engine's markers: `@P1..` for SQL
    /// Server, `:1..` for Oracle. Question marks inside string literals are
    /// left alone.
    pub fn render_placeholders(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0;
        let mut in_literal = false;
        for ch in sql.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                }
                '?' if !in_literal => {
                    n += 1;
                    match self.engine {
                        DatabaseEngine::SqlServer => out.push_str(&format!("@P{n}")),
                        DatabaseEngine::Oracle => out.push_str(&format!(":{n}")),
                    }
                }
                _ => out.push(ch),
            }
        }
        out
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => format!("[{ident}]"),
            // Oracle folds unquoted identifiers to upper case; the original
            // deployment relies on that rather than quoting.
            DatabaseEngine::Oracle => ident.to_uppercase(),
        }
    }

    pub fn qualified_table(&self, schema: &str, table: &str) -> String {
        format!("{}.{}", self.quote_ident(schema), self.quote_ident(table))
    }

    fn escape_literal(value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Cheapest statement the engine accepts; used to verify connectivity at
    /// startup.
    pub fn ping_sql(&self) -> &'static str {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT 1 AS ok",
            DatabaseEngine::Oracle => "SELECT 1 AS ok FROM DUAL",
        }
    }

    // --- provisioning -----------------------------------------------------

    /// One `?` parameter: the principal name. Counts matching database
    /// principals.
    pub fn principal_exists_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => {
                "SELECT COUNT(*) AS cnt FROM sys.database_principals WHERE name = ?".to_string()
            }
            DatabaseEngine::Oracle => {
                "SELECT COUNT(*) AS cnt FROM ALL_USERS WHERE USERNAME = UPPER(?)".to_string()
            }
        }
    }

    /// Server-level login check; Oracle has no separate login concept.
    pub fn login_exists_sql(&self) -> Option<String> {
        match self.engine {
            DatabaseEngine::SqlServer => Some(
                "SELECT COUNT(*) AS cnt FROM sys.server_principals WHERE name = ?".to_string(),
            ),
            DatabaseEngine::Oracle => None,
        }
    }

    pub fn schema_exists_sql(&self) -> Option<String> {
        match self.engine {
            DatabaseEngine::SqlServer => {
                Some("SELECT COUNT(*) AS cnt FROM sys.schemas WHERE name = ?".to_string())
            }
            // user == schema
            DatabaseEngine::Oracle => None,
        }
    }

    /// Statements creating the schema-scoped principal. On Oracle creating
    /// the user creates the schema; on SQL Server login, user and schema are
    /// three separate objects.
    pub fn create_principal_ddl(&self, schema: &str, password: &str) -> Vec<String> {
        match self.engine {
            DatabaseEngine::SqlServer => {
                let pw = Self::escape_literal(password);
                vec![
                    format!("CREATE LOGIN [{schema}] WITH PASSWORD = N'{pw}'"),
                    format!("CREATE USER [{schema}] FOR LOGIN [{schema}] WITH DEFAULT_SCHEMA = [{schema}]"),
                    format!("CREATE SCHEMA [{schema}] AUTHORIZATION [{schema}]"),
                ]
            }
            DatabaseEngine::Oracle => {
                let pw = password.replace('"', "");
                vec![format!(
                    "CREATE USER {schema} IDENTIFIED BY \"{pw}\" \
                     DEFAULT TABLESPACE DATA TEMPORARY TABLESPACE TEMP QUOTA UNLIMITED ON DATA"
                )]
            }
        }
    }

    /// Rights scoped to the tenant's own schema only. A tenant principal can
    /// never read another schema even through a buggy handler.
    pub fn grant_ddl(&self, schema: &str) -> Vec<String> {
        match self.engine {
            DatabaseEngine::SqlServer => {
                vec![format!("GRANT CONTROL ON SCHEMA::[{schema}] TO [{schema}]")]
            }
            DatabaseEngine::Oracle => [
                "CREATE SESSION",
                "CREATE TABLE",
                "CREATE VIEW",
                "CREATE SEQUENCE",
                "CREATE TRIGGER",
                "CREATE PROCEDURE",
                "CREATE TYPE",
                "CREATE FUNCTION",
            ]
            .iter()
            .map(|permission| format!("GRANT {permission} TO {schema}"))
            .collect(),
        }
    }

    // --- teardown ---------------------------------------------------------

    /// One `?` parameter: the schema. Returns `table_name` rows.
    pub fn list_tables_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT t.name AS table_name FROM sys.tables t \
                 JOIN sys.schemas s ON t.schema_id = s.schema_id WHERE s.name = ?"
                .to_string(),
            DatabaseEngine::Oracle => {
                "SELECT TABLE_NAME AS table_name FROM ALL_TABLES WHERE OWNER = UPPER(?)"
                    .to_string()
            }
        }
    }

    /// One `?` parameter: the schema. Counts every object still owned by it.
    pub fn count_schema_objects_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT COUNT(*) AS cnt FROM sys.objects o \
                 JOIN sys.schemas s ON o.schema_id = s.schema_id WHERE s.name = ?"
                .to_string(),
            DatabaseEngine::Oracle => {
                "SELECT COUNT(*) AS cnt FROM ALL_OBJECTS WHERE OWNER = UPPER(?)".to_string()
            }
        }
    }

    pub fn drop_table_ddl(&self, schema: &str, table: &str) -> String {
        format!("DROP TABLE {}", self.qualified_table(schema, table))
    }

    /// Statements removing the principal (and, on SQL Server, the schema and
    /// login). Oracle's `CASCADE` takes every schema object with the user.
    pub fn drop_principal_ddl(&self, schema: &str) -> Vec<String> {
        match self.engine {
            DatabaseEngine::SqlServer => vec![
                format!("DROP SCHEMA [{schema}]"),
                format!("DROP USER [{schema}]"),
                format!("DROP LOGIN [{schema}]"),
            ],
            DatabaseEngine::Oracle => vec![format!("DROP USER {schema} CASCADE")],
        }
    }

    /// Labelled verification queries, each with one `?` parameter (the
    /// schema) and each required to report a zero count before a teardown is
    /// considered complete. The two engines verify structurally different
    /// catalogs.
    pub fn teardown_verification_sql(&self) -> Vec<(&'static str, String)> {
        match self.engine {
            DatabaseEngine::SqlServer => vec![
                ("schema", "SELECT COUNT(*) AS cnt FROM sys.schemas WHERE name = ?".to_string()),
                (
                    "user",
                    "SELECT COUNT(*) AS cnt FROM sys.database_principals WHERE name = ?"
                        .to_string(),
                ),
                (
                    "login",
                    "SELECT COUNT(*) AS cnt FROM sys.server_principals WHERE name = ?".to_string(),
                ),
                (
                    "tables",
                    "SELECT COUNT(*) AS cnt FROM sys.tables t \
                     JOIN sys.schemas s ON t.schema_id = s.schema_id WHERE s.name = ?"
                        .to_string(),
                ),
            ],
            DatabaseEngine::Oracle => vec![
                (
                    "user",
                    "SELECT COUNT(*) AS cnt FROM ALL_USERS WHERE USERNAME = UPPER(?)".to_string(),
                ),
                (
                    "objects",
                    "SELECT COUNT(*) AS cnt FROM ALL_OBJECTS WHERE OWNER = UPPER(?)".to_string(),
                ),
            ],
        }
    }

    // --- reflection -------------------------------------------------------

    /// Two `?` parameters: schema, table. Returns `column_name`, `data_type`,
    /// `is_nullable` (1/0) in ordinal order.
    pub fn reflect_columns_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
                 CASE IS_NULLABLE WHEN 'YES' THEN 1 ELSE 0 END AS is_nullable \
                 FROM INFORMATION_SCHEMA.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
                .to_string(),
            DatabaseEngine::Oracle => "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
                 CASE NULLABLE WHEN 'Y' THEN 1 ELSE 0 END AS is_nullable \
                 FROM ALL_TAB_COLUMNS \
                 WHERE OWNER = UPPER(?) AND TABLE_NAME = UPPER(?) ORDER BY COLUMN_ID"
                .to_string(),
        }
    }

    /// Two `?` parameters: schema, table. Returns `column_name` rows of the
    /// primary key in key order.
    pub fn reflect_primary_key_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT kcu.COLUMN_NAME AS column_name \
                 FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                 JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
                   ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
                  AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
                 WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
                   AND tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ? \
                 ORDER BY kcu.ORDINAL_POSITION"
                .to_string(),
            DatabaseEngine::Oracle => "SELECT acc.COLUMN_NAME AS column_name \
                 FROM ALL_CONSTRAINTS ac \
                 JOIN ALL_CONS_COLUMNS acc \
                   ON ac.CONSTRAINT_NAME = acc.CONSTRAINT_NAME AND ac.OWNER = acc.OWNER \
                 WHERE ac.CONSTRAINT_TYPE = 'P' \
                   AND ac.OWNER = UPPER(?) AND ac.TABLE_NAME = UPPER(?) \
                 ORDER BY acc.POSITION"
                .to_string(),
        }
    }

    /// Two `?` parameters: schema, table. Returns `index_name` rows.
    pub fn reflect_indexes_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT i.name AS index_name FROM sys.indexes i \
                 JOIN sys.tables t ON i.object_id = t.object_id \
                 JOIN sys.schemas s ON t.schema_id = s.schema_id \
                 WHERE s.name = ? AND t.name = ? AND i.name IS NOT NULL"
                .to_string(),
            DatabaseEngine::Oracle => "SELECT INDEX_NAME AS index_name FROM ALL_INDEXES \
                 WHERE OWNER = UPPER(?) AND TABLE_NAME = UPPER(?)"
                .to_string(),
        }
    }

    /// Two `?` parameters: schema, table. Zero count means the table is
    /// missing.
    pub fn table_exists_sql(&self) -> String {
        match self.engine {
            DatabaseEngine::SqlServer => "SELECT COUNT(*) AS cnt FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?"
                .to_string(),
            DatabaseEngine::Oracle => "SELECT COUNT(*) AS cnt FROM ALL_TABLES \
                 WHERE OWNER = UPPER(?) AND TABLE_NAME = UPPER(?)"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sqlserver() -> Dialect {
        Dialect::new(DatabaseEngine::SqlServer)
    }
    fn oracle() -> Dialect {
        Dialect::new(DatabaseEngine::Oracle)
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(
            sqlserver().render_placeholders("SELECT * FROM home WHERE id = ? AND name = ?"),
            "SELECT * FROM home WHERE id = @P1 AND name = @P2"
        );
        assert_eq!(
            oracle().render_placeholders("SELECT * FROM home WHERE id = ? AND name = ?"),
            "SELECT * FROM home WHERE id = :1 AND name = :2"
        );
    }

    #[test]
    fn test_placeholder_inside_literal_is_kept() {
        assert_eq!(
            sqlserver().render_placeholders("SELECT '?' AS q FROM t WHERE id = ?"),
            "SELECT '?' AS q FROM t WHERE id = @P1"
        );
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(
            sqlserver().qualified_table("beresheet", "events"),
            "[beresheet].[events]"
        );
        assert_eq!(
            oracle().qualified_table("beresheet", "events"),
            "BERESHEET.EVENTS"
        );
    }

    #[test]
    fn test_sqlserver_provisioning_creates_login_user_and_schema() {
        let ddl = sqlserver().create_principal_ddl("acme", "acme2025!");
        assert_eq!(ddl.len(), 3);
        assert!(ddl[0].starts_with("CREATE LOGIN [acme]"));
        assert!(ddl[1].contains("FOR LOGIN [acme]"));
        assert!(ddl[2].contains("AUTHORIZATION [acme]"));
    }

    #[test]
    fn test_sqlserver_password_literal_is_escaped() {
        let ddl = sqlserver().create_principal_ddl("acme", "it's");
        assert!(ddl[0].contains("N'it''s'"));
    }

    #[test]
    fn test_oracle_provisioning_user_is_schema() {
        let ddl = oracle().create_principal_ddl("acme", "Acme2025!");
        assert_eq!(ddl.len(), 1);
        assert!(ddl[0].contains("CREATE USER acme IDENTIFIED BY \"Acme2025!\""));
        assert!(ddl[0].contains("QUOTA UNLIMITED ON DATA"));
    }

    #[test]
    fn test_oracle_grants_cover_schema_object_kinds() {
        let grants = oracle().grant_ddl("acme");
        for permission in [
            "CREATE SESSION",
            "CREATE TABLE",
            "CREATE VIEW",
            "CREATE SEQUENCE",
            "CREATE TRIGGER",
            "CREATE PROCEDURE",
            "CREATE TYPE",
            "CREATE FUNCTION",
        ] {
            assert!(grants.iter().any(|g| g.contains(permission)), "{permission}");
        }
    }

    #[test]
    fn test_drop_order_sqlserver() {
        let ddl = sqlserver().drop_principal_ddl("acme");
        assert_eq!(
            ddl,
            vec![
                "DROP SCHEMA [acme]".to_string(),
                "DROP USER [acme]".to_string(),
                "DROP LOGIN [acme]".to_string(),
            ]
        );
    }

    #[test]
    fn test_oracle_drop_cascades() {
        assert_eq!(
            oracle().drop_principal_ddl("acme"),
            vec!["DROP USER acme CASCADE".to_string()]
        );
    }

    #[test]
    fn test_verification_queries_differ_in_structure() {
        let mssql: Vec<&str> = sqlserver()
            .teardown_verification_sql()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        let ora: Vec<&str> = oracle()
            .teardown_verification_sql()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(mssql, vec!["schema", "user", "login", "tables"]);
        assert_eq!(ora, vec!["user", "objects"]);
    }

    #[test]
    fn test_reflection_queries_bind_schema_and_table() {
        for dialect in [sqlserver(), oracle()] {
            let sql = dialect.render_placeholders(&dialect.reflect_columns_sql());
            match dialect.engine() {
                DatabaseEngine::SqlServer => assert!(sql.contains("@P2")),
                DatabaseEngine::Oracle => assert!(sql.contains(":2")),
            }
        }
    }
}
