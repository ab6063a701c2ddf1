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
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Central, immutable application configuration.
///
/// Loaded once at startup from `config/default.toml` with `RESIDENTS_*`
/// environment overrides, then shared as `Arc<AppConfig>`. Every component
/// reads from here; nothing re-reads the environment after startup.
///
/// # Sections
///
/// * `server` - listen address of the HTTP server.
/// * `database` - engine selection plus the admin and home_index
///   credentials. The engine value is enumerated; an unrecognized engine
///   fails deserialization and therefore startup.
/// * `auth` - JWT secrets for the web session and the admin API, and the
///   master admin seed credentials.
/// * `storage` - object storage provider selection and its settings.
/// * `mail` - SMTP transport used for admin error notifications.
/// * `tenants` - provisioning knobs: the per-schema password template, the
///   admin catalog schema and the optional web build directory.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    server: ServerConfig,
    database: DatabaseConfig,
    auth: AuthConfig,
    storage: StorageConfig,
    mail: MailConfig,
    tenants: TenantsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

/// Database engines the catalog can route to. The set is closed: tenant
/// records carry one of these values in `database_type` and the process
/// connects with the matching driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    SqlServer,
    Oracle,
}

impl DatabaseEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::SqlServer => "sqlserver",
            DatabaseEngine::Oracle => "oracle",
        }
    }
}

impl Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlserver" => Ok(DatabaseEngine::SqlServer),
            "oracle" => Ok(DatabaseEngine::Oracle),
            other => Err(format!("Unsupported database engine: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

/// Credentials scoped to the `home_index` schema only. The phone→home
/// directory never touches tenant schemas and tenant principals never
/// touch it.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeIndexConfig {
    pub schema: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    engine: DatabaseEngine,
    host: String,
    port: u16,
    /// Physical database (SQL Server) or service name (Oracle).
    database: String,
    admin: CredentialsConfig,
    home_index: HomeIndexConfig,
    max_pool_size: Option<u32>,
    acquire_timeout_secs: Option<u64>,
    query_timeout_secs: Option<u64>,
}

impl DatabaseConfig {
    pub fn engine(&self) -> DatabaseEngine {
        self.engine
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn database(&self) -> &str {
        &self.database
    }
    pub fn admin(&self) -> &CredentialsConfig {
        &self.admin
    }
    pub fn home_index(&self) -> &HomeIndexConfig {
        &self.home_index
    }
    pub fn max_pool_size(&self) -> u32 {
        self.max_pool_size.unwrap_or(5)
    }
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs.unwrap_or(3))
    }
    /// Bounded per-operation query timeout, 30s unless configured.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.unwrap_or(30))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    web_jwt_secret: String,
    admin_jwt_secret: String,
    admin_token_expiration_mins: u64,
    master_admin_email: String,
    master_admin_password: String,
}

impl AuthConfig {
    pub fn web_jwt_secret(&self) -> &str {
        &self.web_jwt_secret
    }
    pub fn admin_jwt_secret(&self) -> &str {
        &self.admin_jwt_secret
    }
    pub fn admin_token_expiration_mins(&self) -> u64 {
        self.admin_token_expiration_mins
    }
    pub fn master_admin_email(&self) -> &str {
        &self.master_admin_email
    }
    pub fn master_admin_password(&self) -> &str {
        &self.master_admin_password
    }
}

/// Object storage providers the deployment can select. Enumerated like the
/// database engine; an unknown provider fails startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Azure,
    Cloudflare,
    Filesystem,
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Azure => write!(f, "azure"),
            StorageProvider::Cloudflare => write!(f, "cloudflare"),
            StorageProvider::Filesystem => write!(f, "filesystem"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    provider: StorageProvider,
    container: String,
    local_root: Option<String>,
    public_base_url: Option<String>,
    upload_timeout_secs: Option<u64>,
}

impl StorageConfig {
    pub fn provider(&self) -> StorageProvider {
        self.provider
    }
    pub fn container(&self) -> &str {
        &self.container
    }
    pub fn local_root(&self) -> Option<&str> {
        self.local_root.as_deref()
    }
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }
    /// Uploads get a longer budget than queries, 120s unless configured.
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs.unwrap_or(120))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    smtp_host: String,
    smtp_user: String,
    smtp_passwd: String,
    default_from: String,
    default_from_name: String,
    default_notification_email: String,
}

impl MailConfig {
    pub fn smtp_host(&self) -> &str {
        &self.smtp_host
    }
    pub fn smtp_user(&self) -> &str {
        &self.smtp_user
    }
    pub fn smtp_passwd(&self) -> &str {
        &self.smtp_passwd
    }
    pub fn default_from(&self) -> &str {
        &self.default_from
    }
    pub fn default_from_name(&self) -> &str {
        &self.default_from_name
    }
    pub fn default_notification_email(&self) -> &str {
        &self.default_notification_email
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantsConfig {
    /// Template for per-schema principal passwords; `{schema}` is replaced
    /// with the schema name.
    password_template: String,
    admin_schema: String,
    web_build_path: Option<String>,
}

impl TenantsConfig {
    pub fn password_template(&self) -> &str {
        &self.password_template
    }
    pub fn admin_schema(&self) -> &str {
        &self.admin_schema
    }
    pub fn web_build_path(&self) -> Option<&str> {
        self.web_build_path.as_deref()
    }
    /// Derives the password of the schema-scoped principal. Every tenant
    /// schema owns a database user named after the schema; only the password
    /// comes from here.
    pub fn schema_password(&self, schema: &str) -> String {
        self.password_template.replace("{schema}", schema)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(true))
            .add_source(config::Environment::with_prefix("RESIDENTS").separator("__"));
        builder.build()?.try_deserialize()
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }
    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }
    pub fn mail(&self) -> &MailConfig {
        &self.mail
    }
    pub fn tenants(&self) -> &TenantsConfig {
        &self.tenants
    }
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Builder with sane local defaults; primarily a test fixture, mirroring a
/// development `config/default.toml`.
pub struct AppConfigBuilder {
    engine: DatabaseEngine,
    web_jwt_secret: String,
    admin_jwt_secret: String,
    password_template: String,
    web_build_path: Option<String>,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::SqlServer,
            web_jwt_secret: "test_web_jwt_secret".to_string(),
            admin_jwt_secret: "test_admin_jwt_secret".to_string(),
            password_template: "{schema}2025!".to_string(),
            web_build_path: None,
        }
    }
}

impl AppConfigBuilder {
    pub fn engine(mut self, engine: DatabaseEngine) -> Self {
        self.engine = engine;
        self
    }
    pub fn web_jwt_secret(mut self, secret: &str) -> Self {
        self.web_jwt_secret = secret.to_string();
        self
    }
    pub fn web_build_path(mut self, path: &str) -> Self {
        self.web_build_path = Some(path.to_string());
        self
    }
    pub fn build(self) -> Result<AppConfig, String> {
        Ok(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                engine: self.engine,
                host: "localhost".to_string(),
                port: match self.engine {
                    DatabaseEngine::SqlServer => 1433,
                    DatabaseEngine::Oracle => 1521,
                },
                database: "residents".to_string(),
                admin: CredentialsConfig {
                    username: "home".to_string(),
                    password: "home2025!".to_string(),
                },
                home_index: HomeIndexConfig {
                    schema: "home_index".to_string(),
                    username: "home_index".to_string(),
                    password: "HomeIndex2025!@#".to_string(),
                },
                max_pool_size: Some(5),
                acquire_timeout_secs: Some(3),
                query_timeout_secs: Some(30),
            },
            auth: AuthConfig {
                web_jwt_secret: self.web_jwt_secret,
                admin_jwt_secret: self.admin_jwt_secret,
                admin_token_expiration_mins: 60,
                master_admin_email: "admin@localhost".to_string(),
                master_admin_password: "admin".to_string(),
            },
            storage: StorageConfig {
                provider: StorageProvider::Filesystem,
                container: "residents-images".to_string(),
                local_root: Some("./storage-data".to_string()),
                public_base_url: Some("http://localhost:8000/storage".to_string()),
                upload_timeout_secs: Some(120),
            },
            mail: MailConfig {
                smtp_host: "localhost".to_string(),
                smtp_user: "mailer".to_string(),
                smtp_passwd: "mailer".to_string(),
                default_from: "noreply@localhost".to_string(),
                default_from_name: "Residents".to_string(),
                default_notification_email: "admin@localhost".to_string(),
            },
            tenants: TenantsConfig {
                password_template: self.password_template,
                admin_schema: "home".to_string(),
                web_build_path: self.web_build_path,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_engine_parse_round_trip() {
        assert_eq!(
            DatabaseEngine::from_str("sqlserver").unwrap(),
            DatabaseEngine::SqlServer
        );
        assert_eq!(
            DatabaseEngine::from_str("oracle").unwrap(),
            DatabaseEngine::Oracle
        );
        assert_eq!(DatabaseEngine::SqlServer.to_string(), "sqlserver");
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        assert!(DatabaseEngine::from_str("mysql").is_err());
        assert!(DatabaseEngine::from_str("").is_err());
        let parsed: Result<DatabaseEngine, _> = serde_json::from_str("\"postgres\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_storage_provider_is_rejected() {
        let parsed: Result<StorageProvider, _> = serde_json::from_str("\"s3\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_schema_password_template() {
        let config = AppConfigBuilder::default().build().unwrap();
        assert_eq!(config.tenants().schema_password("beresheet"), "beresheet2025!");
    }

    #[test]
    fn test_builder_defaults() {
        let config = AppConfigBuilder::default().build().unwrap();
        assert_eq!(config.database().engine(), DatabaseEngine::SqlServer);
        assert_eq!(config.database().query_timeout(), Duration::from_secs(30));
        assert_eq!(config.storage().upload_timeout(), Duration::from_secs(120));
        assert_eq!(config.database().home_index().schema, "home_index");
    }
}
