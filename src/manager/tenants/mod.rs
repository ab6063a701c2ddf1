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
use crate::manager::tenants::bootstrap::SchemaBootstrap;
use crate::manager::tenants::directory::TenantDirectory;
use crate::manager::tenants::provisioner::SchemaProvisioner;
use crate::manager::tenants::repository::HomesRepository;
use crate::storage::ObjectStorage;
use std::sync::Arc;

pub(crate) mod bootstrap;
pub(crate) mod directory;
pub(crate) mod dto;
mod handler;
pub(crate) mod model;
pub(crate) mod provisioner;
pub(crate) mod repository;
pub(crate) mod routes;
pub(crate) mod service;
pub(crate) mod types;

pub trait TenantsModule: ConfigProvider + MailTransporter + Send + Sync {
    fn homes_repo(&self) -> Arc<dyn HomesRepository>;
    fn provisioner(&self) -> Arc<dyn SchemaProvisioner>;
    fn bootstrap(&self) -> Arc<dyn SchemaBootstrap>;
    fn storage(&self) -> Arc<dyn ObjectStorage>;
    fn directory(&self) -> Arc<dyn TenantDirectory>;
}

impl TenantsModule for DefaultAppState {
    fn homes_repo(&self) -> Arc<dyn HomesRepository> {
        self.pool_wrapper.clone()
    }
    fn provisioner(&self) -> Arc<dyn SchemaProvisioner> {
        self.pool_wrapper.clone()
    }
    fn bootstrap(&self) -> Arc<dyn SchemaBootstrap> {
        self.bootstrap.clone()
    }
    fn storage(&self) -> Arc<dyn ObjectStorage> {
        self.storage.clone()
    }
    fn directory(&self) -> Arc<dyn TenantDirectory> {
        self.directory.clone()
    }
}
