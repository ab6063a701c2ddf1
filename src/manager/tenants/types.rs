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
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

/// Path segments that can never become tenant names because the router owns
/// them.
pub const RESERVED_TENANT_NAMES: [&str; 8] = [
    "home", "admin", "api", "web", "login", "health", "static", "debug",
];

static TENANT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_-]+$").expect("tenant name regex"));

/// Validated tenant name. The name doubles as the URL path segment, the
/// database schema and the schema principal, so everything downstream
/// (including DDL built from it) relies on this validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantName(String);

impl TenantName {
    pub fn new(value: &str) -> Result<Self, String> {
        if value.is_empty() || value.len() > 50 {
            return Err("Tenant name must be between 1 and 50 characters".to_string());
        }
        if !TENANT_NAME_RE.is_match(value) {
            return Err(
                "Tenant name must be alphanumeric (with optional hyphens and underscores)"
                    .to_string(),
            );
        }
        if RESERVED_TENANT_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(value))
        {
            return Err(format!("Tenant name '{value}' is reserved"));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["beresheet", "acme", "Home-2", "a", "x_y-z9"] {
            assert!(TenantName::new(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_characters_are_rejected() {
        for name in ["", "a b", "a/b", "a.b", "héber", "a'b", "a;DROP"] {
            assert!(TenantName::new(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        assert!(TenantName::new(&"a".repeat(50)).is_ok());
        assert!(TenantName::new(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        for name in RESERVED_TENANT_NAMES {
            assert!(TenantName::new(name).is_err(), "{name}");
        }
        // regardless of case
        assert!(TenantName::new("Admin").is_err());
        assert!(TenantName::new("API").is_err());
    }
}
