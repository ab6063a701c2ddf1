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
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const WEB_ISSUER: &str = "web";
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims of the tenant web session tokens. Issued by the tenant-prefixed
/// login endpoint and carried in the `web_jwt_token` cookie; entirely
/// separate from the admin API tokens.
///
/// `home_id` binds the session to one tenant: the web gate only accepts a
/// cookie whose `home_id` equals the tenant resolved from the URL.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct WebClaims {
    user_id: String,
    phone_number: String,
    full_name: String,
    role: String,
    home_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    home_name: Option<String>,
    exp: usize,
    #[serde(rename = "type")]
    token_type: String,
    iss: String,
}

impl WebClaims {
    #[allow(clippy::too_many_arguments)]
    fn new(
        user_id: String,
        phone_number: String,
        full_name: String,
        role: String,
        home_id: i32,
        home_name: Option<String>,
        lifetime_secs: i64,
        token_type: &str,
    ) -> Self {
        let exp = Utc::now().timestamp() + lifetime_secs;
        Self {
            user_id,
            phone_number,
            full_name,
            role,
            home_id,
            home_name,
            exp: usize::try_from(exp).unwrap_or(usize::MAX),
            token_type: token_type.to_string(),
            iss: WEB_ISSUER.to_string(),
        }
    }

    pub fn access(
        user_id: String,
        phone_number: String,
        full_name: String,
        role: String,
        home_id: i32,
        home_name: Option<String>,
        lifetime_secs: i64,
    ) -> Self {
        Self::new(
            user_id,
            phone_number,
            full_name,
            role,
            home_id,
            home_name,
            lifetime_secs,
            TOKEN_TYPE_ACCESS,
        )
    }

    pub fn refresh(
        user_id: String,
        phone_number: String,
        full_name: String,
        role: String,
        home_id: i32,
        home_name: Option<String>,
        lifetime_secs: i64,
    ) -> Self {
        Self::new(
            user_id,
            phone_number,
            full_name,
            role,
            home_id,
            home_name,
            lifetime_secs,
            TOKEN_TYPE_REFRESH,
        )
    }

    /// Re-issues an access token from a (verified) refresh token's identity.
    pub fn access_from(&self, lifetime_secs: i64) -> Self {
        Self::new(
            self.user_id.clone(),
            self.phone_number.clone(),
            self.full_name.clone(),
            self.role.clone(),
            self.home_id,
            self.home_name.clone(),
            lifetime_secs,
            TOKEN_TYPE_ACCESS,
        )
    }

    pub fn from_token(token: &str, decoding_key: &[u8]) -> Result<Self, String> {
        let mut validator = Validation::new(Algorithm::HS256);
        validator.set_issuer(&[WEB_ISSUER]);
        validator.set_required_spec_claims(&["exp", "iss"]);
        Ok(
            decode::<WebClaims>(token, &DecodingKey::from_secret(decoding_key), &validator)
                .map_err(|_| String::from("Invalid token"))?
                .claims,
        )
    }

    pub fn to_token(&self, encoding_key: &[u8]) -> Result<String, String> {
        encode(
            &Header::default(),
            &self,
            &EncodingKey::from_secret(encoding_key),
        )
        .map_err(|_| String::from("Could not encode token"))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
    pub fn role(&self) -> &str {
        &self.role
    }
    pub fn home_id(&self) -> i32 {
        self.home_id
    }
    pub fn home_name(&self) -> Option<&str> {
        self.home_name.as_deref()
    }
    pub fn exp(&self) -> usize {
        self.exp
    }
    pub fn is_access(&self) -> bool {
        self.token_type == TOKEN_TYPE_ACCESS
    }
    pub fn is_refresh(&self) -> bool {
        self.token_type == TOKEN_TYPE_REFRESH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &[u8] = b"test_web_jwt_secret";

    fn claims(lifetime_secs: i64) -> WebClaims {
        WebClaims::access(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            1,
            Some("beresheet".to_string()),
            lifetime_secs,
        )
    }

    #[test]
    fn test_round_trip() {
        let claims = claims(3600);
        let token = claims.to_token(SECRET).unwrap();
        let decoded = WebClaims::from_token(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert!(decoded.is_access());
        assert_eq!(decoded.home_id(), 1);
        assert_eq!(decoded.home_name(), Some("beresheet"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = claims(-120).to_token(SECRET).unwrap();
        assert!(WebClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = claims(3600).to_token(SECRET).unwrap();
        assert!(WebClaims::from_token(&token, b"another_secret").is_err());
    }

    #[test]
    fn test_refresh_token_type() {
        let refresh = WebClaims::refresh(
            "user-1".to_string(),
            "541111666".to_string(),
            "Test User".to_string(),
            "resident".to_string(),
            1,
            None,
            3600,
        );
        assert!(refresh.is_refresh());
        let access = refresh.access_from(60);
        assert!(access.is_access());
        assert_eq!(access.user_id(), "user-1");
    }
}
