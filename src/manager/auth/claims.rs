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
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ADMIN_ISSUER: &str = "admin";

/// Claims of the admin API token, issued against the master admin
/// credentials and entirely separate from the tenant web session tokens.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct AdminClaims {
    sub: String,
    exp: usize,
    iat: usize,
    iss: String,
}

impl AdminClaims {
    pub fn new(sub: String, exp: usize, iat: usize) -> Self {
        Self {
            sub,
            exp,
            iat,
            iss: ADMIN_ISSUER.to_string(),
        }
    }

    pub fn from_token(token: &str, decoding_key: &[u8]) -> Result<Self, String> {
        let mut validator = Validation::new(Algorithm::HS256);
        validator.set_issuer(&[ADMIN_ISSUER]);
        validator.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        Ok(
            decode::<AdminClaims>(token, &DecodingKey::from_secret(decoding_key), &validator)
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

    pub fn sub(&self) -> &str {
        &self.sub
    }
    pub fn exp(&self) -> usize {
        self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::ops::{Add, Sub};
    use std::time::Duration;

    const SECRET: &[u8] = b"test_admin_jwt_secret";

    #[test]
    fn test_valid_claims_round_trip() {
        let exp = Local::now().add(Duration::from_secs(100)).timestamp();
        let iat = Local::now().timestamp();
        let claims = AdminClaims::new(
            "admin@localhost".to_string(),
            usize::try_from(exp).unwrap(),
            usize::try_from(iat).unwrap(),
        );
        let token = claims.to_token(SECRET).unwrap();
        assert_eq!(AdminClaims::from_token(&token, SECRET).unwrap(), claims);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let exp = Local::now().sub(Duration::from_secs(120)).timestamp();
        let iat = Local::now().timestamp();
        let claims = AdminClaims::new(
            "admin@localhost".to_string(),
            usize::try_from(exp).unwrap(),
            usize::try_from(iat).unwrap(),
        );
        let token = claims.to_token(SECRET).unwrap();
        assert!(AdminClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let exp = Local::now().add(Duration::from_secs(100)).timestamp();
        let iat = Local::now().timestamp();
        let claims = AdminClaims::new(
            "admin@localhost".to_string(),
            usize::try_from(exp).unwrap(),
            usize::try_from(iat).unwrap(),
        );
        let token = claims.to_token(SECRET).unwrap();
        assert!(AdminClaims::from_token(&token, b"other_secret").is_err());
    }
}
