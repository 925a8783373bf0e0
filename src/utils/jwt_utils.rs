use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Access-token claims. `jti` is the handle for the logout blacklist.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub token_type: String,
}

/// Signing material built once at startup and carried in `AppState`, so token
/// operations never reach back into the environment.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_minutes: i64,
    refresh_days: i64,
}

impl JwtKeys {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_minutes: config.jwt_access_minutes,
            refresh_days: config.jwt_refresh_days,
        }
    }

    /// Returns (token, jti, expiry as unix seconds).
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
    ) -> Result<(String, String, usize), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expire = now + Duration::minutes(self.access_minutes);
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user_id,
            exp: expire.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: jti.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, jti, claims.exp))
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<(String, String, usize), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expire = now + Duration::days(self.refresh_days);
        let jti = Uuid::new_v4().to_string();
        let claims = RefreshClaims {
            sub: user_id,
            exp: expire.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: jti.clone(),
            token_type: "refresh".to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, jti, claims.exp))
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding, &validation)
    }

    pub fn validate_refresh_token(
        &self,
        token: &str,
    ) -> Result<RefreshClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let token_data = decode::<RefreshClaims>(token, &self.decoding, &validation)?;
        if token_data.claims.token_type != "refresh" {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(b"test-secret"),
            decoding: DecodingKey::from_secret(b"test-secret"),
            access_minutes: 15,
            refresh_days: 7,
        }
    }

    #[test]
    fn access_token_round_trips() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let (token, jti, _) = keys.generate_access_token(user_id).unwrap();
        let data = keys.validate_access_token(&token).unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.jti, jti);
    }

    #[test]
    fn refresh_token_rejected_as_access_token() {
        let keys = keys();
        let (refresh, _, _) = keys.generate_refresh_token(Uuid::new_v4()).unwrap();
        // Different claim shape: `sub`/`exp` parse, but it must not be
        // accepted by the refresh-specific validator as an access token
        // and vice versa via the token_type marker.
        let claims = keys.validate_refresh_token(&refresh).unwrap();
        assert_eq!(claims.token_type, "refresh");

        let (access, _, _) = keys.generate_access_token(Uuid::new_v4()).unwrap();
        assert!(keys.validate_refresh_token(&access).is_err());
    }
}
