use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    /// Staff or superuser at issue time.
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        is_staff: bool,
        token_type: &str,
        expires_in: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            is_staff,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        username: &str,
        is_staff: bool,
    ) -> AppResult<String> {
        self.issue(
            user_id,
            username,
            is_staff,
            "access",
            self.access_token_expires_in,
        )
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        username: &str,
        is_staff: bool,
    ) -> AppResult<String> {
        self.issue(
            user_id,
            username,
            is_staff,
            "refresh",
            self.refresh_token_expires_in,
        )
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "refresh" {
            return Err(AppError::AuthError("Invalid refresh token type".to_string()));
        }

        Ok(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", 3600, 86400)
    }

    #[test]
    fn access_token_round_trips_claims() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.generate_access_token(id, "wanjiku", true).unwrap();
        let claims = svc.verify_access_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), id);
        assert_eq!(claims.username, "wanjiku");
        assert!(claims.is_staff);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = service();
        let token = svc
            .generate_refresh_token(Uuid::new_v4(), "otieno", false)
            .unwrap();
        assert!(svc.verify_access_token(&token).is_err());
        assert!(svc.verify_refresh_token(&token).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtService::new("other-secret", 3600, 86400);
        let token = other
            .generate_access_token(Uuid::new_v4(), "kamau", false)
            .unwrap();
        assert!(service().verify_access_token(&token).is_err());
    }
}
