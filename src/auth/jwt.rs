use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, EncodingKey, Validation};
use tracing::{debug, warn};

use super::claims::Claims;
use crate::{config::JwtConfig, error::AppError};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// Why a bearer token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::SessionExpired,
            TokenError::Invalid => AppError::Unauthorized,
        }
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    /// Issues a token for the given identity. Production tokens are minted
    /// by the account service, so this is test-only.
    #[cfg(test)]
    pub fn sign(
        &self,
        user_id: &str,
        username: &str,
        ttl: std::time::Duration,
    ) -> anyhow::Result<String> {
        use jsonwebtoken::{encode, Header};

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            iat: Some(now as usize),
            exp: (now + ttl.as_secs() as i64) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        match &self.audience {
            Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(std::slice::from_ref(iss));
        }

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    debug!(error = %e, "jwt rejected");
                    TokenError::Invalid
                }
            }
        })?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

/// Identity of the caller, taken from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl AuthUser {
    pub fn from_header(keys: &JwtKeys, header: Option<&str>) -> Result<Self, TokenError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::Invalid)?;

        let claims = keys.verify(token)?;
        Ok(Self {
            user_id: claims.user_id,
            username: claims.username,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        AuthUser::from_header(&keys, header).map_err(|e| {
            warn!(reason = %e, "request rejected by auth gate");
            AppError::from(e)
        })
    }
}
