//! Bearer token verification
//!
//! Id tokens issued by the identity provider are JWTs. They are verified
//! either with a shared HS256 secret or with RS256 public keys selected by
//! the token's `kid` header.

use std::collections::HashMap;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::utils::errors::{CollectivError, Result};

/// Claims read from an id token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: Option<String>,
    pub user_id: Option<String>,
    pub exp: usize,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl IdTokenClaims {
    /// Provider uid: the `user_id` claim, falling back to `sub`
    pub fn uid(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|uid| !uid.is_empty())
    }
}

#[derive(Clone)]
enum VerificationKeys {
    Shared(DecodingKey),
    ByKeyId(HashMap<String, DecodingKey>),
}

#[derive(Clone)]
pub struct AuthService {
    keys: VerificationKeys,
    issuer: Option<String>,
    audience: Option<String>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let keys = if !config.public_keys.is_empty() {
            let mut keys = HashMap::with_capacity(config.public_keys.len());
            for (kid, pem) in &config.public_keys {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| CollectivError::Config(format!("Invalid public key {}: {}", kid, e)))?;
                keys.insert(kid.clone(), key);
            }
            VerificationKeys::ByKeyId(keys)
        } else {
            let secret = config
                .jwt_secret
                .as_deref()
                .filter(|secret| !secret.is_empty())
                .ok_or_else(|| CollectivError::Config("Either auth.jwt_secret or auth.public_keys must be set".to_string()))?;
            VerificationKeys::Shared(DecodingKey::from_secret(secret.as_bytes()))
        };

        Ok(Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    /// Verify the token and return its claims
    pub fn verify(&self, token: &str) -> Result<IdTokenClaims> {
        let (key, algorithm) = match &self.keys {
            VerificationKeys::Shared(key) => (key, Algorithm::HS256),
            VerificationKeys::ByKeyId(keys) => {
                let header = decode_header(token)?;
                let kid = header
                    .kid
                    .ok_or_else(|| CollectivError::Unauthorized("Invalid token provided".to_string()))?;
                let key = keys
                    .get(&kid)
                    .ok_or_else(|| CollectivError::Unauthorized("Invalid token provided".to_string()))?;
                (key, Algorithm::RS256)
            }
        };

        let data = decode::<IdTokenClaims>(token, key, &self.validation(algorithm))?;
        debug!(uid = ?data.claims.uid(), "Token verified");
        Ok(data.claims)
    }

    /// Verify the token and return the user id it was issued for
    pub fn verify_user_id(&self, token: &str) -> Result<String> {
        let claims = self.verify(token)?;
        claims
            .uid()
            .map(str::to_string)
            .ok_or_else(|| CollectivError::Unauthorized("Invalid token provided".to_string()))
    }
}
