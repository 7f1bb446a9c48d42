// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed bearer token encoding and decoding.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Claims, TokenError, TokenResult};

// =============================================================================
// JwtConfig
// =============================================================================

/// JWT configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Token issuer.
    pub issuer: String,
    /// Token lifetime in seconds.
    pub expiration_secs: i64,
    /// HMAC algorithm to use for signing.
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "warden".to_string(),
            expiration_secs: 3600, // 1 hour
            algorithm: Algorithm::HS256,
            leeway_secs: 30,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the token lifetime.
    pub fn with_expiration(mut self, duration: Duration) -> Self {
        self.expiration_secs = duration.as_secs() as i64;
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Upper bound on how long any issued token stays acceptable.
    pub fn max_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.expiration_secs.max(0) as u64 + self.leeway_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TokenResult<()> {
        if self.secret.is_empty() {
            return Err(TokenError::Signing("JWT secret is not configured".into()));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::Signing(format!(
                "unsupported signing algorithm {:?}, expected an HMAC algorithm",
                self.algorithm
            )));
        }
        if self.expiration_secs <= 0 {
            return Err(TokenError::Signing("token lifetime must be positive".into()));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("expiration_secs", &self.expiration_secs)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

// =============================================================================
// ClaimsCodec
// =============================================================================

/// Encodes claims into signed tokens and decodes them back.
///
/// The codec holds the process-wide signing key; it is read-only after
/// construction and cheap to clone.
#[derive(Clone)]
pub struct ClaimsCodec {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    unverified: Arc<Validation>,
}

impl ClaimsCodec {
    /// Creates a new codec with the given configuration.
    pub fn new(config: JwtConfig) -> TokenResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "jti", "sub"]);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;

        let mut unverified = Validation::new(config.algorithm);
        unverified.insecure_disable_signature_validation();
        unverified.validate_exp = false;
        unverified.validate_aud = false;
        unverified.required_spec_claims.clear();

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            unverified: Arc::new(unverified),
        })
    }

    /// Signs the claims into a compact token.
    pub fn encode(&self, claims: &Claims) -> TokenResult<String> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Extracts claims without checking signature or expiry.
    ///
    /// Only used to obtain the `jti` before the revocation lookup; the result
    /// must never be trusted for anything else.
    pub fn decode_unverified(&self, token: &str) -> TokenResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.unverified)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Verifies signature, issuer, and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> TokenResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::InvalidIssuer => TokenError::Malformed("unexpected issuer".into()),
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    /// Returns the configured token lifetime in seconds.
    pub fn expiration_secs(&self) -> i64 {
        self.config.expiration_secs
    }

    /// Returns the configured issuer.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Returns the configured clock skew tolerance.
    pub fn leeway(&self) -> Duration {
        Duration::from_secs(self.config.leeway_secs)
    }

    /// Upper bound on how long any issued token stays acceptable.
    pub fn max_token_lifetime(&self) -> Duration {
        self.config.max_token_lifetime()
    }
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("expiration_secs", &self.config.expiration_secs)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
