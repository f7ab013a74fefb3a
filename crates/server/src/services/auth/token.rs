//! Bearer token issuance and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with the same secret and
//! told apart by the `token_type` claim. The subject is the account's numeric
//! ID and `role` says which table it lives in.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinic_core::access::PrincipalKind;
use clinic_core::{DoctorId, PatientId, Principal};

use super::AuthError;
use crate::config::AuthConfig;

/// Which of the pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: doctor or patient ID.
    pub sub: String,
    pub role: PrincipalKind,
    pub token_type: TokenType,
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

impl Claims {
    /// The principal named by `sub` and `role`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if `sub` is not a numeric ID.
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let id: i32 = self
            .sub
            .parse()
            .map_err(|_| AuthError::TokenInvalid("subject is not an ID".to_owned()))?;

        Ok(match self.role {
            PrincipalKind::Doctor => Principal::Doctor(DoctorId::new(id)),
            PrincipalKind::Patient => Principal::Patient(PatientId::new(id)),
        })
    }
}

/// An access/refresh token pair, as returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing and verification keys plus token policy.
///
/// Implements `Debug` manually to keep key material out of logs.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl TokenKeys {
    /// Build keys from configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            access_ttl_secs: ttl_secs(config.access_ttl),
            refresh_ttl_secs: ttl_secs(config.refresh_ttl),
        }
    }

    /// Issue a fresh access/refresh pair for `principal`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if a token cannot be encoded.
    pub fn issue_pair(&self, principal: Principal) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(principal, TokenType::Access)?,
            refresh: self.issue(principal, TokenType::Refresh)?,
        })
    }

    /// Issue a single token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub fn issue(&self, principal: Principal, token_type: TokenType) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        };
        let sub = match principal {
            Principal::Doctor(id) => id.to_string(),
            Principal::Patient(id) => id.to_string(),
        };
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            role: principal.kind(),
            token_type,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + ttl,
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::Signing)
    }

    /// Decode and verify a token (signature, expiry, issuer).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for expired tokens and
    /// `AuthError::TokenInvalid` for anything else that fails validation.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    /// Verify a token of the expected type and return its principal.
    ///
    /// Purely stateless; the account is not looked up.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongTokenType` if the token is valid but of the
    /// other type, plus any error from [`Self::decode`].
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Principal, AuthError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType);
        }
        claims.principal()
    }
}

fn ttl_secs(ttl: std::time::Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::from("kV9#qL2!xR7@mN4$wT8^zB1&cF5*hJ3%"),
            issuer: "clinic-test".to_owned(),
            access_ttl: Duration::from_secs(300),
            refresh_ttl: Duration::from_secs(86400),
        }
    }

    #[test]
    fn test_pair_roundtrip() {
        let keys = TokenKeys::from_config(&test_config());
        let pair = keys.issue_pair(Principal::Doctor(DoctorId::new(4))).unwrap();

        assert_eq!(
            keys.verify(&pair.access, TokenType::Access).unwrap(),
            Principal::Doctor(DoctorId::new(4))
        );
        assert_eq!(
            keys.verify(&pair.refresh, TokenType::Refresh).unwrap(),
            Principal::Doctor(DoctorId::new(4))
        );
    }

    #[test]
    fn test_role_survives_roundtrip() {
        let keys = TokenKeys::from_config(&test_config());
        let token = keys
            .issue(Principal::Patient(PatientId::new(4)), TokenType::Access)
            .unwrap();
        assert_eq!(
            keys.verify(&token, TokenType::Access).unwrap(),
            Principal::Patient(PatientId::new(4))
        );
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let keys = TokenKeys::from_config(&test_config());
        let pair = keys.issue_pair(Principal::Patient(PatientId::new(1))).unwrap();
        assert!(matches!(
            keys.verify(&pair.refresh, TokenType::Access),
            Err(AuthError::WrongTokenType)
        ));
        assert!(matches!(
            keys.verify(&pair.access, TokenType::Refresh),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_jti_is_unique() {
        let keys = TokenKeys::from_config(&test_config());
        let principal = Principal::Doctor(DoctorId::new(1));
        let a = keys.decode(&keys.issue(principal, TokenType::Access).unwrap()).unwrap();
        let b = keys.decode(&keys.issue(principal, TokenType::Access).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_rejects_other_secret_and_issuer() {
        let keys = TokenKeys::from_config(&test_config());
        let token = keys
            .issue(Principal::Doctor(DoctorId::new(1)), TokenType::Access)
            .unwrap();

        let mut other = test_config();
        other.jwt_secret = SecretString::from("Zp8&Lm3!Qw6@Er1#Ty4$Ui7%Op0^As2*");
        assert!(matches!(
            TokenKeys::from_config(&other).decode(&token),
            Err(AuthError::TokenInvalid(_))
        ));

        let mut other = test_config();
        other.issuer = "someone-else".to_owned();
        assert!(matches!(
            TokenKeys::from_config(&other).decode(&token),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let keys = TokenKeys::from_config(&test_config());
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_owned(),
            role: PrincipalKind::Doctor,
            token_type: TokenType::Access,
            iss: "clinic-test".to_owned(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert!(matches!(keys.decode(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token() {
        let keys = TokenKeys::from_config(&test_config());
        assert!(matches!(
            keys.decode("not.a.jwt"),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let keys = TokenKeys::from_config(&test_config());
        assert!(!format!("{keys:?}").contains("kV9#"));
    }
}
