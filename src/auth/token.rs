//! Signed bearer tokens (JWT, HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthUser;
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Token has expired")]
    Expired,
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    BadSignature,
    #[error("Token was not issued for this service")]
    UntrustedIssuer,
    #[error("Token verification is not configured")]
    Unavailable,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => AuthError::UntrustedIssuer,
            _ => AuthError::Malformed,
        }
    }
}

/// Registered and private claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims.sub.parse().map_err(|_| AuthError::Malformed)?;
        Ok(AuthUser {
            user_id,
            username: claims.username,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies tokens with the configured secret, issuer, audience and lifetime.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Option<SigningKeys>,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenCodec {
    /// An empty secret leaves the codec unable to sign or verify; both
    /// operations then fail instead of using a blank key.
    pub fn new(config: &JwtConfig) -> Self {
        let keys = (!config.secret.is_empty()).then(|| SigningKeys {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
        });
        Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: Duration::minutes(config.expire_minutes),
        }
    }

    pub fn issue(&self, user: &AuthUser) -> AppResult<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    /// Fails when no signing secret is configured.
    pub fn ensure_signing(&self) -> AppResult<()> {
        self.signing_keys().map(|_| ())
    }

    fn signing_keys(&self) -> AppResult<&SigningKeys> {
        self.keys.as_ref().ok_or_else(|| AppError::Configuration {
            key: "jwt.secret".to_string(),
            source: anyhow::anyhow!("JWT signing secret is not configured"),
        })
    }

    pub fn issue_at(&self, user: &AuthUser, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let keys = self.signing_keys()?;

        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user.user_id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(
            |e| AppError::Internal {
                source: anyhow::anyhow!("Failed to sign token: {}", e),
            },
        )?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies signature, issuer and audience, then checks expiry against
    /// `now` (unix seconds) with no leeway.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::Unavailable)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<Claims>(token, &keys.decoding, &validation)?.claims;
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Verifies a token and converts it into the caller identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        AuthUser::try_from(self.verify(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const SECRET: &str = "a-test-secret-that-is-long-enough-for-hs256";

    fn config() -> JwtConfig {
        JwtConfig {
            secret: SECRET.to_string(),
            issuer: "storefront".to_string(),
            audience: "storefront-clients".to_string(),
            expire_minutes: 60,
        }
    }

    fn alice() -> AuthUser {
        AuthUser {
            user_id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let codec = TokenCodec::new(&config());
        let issued = codec.issue_at(&alice(), t0()).unwrap();

        let claims = codec.verify_at(&issued.token, t0().timestamp() + 10).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "storefront");
        assert_eq!(claims.aud, "storefront-clients");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(issued.expires_at, t0() + Duration::minutes(60));

        assert_eq!(AuthUser::try_from(claims).unwrap(), alice());
    }

    #[test]
    fn test_expiry_is_exact() {
        let codec = TokenCodec::new(&config());
        let issued = codec.issue_at(&alice(), t0()).unwrap();
        let lifetime = 60 * 60;

        assert!(codec.verify_at(&issued.token, t0().timestamp() + lifetime).is_ok());
        assert_eq!(
            codec.verify_at(&issued.token, t0().timestamp() + lifetime + 1),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let codec = TokenCodec::new(&config());
        let issued = codec.issue_at(&alice(), t0()).unwrap();

        let mut other = config();
        other.secret = "another-secret-of-sufficient-length-0123456789".to_string();
        let foreign = TokenCodec::new(&other);

        assert_eq!(
            foreign.verify_at(&issued.token, t0().timestamp()),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_structural_corruption_is_malformed() {
        let codec = TokenCodec::new(&config());
        assert_eq!(codec.verify_at("not-a-token", 0), Err(AuthError::Malformed));
        assert_eq!(codec.verify_at("a.b.c", 0), Err(AuthError::Malformed));
        assert_eq!(codec.verify_at("", 0), Err(AuthError::Malformed));
    }

    #[test]
    fn test_wrong_audience_is_untrusted() {
        let codec = TokenCodec::new(&config());
        let issued = codec.issue_at(&alice(), t0()).unwrap();

        let mut other = config();
        other.audience = "someone-else".to_string();
        let strict = TokenCodec::new(&other);

        assert_eq!(
            strict.verify_at(&issued.token, t0().timestamp()),
            Err(AuthError::UntrustedIssuer)
        );
    }

    #[test]
    fn test_missing_secret_is_a_configuration_error() {
        let mut empty = config();
        empty.secret = String::new();
        let codec = TokenCodec::new(&empty);

        match codec.issue_at(&alice(), t0()) {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "jwt.secret"),
            other => panic!("Expected Configuration error, got {:?}", other.map(|t| t.token)),
        }
        assert_eq!(codec.verify_at("a.b.c", 0), Err(AuthError::Unavailable));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::User)]
    }

    proptest! {
        #[test]
        fn prop_round_trip_before_expiry(
            user_id in 1i32..i32::MAX,
            username in "[a-z][a-z0-9_]{2,20}",
            role in any_role(),
            elapsed in 0i64..=3600,
        ) {
            let codec = TokenCodec::new(&config());
            let user = AuthUser {
                user_id,
                email: format!("{}@example.com", username),
                username,
                role,
            };
            let issued = codec.issue_at(&user, t0()).unwrap();
            let claims = codec.verify_at(&issued.token, t0().timestamp() + elapsed).unwrap();
            prop_assert_eq!(AuthUser::try_from(claims).unwrap(), user);
        }
    }
}
