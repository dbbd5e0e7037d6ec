//! JWT session token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{api::models::users::CurrentUser, config::Config, errors::Error, types::UserId};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(config.auth.session.timeout).unwrap_or(chrono::Duration::days(7));

        Self {
            sub: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            display_name: claims.display_name,
        }
    }
}

fn secret(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a signed session token for `user`, valid for the configured session timeout.
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(user, config);
    let key = EncodingKey::from_secret(secret(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a session token. Bad, tampered and expired tokens are 401s.
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    use jsonwebtoken::errors::ErrorKind;

    let key = DecodingKey::from_secret(secret(config)?.as_bytes());

    let token_data = decode::<SessionClaims>(token, &key, &Validation::default()).map_err(|e| match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn config() -> Config {
        let mut config = Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        };
        config.auth.session.timeout = Duration::from_secs(3600);
        config
    }

    fn editor() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "editor@studio.test".to_string(),
            display_name: Some("Editor".to_string()),
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_create_and_verify_session_token() {
        let config = config();
        let user = editor();

        let token = create_session_token(&user, &config).unwrap();
        let verified = verify_session_token(&token, &config).unwrap();

        assert_eq!(verified, user);
    }

    #[test]
    fn test_expiry_follows_session_timeout() {
        let mut config = config();
        config.auth.session.timeout = Duration::from_secs(7 * 86400);

        let claims = SessionClaims::new(&editor(), &config);
        assert_eq!(claims.exp - claims.iat, 7 * 86400);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = config();
        let token = create_session_token(&editor(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let err = verify_session_token(&token, &config).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = config();
        let user = editor();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email,
            display_name: None,
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: (now - chrono::Duration::hours(2)).timestamp(),
        };

        let token = sign(&claims, config.secret_key.as_deref().unwrap());
        let err = verify_session_token(&token, &config).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_tokens() {
        let config = config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let err = verify_session_token(token, &config).unwrap_err();
            assert!(
                matches!(err, Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {token}"
            );
        }
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let mut config = config();
        config.secret_key = None;

        let err = create_session_token(&editor(), &config).unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }
}
