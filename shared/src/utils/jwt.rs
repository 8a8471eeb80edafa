use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::env;
use thiserror::Error;

use crate::models::claims::TokenClaims;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token inválido ou expirado")]
    InvalidToken,

    #[error("JWT secret não encontrado")]
    MissingSecret,

    #[error("Tipo de token não aceito neste endpoint")]
    InvalidTokenType,
}

/// Valida o JWT e extrai as claims
pub fn validate_token(token: &str) -> Result<TokenClaims, JwtError> {
    let secret = env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

/// Valida o token e exige que seja um access token
pub fn validate_access_token(token: &str) -> Result<TokenClaims, JwtError> {
    let claims = validate_token(token)?;

    if !claims.is_access_token() {
        tracing::warn!("Tipo de token inválido: {}", claims.token_type);
        return Err(JwtError::InvalidTokenType);
    }

    Ok(claims)
}

/// Extrai o bearer token do header Authorization
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    if auth_header.starts_with("Bearer ") {
        Some(auth_header[7..].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_token(user_id: i32, role: &str, token_type: &str) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id,
            email: "teste@exemplo.com.br".to_string(),
            role: role.to_string(),
            exp: (now + Duration::minutes(15)).timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
            jti: "test-jti-123".to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key-for-testing-only".as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let header = "Bearer abc123token";
        assert_eq!(
            extract_bearer_token(header),
            Some("abc123token".to_string())
        );

        let invalid = "Token abc123";
        assert_eq!(extract_bearer_token(invalid), None);
    }

    #[test]
    fn test_validate_token_signature() {
        std::env::set_var("JWT_SECRET", "test-secret-key-for-testing-only");

        let token = create_test_token(42, "teacher", "access");
        let result = validate_token(&token);

        assert!(result.is_ok());
        let claims = result.unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "teacher");
        assert!(claims.is_access_token());
    }

    #[test]
    fn test_validate_access_token_rejects_refresh() {
        std::env::set_var("JWT_SECRET", "test-secret-key-for-testing-only");

        let token = create_test_token(42, "guardian", "refresh");
        let result = validate_access_token(&token);

        assert!(matches!(result, Err(JwtError::InvalidTokenType)));
    }

    #[test]
    fn test_validate_token_rejects_garbage() {
        std::env::set_var("JWT_SECRET", "test-secret-key-for-testing-only");

        let result = validate_token("nao-e-um-jwt");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }
}
