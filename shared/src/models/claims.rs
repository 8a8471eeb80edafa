use serde::{Deserialize, Serialize};

/// Model JWT claims usado em todo o sistema para autenticação
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
    pub jti: String,
}

impl TokenClaims {
    /// Verifica se o token é um access token
    pub fn is_access_token(&self) -> bool {
        self.token_type == "access"
    }

    /// Verifica se o token é um refresh token
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == "refresh"
    }

    /// Verifica se o usuário tem role responsável (pai/mãe)
    pub fn is_guardian(&self) -> bool {
        self.role == "guardian"
    }

    /// Verifica se o usuário tem role professor
    pub fn is_teacher(&self) -> bool {
        self.role == "teacher"
    }

    /// Verifica se o usuário tem role admin (secretaria da escola)
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Verifica se o token já expirou baseado no horário atual
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp <= now
    }

    /// Validade restante em segundos
    pub fn remaining_validity(&self) -> i64 {
        let now = chrono::Utc::now().timestamp();
        (self.exp - now).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_claims() -> TokenClaims {
        let now = chrono::Utc::now().timestamp();
        TokenClaims {
            sub: 123,
            email: "maria@exemplo.com.br".to_string(),
            role: "guardian".to_string(),
            exp: now + 900,
            iat: now,
            token_type: "access".to_string(),
            jti: "unique-jti-123".to_string(),
        }
    }

    #[test]
    fn test_is_access_token() {
        let claims = create_test_claims();
        assert!(claims.is_access_token());
        assert!(!claims.is_refresh_token());
    }

    #[test]
    fn test_is_guardian() {
        let claims = create_test_claims();
        assert!(claims.is_guardian());
        assert!(!claims.is_teacher());
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_is_teacher() {
        let mut claims = create_test_claims();
        claims.role = "teacher".to_string();
        assert!(claims.is_teacher());
        assert!(!claims.is_guardian());
    }

    #[test]
    fn test_is_not_expired() {
        let claims = create_test_claims();
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_is_expired() {
        let mut claims = create_test_claims();
        claims.exp = chrono::Utc::now().timestamp() - 1;
        assert!(claims.is_expired());
    }

    #[test]
    fn test_remaining_validity() {
        let claims = create_test_claims();
        let remaining = claims.remaining_validity();
        assert!(remaining > 0 && remaining <= 900);
    }
}
