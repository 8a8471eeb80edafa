use regex::Regex;

// Validate formato de email
pub fn is_valid_email(email: &str) -> bool {
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    email_regex.is_match(email)
}

// Validate celular brasileiro (formato: DDD + 9 dígitos, com ou sem +55)
pub fn is_valid_phone(phone: &str) -> bool {
    let phone_regex = Regex::new(r"^(\+55|55)?[1-9][0-9]9?[0-9]{8}$").unwrap();
    phone_regex.is_match(phone)
}

// Motivo de retirada: obrigatório, até 500 caracteres
pub fn is_valid_reason(reason: &str) -> bool {
    let trimmed = reason.trim();
    !trimmed.is_empty() && trimmed.len() <= 500
}

// Conteúdo de mensagem de chat: obrigatório, até 2000 caracteres
pub fn is_valid_message_content(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && trimmed.len() <= 2000
}

// Preço da cantina em reais (positivo, teto de R$ 1.000 por item)
pub fn is_valid_price(price: f64) -> bool {
    price > 0.0 && price <= 1_000.0
}

// Quantidade de consumo na cantina
pub fn is_valid_quantity(quantity: i32) -> bool {
    (1..=50).contains(&quantity)
}

// Sanitize string para prevenir XSS
pub fn sanitize_html(input: &str) -> String {
    input
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("teste@exemplo.com"));
        assert!(is_valid_email("maria.silva+filho@escola.com.br"));
        assert!(!is_valid_email("email.invalido"));
        assert!(!is_valid_email("@exemplo.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("11987654321"));
        assert!(is_valid_phone("+5511987654321"));
        assert!(is_valid_phone("5511987654321"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("abc987654321"));
    }

    #[test]
    fn test_reason_validation() {
        assert!(is_valid_reason("Consulta médica"));
        assert!(!is_valid_reason("   "));
        assert!(!is_valid_reason(&"x".repeat(501)));
    }

    #[test]
    fn test_message_content_validation() {
        assert!(is_valid_message_content("Bom dia, professora!"));
        assert!(!is_valid_message_content(""));
        assert!(!is_valid_message_content(&"a".repeat(2001)));
    }

    #[test]
    fn test_price_validation() {
        assert!(is_valid_price(7.50));
        assert!(!is_valid_price(0.0));
        assert!(!is_valid_price(-3.0));
        assert!(!is_valid_price(1_500.0));
    }

    #[test]
    fn test_sanitize_html() {
        assert_eq!(
            sanitize_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }
}
