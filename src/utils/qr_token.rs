use rand::Rng;
use uuid::Uuid;

/// Generate the opaque token embedded in an order's pickup QR code.
/// UUID body plus a short random suffix; unique and immutable once issued.
pub fn generate_qr_token() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}{:06}",
        Uuid::new_v4().simple(),
        rng.gen_range(0..=999999)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_qr_token();
        assert_eq!(token.len(), 38);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_qr_token();
        let b = generate_qr_token();
        assert_ne!(a, b);
    }
}
