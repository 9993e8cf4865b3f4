use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 digest of `body`, as the payment collaborator
/// sends it in the `x-payment-signature` header.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a webhook signature against the raw request body.
pub fn verify(secret: &str, body: &[u8], provided: &str) -> bool {
    let expected = sign(secret, body);
    ConstantTimeEq::ct_eq(expected.as_bytes(), provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"event":"payment_completed"}"#;
        let signature = sign("whsec_test", body);
        assert!(verify("whsec_test", body, &signature));
    }

    #[test]
    fn tampered_body_or_wrong_secret_is_rejected() {
        let body = br#"{"event":"payment_completed"}"#;
        let signature = sign("whsec_test", body);
        assert!(!verify("whsec_test", br#"{"event":"other"}"#, &signature));
        assert!(!verify("whsec_other", body, &signature));
        assert!(!verify("whsec_test", body, "deadbeef"));
    }
}
