use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(secret).expect("hmac key")
}

/// Base64 HMAC-SHA256 over an outbound webhook body, carried in the
/// `X-Vulnwatch-Signature` header so receivers can authenticate the payload.
pub fn sign_data(secret: &[u8], body: &[u8]) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Receiver-side check; comparison is constant-time via `verify_slice`.
pub fn verify_signature(secret: &[u8], body: &[u8], signature_b64: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature_b64) else {
        return false;
    };
    let mut mac = keyed_mac(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
