//! # Cart Signatures
//!
//! Canonical, order-independent fingerprints of a cart, used as cache key
//! components for applicable-coupon lookups.
//!
//! ```text
//! cart: [PARA-500, AMOX-250, VITC-1000]
//!          │
//!          ▼  sort ids ascending
//! "AMOX-250|PARA-500|VITC-1000|"      ← cart_signature
//!          │
//!          ▼  SHA-256, hex
//! "3f1c…e9"                           ← signature_digest
//! ```

use sha2::{Digest, Sha256};

use crate::types::CartItem;

/// Builds the canonical signature for a cart.
///
/// Item ids are sorted ascending and each is followed by `|`. The caller's
/// slice is not reordered.
///
/// ## Example
/// ```rust
/// use coupon_core::cart::cart_signature;
/// use coupon_core::CartItem;
///
/// let item = |id: &str| CartItem {
///     id: id.to_string(),
///     category: "vitamins".to_string(),
///     price: 1.0,
///     quantity: 1,
/// };
/// assert_eq!(cart_signature(&[item("b"), item("a")]), "a|b|");
/// ```
pub fn cart_signature(items: &[CartItem]) -> String {
    let mut ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    ids.sort_unstable();

    let mut signature = String::with_capacity(ids.iter().map(|id| id.len() + 1).sum());
    for id in ids {
        signature.push_str(id);
        signature.push('|');
    }
    signature
}

/// Hex-encoded SHA-256 of a signature.
pub fn signature_digest(signature: &str) -> String {
    hex::encode(Sha256::digest(signature.as_bytes()))
}

/// Shorthand for `signature_digest(&cart_signature(items))`.
pub fn cart_digest(items: &[CartItem]) -> String {
    signature_digest(&cart_signature(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> CartItem {
        CartItem {
            id: id.to_string(),
            category: "vitamins".to_string(),
            price: 10.0,
            quantity: 1,
        }
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = vec![item("PARA-500"), item("AMOX-250"), item("VITC-1000")];
        let b = vec![item("VITC-1000"), item("PARA-500"), item("AMOX-250")];

        assert_eq!(cart_signature(&a), "AMOX-250|PARA-500|VITC-1000|");
        assert_eq!(cart_signature(&a), cart_signature(&b));
        assert_eq!(cart_digest(&a), cart_digest(&b));
    }

    #[test]
    fn test_signature_does_not_reorder_input() {
        let cart = vec![item("z"), item("a")];
        let _ = cart_signature(&cart);
        assert_eq!(cart[0].id, "z");
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(cart_signature(&[]), "");
        // SHA-256 of the empty string
        assert_eq!(
            signature_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = cart_digest(&[item("a")]);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, cart_digest(&[item("b")]));
    }
}
