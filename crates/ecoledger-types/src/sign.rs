//! Canonical sign-bytes projection.
//!
//! Legacy-amino signing hashes a deterministic JSON projection of the
//! message: object keys in lexicographic order at every nesting level,
//! decimals and coin amounts as strings. Routing the message through
//! `serde_json::Value` sorts keys recursively, since its object map is a
//! `BTreeMap`. The compact binary transport encoding is the host's
//! concern.

use serde::Serialize;

use crate::error::{EcoError, Result};

/// Deterministic JSON bytes of `msg` for signing.
///
/// # Errors
/// Returns [`EcoError::Internal`] if the message fails to serialize,
/// which indicates a programming bug in the message type.
pub fn sign_bytes<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(msg)
        .map_err(|e| EcoError::Internal(format!("sign bytes: {e}")))?;
    serde_json::to_vec(&value).map_err(|e| EcoError::Internal(format!("sign bytes: {e}")))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde::Serialize;

    use super::*;
    use crate::coin::Coin;

    #[derive(Serialize)]
    struct Unordered {
        zulu: u64,
        alpha: String,
        mike: Coin,
    }

    #[test]
    fn keys_emitted_in_lexicographic_order() {
        let msg = Unordered {
            zulu: 7,
            alpha: "a".into(),
            mike: Coin::new("uregen", Decimal::TEN),
        };
        let bytes = sign_bytes(&msg).unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert_eq!(
            json,
            r#"{"alpha":"a","mike":{"amount":"10","denom":"uregen"},"zulu":7}"#
        );
    }

    #[test]
    fn decimals_project_as_strings() {
        let bytes = sign_bytes(&Coin::new("uregen", Decimal::new(45, 1))).unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert!(json.contains(r#""amount":"4.5""#), "got: {json}");
    }

    #[test]
    fn sign_bytes_are_deterministic() {
        let msg = Unordered {
            zulu: 1,
            alpha: "x".into(),
            mike: Coin::new("uregen", Decimal::ONE),
        };
        assert_eq!(sign_bytes(&msg).unwrap(), sign_bytes(&msg).unwrap());
    }
}
