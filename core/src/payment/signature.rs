// shopflow/src/payment/signature.rs

//! Gateway callback signatures: lowercase hex of
//! `HMAC-SHA256(secret, "{gateway_order_id}|{gateway_payment_id}")`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CommerceError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Hex length of a SHA-256 MAC.
const SIGNATURE_LEN: usize = 64;

/// Exactly the form `sign` produces: 64 lowercase hex digits, no padding.
fn is_canonical(signature: &str) -> bool {
  signature.len() == SIGNATURE_LEN && signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn mac_for(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|_| CommerceError::Internal("HMAC key error".to_string()))?;
  mac.update(gateway_order_id.as_bytes());
  mac.update(b"|");
  mac.update(gateway_payment_id.as_bytes());
  Ok(mac)
}

/// The signature the gateway is expected to send.
pub fn sign(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Result<String> {
  let mac = mac_for(secret, gateway_order_id, gateway_payment_id)?;
  Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a signature. Anything other than the exact
/// lowercase hex `sign` would produce never verifies.
pub fn verify(secret: &str, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> Result<bool> {
  if !is_canonical(signature) {
    return Ok(false);
  }
  let Ok(sig_bytes) = hex::decode(signature) else {
    return Ok(false);
  };
  let mac = mac_for(secret, gateway_order_id, gateway_payment_id)?;
  Ok(mac.verify_slice(&sig_bytes).is_ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "test_secret";

  #[test]
  fn signs_and_verifies() {
    let sig = sign(SECRET, "order_1", "pay_1").unwrap();
    assert_eq!(sig.len(), 64);
    assert!(verify(SECRET, "order_1", "pay_1", &sig).unwrap());
  }

  #[test]
  fn any_single_character_mutation_fails() {
    let sig = sign(SECRET, "intent_1", "pay_9").unwrap();
    for idx in 0..sig.len() {
      let mut chars: Vec<char> = sig.chars().collect();
      chars[idx] = if chars[idx] == '0' { '1' } else { '0' };
      let mutated: String = chars.into_iter().collect();
      assert!(!verify(SECRET, "intent_1", "pay_9", &mutated).unwrap(), "mutation at {idx} verified");
    }
  }

  #[test]
  fn case_change_fails() {
    let sig = sign(SECRET, "intent_1", "pay_1").unwrap();
    let idx = sig.find(|c: char| c.is_ascii_alphabetic()).unwrap();
    let mut mutated = sig.clone();
    mutated.replace_range(idx..idx + 1, &sig[idx..idx + 1].to_ascii_uppercase());
    assert!(!verify(SECRET, "intent_1", "pay_1", &mutated).unwrap());
    assert!(!verify(SECRET, "intent_1", "pay_1", &sig.to_ascii_uppercase()).unwrap());
  }

  #[test]
  fn surrounding_whitespace_fails() {
    let sig = sign(SECRET, "intent_1", "pay_1").unwrap();
    assert!(!verify(SECRET, "intent_1", "pay_1", &format!(" {sig}\n")).unwrap());
    assert!(!verify(SECRET, "intent_1", "pay_1", &format!("{sig} ")).unwrap());
    assert!(verify(SECRET, "intent_1", "pay_1", &sig).unwrap());
  }

  #[test]
  fn wrong_inputs_fail() {
    let sig = sign(SECRET, "intent_1", "pay_9").unwrap();
    assert!(!verify(SECRET, "intent_1", "pay_8", &sig).unwrap());
    assert!(!verify("other", "intent_1", "pay_9", &sig).unwrap());
    assert!(!verify(SECRET, "intent_1", "pay_9", "not-hex").unwrap());
    assert!(!verify(SECRET, "intent_1", "pay_9", "").unwrap());
  }

  #[test]
  fn separator_is_part_of_the_message() {
    let a = sign(SECRET, "ab", "c").unwrap();
    let b = sign(SECRET, "a", "bc").unwrap();
    assert_ne!(a, b);
  }
}
