//! Canonical CBOR encoding for deterministic intent serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats (resource caps) always encoded as IEEE-754 binary64, `-0.0`
//!   normalized to `0.0`
//!
//! The canonical encoding is what gets signed: the same intent must produce
//! identical bytes on every platform so independent verifiers agree.
//! `signature` and `status` are not part of the encoding.

use ciborium::value::Value;

use crate::intent::IntentPayload;
use crate::scope::IntentScope;

/// Canonical encoding version, encoded as field 0.
pub const CANONICAL_VERSION: u8 = 0;

/// Domain separation prefix for intent signatures.
pub const SIGN_DOMAIN: &[u8] = b"iba-intent-v0:";

/// Payload field keys (integer keys for compact encoding).
mod keys {
    pub const VERSION: u64 = 0;
    pub const INTENT_ID: u64 = 1;
    pub const DECLARED_PURPOSE: u64 = 2;
    pub const AUTHORIZED_BY: u64 = 3;
    pub const SCOPE: u64 = 4;
    pub const ISSUED_AT: u64 = 5;
    pub const EXPIRES_AT: u64 = 6;
}

/// Scope field keys.
mod scope_keys {
    pub const ALLOWED: u64 = 0;
    pub const FORBIDDEN: u64 = 1;
    pub const LIMITS: u64 = 2;
    pub const MAX_ACTIONS: u64 = 3;
}

/// Encode an intent payload to canonical CBOR bytes.
pub fn canonical_payload_bytes(payload: &IntentPayload) -> Vec<u8> {
    let value = payload_to_cbor_value(payload);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

/// Construct the signed message (SIGN_DOMAIN || canonical payload).
pub fn signed_message(payload: &IntentPayload) -> Vec<u8> {
    let mut buf = SIGN_DOMAIN.to_vec();
    buf.extend_from_slice(&canonical_payload_bytes(payload));
    buf
}

fn payload_to_cbor_value(payload: &IntentPayload) -> Value {
    let expires_at = match payload.expires_at {
        Some(ts) => Value::Integer(ts.into()),
        None => Value::Null,
    };

    Value::Map(vec![
        (
            Value::Integer(keys::VERSION.into()),
            Value::Integer(CANONICAL_VERSION.into()),
        ),
        (
            Value::Integer(keys::INTENT_ID.into()),
            Value::Text(payload.intent_id.clone()),
        ),
        (
            Value::Integer(keys::DECLARED_PURPOSE.into()),
            Value::Text(payload.declared_purpose.clone()),
        ),
        (
            Value::Integer(keys::AUTHORIZED_BY.into()),
            Value::Text(payload.authorized_by.clone()),
        ),
        (
            Value::Integer(keys::SCOPE.into()),
            scope_to_cbor_value(&payload.scope),
        ),
        (
            Value::Integer(keys::ISSUED_AT.into()),
            Value::Integer(payload.issued_at.into()),
        ),
        (Value::Integer(keys::EXPIRES_AT.into()), expires_at),
    ])
}

fn scope_to_cbor_value(scope: &IntentScope) -> Value {
    // BTreeSet / BTreeMap iterate in lexical order of the pattern text.
    let allowed = scope
        .allowed_resources
        .iter()
        .map(|p| Value::Text(p.as_str().to_string()))
        .collect();
    let forbidden = scope
        .forbidden_resources
        .iter()
        .map(|p| Value::Text(p.as_str().to_string()))
        .collect();
    let limits = scope
        .resource_limits
        .iter()
        .map(|(key, cap)| (Value::Text(key.as_str().to_string()), Value::Float(*cap)))
        .collect();
    let max_actions = match scope.max_actions {
        Some(n) => Value::Integer(n.into()),
        None => Value::Null,
    };

    Value::Map(vec![
        (Value::Integer(scope_keys::ALLOWED.into()), Value::Array(allowed)),
        (Value::Integer(scope_keys::FORBIDDEN.into()), Value::Array(forbidden)),
        (Value::Integer(scope_keys::LIMITS.into()), Value::Map(limits)),
        (Value::Integer(scope_keys::MAX_ACTIONS.into()), max_actions),
    ])
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Float(f) => encode_float(buf, *f),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        _ => panic!("unsupported CBOR value type in intent payload"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a float as binary64 (major type 7, additional info 27).
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    let f = if f == 0.0 { 0.0 } else { f };
    buf.push(0xfb);
    buf.extend_from_slice(&f.to_bits().to_be_bytes());
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentBuilder;

    fn sample_payload() -> IntentPayload {
        let scope = IntentScope::builder()
            .allow("calendar:read")
            .forbid("payment:*")
            .limit("usdc_transfer", 100.0)
            .build()
            .unwrap();
        IntentBuilder::new("intent-001", "Schedule dentist appointment", "user@example.com")
            .scope(scope)
            .issued_at(1_736_870_400_000)
            .expires_at(1_736_874_000_000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_canonical_encoding_deterministic() {
        let payload = sample_payload();
        assert_eq!(
            canonical_payload_bytes(&payload),
            canonical_payload_bytes(&payload.clone())
        );
    }

    #[test]
    fn test_canonical_prefix() {
        let bytes = canonical_payload_bytes(&sample_payload());
        // Map of 7 entries, key 0 -> version 0, key 1 -> text "intent-001".
        assert_eq!(bytes[0], 0xa7);
        assert_eq!(&bytes[1..3], &[0x00, 0x00]);
        assert_eq!(bytes[3], 0x01);
        assert_eq!(bytes[4], 0x60 | 10);
        assert_eq!(&bytes[5..15], b"intent-001");
    }

    #[test]
    fn test_pattern_insertion_order_irrelevant() {
        let a = IntentScope::builder()
            .allow("b:*")
            .allow("a:*")
            .build()
            .unwrap();
        let b = IntentScope::builder()
            .allow("a:*")
            .allow("b:*")
            .build()
            .unwrap();
        let mut pa = sample_payload();
        let mut pb = sample_payload();
        pa.scope = a;
        pb.scope = b;
        assert_eq!(canonical_payload_bytes(&pa), canonical_payload_bytes(&pb));
    }

    #[test]
    fn test_every_field_affects_encoding() {
        let base = canonical_payload_bytes(&sample_payload());

        let mut p = sample_payload();
        p.intent_id.push('x');
        assert_ne!(canonical_payload_bytes(&p), base);

        let mut p = sample_payload();
        p.declared_purpose.push('x');
        assert_ne!(canonical_payload_bytes(&p), base);

        let mut p = sample_payload();
        p.authorized_by.push('x');
        assert_ne!(canonical_payload_bytes(&p), base);

        let mut p = sample_payload();
        p.issued_at += 1;
        assert_ne!(canonical_payload_bytes(&p), base);

        let mut p = sample_payload();
        p.expires_at = None;
        assert_ne!(canonical_payload_bytes(&p), base);

        let mut p = sample_payload();
        p.scope.max_actions = Some(3);
        assert_ne!(canonical_payload_bytes(&p), base);
    }

    #[test]
    fn test_signed_message_has_domain_prefix() {
        let payload = sample_payload();
        let msg = signed_message(&payload);
        assert!(msg.starts_with(SIGN_DOMAIN));
        assert_eq!(&msg[SIGN_DOMAIN.len()..], canonical_payload_bytes(&payload).as_slice());
    }

    #[test]
    fn test_float_encoding() {
        let mut buf = Vec::new();
        encode_float(&mut buf, 100.0);
        assert_eq!(buf, vec![0xfb, 0x40, 0x59, 0, 0, 0, 0, 0, 0]);

        buf.clear();
        encode_float(&mut buf, -0.0);
        assert_eq!(buf, vec![0xfb, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 65535);
        assert_eq!(buf, vec![0x19, 0xff, 0xff]);

        buf.clear();
        encode_integer(&mut buf, (-1i64).into());
        assert_eq!(buf, vec![0x20]);
    }

    #[test]
    fn test_map_key_ordering() {
        let mut buf = Vec::new();
        let entries = vec![
            (Value::Integer(6.into()), Value::Null),
            (Value::Integer(0.into()), Value::Integer(0.into())),
            (Value::Integer(3.into()), Value::Bool(true)),
        ];
        encode_map_canonical(&mut buf, &entries);
        assert_eq!(buf, vec![0xa3, 0x00, 0x00, 0x03, 0xf5, 0x06, 0xf6]);
    }
}
