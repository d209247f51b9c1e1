//! Cryptographic binding of intents.
//!
//! Binding canonicalizes every signed field of an intent and signs the result
//! with the issuing principal's Ed25519 key. Any later change to the purpose,
//! scope, principal, identifier or validity window breaks verification.
//!
//! Keys are never stored here; callers supply them per operation.

use crate::canonical::{canonical_payload_bytes, signed_message};
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::error::{CoreError, Result};
use crate::intent::{IntentDeclaration, IntentPayload, IntentStatus};

/// Deterministic canonical bytes of the signed fields.
pub fn canonicalize(payload: &IntentPayload) -> Vec<u8> {
    canonical_payload_bytes(payload)
}

/// Sign an already-built message.
pub fn sign(message: &[u8], keypair: &Keypair) -> Ed25519Signature {
    keypair.sign(message)
}

/// Validate a payload and bind it to a signature.
///
/// The resulting declaration starts in [`IntentStatus::Active`].
pub fn bind(payload: IntentPayload, keypair: &Keypair) -> Result<IntentDeclaration> {
    payload.validate()?;
    let signature = sign(&signed_message(&payload), keypair);
    Ok(IntentDeclaration {
        payload,
        signature,
        status: IntentStatus::Active,
    })
}

/// Advisory check: does the signature verify against `public_key`?
pub fn verify(declaration: &IntentDeclaration, public_key: &Ed25519PublicKey) -> bool {
    verify_strict(declaration, public_key).is_ok()
}

/// Verify the signature, failing with [`CoreError::SignatureInvalid`].
pub fn verify_strict(declaration: &IntentDeclaration, public_key: &Ed25519PublicKey) -> Result<()> {
    let message = signed_message(&declaration.payload);
    public_key
        .verify(&message, &declaration.signature)
        .map_err(|e| match e {
            CoreError::InvalidPublicKey => CoreError::InvalidPublicKey,
            _ => CoreError::SignatureInvalid,
        })
}
