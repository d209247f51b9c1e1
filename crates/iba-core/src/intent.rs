//! Intent declarations: a signed statement of purpose, scope and validity.
//!
//! An intent is built as an [`IntentPayload`] (every signed field), then bound
//! to a signature by [`crate::binder::bind`]. Once signed, the payload is
//! immutable as far as verification is concerned; only `status` may change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::binder;
use crate::canonical::canonical_payload_bytes;
use crate::crypto::{Ed25519Signature, IntentDigest, Keypair};
use crate::error::{CoreError, Result};
use crate::scope::IntentScope;

/// Lifecycle state of an intent.
///
/// `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Active,
    Completed,
    Revoked,
    Expired,
}

impl IntentStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        !matches!(self, IntentStatus::Active)
    }

    /// Lowercase state name.
    pub fn as_str(self) -> &'static str {
        match self {
            IntentStatus::Active => "active",
            IntentStatus::Completed => "completed",
            IntentStatus::Revoked => "revoked",
            IntentStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every field covered by the intent signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPayload {
    /// Caller-assigned identifier.
    pub intent_id: String,

    /// Free-text purpose; the baseline for drift scoring.
    pub declared_purpose: String,

    /// Identifier of the issuing principal.
    pub authorized_by: String,

    /// Resource boundary.
    pub scope: IntentScope,

    /// Issue time (Unix milliseconds).
    pub issued_at: i64,

    /// Expiry time (Unix milliseconds). `None` means no time bound.
    pub expires_at: Option<i64>,
}

impl IntentPayload {
    /// Reject malformed payloads.
    pub fn validate(&self) -> Result<()> {
        if self.intent_id.trim().is_empty() {
            return Err(CoreError::malformed("intent_id is empty"));
        }
        if self.declared_purpose.trim().is_empty() {
            return Err(CoreError::malformed("declared_purpose is empty"));
        }
        if self.authorized_by.trim().is_empty() {
            return Err(CoreError::malformed("authorized_by is empty"));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at < self.issued_at {
                return Err(CoreError::malformed(format!(
                    "expires_at {} precedes issued_at {}",
                    expires_at, self.issued_at
                )));
            }
        }
        self.scope.validate()
    }

    /// Blake3 digest of the canonical encoding.
    pub fn digest(&self) -> IntentDigest {
        IntentDigest::hash(&canonical_payload_bytes(self))
    }
}

/// A signed intent declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDeclaration {
    /// The signed fields.
    pub payload: IntentPayload,

    /// Ed25519 signature over the canonical payload.
    pub signature: Ed25519Signature,

    /// Lifecycle metadata; not signed.
    pub status: IntentStatus,
}

impl IntentDeclaration {
    pub fn intent_id(&self) -> &str {
        &self.payload.intent_id
    }

    pub fn declared_purpose(&self) -> &str {
        &self.payload.declared_purpose
    }

    pub fn authorized_by(&self) -> &str {
        &self.payload.authorized_by
    }

    pub fn scope(&self) -> &IntentScope {
        &self.payload.scope
    }

    pub fn issued_at(&self) -> i64 {
        self.payload.issued_at
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.payload.expires_at
    }

    pub fn status(&self) -> IntentStatus {
        self.status
    }

    /// Whether the validity window has closed at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.payload.expires_at, Some(expires_at) if now >= expires_at)
    }

    /// Deterministic digest of the signed payload.
    ///
    /// Two declarations with the same payload share a digest regardless of
    /// status.
    pub fn digest(&self) -> IntentDigest {
        self.payload.digest()
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    ///
    /// The signature is not checked here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Builder for intent payloads.
pub struct IntentBuilder {
    intent_id: String,
    declared_purpose: String,
    authorized_by: String,
    scope: IntentScope,
    issued_at: Option<i64>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
}

impl IntentBuilder {
    /// Create a new builder. The scope starts empty (deny everything).
    pub fn new(
        intent_id: impl Into<String>,
        declared_purpose: impl Into<String>,
        authorized_by: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            declared_purpose: declared_purpose.into(),
            authorized_by: authorized_by.into(),
            scope: IntentScope::default(),
            issued_at: None,
            expires_at: None,
            expires_in: None,
        }
    }

    /// Set the scope.
    pub fn scope(mut self, scope: IntentScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the issue time. Defaults to now.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    /// Set an absolute expiry.
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires_at = Some(timestamp);
        self.expires_in = None;
        self
    }

    /// Expire `millis` after the issue time.
    pub fn expires_in(mut self, millis: i64) -> Self {
        self.expires_in = Some(millis);
        self.expires_at = None;
        self
    }

    /// Build and validate the payload.
    pub fn build(self) -> Result<IntentPayload> {
        let issued_at = self.issued_at.unwrap_or_else(now_millis);
        let expires_at = match self.expires_in {
            Some(millis) => Some(issued_at.saturating_add(millis)),
            None => self.expires_at,
        };

        let payload = IntentPayload {
            intent_id: self.intent_id,
            declared_purpose: self.declared_purpose,
            authorized_by: self.authorized_by,
            scope: self.scope,
            issued_at,
            expires_at,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Build, validate and sign.
    pub fn sign(self, keypair: &Keypair) -> Result<IntentDeclaration> {
        binder::bind(self.build()?, keypair)
    }
}

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
