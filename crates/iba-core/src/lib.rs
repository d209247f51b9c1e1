//! # IBA Core
//!
//! Pure primitives for intent-bound authorization: intent declarations,
//! resource scopes, canonicalization, and Ed25519 binding.
//!
//! This crate contains no I/O and no mutable shared state. It is pure
//! computation over signed data structures.
//!
//! ## Key Types
//!
//! - [`IntentDeclaration`] - A signed statement of purpose, scope and validity
//! - [`IntentPayload`] - The signed fields of a declaration
//! - [`IntentScope`] - Allowed/forbidden resource patterns and numeric caps
//! - [`ResourcePattern`] - `:`-delimited resource pattern with `*` segments
//!
//! ## Canonicalization
//!
//! Payloads are encoded using deterministic CBOR before signing. See the
//! [`canonical`] module.

pub mod binder;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod intent;
pub mod pattern;
pub mod scope;

pub use binder::{bind, canonicalize, verify, verify_strict};
pub use canonical::{canonical_payload_bytes, signed_message, SIGN_DOMAIN};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, IntentDigest, Keypair};
pub use error::{CoreError, Result};
pub use intent::{now_millis, IntentBuilder, IntentDeclaration, IntentPayload, IntentStatus};
pub use pattern::{ResourcePattern, Segment, SEGMENT_DELIMITER, WILDCARD};
pub use scope::{IntentScope, ScopeBuilder};
