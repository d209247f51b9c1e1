//! # IBA Testkit
//!
//! Testing utilities for intent-bound authorization.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: pinned canonical encodings of intent payloads
//! - **Generators**: Proptest strategies for resources, patterns, scopes and intents
//! - **Distances**: deterministic [`iba_engine::PurposeDistance`] implementations
//! - **Fixtures**: signing principals and ready-made scopes
//!
//! ## Golden Vectors
//!
//! ```rust
//! use iba_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{name}: {hex}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use iba_testkit::generators::{intent_from_params, IntentParams};
//!
//! proptest! {
//!     #[test]
//!     fn digest_is_deterministic(params: IntentParams) {
//!         let d1 = intent_from_params(&params);
//!         let d2 = intent_from_params(&params);
//!         prop_assert_eq!(d1.digest(), d2.digest());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use iba_testkit::fixtures::{healthcare_scope, TestFixture};
//! use iba_testkit::distance::FixedDistance;
//!
//! let fixture = TestFixture::new("user@example.com");
//! let intent = fixture.declare("intent-1", "Schedule an appointment", healthcare_scope());
//! let engine = fixture.engine(intent, FixedDistance(0.0));
//! ```

pub mod distance;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use distance::{FixedDistance, KeywordDistance, ScriptedDistance};
pub use fixtures::{healthcare_scope, multi_party_fixtures, payments_scope, TestFixture, HOUR, T0};
pub use generators::{intent_from_params, IntentParams};
pub use vectors::{all_vectors, declaration_from_vector, verify_all_vectors, GoldenVector};
