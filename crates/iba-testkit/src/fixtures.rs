//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use iba_core::{
    Ed25519PublicKey, IntentBuilder, IntentDeclaration, IntentScope, Keypair,
};
use iba_engine::{EngineConfig, PurposeDistance, ValidationEngine};

/// Fixed issue time used by fixtures (2025-01-14T16:00:00Z).
pub const T0: i64 = 1_736_870_400_000;

/// One hour in milliseconds.
pub const HOUR: i64 = 3_600_000;

/// A principal with a keypair.
pub struct TestFixture {
    pub principal: String,
    pub keypair: Keypair,
}

impl TestFixture {
    /// Create a new fixture with a random keypair.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            keypair: Keypair::generate(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(principal: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            principal: principal.into(),
            keypair: Keypair::from_seed(&seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Intent builder for this principal, issued at [`T0`].
    pub fn intent(&self, intent_id: &str, purpose: &str, scope: IntentScope) -> IntentBuilder {
        IntentBuilder::new(intent_id, purpose, self.principal.clone())
            .scope(scope)
            .issued_at(T0)
    }

    /// Signed intent issued at [`T0`], valid for one hour.
    pub fn declare(&self, intent_id: &str, purpose: &str, scope: IntentScope) -> IntentDeclaration {
        self.intent(intent_id, purpose, scope)
            .expires_in(HOUR)
            .sign(&self.keypair)
            .expect("fixture intent should sign")
    }

    /// Engine over `declaration` with the default configuration.
    pub fn engine(
        &self,
        declaration: IntentDeclaration,
        distance: impl PurposeDistance + 'static,
    ) -> ValidationEngine {
        self.engine_with_config(declaration, distance, EngineConfig::default())
    }

    pub fn engine_with_config(
        &self,
        declaration: IntentDeclaration,
        distance: impl PurposeDistance + 'static,
        config: EngineConfig,
    ) -> ValidationEngine {
        ValidationEngine::new(declaration, &self.public_key(), distance, config)
            .expect("fixture engine should build")
    }
}

/// Scope for the appointment-scheduling scenario.
pub fn healthcare_scope() -> IntentScope {
    IntentScope::builder()
        .allow("calendar:*")
        .allow("availability:*")
        .allow("appointments:create")
        .forbid("medical_records:*")
        .forbid("payment:*")
        .forbid("prescriptions:*")
        .build()
        .expect("healthcare scope is valid")
}

/// Scope for the payments scenario: USDC up to 100, no ETH.
pub fn payments_scope() -> IntentScope {
    IntentScope::builder()
        .allow("usdc_transfer")
        .allow("balance:*")
        .limit("usdc_transfer", 100.0)
        .limit("eth_transfer", 0.05)
        .build()
        .expect("payments scope is valid")
}

/// Create fixtures for several principals.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            TestFixture::with_seed(format!("principal-{i}@example.com"), seed)
        })
        .collect()
}
