//! Intent issuers and public-key lookup.

use std::collections::{BTreeMap, HashMap};

use iba_core::{
    binder, Ed25519PublicKey, IntentBuilder, IntentDeclaration, IntentPayload, Keypair,
};
use iba_engine::{EngineConfig, EngineError, PurposeDistance, ValidationEngine};

use crate::error::{IbaError, Result};

/// Resolves a principal identifier to its public key.
///
/// Key storage lives outside this crate; implement this over whatever
/// directory, HSM or config file holds the keys.
pub trait KeyDirectory {
    fn public_key(&self, principal: &str) -> Option<Ed25519PublicKey>;
}

impl KeyDirectory for HashMap<String, Ed25519PublicKey> {
    fn public_key(&self, principal: &str) -> Option<Ed25519PublicKey> {
        self.get(principal).copied()
    }
}

impl KeyDirectory for BTreeMap<String, Ed25519PublicKey> {
    fn public_key(&self, principal: &str) -> Option<Ed25519PublicKey> {
        self.get(principal).copied()
    }
}

/// Build an engine, looking up the issuer's key in `keys`.
pub fn open_engine<K, D>(
    declaration: IntentDeclaration,
    keys: &K,
    distance: D,
    config: EngineConfig,
) -> iba_engine::Result<ValidationEngine>
where
    K: KeyDirectory + ?Sized,
    D: PurposeDistance + 'static,
{
    let principal = declaration.authorized_by();
    let public_key = keys
        .public_key(principal)
        .ok_or_else(|| EngineError::UnknownPrincipal(principal.to_string()))?;
    ValidationEngine::new(declaration, &public_key, distance, config)
}

/// A principal that issues signed intents.
pub struct Authority {
    principal: String,
    keypair: Keypair,
}

impl Authority {
    pub fn new(principal: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            principal: principal.into(),
            keypair,
        }
    }

    /// Authority with a freshly generated key.
    pub fn generate(principal: impl Into<String>) -> Self {
        Self::new(principal, Keypair::generate())
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Start an intent issued by this authority.
    pub fn intent(
        &self,
        intent_id: impl Into<String>,
        declared_purpose: impl Into<String>,
    ) -> IntentBuilder {
        IntentBuilder::new(intent_id, declared_purpose, self.principal.clone())
    }

    /// Sign a payload. `authorized_by` must name this authority.
    pub fn sign(&self, payload: IntentPayload) -> Result<IntentDeclaration> {
        if payload.authorized_by != self.principal {
            return Err(IbaError::PrincipalMismatch {
                authority: self.principal.clone(),
                authorized_by: payload.authorized_by,
            });
        }
        let declaration = binder::bind(payload, &self.keypair)?;
        tracing::debug!(
            intent_id = %declaration.intent_id(),
            authorized_by = %self.principal,
            "intent signed"
        );
        Ok(declaration)
    }

    /// Build an engine for an intent this authority signed.
    pub fn open<D>(
        &self,
        declaration: IntentDeclaration,
        distance: D,
        config: EngineConfig,
    ) -> Result<ValidationEngine>
    where
        D: PurposeDistance + 'static,
    {
        Ok(open_engine(declaration, self, distance, config)?)
    }
}

impl KeyDirectory for Authority {
    fn public_key(&self, principal: &str) -> Option<Ed25519PublicKey> {
        (principal == self.principal).then(|| self.keypair.public_key())
    }
}

impl std::fmt::Debug for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority")
            .field("principal", &self.principal)
            .field("public_key", &self.public_key())
            .finish()
    }
}
