//! Proptest generators for property-based testing.

use proptest::prelude::*;

use iba_core::{
    Ed25519PublicKey, IntentBuilder, IntentDeclaration, IntentScope, Keypair, WILDCARD,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a literal resource segment.
pub fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}".prop_map(String::from)
}

/// Generate a concrete resource of one to four segments.
pub fn resource() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..=4).prop_map(|segments| segments.join(":"))
}

/// Generate a pattern that matches `resource`.
///
/// Each segment is kept or replaced with a wildcard.
pub fn pattern_matching(resource: String) -> impl Strategy<Value = String> {
    let segments: Vec<String> = resource.split(':').map(String::from).collect();
    let len = segments.len();
    prop::collection::vec(any::<bool>(), len).prop_map(move |wild| {
        segments
            .iter()
            .zip(wild)
            .map(|(segment, wild)| if wild { WILDCARD } else { segment.as_str() })
            .collect::<Vec<_>>()
            .join(":")
    })
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate a non-empty free-text purpose.
pub fn purpose() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,63}".prop_map(String::from)
}

/// Generate a scope without limits.
pub fn scope() -> impl Strategy<Value = IntentScope> {
    (
        prop::collection::btree_set(resource(), 0..4),
        prop::collection::btree_set(resource(), 0..3),
        prop::option::of(0u64..100),
    )
        .prop_map(|(allowed, forbidden, max_actions)| {
            let mut builder = IntentScope::builder();
            for pattern in allowed {
                builder = builder.allow(pattern);
            }
            for pattern in forbidden {
                builder = builder.forbid(pattern);
            }
            if let Some(n) = max_actions {
                builder = builder.max_actions(n);
            }
            builder.build().expect("generated patterns are valid")
        })
}

/// Parameters for generating a signed intent.
#[derive(Debug, Clone)]
pub struct IntentParams {
    pub keypair: Keypair,
    pub intent_id: String,
    pub purpose: String,
    pub authorized_by: String,
    pub scope: IntentScope,
    pub issued_at: i64,
    pub ttl: Option<i64>,
}

impl Arbitrary for IntentParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            "[a-z0-9-]{1,24}",
            purpose(),
            "[a-z]{1,12}@[a-z]{1,12}\\.com",
            scope(),
            0i64..=1_800_000_000_000i64,
            prop::option::of(0i64..=86_400_000i64),
        )
            .prop_map(
                |(seed, intent_id, purpose, authorized_by, scope, issued_at, ttl)| IntentParams {
                    keypair: Keypair::from_seed(&seed),
                    intent_id,
                    purpose,
                    authorized_by,
                    scope,
                    issued_at,
                    ttl,
                },
            )
            .boxed()
    }
}

/// Sign an intent from parameters.
pub fn intent_from_params(params: &IntentParams) -> IntentDeclaration {
    let mut builder = IntentBuilder::new(
        params.intent_id.clone(),
        params.purpose.clone(),
        params.authorized_by.clone(),
    )
    .scope(params.scope.clone())
    .issued_at(params.issued_at);

    if let Some(ttl) = params.ttl {
        builder = builder.expires_in(ttl);
    }

    builder
        .sign(&params.keypair)
        .expect("generated intent is valid")
}
