//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding of intent payloads so that
//! independent verifiers produce identical signed bytes.

use iba_core::{canonicalize, IntentBuilder, IntentDeclaration, IntentScope, Keypair};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub seed: [u8; 32],
    pub intent_id: &'static str,
    pub purpose: &'static str,
    pub authorized_by: &'static str,
    pub allowed: &'static [&'static str],
    pub forbidden: &'static [&'static str],
    pub limits: &'static [(&'static str, f64)],
    pub max_actions: Option<u64>,
    pub issued_at: i64,
    pub expires_at: Option<i64>,
    /// Expected canonical payload bytes (hex).
    pub expected_canonical: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Scheduling intent with one limit",
            seed: [0x42; 32],
            intent_id: "golden-001",
            purpose: "Schedule a meeting",
            authorized_by: "alice@example.com",
            allowed: &["calendar:*"],
            forbidden: &["payment:*"],
            limits: &[("usdc_transfer", 100.0)],
            max_actions: None,
            issued_at: 1_736_870_400_000,
            expires_at: Some(1_736_874_000_000),
            expected_canonical: "a70000016a676f6c64656e2d30303102725363686564756c652061206d656574696e67\
                                 0371616c696365406578616d706c652e636f6d04a400816a63616c656e6461723a2a01\
                                 81697061796d656e743a2a02a16d757364635f7472616e73666572fb40590000000000\
                                 0003f6051b00000194658b1000061b0000019465c1fe80",
        },
        GoldenVector {
            name: "Minimal intent with empty scope",
            seed: [0x00; 32],
            intent_id: "golden-002",
            purpose: "Minimal",
            authorized_by: "bob",
            allowed: &[],
            forbidden: &[],
            limits: &[],
            max_actions: None,
            issued_at: 0,
            expires_at: None,
            expected_canonical: "a70000016a676f6c64656e2d30303202674d696e696d616c0363626f6204a400800180\
                                 02a003f6050006f6",
        },
        GoldenVector {
            name: "Payments intent with zero cap and action limit",
            seed: [0x07; 32],
            intent_id: "golden-003",
            purpose: "Pay the monthly rent",
            authorized_by: "carol@example.com",
            allowed: &["usdc_transfer", "balance:*"],
            forbidden: &["admin:*"],
            limits: &[("usdc_transfer", 1_500.0), ("eth_transfer", 0.0)],
            max_actions: Some(3),
            issued_at: 1_736_870_400_000,
            expires_at: Some(1_736_956_800_000),
            expected_canonical: "a70000016a676f6c64656e2d303033027450617920746865206d6f6e74686c79207265\
                                 6e7403716361726f6c406578616d706c652e636f6d04a400826962616c616e63653a2a\
                                 6d757364635f7472616e7366657201816761646d696e3a2a02a26c6574685f7472616e\
                                 73666572fb00000000000000006d757364635f7472616e73666572fb40977000000000\
                                 000303051b00000194658b1000061b000001946ab16c00",
        },
    ]
}

/// Sign the intent described by a golden vector.
pub fn declaration_from_vector(vector: &GoldenVector) -> IntentDeclaration {
    let keypair = Keypair::from_seed(&vector.seed);

    let mut scope = IntentScope::builder();
    for pattern in vector.allowed {
        scope = scope.allow(*pattern);
    }
    for pattern in vector.forbidden {
        scope = scope.forbid(*pattern);
    }
    for (key, cap) in vector.limits {
        scope = scope.limit(*key, *cap);
    }
    if let Some(n) = vector.max_actions {
        scope = scope.max_actions(n);
    }

    let mut builder = IntentBuilder::new(vector.intent_id, vector.purpose, vector.authorized_by)
        .scope(scope.build().expect("golden scope is valid"))
        .issued_at(vector.issued_at);
    if let Some(expires_at) = vector.expires_at {
        builder = builder.expires_at(expires_at);
    }
    builder.sign(&keypair).expect("golden intent is valid")
}

/// Canonical payload bytes of a vector, as hex.
pub fn canonical_hex(vector: &GoldenVector) -> String {
    hex::encode(canonicalize(&declaration_from_vector(vector).payload))
}

/// Verify all golden vectors against their pinned encodings.
///
/// Returns `(name, matches, canonical_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = canonical_hex(v);
            let matches = hex == v.expected_canonical;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}
