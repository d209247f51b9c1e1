//! Resource patterns.
//!
//! A resource is a `:`-delimited path such as `calendar:read` or
//! `medical_records:patient_data`. A pattern has the same shape, except that
//! a segment may be the wildcard `*`, which matches one or more whole
//! segments. Matching is case-sensitive and must cover the full resource.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Delimiter between resource segments.
pub const SEGMENT_DELIMITER: char = ':';

/// The wildcard segment.
pub const WILDCARD: &str = "*";

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this text.
    Literal(String),
    /// Matches one or more segments.
    Wildcard,
}

/// A parsed resource pattern.
///
/// Equality, ordering and hashing use the source text, so a set of patterns
/// iterates in a stable lexical order.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl ResourcePattern {
    /// Parse a pattern, rejecting empty patterns, empty segments and partial
    /// wildcards such as `cal*`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(CoreError::invalid_pattern(raw, "pattern is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split(SEGMENT_DELIMITER) {
            if part.is_empty() {
                return Err(CoreError::invalid_pattern(raw, "empty segment"));
            }
            if part == WILDCARD {
                segments.push(Segment::Wildcard);
            } else if part.contains('*') {
                return Err(CoreError::invalid_pattern(
                    raw,
                    format!("wildcard must be a whole segment, got {part:?}"),
                ));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern's source text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern contains no wildcard.
    pub fn is_exact(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Check whether `resource` is matched by this pattern.
    ///
    /// Resources with empty segments (`a::b`, `a:`) never match.
    pub fn matches(&self, resource: &str) -> bool {
        if resource.is_empty() {
            return false;
        }
        let parts: Vec<&str> = resource.split(SEGMENT_DELIMITER).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return false;
        }
        match_segments(&self.segments, &parts)
    }

    /// Check whether at least one resource is matched by both patterns.
    pub fn overlaps(&self, other: &ResourcePattern) -> bool {
        overlap_segments(&self.segments, &other.segments)
    }
}

// reachable[j]: the pattern segments seen so far consume exactly parts[..j].
fn match_segments(pattern: &[Segment], parts: &[&str]) -> bool {
    let n = parts.len();
    let mut reachable = vec![false; n + 1];
    reachable[0] = true;

    for segment in pattern {
        let mut next = vec![false; n + 1];
        match segment {
            Segment::Literal(lit) => {
                for j in 0..n {
                    next[j + 1] = reachable[j] && parts[j] == lit.as_str();
                }
            }
            Segment::Wildcard => {
                let mut seen = false;
                for j in 1..=n {
                    seen |= reachable[j - 1];
                    next[j] = seen;
                }
            }
        }
        if !next.iter().any(|r| *r) {
            return false;
        }
        reachable = next;
    }

    reachable[n]
}

// table[i][j]: a[i..] and b[j..] match a common resource. Every segment
// consumes at least one resource segment; after a wildcard has consumed one
// it may stop (advance) or keep going (stay).
fn overlap_segments(a: &[Segment], b: &[Segment]) -> bool {
    let (la, lb) = (a.len(), b.len());
    let width = lb + 1;
    let mut table = vec![false; (la + 1) * width];
    table[la * width + lb] = true;

    for i in (0..la).rev() {
        for j in (0..lb).rev() {
            let advance = table[(i + 1) * width + j + 1];
            let stay_a = table[i * width + j + 1];
            let stay_b = table[(i + 1) * width + j];
            table[i * width + j] = match (&a[i], &b[j]) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y && advance,
                (Segment::Wildcard, Segment::Literal(_)) => advance || stay_a,
                (Segment::Literal(_), Segment::Wildcard) => advance || stay_b,
                (Segment::Wildcard, Segment::Wildcard) => advance || stay_a || stay_b,
            };
        }
    }

    table[0]
}

impl FromStr for ResourcePattern {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourcePattern {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for ResourcePattern {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<ResourcePattern> for String {
    fn from(p: ResourcePattern) -> Self {
        p.raw
    }
}

impl PartialEq for ResourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ResourcePattern {}

impl PartialOrd for ResourcePattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourcePattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for ResourcePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Debug for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourcePattern({})", self.raw)
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
