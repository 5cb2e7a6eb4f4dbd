//! The wire-agnostic NDN packet model: `Name`, `Interest`, `Data`.
//!
//! This module provides the core data structures routed by the forwarding
//! engine. It intentionally has no opinion on wire encoding — that concern
//! belongs to a codec crate outside this workspace's scope.

use bytes::Bytes;
use std::fmt;
use std::time::Duration;

use crate::error::Error;

/* ---------------------------------------------------------------- *\
 * FaceId
\* ---------------------------------------------------------------- */

/// Identifier for a `Face`, stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reserved face id representing a Data reply synthesized by the Content Store.
pub const FACEID_CONTENT_STORE: FaceId = FaceId(u32::MAX);
/// Reserved face id representing a Data reply synthesized by the Object Processor.
pub const FACEID_OBJECT_PROCESSOR: FaceId = FaceId(u32::MAX - 1);
/// Reserved face id meaning "no face" / an invalid send target.
pub const FACEID_INVALID: FaceId = FaceId(0);

/* ---------------------------------------------------------------- *\
 * Name and NameComponent
\* ---------------------------------------------------------------- */

/// A single, binary-opaque component of a `Name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printable = self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ');
        if printable {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x")?;
            for &b in &self.0 {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

/// An ordered sequence of binary components, compared and hashed
/// component-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `/`-delimited URI. Empty segments (leading/trailing/doubled
    /// slashes) are ignored, so `/a/b/` and `/a/b` parse identically.
    pub fn from_uri(s: &str) -> Result<Self, Error> {
        let components = s
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| NameComponent::new(seg.as_bytes().to_vec()))
            .collect();
        Ok(Self { components })
    }

    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn with_component(mut self, component: NameComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Truncates to the first `len` components (NFD's `getPrefix(n)` for
    /// non-negative `n`). `len` is clamped to the name's length.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            components: self.components.iter().take(len).cloned().collect(),
        }
    }

    /// Drops the last `n` components (NFD's `getPrefix(-n)`).
    pub fn dropping_last(&self, n: usize) -> Self {
        let keep = self.components.len().saturating_sub(n);
        self.prefix(keep)
    }

    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/* ---------------------------------------------------------------- *\
 * Interest
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct Interest {
    pub name: Name,
    pub nonce: u32,
    pub lifetime: Duration,
    pub must_be_fresh: bool,
    pub incoming_face_id: Option<FaceId>,
}

impl Interest {
    pub fn new(name: Name, nonce: u32) -> Self {
        Self {
            name,
            nonce,
            lifetime: Duration::from_millis(4000),
            must_be_fresh: false,
            incoming_face_id: None,
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }
}

/* ---------------------------------------------------------------- *\
 * Data
\* ---------------------------------------------------------------- */

/// A placeholder for NDN's `SignatureInfo` + `SignatureValue`. Signatures are
/// passed through opaquely and never verified by this engine (spec Non-goal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature_type: u8,
    pub value: Bytes,
}

impl SignatureInfo {
    /// The placeholder signature `onProcessingData` stamps onto a derived
    /// child Data: type 255, value 0.
    pub fn derived_placeholder() -> Self {
        Self {
            signature_type: 255,
            value: Bytes::from_static(&[0]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Data {
    pub name: Name,
    pub content: Bytes,
    /// `None` means the Data never becomes stale.
    pub freshness_period: Option<Duration>,
    pub signature: SignatureInfo,
    pub incoming_face_id: Option<FaceId>,
}

impl Data {
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            freshness_period: None,
            signature: SignatureInfo {
                signature_type: 0,
                value: Bytes::new(),
            },
            incoming_face_id: None,
        }
    }

    pub fn with_freshness_period(mut self, freshness_period: Option<Duration>) -> Self {
        self.freshness_period = freshness_period;
        self
    }

    pub fn with_signature(mut self, signature: SignatureInfo) -> Self {
        self.signature = signature;
        self
    }

    /// Returns a copy with its `incoming_face_id` stripped — the
    /// "remove transport tags" step before insertion into CS/OP.
    pub fn without_transport_tags(&self) -> Self {
        Self {
            incoming_face_id: None,
            ..self.clone()
        }
    }

    /// A `None` freshness period never goes stale. A `Some(d)` of zero is
    /// immediately stale; anything else is fresh at the moment of arrival.
    pub fn is_fresh_now(&self) -> bool {
        self.freshness_period.map_or(true, |d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_uri_round_trip() {
        let name = Name::from_uri("/a/b/c").unwrap();
        assert_eq!(name.component_count(), 3);
        assert_eq!(name.to_string(), "/a/b/c");
    }

    #[test]
    fn name_root_is_slash() {
        assert_eq!(Name::new().to_string(), "/");
    }

    #[test]
    fn name_prefix_and_is_prefix_of() {
        let full = Name::from_uri("/a/b/c").unwrap();
        let prefix = Name::from_uri("/a/b").unwrap();
        assert_eq!(full.prefix(2), prefix);
        assert!(prefix.is_prefix_of(&full));
        assert!(!full.is_prefix_of(&prefix));
    }

    #[test]
    fn name_dropping_last() {
        let full = Name::from_uri("/a/b/c/1").unwrap();
        assert_eq!(full.dropping_last(1), Name::from_uri("/a/b/c").unwrap());
    }

    #[test]
    fn name_ordering_is_component_wise() {
        let a = Name::from_uri("/a/b").unwrap();
        let b = Name::from_uri("/a/c").unwrap();
        assert!(a < b);
    }
}
