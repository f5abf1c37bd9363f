//! Point-to-point link records.

use serde::{Deserialize, Serialize};
use wgmgr_keys::{PresharedKey, PublicKey};

/// One end of a point-to-point link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHost {
    /// Public key of the peer at this end.
    pub public_key: PublicKey,
    /// Address the other end uses to reach this one.
    pub endpoint: Option<String>,
}

impl LinkHost {
    /// Creates a link end. Empty endpoints are stored as absent.
    #[must_use]
    pub fn new(public_key: PublicKey, endpoint: Option<String>) -> Self {
        Self {
            public_key,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// A direct link between two peers with its own preshared key.
///
/// Links refer to peers by public key, so rotating a peer's keys must update
/// every link naming the old key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub(crate) host1: LinkHost,
    pub(crate) host2: LinkHost,
    pub(crate) preshared_key: PresharedKey,
}

impl LinkRecord {
    /// Creates a link record.
    #[must_use]
    pub const fn new(host1: LinkHost, host2: LinkHost, preshared_key: PresharedKey) -> Self {
        Self {
            host1,
            host2,
            preshared_key,
        }
    }

    /// First end.
    #[must_use]
    pub const fn host1(&self) -> &LinkHost {
        &self.host1
    }

    /// Second end.
    #[must_use]
    pub const fn host2(&self) -> &LinkHost {
        &self.host2
    }

    /// Shared secret of the link.
    #[must_use]
    pub const fn preshared_key(&self) -> &PresharedKey {
        &self.preshared_key
    }

    /// Returns true if either end carries `key`.
    #[must_use]
    pub fn involves(&self, key: &PublicKey) -> bool {
        self.host1.public_key == *key || self.host2.public_key == *key
    }

    /// Returns true if the link joins `a` and `b`, in either orientation.
    #[must_use]
    pub fn connects(&self, a: &PublicKey, b: &PublicKey) -> bool {
        (self.host1.public_key == *a && self.host2.public_key == *b)
            || (self.host1.public_key == *b && self.host2.public_key == *a)
    }

    /// Returns the end opposite to `key`, if `key` is one of the ends.
    #[must_use]
    pub fn other_end(&self, key: &PublicKey) -> Option<&LinkHost> {
        if self.host1.public_key == *key {
            Some(&self.host2)
        } else if self.host2.public_key == *key {
            Some(&self.host1)
        } else {
            None
        }
    }

    /// Points the end holding `old` at `new`. Only the first matching end is
    /// rewritten. Returns false if neither end matched.
    pub(crate) fn rekey_host(&mut self, old: &PublicKey, new: PublicKey) -> bool {
        if self.host1.public_key == *old {
            self.host1.public_key = new;
            true
        } else if self.host2.public_key == *old {
            self.host2.public_key = new;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgmgr_keys::PrivateKey;

    fn key() -> PublicKey {
        PrivateKey::generate().public_key()
    }

    #[test]
    fn empty_endpoint_is_absent() {
        let host = LinkHost::new(key(), Some("  ".into()));
        assert!(host.endpoint.is_none());
    }

    #[test]
    fn rekey_rewrites_first_matching_end_only() {
        let (a, b, c) = (key(), key(), key());
        let mut link = LinkRecord::new(
            LinkHost::new(a, None),
            LinkHost::new(b, Some("vpn.example.org:51820".into())),
            PresharedKey::generate(),
        );

        assert!(link.rekey_host(&b, c));
        assert_eq!(link.host2().public_key, c);
        assert_eq!(link.host1().public_key, a);
        assert!(!link.rekey_host(&b, a));
    }

    #[test]
    fn connects_either_orientation() {
        let (a, b, c) = (key(), key(), key());
        let link = LinkRecord::new(LinkHost::new(a, None), LinkHost::new(b, None), PresharedKey::generate());
        assert!(link.connects(&a, &b));
        assert!(link.connects(&b, &a));
        assert!(!link.connects(&a, &c));
        assert_eq!(link.other_end(&a).map(|h| h.public_key), Some(b));
        assert!(link.other_end(&c).is_none());
    }

    #[test]
    fn serializes_nested_hosts() {
        let link = LinkRecord::new(
            LinkHost::new(key(), Some("10.1.1.1:51820".into())),
            LinkHost::new(key(), None),
            PresharedKey::generate(),
        );
        let json = serde_json::to_value(&link).expect("serialize");
        assert_eq!(json["host1"]["endpoint"], "10.1.1.1:51820");
        assert!(json["host2"]["endpoint"].is_null());
        assert!(json["preshared_key"].is_string());
    }
}
