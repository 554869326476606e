//! Signing identities
//!
//! Identities are derived from the configured key list and indexed by
//! participant slot. Slot 0 doubles as the funding identity that signs mints.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use std::sync::Arc;

/// Signing credential plus its address
#[derive(Clone)]
pub struct Identity {
    slot: usize,
    signer: Arc<PrivateKeySigner>,
    address: Address,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("Identity")
            .field("slot", &self.slot)
            .field("address", &self.address)
            .finish()
    }
}

impl Identity {
    /// Parse a hex private key (with or without `0x`)
    pub fn from_hex(slot: usize, key: &str) -> Result<Self> {
        let key = key.trim();
        let raw = key.strip_prefix("0x").unwrap_or(key);
        if !raw.is_empty() && raw.bytes().all(|b| b == b'0') {
            bail!("Invalid key for slot {}: all-zero key rejected", slot);
        }
        let signer: PrivateKeySigner = raw
            .parse()
            .with_context(|| format!("Invalid private key for slot {}", slot))?;
        Ok(Self::from_signer(slot, signer))
    }

    pub fn from_signer(slot: usize, signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            slot,
            signer: Arc::new(signer),
            address,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// Identities for one run, indexed by participant slot
#[derive(Debug, Clone)]
pub struct IdentitySet {
    identities: Vec<Identity>,
}

impl IdentitySet {
    /// Derive identities from a key list; slot = position in the list
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        if keys.is_empty() {
            bail!("At least one private key is required");
        }
        let identities = keys
            .iter()
            .enumerate()
            .map(|(slot, key)| Identity::from_hex(slot, key.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { identities })
    }

    /// Keep only the first `limit` participants
    pub fn truncate(&mut self, limit: usize) {
        self.identities.truncate(limit.max(1));
    }

    /// Identity that signs mint operations
    pub fn funding(&self) -> &Identity {
        &self.identities[0]
    }

    pub fn get(&self, slot: usize) -> Option<&Identity> {
        self.identities.get(slot)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    /// Participant pairs `(j, j+1)` for `j = 0, 2, 4, …`
    pub fn pairs(&self) -> impl Iterator<Item = (&Identity, &Identity)> {
        self.identities
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DEV_KEYS;
    use alloy_primitives::address;

    #[test]
    fn test_derives_known_addresses() {
        let set = IdentitySet::from_keys(&DEV_KEYS).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(
            set.funding().address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            set.get(1).unwrap().address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(set.get(2).unwrap().slot(), 2);
    }

    #[test]
    fn test_accepts_prefixed_keys() {
        let prefixed = format!("0x{}", DEV_KEYS[0]);
        let identity = Identity::from_hex(0, &prefixed).unwrap();
        assert_eq!(
            identity.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(Identity::from_hex(0, &"0".repeat(64)).is_err());
        assert!(Identity::from_hex(0, "zz").is_err());
        assert!(IdentitySet::from_keys::<&str>(&[]).is_err());
    }

    #[test]
    fn test_pairs_skip_odd_tail() {
        let set = IdentitySet::from_keys(&DEV_KEYS[..3]).unwrap();
        let pairs: Vec<_> = set.pairs().map(|(a, b)| (a.slot(), b.slot())).collect();
        assert_eq!(pairs, vec![(0, 1)]);

        let set = IdentitySet::from_keys(&DEV_KEYS).unwrap();
        let pairs: Vec<_> = set.pairs().map(|(a, b)| (a.slot(), b.slot())).collect();
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_debug_hides_key() {
        let identity = Identity::from_hex(0, DEV_KEYS[0]).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(DEV_KEYS[0]));
    }
}
