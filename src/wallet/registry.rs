//! Owned registry of wallet snapshots.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::wallet::types::{WalletId, WalletSnapshot, WalletStatus};

/// Snapshot store keyed by wallet id, preserving the order wallets were added
/// to the profile. Only the synchronizer writes; UI readers get clones.
#[derive(Default)]
pub struct WalletRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    order: Vec<WalletId>,
    snapshots: HashMap<WalletId, WalletSnapshot>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wallet. Replaces any existing snapshot for the same id
    /// without changing its position.
    pub fn insert(&self, snapshot: WalletSnapshot) {
        let mut inner = self.inner.write().unwrap();
        if !inner.snapshots.contains_key(&snapshot.wallet_id) {
            inner.order.push(snapshot.wallet_id.clone());
        }
        inner
            .snapshots
            .insert(snapshot.wallet_id.clone(), snapshot);
    }

    /// Drop a wallet deleted from the profile.
    pub fn remove(&self, wallet_id: &str) -> Option<WalletSnapshot> {
        let mut inner = self.inner.write().unwrap();
        inner.order.retain(|id| id != wallet_id);
        inner.snapshots.remove(wallet_id)
    }

    pub fn get(&self, wallet_id: &str) -> Option<WalletSnapshot> {
        self.inner.read().unwrap().snapshots.get(wallet_id).cloned()
    }

    /// Whole-snapshot replacement. Ignored if the wallet was removed in the
    /// meantime, so a late fetch cannot resurrect a deleted wallet.
    pub fn replace(&self, snapshot: WalletSnapshot) {
        let mut inner = self.inner.write().unwrap();
        if inner.snapshots.contains_key(&snapshot.wallet_id) {
            inner
                .snapshots
                .insert(snapshot.wallet_id.clone(), snapshot);
        }
    }

    /// All snapshots in profile order.
    pub fn list(&self) -> Vec<WalletSnapshot> {
        let inner = self.inner.read().unwrap();
        inner
            .order
            .iter()
            .filter_map(|id| inner.snapshots.get(id).cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().order.len()
    }

    /// Pending transaction proposals summed across all cached statuses.
    pub fn pending_proposal_total(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner
            .snapshots
            .values()
            .filter_map(|s| s.cached_status.as_ref())
            .map(|status: &WalletStatus| status.pending_txps)
            .sum()
    }
}
