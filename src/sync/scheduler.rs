//! Debounced entry points for the synchronization engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::SyncConfig;
use crate::sync::debounce::{Debouncer, Edge};
use crate::sync::synchronizer::StatusSynchronizer;
use crate::wallet::{SyncTrigger, WalletId};

/// Coalesces UI and service triggers into synchronizer invocations.
///
/// Per-wallet status triggers are trailing-edge debounced so a burst of
/// service events (several transactions in one block) costs one round-trip.
/// Triggers are keyed per wallet: a burst for one wallet cannot swallow
/// another wallet's refresh. Full-list refreshes (pull-to-refresh, app
/// resume) are leading-edge debounced so the first request runs immediately.
///
/// Dropping the scheduler cancels all pending debounce timers. Must be
/// created inside a tokio runtime.
pub struct SyncScheduler {
    synchronizer: Arc<StatusSynchronizer>,
    config: SyncConfig,
    status_debouncers: Mutex<HashMap<WalletId, Debouncer<SyncTrigger>>>,
    list_debouncer: Debouncer<()>,
}

impl SyncScheduler {
    pub fn new(synchronizer: Arc<StatusSynchronizer>, config: SyncConfig) -> Self {
        let list_debouncer = {
            let synchronizer = synchronizer.clone();
            Debouncer::new(config.list_debounce, Edge::Leading, move |()| {
                let synchronizer = synchronizer.clone();
                async move { synchronizer.fetch_all_wallets_status().await }
            })
        };
        Self {
            synchronizer,
            config,
            status_debouncers: Mutex::new(HashMap::new()),
            list_debouncer,
        }
    }

    pub fn synchronizer(&self) -> &Arc<StatusSynchronizer> {
        &self.synchronizer
    }

    /// Request a debounced status refresh for one wallet.
    pub fn trigger(&self, trigger: SyncTrigger) {
        let mut debouncers = self.status_debouncers.lock().unwrap();
        let debouncer = debouncers
            .entry(trigger.wallet_id.clone())
            .or_insert_with(|| {
                let synchronizer = self.synchronizer.clone();
                Debouncer::new(
                    self.config.status_debounce,
                    Edge::Trailing,
                    move |t: SyncTrigger| {
                        let synchronizer = synchronizer.clone();
                        async move { synchronizer.fetch_wallet_status(t).await }
                    },
                )
            });
        debouncer.call(trigger);
    }

    /// Immediate refresh for a wallet the user is looking at, chaining a
    /// history update. Not debounced.
    pub async fn focus(&self, wallet_id: impl Into<WalletId>) {
        let mut trigger = SyncTrigger::new(wallet_id);
        trigger.also_update_history = true;
        self.synchronizer.clone().fetch_wallet_status(trigger).await;
    }

    /// Request a debounced refresh of every wallet's status.
    pub fn trigger_full_refresh(&self) {
        self.list_debouncer.call(());
    }

    /// Drop the debouncer of a wallet deleted from the profile, cancelling
    /// any pending refresh for it.
    pub fn forget_wallet(&self, wallet_id: &str) {
        self.status_debouncers.lock().unwrap().remove(wallet_id);
    }
}
