//! Typed status-change events and their observer registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::wallet::{ServerMessage, WalletId};

/// Events emitted by the synchronization engine toward the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A status fetch started (`finished: false, error: None`), completed
    /// (`finished: true`) or failed (`finished: false, error: Some`).
    WalletUpdated {
        wallet_id: WalletId,
        finished: bool,
        error: Option<String>,
    },
    /// History fetch lifecycle; `progress` carries the size of a new page.
    HistoryUpdated {
        wallet_id: WalletId,
        finished: bool,
        progress: Option<usize>,
        error: Option<String>,
    },
    /// The aggregate pending-proposal count changed.
    ProposalsUpdated { pending: usize },
    /// The server-message batch for this refresh cycle.
    ServerMessages { messages: Vec<ServerMessage> },
}

/// Receiver of engine events. Register with [`ObserverRegistry::subscribe`]
/// while the dashboard is active and unsubscribe on pause.
#[async_trait]
pub trait SyncObserver: Send + Sync {
    async fn on_event(&self, event: SyncEvent);
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer set owned by the engine. Replaces an application-global event
/// bus: subscriber lifetimes are explicit and scoped by the caller.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: RwLock<HashMap<u64, Arc<dyn SyncObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn SyncObserver>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.write().unwrap().insert(id, observer);
        SubscriptionId(id)
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.write().unwrap().remove(&id.0).is_some()
    }

    pub async fn emit(&self, event: SyncEvent) {
        let observers: Vec<Arc<dyn SyncObserver>> = {
            let guard = self.observers.read().unwrap();
            guard.values().cloned().collect()
        };
        for observer in observers {
            observer.on_event(event.clone()).await;
        }
    }
}
