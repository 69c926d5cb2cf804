//! Per-wallet and bulk status fetch orchestration.
//!
//! Each wallet moves through IDLE -> FETCHING -> (UPDATED | ERRORED) -> IDLE.
//! An explicit per-wallet in-flight guard keeps concurrent triggers from
//! spawning duplicate requests; an in-flight fetch is never cancelled by a
//! newer trigger, so the later-completing response wins.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;

use crate::client::{ErrorFormatter, PersistenceStore, ProgressFn, WalletServiceClient};
use crate::error::SyncError;
use crate::sync::events::{ObserverRegistry, SubscriptionId, SyncEvent, SyncObserver};
use crate::wallet::{FetchOpts, ServerMessage, SyncTrigger, WalletId, WalletRegistry};

pub struct StatusSynchronizer {
    client: Arc<dyn WalletServiceClient>,
    persistence: Arc<dyn PersistenceStore>,
    formatter: Arc<dyn ErrorFormatter>,
    registry: Arc<WalletRegistry>,
    observers: ObserverRegistry,
    in_flight: Mutex<HashSet<WalletId>>,
    history_in_flight: Mutex<HashSet<WalletId>>,
    /// Sticky until the caller clears it after explicit user action.
    access_denied: AtomicBool,
    server_messages: RwLock<Vec<ServerMessage>>,
    app_name: String,
}

impl StatusSynchronizer {
    pub fn new(
        client: Arc<dyn WalletServiceClient>,
        persistence: Arc<dyn PersistenceStore>,
        formatter: Arc<dyn ErrorFormatter>,
        registry: Arc<WalletRegistry>,
        app_name: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            persistence,
            formatter,
            registry,
            observers: ObserverRegistry::new(),
            in_flight: Mutex::new(HashSet::new()),
            history_in_flight: Mutex::new(HashSet::new()),
            access_denied: AtomicBool::new(false),
            server_messages: RwLock::new(Vec::new()),
            app_name: app_name.into(),
        })
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    pub(crate) fn client(&self) -> &Arc<dyn WalletServiceClient> {
        &self.client
    }

    pub fn subscribe(&self, observer: Arc<dyn SyncObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn access_denied(&self) -> bool {
        self.access_denied.load(Ordering::SeqCst)
    }

    /// Explicit user acknowledgement; successful fetches never clear it.
    pub fn clear_access_denied(&self) {
        self.access_denied.store(false, Ordering::SeqCst);
    }

    /// The server-message batch surfaced by the last bulk refresh.
    pub fn server_messages(&self) -> Vec<ServerMessage> {
        self.server_messages.read().unwrap().clone()
    }

    /// Refresh one wallet's status from the wallet service.
    pub async fn fetch_wallet_status(self: Arc<Self>, trigger: SyncTrigger) {
        let wallet_id = trigger.wallet_id.clone();
        let Some(wallet) = self.registry.get(&wallet_id) else {
            log::error!("no wallet {} to update", wallet_id);
            return;
        };
        if !self.begin_status_fetch(&wallet_id) {
            log::debug!("status fetch already in flight for {}", wallet_id);
            return;
        }

        self.observers
            .emit(SyncEvent::WalletUpdated {
                wallet_id: wallet_id.clone(),
                finished: false,
                error: None,
            })
            .await;

        log::debug!(
            "fetching status for {} (history: {})",
            wallet_id,
            trigger.also_update_history
        );

        let result = self
            .client
            .fetch_status(
                &wallet,
                FetchOpts {
                    force: trigger.force,
                },
            )
            .await;

        match result {
            Ok(status) => {
                self.persist_balance(&wallet_id, &status.available_balance_str)
                    .await;

                let mut snapshot = wallet;
                snapshot.last_known_balance = Some(status.available_balance_str.clone());
                snapshot.cached_status = Some(status);
                snapshot.error = None;
                self.registry.replace(snapshot);

                self.observers
                    .emit(SyncEvent::ProposalsUpdated {
                        pending: self.registry.pending_proposal_total(),
                    })
                    .await;
                self.observers
                    .emit(SyncEvent::WalletUpdated {
                        wallet_id: wallet_id.clone(),
                        finished: true,
                        error: None,
                    })
                    .await;
            }
            Err(err) => {
                self.process_wallet_error(&wallet_id, &err);
                let user_error = self.registry.get(&wallet_id).and_then(|s| s.error);
                self.observers
                    .emit(SyncEvent::WalletUpdated {
                        wallet_id: wallet_id.clone(),
                        finished: false,
                        error: user_error,
                    })
                    .await;
            }
        }

        self.end_status_fetch(&wallet_id);

        if trigger.also_update_history {
            let this = self.clone();
            tokio::spawn(async move { this.fetch_history(wallet_id).await });
        }
    }

    /// Refresh every wallet concurrently. A failing wallet never aborts its
    /// siblings; at most one server-message batch is surfaced per cycle,
    /// chosen by profile order.
    pub async fn fetch_all_wallets_status(self: Arc<Self>) {
        let wallets = self.registry.list();
        if wallets.is_empty() {
            return;
        }
        log::debug!("refreshing status for {} wallets", wallets.len());

        let mut handles = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let this = self.clone();
            handles.push(tokio::spawn(async move {
                let wallet_id = wallet.wallet_id.clone();
                if !this.begin_status_fetch(&wallet_id) {
                    log::debug!("status fetch already in flight for {}", wallet_id);
                    return None;
                }
                let result = this.client.fetch_status(&wallet, FetchOpts::default()).await;
                let messages = match result {
                    Ok(status) => {
                        this.persist_balance(&wallet_id, &status.available_balance_str)
                            .await;
                        let messages = status.server_messages.clone();
                        let mut snapshot = wallet;
                        snapshot.last_known_balance =
                            Some(status.available_balance_str.clone());
                        snapshot.cached_status = Some(status);
                        snapshot.error = None;
                        this.registry.replace(snapshot);
                        Some(messages)
                    }
                    Err(err) => {
                        this.process_wallet_error(&wallet_id, &err);
                        None
                    }
                };
                this.end_status_fetch(&wallet_id);
                messages
            }));
        }

        // Await in profile order so the winning message batch is the first
        // wallet that reported any, regardless of completion order.
        let mut batch: Option<Vec<ServerMessage>> = None;
        for handle in handles {
            if let Ok(Some(messages)) = handle.await {
                if batch.is_none() && !messages.is_empty() {
                    batch = Some(messages);
                }
            }
        }

        if let Some(mut messages) = batch {
            messages.sort_by_key(|m| m.priority);
            let visible = self.filter_server_messages(messages).await;
            *self.server_messages.write().unwrap() = visible.clone();
            if !visible.is_empty() {
                self.observers
                    .emit(SyncEvent::ServerMessages { messages: visible })
                    .await;
            }
        }

        self.observers
            .emit(SyncEvent::ProposalsUpdated {
                pending: self.registry.pending_proposal_total(),
            })
            .await;
    }

    /// Stream the wallet's transaction history, emitting page progress.
    pub async fn fetch_history(self: Arc<Self>, wallet_id: WalletId) {
        let Some(wallet) = self.registry.get(&wallet_id) else {
            log::error!("no wallet {} for history update", wallet_id);
            return;
        };
        if !self
            .history_in_flight
            .lock()
            .unwrap()
            .insert(wallet_id.clone())
        {
            log::debug!("history fetch already in flight for {}", wallet_id);
            return;
        }

        // Startup event so the UI can show a spinner right away.
        self.observers
            .emit(SyncEvent::HistoryUpdated {
                wallet_id: wallet_id.clone(),
                finished: false,
                progress: None,
                error: None,
            })
            .await;

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<usize>();
        let forwarder = {
            let this = self.clone();
            let wallet_id = wallet_id.clone();
            tokio::spawn(async move {
                while let Some(new_txs) = progress_rx.recv().await {
                    this.observers
                        .emit(SyncEvent::HistoryUpdated {
                            wallet_id: wallet_id.clone(),
                            finished: false,
                            progress: Some(new_txs),
                            error: None,
                        })
                        .await;
                }
            })
        };
        let progress: ProgressFn = Box::new(move |new_txs| {
            let _ = progress_tx.send(new_txs);
        });

        let result = self
            .client
            .fetch_history(&wallet, progress, FetchOpts::default())
            .await;
        // The client dropped the callback, so the forwarder drains and ends.
        let _ = forwarder.await;

        match result {
            Ok(history) => {
                log::debug!(
                    "history update finished for {} ({} entries)",
                    wallet_id,
                    history.len()
                );
                self.observers
                    .emit(SyncEvent::HistoryUpdated {
                        wallet_id: wallet_id.clone(),
                        finished: true,
                        progress: None,
                        error: None,
                    })
                    .await;
            }
            Err(SyncError::HistoryInProgress) => {
                // The client is already streaming this wallet; not an error.
                log::debug!("history update skipped for {}", wallet_id);
            }
            Err(err) => {
                log::warn!("history update failed for {}: {}", wallet_id, err);
                self.observers
                    .emit(SyncEvent::HistoryUpdated {
                        wallet_id: wallet_id.clone(),
                        finished: false,
                        progress: None,
                        error: Some(self.formatter.user_message(&err)),
                    })
                    .await;
            }
        }

        self.history_in_flight.lock().unwrap().remove(&wallet_id);
    }

    /// Persist the dismissal and drop the message from the current batch.
    pub async fn dismiss_server_message(&self, message_id: &str) {
        log::debug!("server message {} dismissed", message_id);
        if let Err(err) = self
            .persistence
            .set_server_message_dismissed(message_id)
            .await
        {
            log::warn!("could not persist dismissal of {}: {}", message_id, err);
        }
        self.server_messages
            .write()
            .unwrap()
            .retain(|m| m.id != message_id);
    }

    fn process_wallet_error(&self, wallet_id: &str, err: &SyncError) {
        let Some(mut snapshot) = self.registry.get(wallet_id) else {
            return;
        };
        snapshot.error = None;

        // Expected conditions leave the cached status untouched.
        if err.is_silent() {
            self.registry.replace(snapshot);
            return;
        }

        snapshot.cached_status = None;
        let message = match err {
            SyncError::AccessDenied | SyncError::Service { code: 403, .. } => {
                self.access_denied.store(true, Ordering::SeqCst);
                "Access denied".to_string()
            }
            SyncError::WalletNotRegistered => "Wallet not registered".to_string(),
            other => self.formatter.user_message(other),
        };
        log::warn!("error updating status for {}: {}", wallet_id, message);
        snapshot.error = Some(message);
        self.registry.replace(snapshot);
    }

    async fn persist_balance(&self, wallet_id: &str, balance: &str) {
        if let Err(err) = self
            .persistence
            .set_last_known_balance(wallet_id, balance)
            .await
        {
            log::warn!("could not persist balance for {}: {}", wallet_id, err);
        }
    }

    async fn filter_server_messages(&self, messages: Vec<ServerMessage>) -> Vec<ServerMessage> {
        let mut visible = Vec::with_capacity(messages.len());
        for message in messages {
            if let Some(app) = &message.app {
                if *app != self.app_name {
                    continue;
                }
            }
            let dismissed = self
                .persistence
                .get_server_message_dismissed(&message.id)
                .await
                .unwrap_or(false);
            if !dismissed {
                visible.push(message);
            }
        }
        visible
    }

    fn begin_status_fetch(&self, wallet_id: &str) -> bool {
        self.in_flight.lock().unwrap().insert(wallet_id.to_string())
    }

    fn end_status_fetch(&self, wallet_id: &str) {
        self.in_flight.lock().unwrap().remove(wallet_id);
    }
}
