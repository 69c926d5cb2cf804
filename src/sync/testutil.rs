//! Shared mock collaborators for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::Amount;

use crate::client::{PersistenceStore, PlainErrorFormatter, ProgressFn, WalletServiceClient};
use crate::error::SyncError;
use crate::sync::events::{SyncEvent, SyncObserver};
use crate::sync::synchronizer::StatusSynchronizer;
use crate::wallet::{
    Coin, FetchOpts, HistoryEntry, ServerMessage, WalletId, WalletRegistry, WalletSnapshot,
    WalletStatus,
};

pub(crate) fn status_with(
    balance_sat: u64,
    pending: usize,
    messages: Vec<ServerMessage>,
) -> WalletStatus {
    WalletStatus {
        available_balance: Amount::from_sat(balance_sat),
        available_balance_str: format!("{} sat", balance_sat),
        pending_txps: pending,
        server_messages: messages,
    }
}

pub(crate) fn message(id: &str, priority: u32) -> ServerMessage {
    ServerMessage {
        id: id.into(),
        title: format!("title {}", id),
        body: format!("body {}", id),
        priority,
        app: None,
        link: None,
    }
}

#[derive(Default)]
pub(crate) struct MockClient {
    pub responses: Mutex<HashMap<WalletId, Result<WalletStatus, SyncError>>>,
    pub fetch_counts: Mutex<HashMap<WalletId, usize>>,
    pub fetch_delay: Option<Duration>,
    pub history: Mutex<HashMap<WalletId, Result<Vec<HistoryEntry>, SyncError>>>,
    pub history_pages: Vec<usize>,
    pub expired_addresses: Mutex<Vec<WalletId>>,
    pub invalidated: Mutex<Vec<WalletId>>,
}

impl MockClient {
    pub fn respond(&self, wallet_id: &str, response: Result<WalletStatus, SyncError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(wallet_id.to_string(), response);
    }

    pub fn fetch_count(&self, wallet_id: &str) -> usize {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(wallet_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl WalletServiceClient for MockClient {
    async fn fetch_status(
        &self,
        wallet: &WalletSnapshot,
        _opts: FetchOpts,
    ) -> Result<WalletStatus, SyncError> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(wallet.wallet_id.clone())
            .or_insert(0) += 1;
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&wallet.wallet_id)
            .cloned()
            .unwrap_or_else(|| Ok(status_with(0, 0, Vec::new())))
    }

    async fn fetch_history(
        &self,
        wallet: &WalletSnapshot,
        progress: ProgressFn,
        _opts: FetchOpts,
    ) -> Result<Vec<HistoryEntry>, SyncError> {
        for page in &self.history_pages {
            progress(*page);
        }
        self.history
            .lock()
            .unwrap()
            .get(&wallet.wallet_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn invalidate_status_cache(&self, wallet_id: &str) {
        self.invalidated.lock().unwrap().push(wallet_id.to_string());
    }

    async fn expire_address_cache(&self, wallet_id: &str) {
        self.expired_addresses
            .lock()
            .unwrap()
            .push(wallet_id.to_string());
    }
}

#[derive(Default)]
pub(crate) struct MockStore {
    pub balances: Mutex<HashMap<WalletId, String>>,
    pub dismissed: Mutex<HashSet<String>>,
}

#[async_trait]
impl PersistenceStore for MockStore {
    async fn set_last_known_balance(
        &self,
        wallet_id: &str,
        balance: &str,
    ) -> Result<(), SyncError> {
        self.balances
            .lock()
            .unwrap()
            .insert(wallet_id.to_string(), balance.to_string());
        Ok(())
    }

    async fn get_server_message_dismissed(&self, message_id: &str) -> Result<bool, SyncError> {
        Ok(self.dismissed.lock().unwrap().contains(message_id))
    }

    async fn set_server_message_dismissed(&self, message_id: &str) -> Result<(), SyncError> {
        self.dismissed.lock().unwrap().insert(message_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct Recorder {
    pub events: Mutex<Vec<SyncEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncObserver for Recorder {
    async fn on_event(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub(crate) struct Fixture {
    pub client: Arc<MockClient>,
    pub store: Arc<MockStore>,
    pub sync: Arc<StatusSynchronizer>,
    pub recorder: Arc<Recorder>,
}

pub(crate) fn fixture(wallet_ids: &[&str]) -> Fixture {
    fixture_with_client(MockClient::default(), wallet_ids)
}

pub(crate) fn fixture_with_client(client: MockClient, wallet_ids: &[&str]) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = Arc::new(client);
    let store = Arc::new(MockStore::default());
    let registry = Arc::new(WalletRegistry::new());
    for id in wallet_ids {
        registry.insert(WalletSnapshot::new(*id, Coin::Btc, format!("copayer-{}", id)));
    }
    let sync = StatusSynchronizer::new(
        client.clone(),
        store.clone(),
        Arc::new(PlainErrorFormatter),
        registry,
        "testapp",
    );
    let recorder = Arc::new(Recorder::default());
    sync.subscribe(recorder.clone());
    Fixture {
        client,
        store,
        sync,
        recorder,
    }
}
