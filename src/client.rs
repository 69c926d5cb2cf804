//! Collaborator contracts for the synchronization engine.
//!
//! The wallet service wire protocol, the persistence backend and the actual
//! wallet creation/signing stack all live behind these traits. The engine
//! only ever sees their abstract results.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::wallet::{
    FetchOpts, HistoryEntry, WalletCreationRequest, WalletImportRequest, WalletSnapshot,
    WalletStatus,
};

/// Incremental page callback for history fetches. The argument is the number
/// of new transactions in the page. Implementations must drop the callback
/// when the fetch completes.
pub type ProgressFn = Box<dyn Fn(usize) + Send + Sync>;

/// Remote wallet service ("BWS-equivalent") client.
///
/// Timeout handling is the client's concern; the engine treats any late or
/// failed response uniformly as an errored fetch.
#[async_trait]
pub trait WalletServiceClient: Send + Sync {
    /// Fetch the current status (balance, pending proposals, server
    /// messages) for one wallet.
    async fn fetch_status(
        &self,
        wallet: &WalletSnapshot,
        opts: FetchOpts,
    ) -> Result<WalletStatus, SyncError>;

    /// Fetch the transaction history, reporting pages through `progress`.
    ///
    /// Fails with [`SyncError::HistoryInProgress`] when the client is already
    /// streaming history for this wallet.
    async fn fetch_history(
        &self,
        wallet: &WalletSnapshot,
        progress: ProgressFn,
        opts: FetchOpts,
    ) -> Result<Vec<HistoryEntry>, SyncError>;

    /// Drop the client-side status cache so the next fetch hits the service.
    async fn invalidate_status_cache(&self, wallet_id: &str);

    /// Drop only the cached receive addresses for this wallet.
    async fn expire_address_cache(&self, wallet_id: &str);
}

/// Local key-value persistence for state that survives restarts.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn set_last_known_balance(&self, wallet_id: &str, balance: &str)
        -> Result<(), SyncError>;

    async fn get_server_message_dismissed(&self, message_id: &str) -> Result<bool, SyncError>;

    async fn set_server_message_dismissed(&self, message_id: &str) -> Result<(), SyncError>;
}

/// External wallet creation/import stack (key generation and service-side
/// registration).
#[async_trait]
pub trait WalletCreationService: Send + Sync {
    async fn create(&self, request: &WalletCreationRequest) -> Result<WalletSnapshot, SyncError>;

    async fn import(&self, request: &WalletImportRequest) -> Result<WalletSnapshot, SyncError>;
}

/// Maps service errors to user-facing text before display.
pub trait ErrorFormatter: Send + Sync {
    fn user_message(&self, err: &SyncError) -> String;
}

/// Formatter that passes the error's own display text through.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainErrorFormatter;

impl ErrorFormatter for PlainErrorFormatter {
    fn user_message(&self, err: &SyncError) -> String {
        err.to_string()
    }
}
