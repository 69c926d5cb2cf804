//! Common types shared by the builder and the synchronization engine.

use bitcoin::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a wallet by the wallet service.
pub type WalletId = String;

/// Supported coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    Btc,
    Bch,
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coin::Btc => write!(f, "btc"),
            Coin::Bch => write!(f, "bch"),
        }
    }
}

/// Operator-pushed advisory text attached to wallet status responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Lower sorts first.
    pub priority: u32,
    /// When set, the message targets a single application by name.
    pub app: Option<String>,
    pub link: Option<String>,
}

/// Wallet state as last reported by the wallet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub available_balance: Amount,
    /// Formatted balance, persisted for offline display.
    pub available_balance_str: String,
    /// Pending transaction proposals for this wallet.
    pub pending_txps: usize,
    pub server_messages: Vec<ServerMessage>,
}

/// Locally cached view of a single wallet.
///
/// Snapshots are value types: the synchronizer replaces the whole snapshot in
/// the registry rather than mutating fields in place, and UI readers get
/// clones that are consistent at some point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub wallet_id: WalletId,
    pub coin: Coin,
    /// The local participant's copayer id, used for self-event suppression.
    pub copayer_id: String,
    /// `None` while never fetched or after an errored fetch.
    pub cached_status: Option<WalletStatus>,
    /// User-facing message for the last failed fetch.
    pub error: Option<String>,
    /// Last successfully fetched balance string, kept across restarts.
    pub last_known_balance: Option<String>,
}

impl WalletSnapshot {
    /// A fresh snapshot for a wallet just added to the profile.
    pub fn new(wallet_id: impl Into<WalletId>, coin: Coin, copayer_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            coin,
            copayer_id: copayer_id.into(),
            cached_status: None,
            error: None,
            last_known_balance: None,
        }
    }
}

/// A request to refresh one wallet's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTrigger {
    pub wallet_id: WalletId,
    /// Chain a history fetch after the status update.
    pub also_update_history: bool,
    /// Bypass the wallet service's response cache.
    pub force: bool,
}

impl SyncTrigger {
    pub fn new(wallet_id: impl Into<WalletId>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            also_update_history: false,
            force: false,
        }
    }
}

/// Options forwarded to the wallet service on a fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOpts {
    pub force: bool,
}

/// One confirmed or pending transaction in a wallet's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub txid: String,
    /// Signed satoshi delta from this wallet's perspective.
    pub amount_sat: i64,
    pub time: u64,
    pub confirmations: u32,
}

/// A detected payment request awaiting user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvoice {
    pub expires_at: DateTime<Utc>,
    pub coin: Coin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Coin::Bch).unwrap(), "\"bch\"");
        assert_eq!(serde_json::from_str::<Coin>("\"btc\"").unwrap(), Coin::Btc);
    }

    #[test]
    fn status_deserializes_from_service_payload() {
        let payload = serde_json::json!({
            "available_balance": 12345,
            "available_balance_str": "0.00012345 BTC",
            "pending_txps": 1,
            "server_messages": [{
                "id": "maintenance",
                "title": "Scheduled maintenance",
                "body": "The service will be briefly unavailable.",
                "priority": 5,
                "app": null,
                "link": null
            }]
        });
        let status: WalletStatus = serde_json::from_value(payload).unwrap();
        assert_eq!(status.available_balance, Amount::from_sat(12345));
        assert_eq!(status.pending_txps, 1);
        assert_eq!(status.server_messages[0].id, "maintenance");
    }
}
