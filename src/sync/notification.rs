//! Remote wallet-service event handling and cache invalidation.

use serde::{Deserialize, Serialize};

use crate::sync::scheduler::SyncScheduler;
use crate::wallet::{SyncTrigger, WalletId};

/// Event kinds pushed by the wallet service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteEventKind {
    NewBlock,
    NewCopayer,
    NewAddress,
    NewTxProposal,
    TxProposalAcceptedBy,
    TxProposalRejectedBy,
    TxProposalFinallyRejected,
    TxProposalFinallyAccepted,
    TxProposalRemoved,
    NewIncomingTx,
    NewOutgoingTx,
}

impl RemoteEventKind {
    /// Whether the event means the transaction set changed, so the local
    /// history is stale too.
    fn affects_history(self) -> bool {
        matches!(
            self,
            RemoteEventKind::NewIncomingTx
                | RemoteEventKind::NewOutgoingTx
                | RemoteEventKind::NewBlock
        )
    }
}

/// A push notification from the wallet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub wallet_id: WalletId,
    pub kind: RemoteEventKind,
    /// Copayer that caused the event.
    pub creator_id: String,
}

impl SyncScheduler {
    /// Route a pushed service event into cache invalidation and a debounced
    /// refetch.
    ///
    /// Events created by the local copayer are ignored: the local action that
    /// produced them already refreshed the wallet. A `NewAddress` only
    /// invalidates the address cache; everything else invalidates the status
    /// cache and schedules a refetch.
    pub async fn handle_remote_event(&self, event: RemoteEvent) {
        let synchronizer = self.synchronizer();
        let Some(wallet) = synchronizer.registry().get(&event.wallet_id) else {
            return;
        };
        if wallet.copayer_id == event.creator_id {
            return;
        }

        log::info!("service event {:?} for wallet {}", event.kind, event.wallet_id);

        if event.kind == RemoteEventKind::NewAddress {
            synchronizer
                .client()
                .expire_address_cache(&event.wallet_id)
                .await;
            return;
        }

        synchronizer
            .client()
            .invalidate_status_cache(&event.wallet_id)
            .await;

        let mut trigger = SyncTrigger::new(event.wallet_id);
        trigger.also_update_history = event.kind.affects_history();
        self.trigger(trigger);
    }
}
