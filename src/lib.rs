use std::sync::Arc;

pub mod client;
pub mod config;
pub mod countdown;
pub mod derivation;
pub mod error;
pub mod multisig;
pub mod sync;
pub mod wallet;

pub use config::Config;
pub use countdown::{CountdownState, InvoiceCountdown};
pub use error::{ConfigError, SyncError, ValidationError};
pub use sync::*;
pub use wallet::*;

use client::{ErrorFormatter, PersistenceStore, WalletServiceClient};

/// The wired-up synchronization engine: snapshot registry, status
/// synchronizer and trigger scheduler sharing one wallet set.
pub struct SyncEngine {
    registry: Arc<WalletRegistry>,
    synchronizer: Arc<StatusSynchronizer>,
    scheduler: SyncScheduler,
}

impl SyncEngine {
    /// Must be called from within a tokio runtime.
    pub fn new(
        client: Arc<dyn WalletServiceClient>,
        persistence: Arc<dyn PersistenceStore>,
        formatter: Arc<dyn ErrorFormatter>,
        config: &Config,
    ) -> Self {
        log::info!("initializing sync engine");
        let registry = Arc::new(WalletRegistry::new());
        let synchronizer = StatusSynchronizer::new(
            client,
            persistence,
            formatter,
            registry.clone(),
            config.app_name.clone(),
        );
        let scheduler = SyncScheduler::new(synchronizer.clone(), config.sync.clone());
        Self {
            registry,
            synchronizer,
            scheduler,
        }
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    pub fn synchronizer(&self) -> &Arc<StatusSynchronizer> {
        &self.synchronizer
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    /// Track a wallet added to the profile and schedule its first refresh.
    pub fn add_wallet(&self, snapshot: WalletSnapshot) {
        let wallet_id = snapshot.wallet_id.clone();
        log::info!("tracking wallet {}", wallet_id);
        self.registry.insert(snapshot);
        self.scheduler.trigger(SyncTrigger::new(wallet_id));
    }

    /// Stop tracking a wallet deleted from the profile, cancelling any
    /// pending refresh for it.
    pub fn remove_wallet(&self, wallet_id: &str) {
        log::info!("dropping wallet {}", wallet_id);
        self.scheduler.forget_wallet(wallet_id);
        self.registry.remove(wallet_id);
    }
}
