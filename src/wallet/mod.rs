mod builder;
mod registry;
mod types;

pub use builder::{
    build_create, build_import, CreateWalletForm, ImportWalletForm, SeedInput, SeedMaterial,
    WalletCreationRequest, WalletImportRequest,
};
pub use registry::WalletRegistry;
pub use types::{
    Coin, FetchOpts, HistoryEntry, PendingInvoice, ServerMessage, SyncTrigger, WalletId,
    WalletSnapshot, WalletStatus,
};
