mod debounce;
mod events;
mod notification;
mod scheduler;
mod synchronizer;

#[cfg(test)]
pub(crate) mod testutil;

pub use debounce::{Debouncer, Edge};
pub use events::{ObserverRegistry, SubscriptionId, SyncEvent, SyncObserver};
pub use notification::{RemoteEvent, RemoteEventKind};
pub use scheduler::SyncScheduler;
pub use synchronizer::StatusSynchronizer;
