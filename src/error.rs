use thiserror::Error;

/// Errors caused by bad user input during wallet creation or import.
///
/// These are surfaced to the UI immediately and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The derivation path does not resolve to a network, strategy and account
    #[error("invalid derivation path")]
    InvalidDerivationPath,

    /// The path's coin code is not acceptable for the selected coin
    #[error("invalid derivation path for selected coin")]
    DerivationPathCoinMismatch,

    /// A recovery phrase or extended private key was required but not supplied
    #[error("please enter the wallet recovery phrase")]
    MissingRecoveryPhrase,

    /// The recovery phrase word count is not a multiple of 3
    #[error("wrong number of recovery words: {0}")]
    InvalidWordCount(usize),

    /// The m-of-n combination is outside the supported signature-size budget
    #[error("unsupported multisig policy: {required} of {total}")]
    InvalidPolicy { total: u8, required: u8 },

    /// Shared wallets need a display name for the local copayer
    #[error("a copayer name is required for shared wallets")]
    MissingCopayerName,
}

/// Errors from the remote wallet service or the local persistence store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// HTTP 403 from the wallet service
    #[error("access denied")]
    AccessDenied,

    /// The wallet is unknown to the wallet service
    #[error("wallet not registered at the wallet service")]
    WalletNotRegistered,

    /// A status fetch for this wallet is already running
    #[error("wallet update in progress")]
    InProgress,

    /// A history fetch for this wallet is already running
    #[error("history update in progress")]
    HistoryInProgress,

    /// The user dismissed an authentication prompt
    #[error("cancelled by user")]
    Cancelled,

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Any other wallet service failure
    #[error("service error {code}: {message}")]
    Service { code: i32, message: String },

    /// Persistence store failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl SyncError {
    /// Expected-and-ignored conditions: not user-visible errors, the caller
    /// must treat them as a no-op rather than an ERRORED transition.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            SyncError::InProgress | SyncError::HistoryInProgress | SyncError::Cancelled
        )
    }
}

/// Configuration error
#[derive(Error, Debug)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);
