//! Create/import form validation and request construction.
//!
//! Building is pure: nothing talks to the wallet service until the caller
//! hands the finished request to a `WalletCreationService`.

use serde::{Deserialize, Serialize};

use crate::derivation::{self, DerivationStrategy, Network};
use crate::error::ValidationError;
use crate::multisig::MultisigPolicy;
use crate::wallet::types::Coin;

/// Raw seed field as submitted by the user. Classification into mnemonic or
/// extended private key happens once, inside the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedInput {
    /// Generate a fresh random seed.
    Random,
    /// User-supplied recovery phrase or extended private key.
    Phrase(String),
}

/// Seed material after classification. Downstream code never re-infers the
/// kind from string shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMaterial {
    Random,
    Mnemonic {
        words: String,
        passphrase: Option<String>,
    },
    ExtendedPrivateKey(String),
}

/// Form values from the create-wallet page.
#[derive(Debug, Clone)]
pub struct CreateWalletForm {
    pub name: String,
    pub coin: Coin,
    pub total_copayers: u8,
    pub required_signatures: u8,
    /// Display name of the local copayer, required when the wallet is shared.
    pub copayer_name: Option<String>,
    pub seed: SeedInput,
    pub derivation_path: String,
    pub testnet: bool,
    pub single_address: bool,
    pub service_url: String,
}

/// Form values from the import-wallet page.
#[derive(Debug, Clone)]
pub struct ImportWalletForm {
    pub coin: Coin,
    pub words: String,
    pub passphrase: Option<String>,
    pub derivation_path: String,
    pub service_url: String,
}

/// Validated request for creating a wallet. Built once per submission and
/// owned by the caller until handed to the creation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCreationRequest {
    pub name: String,
    pub coin: Coin,
    pub network: Network,
    pub policy: MultisigPolicy,
    pub copayer_name: Option<String>,
    pub seed: SeedMaterial,
    pub derivation: DerivationStrategy,
    pub account: u32,
    pub single_address: bool,
    pub service_url: String,
    /// Derive BCH keys with coin type 0, for wallets created before BCH had
    /// its own registered coin type.
    pub use_zero_for_bch: bool,
}

/// Validated request for importing an existing wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletImportRequest {
    pub coin: Coin,
    pub network: Network,
    pub seed: SeedMaterial,
    pub derivation: DerivationStrategy,
    pub account: u32,
    pub service_url: String,
    pub use_zero_for_bch: bool,
}

// An extended private key pasted into the phrase field: a single long token
// like "xprv..." with no whitespace. 108 chars is shorter than any base58
// xprv, so anything longer that fits the prefix shape cannot be a mnemonic.
fn looks_like_extended_key(words: &str) -> bool {
    !words.chars().any(char::is_whitespace)
        && words.get(1..4) == Some("prv")
        && words.len() > 108
}

/// Build a creation request from the form, enforcing the validation order:
/// seed classification, path resolution, missing-phrase, coin mismatch,
/// legacy BCH flag.
pub fn build_create(form: &CreateWalletForm) -> Result<WalletCreationRequest, ValidationError> {
    let policy = MultisigPolicy {
        total_copayers: form.total_copayers,
        required_signatures: form.required_signatures,
    };
    policy.validate()?;

    if policy.is_shared()
        && form
            .copayer_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    {
        return Err(ValidationError::MissingCopayerName);
    }

    let (seed, network, strategy, account) = match &form.seed {
        SeedInput::Random => {
            let network = if form.testnet {
                Network::Testnet
            } else {
                Network::Livenet
            };
            (SeedMaterial::Random, network, DerivationStrategy::Bip44, 0)
        }
        SeedInput::Phrase(words) => {
            let material = if looks_like_extended_key(words) {
                SeedMaterial::ExtendedPrivateKey(words.clone())
            } else {
                SeedMaterial::Mnemonic {
                    words: words.clone(),
                    passphrase: None,
                }
            };

            let (network, strategy, account) = resolve_path(&form.derivation_path)?;

            if words.trim().is_empty() {
                return Err(ValidationError::MissingRecoveryPhrase);
            }

            (material, network, strategy, account)
        }
    };

    if !derivation::is_valid_for_coin(&form.derivation_path, form.coin) {
        return Err(ValidationError::DerivationPathCoinMismatch);
    }

    let use_zero_for_bch = legacy_bch_path(form.coin, &form.derivation_path);

    Ok(WalletCreationRequest {
        name: form.name.clone(),
        coin: form.coin,
        network,
        policy,
        copayer_name: if policy.is_shared() {
            form.copayer_name.clone()
        } else {
            None
        },
        seed,
        derivation: strategy,
        account,
        single_address: form.single_address,
        service_url: form.service_url.clone(),
        use_zero_for_bch,
    })
}

/// Build an import request. On top of the create-flow checks, a mnemonic's
/// word count must be a multiple of 3.
pub fn build_import(form: &ImportWalletForm) -> Result<WalletImportRequest, ValidationError> {
    let (network, strategy, account) = resolve_path(&form.derivation_path)?;

    if !derivation::is_valid_for_coin(&form.derivation_path, form.coin) {
        return Err(ValidationError::DerivationPathCoinMismatch);
    }

    let words = form.words.trim();
    if words.is_empty() {
        return Err(ValidationError::MissingRecoveryPhrase);
    }

    let seed = if words.starts_with("xprv") || words.starts_with("tprv") {
        SeedMaterial::ExtendedPrivateKey(words.to_string())
    } else {
        // split_whitespace covers the full-width space pasted from some IMEs
        let count = words.split_whitespace().count();
        if count % 3 != 0 {
            return Err(ValidationError::InvalidWordCount(count));
        }
        SeedMaterial::Mnemonic {
            words: words.to_string(),
            passphrase: form.passphrase.clone(),
        }
    };

    Ok(WalletImportRequest {
        coin: form.coin,
        network,
        seed,
        derivation: strategy,
        account,
        service_url: form.service_url.clone(),
        use_zero_for_bch: legacy_bch_path(form.coin, &form.derivation_path),
    })
}

fn resolve_path(path: &str) -> Result<(Network, DerivationStrategy, u32), ValidationError> {
    match (
        derivation::network_name(path),
        derivation::strategy(path),
        derivation::account(path),
    ) {
        (Some(network), Some(strategy), Some(account)) => Ok((network, strategy, account)),
        _ => Err(ValidationError::InvalidDerivationPath),
    }
}

fn legacy_bch_path(coin: Coin, path: &str) -> bool {
    let legacy = coin == Coin::Bch && derivation::parse(path).coin_code.as_deref() == Some("0'");
    if legacy {
        log::debug!("using coin type 0 for a legacy bch wallet");
    }
    legacy
}
