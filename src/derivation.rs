//! Hierarchical derivation path parsing and validation.
//!
//! Paths use apostrophe-marked hardened segments: `m/44'/0'/0'`. The wallet
//! service only ever sees the string form, so parsing here is lookup-only and
//! never fails hard: malformed input yields `None` fields and callers must
//! check them before use.

use serde::{Deserialize, Serialize};

use crate::wallet::Coin;

/// Default path for a mainnet BTC wallet.
pub const DEFAULT_BTC: &str = "m/44'/0'/0'";
/// Default path for a mainnet BCH wallet.
pub const DEFAULT_BCH: &str = "m/44'/145'/0'";
/// Default path for a testnet wallet of any coin.
pub const DEFAULT_TESTNET: &str = "m/44'/1'/0'";

/// Key-tree layout addressed by the path's purpose segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivationStrategy {
    #[serde(rename = "BIP44")]
    Bip44,
    #[serde(rename = "BIP45")]
    Bip45,
    #[serde(rename = "BIP48")]
    Bip48,
}

/// Network selected by the path's coin code segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Livenet,
    Testnet,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Livenet => write!(f, "livenet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Raw segments of a derivation path, split on `/` at fixed positions.
///
/// Fields are `None` when the segment is absent. No further validation is
/// done at this level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPath {
    pub purpose: Option<String>,
    pub coin_code: Option<String>,
    pub account: Option<String>,
}

/// Split a path into its purpose/coin/account segments.
pub fn parse(path: &str) -> ParsedPath {
    let parts: Vec<&str> = path.split('/').collect();
    ParsedPath {
        purpose: parts.get(1).map(|s| s.to_string()),
        coin_code: parts.get(2).map(|s| s.to_string()),
        account: parts.get(3).map(|s| s.to_string()),
    }
}

/// Map the purpose segment to a derivation strategy.
///
/// Returns `None` for unsupported purposes.
pub fn strategy(path: &str) -> Option<DerivationStrategy> {
    match parse(path).purpose.as_deref() {
        Some("44'") => Some(DerivationStrategy::Bip44),
        Some("45'") => Some(DerivationStrategy::Bip45),
        Some("48'") => Some(DerivationStrategy::Bip48),
        _ => None,
    }
}

/// Map the coin code segment to a network name.
///
/// `0'` is BTC mainnet, `1'` is testnet for all coins, `145'` is BCH mainnet.
pub fn network_name(path: &str) -> Option<Network> {
    match parse(path).coin_code.as_deref() {
        Some("0'") => Some(Network::Livenet),
        Some("1'") => Some(Network::Testnet),
        Some("145'") => Some(Network::Livenet),
        _ => None,
    }
}

/// Extract the hardened account index, e.g. `0'` -> 0.
pub fn account(path: &str) -> Option<u32> {
    let segment = parse(path).account?;
    hardened_index(&segment)
}

/// Whether the path's coin code is acceptable for the selected coin.
///
/// BCH additionally accepts `0'`: wallets derived before BCH had its own coin
/// type used the BTC code, and those legacy paths must keep importing.
pub fn is_valid_for_coin(path: &str, coin: Coin) -> bool {
    let coin_code = parse(path).coin_code;
    match coin {
        Coin::Btc => matches!(coin_code.as_deref(), Some("0'") | Some("1'")),
        Coin::Bch => matches!(coin_code.as_deref(), Some("145'") | Some("0'") | Some("1'")),
    }
}

/// The default path for a new wallet of the given coin.
pub fn default_path(coin: Coin, testnet: bool) -> &'static str {
    if testnet {
        DEFAULT_TESTNET
    } else {
        match coin {
            Coin::Btc => DEFAULT_BTC,
            Coin::Bch => DEFAULT_BCH,
        }
    }
}

// First run of digits immediately followed by an apostrophe.
fn hardened_index(segment: &str) -> Option<u32> {
    for (pos, ch) in segment.char_indices() {
        if ch != '\'' || pos == 0 {
            continue;
        }
        let start = segment[..pos]
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|p| p + 1)
            .unwrap_or(0);
        if start < pos {
            return segment[start..pos].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bch_default_path() {
        let parsed = parse(DEFAULT_BCH);
        assert_eq!(parsed.purpose.as_deref(), Some("44'"));
        assert_eq!(parsed.coin_code.as_deref(), Some("145'"));
        assert_eq!(parsed.account.as_deref(), Some("0'"));
        assert_eq!(strategy(DEFAULT_BCH), Some(DerivationStrategy::Bip44));
        assert_eq!(network_name(DEFAULT_BCH), Some(Network::Livenet));
        assert_eq!(account(DEFAULT_BCH), Some(0));
    }

    #[test]
    fn malformed_path_yields_none_fields() {
        let parsed = parse("garbage");
        assert_eq!(parsed.purpose, None);
        assert_eq!(parsed.coin_code, None);
        assert_eq!(parsed.account, None);
        assert_eq!(strategy("garbage"), None);
        assert_eq!(network_name("garbage"), None);
        assert_eq!(account("garbage"), None);
    }

    #[test]
    fn unsupported_purpose_has_no_strategy() {
        assert_eq!(strategy("m/49'/0'/0'"), None);
    }

    #[test]
    fn testnet_coin_code_maps_for_all_coins() {
        assert_eq!(network_name(DEFAULT_TESTNET), Some(Network::Testnet));
        assert!(is_valid_for_coin(DEFAULT_TESTNET, Coin::Btc));
        assert!(is_valid_for_coin(DEFAULT_TESTNET, Coin::Bch));
    }

    #[test]
    fn account_requires_hardened_marker() {
        assert_eq!(account("m/44'/0'/7'"), Some(7));
        assert_eq!(account("m/44'/0'/7"), None);
        assert_eq!(account("m/44'/0'"), None);
    }

    #[test]
    fn bch_accepts_legacy_btc_coin_code() {
        assert!(is_valid_for_coin("m/44'/145'/0'", Coin::Bch));
        assert!(is_valid_for_coin("m/44'/0'/0'", Coin::Bch));
        assert!(is_valid_for_coin("m/44'/1'/0'", Coin::Bch));
        assert!(!is_valid_for_coin("m/44'/60'/0'", Coin::Bch));
    }

    #[test]
    fn btc_rejects_bch_coin_code() {
        assert!(is_valid_for_coin("m/44'/0'/0'", Coin::Btc));
        assert!(!is_valid_for_coin("m/44'/145'/0'", Coin::Btc));
    }

    #[test]
    fn default_paths_per_coin() {
        assert_eq!(default_path(Coin::Btc, false), DEFAULT_BTC);
        assert_eq!(default_path(Coin::Bch, false), DEFAULT_BCH);
        assert_eq!(default_path(Coin::Btc, true), DEFAULT_TESTNET);
        assert_eq!(default_path(Coin::Bch, true), DEFAULT_TESTNET);
    }
}
